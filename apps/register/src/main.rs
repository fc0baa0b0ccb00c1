//! # Tally Register Entry Point
//!
//! ```text
//! tally-register [path/to/register.toml]
//! ```
//!
//! The actual setup is in lib.rs so it can be tested.

use tally_register::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::args_os().nth(1).map(Into::into);
    tally_register::run(config_path).await
}
