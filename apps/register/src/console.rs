//! # Bill Console
//!
//! Line-oriented billing screen. Each input line is one cashier action.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  code <row> <text>       type into a row's code field                   │
//! │  pick <row> <id>         choose a product from the suggestion list      │
//! │  qty <row> [text]        type into a row's quantity field (blank ok)    │
//! │  blur <row>              leave the quantity field                       │
//! │  add / del <row>         add an empty row / delete a row                │
//! │  customer <phone>        look up and attach a loyalty customer          │
//! │  nocustomer              detach the customer                            │
//! │  redeem <points>         points to redeem (clamped to the balance)      │
//! │  coupon [code]           set or clear the coupon                        │
//! │  find <text>             search the catalog                             │
//! │  preview                 ask the server for discounts                   │
//! │  scan <row> / scan stop  read a barcode into a row                      │
//! │  show / json             print the bill                                 │
//! │  reload / submit / quit                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are numbered from 1 on screen.

use std::fmt::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use tally_client::BillingBackend;
use tally_core::validation::validate_search_query;
use tally_core::{BillEditor, BillSummary, DiscountKind, Money};

use crate::config::RegisterConfig;
use crate::error::{AppError, AppResult};
use crate::scanner::{FileCaptureSource, ScanSession};
use crate::state::{BillState, PreviewOutcome};

// =============================================================================
// Command Parsing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Code { row: usize, text: String },
    Pick { row: usize, product_id: i64 },
    Qty { row: usize, text: String },
    Blur { row: usize },
    Add,
    Del { row: usize },
    Customer { phone: String },
    NoCustomer,
    Redeem { text: String },
    Coupon { code: Option<String> },
    Find { query: String },
    Preview,
    Scan { row: usize },
    StopScan,
    Show,
    Json,
    Reload,
    Submit,
    Help,
    Quit,
}

/// Parses one console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> AppResult<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb.to_lowercase().as_str() {
        "code" => {
            let (row, text) = row_and_text(rest)?;
            Command::Code { row, text }
        }
        "pick" => {
            let (row, text) = row_and_text(rest)?;
            let product_id = text
                .parse()
                .map_err(|_| AppError::usage("usage: pick <row> <product-id>"))?;
            Command::Pick { row, product_id }
        }
        "qty" => {
            let (row, text) = row_and_text(rest)?;
            Command::Qty { row, text }
        }
        "blur" => Command::Blur { row: parse_row(rest)? },
        "add" => Command::Add,
        "del" => Command::Del { row: parse_row(rest)? },
        "customer" if !rest.is_empty() => Command::Customer {
            phone: rest.to_string(),
        },
        "customer" => return Err(AppError::usage("usage: customer <phone>")),
        "nocustomer" => Command::NoCustomer,
        "redeem" => Command::Redeem {
            text: rest.to_string(),
        },
        "coupon" => Command::Coupon {
            code: (!rest.is_empty()).then(|| rest.to_string()),
        },
        "find" => Command::Find {
            query: rest.to_string(),
        },
        "preview" => Command::Preview,
        "scan" if rest.eq_ignore_ascii_case("stop") => Command::StopScan,
        "scan" => Command::Scan { row: parse_row(rest)? },
        "show" => Command::Show,
        "json" => Command::Json,
        "reload" => Command::Reload,
        "submit" => Command::Submit,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(AppError::usage(format!(
                "unknown command '{}', type 'help'",
                other
            )))
        }
    };

    Ok(Some(command))
}

/// Converts a 1-based row number into an index.
fn parse_row(text: &str) -> AppResult<usize> {
    match text.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(AppError::usage(format!("'{}' is not a row number", text.trim()))),
    }
}

fn row_and_text(rest: &str) -> AppResult<(usize, String)> {
    let (row, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Ok((parse_row(row)?, text.trim().to_string()))
}

// =============================================================================
// Rendering
// =============================================================================

/// Renders the bill the way the billing screen lays it out.
pub fn render_bill(bill: &BillEditor, summary: &BillSummary, config: &RegisterConfig) -> String {
    let money = |m: Money| config.format_currency(m);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:>3}  {:<16} {:<24} {:>5} {:>11} {:>11}",
        "#", "Code", "Item", "Qty", "Price", "Total"
    );
    for (i, row) in bill.rows().iter().enumerate() {
        let qty = row.quantity.map(|q| q.to_string()).unwrap_or_default();
        let name = if row.is_resolved() { row.name.as_str() } else { "-" };
        let _ = writeln!(
            out,
            "{:>3}  {:<16} {:<24} {:>5} {:>11} {:>11}",
            i + 1,
            row.code,
            name,
            qty,
            money(row.unit_price),
            money(row.line_total)
        );
        if let Some(suggestions) = bill.suggestions().filter(|s| s.row == i) {
            for product in &suggestions.products {
                let _ = writeln!(
                    out,
                    "       > [{}] {} ({}) {}",
                    product.id,
                    product.name,
                    product.sku,
                    money(product.selling_price)
                );
            }
        }
    }

    out.push('\n');
    if let Some(customer) = bill.customer() {
        let _ = writeln!(
            out,
            "Customer: {} ({}, {} pts)",
            customer.name, customer.membership_tier, customer.loyalty_points
        );
    }
    if let Some(code) = bill.coupon_code() {
        let _ = writeln!(out, "Coupon: {}", code);
    }

    let _ = writeln!(out, "{:<24}{:>12}", "Subtotal", money(summary.subtotal));
    for kind in DiscountKind::ALL {
        let amount = summary.discount(kind);
        if amount.is_positive() {
            let _ = writeln!(out, "{:<24}{:>12}", kind.label(), format!("-{}", money(amount)));
        }
    }
    let _ = writeln!(out, "{:<24}{:>12}", "Total", money(summary.base_total));
    let _ = writeln!(out, "{:<24}{:>12}", "Included tax", money(summary.included_tax));
    if summary.redeem_points > 0 {
        let label = format!("Redeemed ({} pts)", summary.redeem_points);
        let _ = writeln!(out, "{:<24}{:>12}", label, format!("-{}", money(summary.redeem_value)));
    }
    let _ = writeln!(out, "{:<24}{:>12}", "Payable", money(summary.final_payable));
    if let Some(points) = summary.points_earned {
        let _ = writeln!(out, "Points earned: {}", points);
    }
    if !summary.from_preview {
        out.push_str("(local estimate)\n");
    }

    out
}

const HELP: &str = "\
commands: code <row> <text> | pick <row> <id> | qty <row> [text] | blur <row>
          add | del <row> | customer <phone> | nocustomer | redeem <points>
          coupon [code] | find <text> | preview | scan <row> | scan stop
          show | json | reload | submit | quit";

// =============================================================================
// Console
// =============================================================================

pub struct Console {
    state: BillState,
    backend: Arc<dyn BillingBackend>,
    config: RegisterConfig,
    scan: Option<ScanSession>,
}

impl Console {
    pub fn new(state: BillState, backend: Arc<dyn BillingBackend>, config: RegisterConfig) -> Self {
        Console {
            state,
            backend,
            config,
            scan: None,
        }
    }

    pub fn state(&self) -> &BillState {
        &self.state
    }

    fn show(&self) -> String {
        self.state
            .with_bill(|bill| render_bill(bill, &bill.summary(), &self.config))
    }

    /// Runs one command and returns the text to print.
    pub async fn execute(&mut self, command: Command) -> AppResult<String> {
        debug!(?command, "Console command");

        match command {
            Command::Code { row, text } => {
                self.state.with_bill_mut(|bill| bill.edit_code(row, &text));
                Ok(self.show())
            }
            Command::Pick { row, product_id } => {
                self.state
                    .with_bill_mut(|bill| bill.select_suggestion(row, product_id))?;
                Ok(self.show())
            }
            Command::Qty { row, text } => {
                self.state.with_bill_mut(|bill| bill.edit_quantity(row, &text));
                Ok(self.show())
            }
            Command::Blur { row } => {
                self.state.with_bill_mut(|bill| bill.blur_quantity(row));
                Ok(self.show())
            }
            Command::Add => {
                let row = self.state.with_bill_mut(BillEditor::add_row);
                Ok(format!("Added row {}", row + 1))
            }
            Command::Del { row } => {
                if self.state.with_bill_mut(|bill| bill.delete_row(row)) {
                    Ok(self.show())
                } else {
                    Ok("The last row cannot be deleted.".to_string())
                }
            }
            Command::Customer { phone } => {
                match self.state.lookup_customer(self.backend.as_ref(), &phone).await? {
                    Some(customer) => Ok(format!(
                        "Customer: {} ({} pts)",
                        customer.name, customer.loyalty_points
                    )),
                    None => Ok("No customer with that phone.".to_string()),
                }
            }
            Command::NoCustomer => {
                self.state.with_bill_mut(BillEditor::clear_customer);
                Ok("Customer cleared.".to_string())
            }
            Command::Redeem { text } => {
                self.state.with_bill_mut(|bill| bill.set_redeem_points(&text));
                let summary = self.state.summary();
                Ok(format!(
                    "Redeeming {} pts, payable {}",
                    summary.redeem_points,
                    self.config.format_currency(summary.final_payable)
                ))
            }
            Command::Coupon { code } => {
                self.state.with_bill_mut(|bill| bill.set_coupon_code(code));
                Ok(self.show())
            }
            Command::Find { query } => {
                let query = validate_search_query(&query).map_err(tally_core::CoreError::from)?;
                let products = self
                    .state
                    .with_bill(|bill| bill.catalog().suggestions(&query));
                if products.is_empty() {
                    return Ok("No matching products.".to_string());
                }
                let mut out = String::new();
                for product in products {
                    let _ = writeln!(
                        out,
                        "[{}] {} ({}) {}",
                        product.id,
                        product.name,
                        product.sku,
                        self.config.format_currency(product.selling_price)
                    );
                }
                Ok(out)
            }
            Command::Preview => {
                match self.state.request_preview(self.backend.as_ref()).await? {
                    PreviewOutcome::Applied => Ok(self.show()),
                    PreviewOutcome::Stale => {
                        Ok("Bill changed while pricing; showing local totals.".to_string())
                    }
                    PreviewOutcome::Skipped => Ok("Nothing to price yet.".to_string()),
                }
            }
            Command::Scan { row } => self.start_scan(row).await,
            Command::StopScan => match self.scan.take() {
                Some(session) => {
                    session.close().await;
                    Ok("Scanner stopped.".to_string())
                }
                None => Ok("Scanner is not running.".to_string()),
            },
            Command::Show => Ok(self.show()),
            Command::Json => {
                let summary = self.state.summary();
                serde_json::to_string_pretty(&summary)
                    .map_err(|e| AppError::usage(format!("cannot render summary: {}", e)))
            }
            Command::Reload => {
                let count = self.state.reload_catalog(self.backend.as_ref()).await?;
                Ok(format!("Catalog reloaded: {} products", count))
            }
            Command::Submit => {
                let receipt = self
                    .state
                    .submit(self.backend.as_ref(), self.config.tenant_id())
                    .await?;
                Ok(format!(
                    "Invoice {} created. New bill started.",
                    receipt
                        .invoice_number
                        .unwrap_or_else(|| format!("#{}", receipt.id))
                ))
            }
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }

    async fn start_scan(&mut self, row: usize) -> AppResult<String> {
        let Some(path) = self.config.scanner.capture_file.clone() else {
            return Err(AppError::usage(
                "No scanner configured (set TALLY_SCAN_FILE or [scanner] capture_file)",
            ));
        };
        if self.state.with_bill(|bill| bill.row(row).is_none()) {
            return Err(AppError::usage(format!("row {} does not exist", row + 1)));
        }

        if let Some(previous) = self.scan.take() {
            previous.close().await;
        }

        let state = self.state.clone();
        self.scan = Some(ScanSession::start(
            FileCaptureSource::new(path),
            self.config.scan_interval(),
            move |code| state.with_bill_mut(|bill| bill.edit_code(row, &code)),
        ));
        Ok(format!("Scanning into row {}...", row + 1))
    }

    /// Reads commands from stdin until `quit` or end of input.
    pub async fn run(mut self) -> AppResult<()> {
        println!("{} | tenant {}", self.config.store.name, self.config.tenant_id());
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("{}", e.user_message());
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }

            match self.execute(command).await {
                Ok(output) => println!("{}", output),
                Err(e) => println!("{}", e.user_message()),
            }
        }

        if let Some(session) = self.scan.take() {
            session.close().await;
        }
        info!("Console closed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tally_client::{ClientError, ClientResult, InvoiceReceipt, PreviewRequest};
    use tally_core::{
        Catalog, Customer, DiscountPreview, InvoiceDraft, MembershipTier, Money, Product, TaxRate,
    };

    struct OfflineBackend;

    #[async_trait]
    impl BillingBackend for OfflineBackend {
        async fn fetch_catalog(&self) -> ClientResult<Vec<Product>> {
            Ok(catalog())
        }

        async fn find_customer(&self, phone: &str) -> ClientResult<Option<Customer>> {
            Ok(Some(Customer::new(5, "Asha", phone, 50, MembershipTier::Gold)))
        }

        async fn preview_discounts(&self, _: &PreviewRequest) -> ClientResult<DiscountPreview> {
            Err(ClientError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            })
        }

        async fn submit_invoice(&self, draft: &InvoiceDraft) -> ClientResult<InvoiceReceipt> {
            Ok(InvoiceReceipt {
                id: 1,
                invoice_number: Some("INV-1".to_string()),
                total: draft.total,
            })
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            Product {
                id: 1,
                name: "Masala Tea".to_string(),
                sku: "TEA-01".to_string(),
                barcode: Some("8901234567890".to_string()),
                selling_price: Money::from_major(10),
                tax_rate: TaxRate::from_bps(500),
                quantity_available: 12,
            },
            Product {
                id: 2,
                name: "Tea Biscuits".to_string(),
                sku: "BIS-02".to_string(),
                barcode: None,
                selling_price: Money::from_cents(2550),
                tax_rate: TaxRate::from_bps(1800),
                quantity_available: 40,
            },
        ]
    }

    fn console() -> Console {
        Console::new(
            BillState::new(Catalog::new(catalog())),
            Arc::new(OfflineBackend),
            RegisterConfig::default(),
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("code 1 brown bread").unwrap(),
            Some(Command::Code {
                row: 0,
                text: "brown bread".to_string()
            })
        );
        assert_eq!(
            parse_command("qty 2").unwrap(),
            Some(Command::Qty {
                row: 1,
                text: String::new()
            })
        );
        assert_eq!(
            parse_command("PICK 1 42").unwrap(),
            Some(Command::Pick {
                row: 0,
                product_id: 42
            })
        );
        assert_eq!(parse_command("coupon").unwrap(), Some(Command::Coupon { code: None }));
        assert_eq!(parse_command("scan stop").unwrap(), Some(Command::StopScan));
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_bad_rows() {
        assert!(parse_command("del 0").is_err());
        assert!(parse_command("blur x").is_err());
        assert!(parse_command("pick 1 abc").is_err());
        assert!(parse_command("customer").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[tokio::test]
    async fn test_typing_a_bill() {
        let mut console = console();

        let out = console
            .execute(Command::Code {
                row: 0,
                text: "tea".to_string(),
            })
            .await
            .unwrap();
        assert!(out.contains("> [1] Masala Tea"));
        assert!(out.contains("> [2] Tea Biscuits"));

        console
            .execute(Command::Pick {
                row: 0,
                product_id: 2,
            })
            .await
            .unwrap();
        console
            .execute(Command::Qty {
                row: 0,
                text: "2".to_string(),
            })
            .await
            .unwrap();

        let summary = console.state().summary();
        assert_eq!(summary.subtotal, Money::from_cents(5100));

        let out = console.execute(Command::Show).await.unwrap();
        assert!(out.contains("$51.00"));
        assert!(out.contains("(local estimate)"));
    }

    #[tokio::test]
    async fn test_redeem_is_clamped() {
        let mut console = console();
        console
            .execute(Command::Code {
                row: 0,
                text: "TEA-01".to_string(),
            })
            .await
            .unwrap();
        console
            .execute(Command::Customer {
                phone: "5550101234".to_string(),
            })
            .await
            .unwrap();

        let out = console
            .execute(Command::Redeem {
                text: "80".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(out, "Redeeming 50 pts, payable $0.00");
    }

    #[tokio::test]
    async fn test_preview_failure_is_generic_notice() {
        let mut console = console();
        console
            .execute(Command::Code {
                row: 0,
                text: "TEA-01".to_string(),
            })
            .await
            .unwrap();

        let err = console.execute(Command::Preview).await.unwrap_err();
        assert_eq!(err.user_message(), crate::error::NETWORK_FAILURE_NOTICE);
        assert_eq!(console.state().summary().base_total, Money::from_major(10));
    }

    #[tokio::test]
    async fn test_submit_starts_new_bill() {
        let mut console = console();
        console
            .execute(Command::Code {
                row: 0,
                text: "8901234567890".to_string(),
            })
            .await
            .unwrap();

        let out = console.execute(Command::Submit).await.unwrap();
        assert_eq!(out, "Invoice INV-1 created. New bill started.");
        assert!(console.state().summary().subtotal.is_zero());
    }

    #[tokio::test]
    async fn test_scan_requires_capture_file() {
        let mut console = console();
        let err = console.execute(Command::Scan { row: 0 }).await.unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
    }
}
