//! # Bill State
//!
//! The bill currently on the counter, shared between the console loop and
//! the scanner task.
//!
//! ## Thread Safety
//! The editor sits behind `Arc<Mutex<T>>`. The lock is only held for the
//! synchronous edit itself, never across a backend call:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request_preview()                                                      │
//! │                                                                         │
//! │  lock ─► snapshot rows + revision ─► unlock                             │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │        backend.preview_discounts()   (cashier keeps editing)            │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  lock ─► revision unchanged? apply : discard ─► unlock                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use tally_client::{BillingBackend, ClientResult, InvoiceReceipt, PreviewRequest};
use tally_core::{BillEditor, BillSummary, Catalog, Customer, InvoiceDraft};

use crate::error::AppResult;

/// What happened to a preview request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewOutcome {
    Applied,
    /// The bill changed while the request was in flight.
    Stale,
    /// Nothing billable to price.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct BillState {
    bill: Arc<Mutex<BillEditor>>,
}

impl BillState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            bill: Arc::new(Mutex::new(BillEditor::new(catalog))),
        }
    }

    /// Executes a function with read access to the bill.
    pub fn with_bill<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&BillEditor) -> R,
    {
        let bill = self.bill.lock().unwrap_or_else(PoisonError::into_inner);
        f(&bill)
    }

    /// Executes a function with write access to the bill.
    ///
    /// ## Usage
    /// ```rust
    /// use tally_core::Catalog;
    /// use tally_register::state::BillState;
    ///
    /// let state = BillState::new(Catalog::default());
    /// let row = state.with_bill_mut(|bill| bill.add_row());
    /// assert_eq!(row, 1);
    /// ```
    pub fn with_bill_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BillEditor) -> R,
    {
        let mut bill = self.bill.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut bill)
    }

    pub fn summary(&self) -> BillSummary {
        self.with_bill(BillEditor::summary)
    }

    // =========================================================================
    // Backend Round Trips
    // =========================================================================

    /// Replaces the catalog with a fresh copy from the backend.
    pub async fn reload_catalog(&self, backend: &dyn BillingBackend) -> ClientResult<usize> {
        let products = backend.fetch_catalog().await?;
        let count = products.len();
        self.with_bill_mut(|bill| bill.replace_catalog(Catalog::new(products)));
        Ok(count)
    }

    /// Looks up a customer by phone and attaches them to the bill.
    pub async fn lookup_customer(
        &self,
        backend: &dyn BillingBackend,
        phone: &str,
    ) -> ClientResult<Option<Customer>> {
        let customer = backend.find_customer(phone).await?;
        if let Some(customer) = &customer {
            self.with_bill_mut(|bill| bill.select_customer(customer.clone()));
        }
        Ok(customer)
    }

    /// Fetches a discount preview and installs it if the bill has not
    /// changed meanwhile. On failure local totals stay in place.
    pub async fn request_preview(
        &self,
        backend: &dyn BillingBackend,
    ) -> ClientResult<PreviewOutcome> {
        let (revision, request) =
            self.with_bill(|bill| (bill.revision(), PreviewRequest::from_editor(bill)));
        if request.is_empty() {
            return Ok(PreviewOutcome::Skipped);
        }

        let preview = match backend.preview_discounts(&request).await {
            Ok(preview) => preview,
            Err(e) => {
                warn!(error = %e, "Discount preview failed, keeping local totals");
                return Err(e);
            }
        };

        if self.with_bill_mut(|bill| bill.apply_preview(revision, preview)) {
            debug!(revision, "Discount preview applied");
            Ok(PreviewOutcome::Applied)
        } else {
            Ok(PreviewOutcome::Stale)
        }
    }

    /// Builds the invoice, submits it and starts a fresh bill on success.
    ///
    /// Rows changed while the request was in flight are not part of the
    /// invoice and stay on the new bill.
    pub async fn submit(
        &self,
        backend: &dyn BillingBackend,
        tenant_id: &str,
    ) -> AppResult<InvoiceReceipt> {
        let (revision, snapshot, draft) = self.with_bill(|bill| {
            InvoiceDraft::from_editor(bill, tenant_id)
                .map(|draft| (bill.revision(), bill.rows().to_vec(), draft))
        })?;
        let receipt = backend.submit_invoice(&draft).await?;
        info!(
            invoice_id = receipt.id,
            lines = draft.lines.len(),
            units = draft.total_quantity(),
            payable = %draft.payable,
            "Bill submitted"
        );

        let carried = self.with_bill_mut(|bill| bill.settle_submitted(revision, &snapshot));
        if carried > 0 {
            info!(rows = carried, "Rows edited during submission kept on the new bill");
        }
        Ok(receipt)
    }
}
