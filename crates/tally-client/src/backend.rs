//! # Billing Backend
//!
//! The [`BillingBackend`] trait is the seam between the register and the
//! remote service. [`HttpBackend`] is the production implementation; tests
//! and offline demos can provide their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use tally_core::validation::validate_phone;
use tally_core::{Customer, DiscountPreview, InvoiceDraft, Product};

use crate::dto::{
    CustomerDto, DiscountPreviewDto, InvoiceReceipt, InvoiceRequest, PreviewRequest, ProductDto,
};
use crate::error::{ClientError, ClientResult};

/// Header carrying the tenant on every request.
pub const TENANT_HEADER: &str = "X-Tenant-Id";

/// Operations the register needs from the billing backend.
#[async_trait]
pub trait BillingBackend: Send + Sync {
    /// Loads the tenant's product catalog.
    async fn fetch_catalog(&self) -> ClientResult<Vec<Product>>;

    /// Looks up a loyalty customer by phone; `None` when unknown.
    async fn find_customer(&self, phone: &str) -> ClientResult<Option<Customer>>;

    /// Asks the backend to price the cart with its discount rules.
    async fn preview_discounts(&self, request: &PreviewRequest) -> ClientResult<DiscountPreview>;

    /// Creates the invoice.
    async fn submit_invoice(&self, draft: &InvoiceDraft) -> ClientResult<InvoiceReceipt>;
}

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub tenant_id: String,
    pub timeout: Duration,
}

/// [`BillingBackend`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    tenant_id: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                config.base_url
            )));
        }
        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url,
            tenant_id: config.tenant_id.clone(),
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<T> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .header(TENANT_HEADER, &self.tenant_id)
            .query(query)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .header(TENANT_HEADER, &self.tenant_id)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                _ => Err(ClientError::Status {
                    status: status.as_u16(),
                    message: text,
                }),
            };
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BillingBackend for HttpBackend {
    async fn fetch_catalog(&self) -> ClientResult<Vec<Product>> {
        let products: Vec<ProductDto> = self.get("products", &[]).await?;
        info!(count = products.len(), "Catalog loaded");
        Ok(products.into_iter().map(Product::from).collect())
    }

    async fn find_customer(&self, phone: &str) -> ClientResult<Option<Customer>> {
        let digits = validate_phone(phone)?;
        match self
            .get::<CustomerDto>("customers/lookup", &[("phone", digits.as_str())])
            .await
        {
            Ok(dto) => Ok(Some(dto.into())),
            Err(ClientError::NotFound(_)) => {
                debug!(phone = %digits, "No customer for phone");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Customer lookup failed");
                Err(e)
            }
        }
    }

    async fn preview_discounts(&self, request: &PreviewRequest) -> ClientResult<DiscountPreview> {
        let dto: DiscountPreviewDto = self.post("discounts/preview", request).await?;
        Ok(dto.into())
    }

    async fn submit_invoice(&self, draft: &InvoiceDraft) -> ClientResult<InvoiceReceipt> {
        let body = InvoiceRequest::from(draft);
        let receipt: InvoiceReceipt = self.post("invoices", &body).await?;
        info!(
            invoice_id = receipt.id,
            reference = %draft.client_reference,
            "Invoice created"
        );
        Ok(receipt)
    }
}
