//! Marketplace REST backend
//!
//! Everything the client knows about the server goes through
//! [`MarketplaceApi`]. The backend owns bid validity, expiry and
//! persistence; we only read and forward.
use crate::{
    auction::{AuthGrant, BidderEntry, Category, MyBid, Product, ProductIdRef, User, UserIdRef},
    profile::ProfileUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

mod http;
mod in_memory;
pub mod wire;

pub use self::{http::*, in_memory::*};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("server reported failure: {0}")]
    Unsuccessful(String),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}

#[async_trait]
pub trait MarketplaceApi {
    /// `GET /user/my_bids`
    async fn my_bids(&self, token: &str) -> Result<Vec<MyBid>, ApiError>;
    /// `GET /product/bids/{product_id}`
    async fn product_bidders(
        &self,
        token: &str,
        product_id: ProductIdRef<'_>,
    ) -> Result<Vec<BidderEntry>, ApiError>;

    /// `GET /auth/user`
    async fn current_user(&self, token: &str) -> Result<User, ApiError>;
    /// `POST /auth/google`
    async fn google_auth(&self, id_token: &str) -> Result<AuthGrant, ApiError>;
    /// `POST /verify_email`
    async fn verify_email(&self, email: &str, code: &str) -> Result<String, ApiError>;
    /// `PUT /update_profile_info/{user_id}`
    async fn update_profile_info(
        &self,
        token: &str,
        user_id: UserIdRef<'_>,
        update: &ProfileUpdate,
    ) -> Result<String, ApiError>;

    /// `GET /public/products_show`
    async fn products(&self) -> Result<Vec<Product>, ApiError>;
    /// `GET /public/product/{id}`
    async fn product(&self, product_id: ProductIdRef<'_>) -> Result<Product, ApiError>;
    /// `GET /all_categories`
    async fn categories(&self) -> Result<Vec<Category>, ApiError>;
}

pub type SharedMarketplaceApi = Arc<dyn MarketplaceApi + Send + Sync + 'static>;

/// Parse a listing expiry as sent by the backend (RFC 3339, usually with a `Z`)
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim()).map(|t| t.with_timezone(&Utc))
}
