use super::{wire, ApiError, MarketplaceApi, SharedMarketplaceApi};
use crate::{
    auction::{AuthGrant, BidderEntry, Category, MyBid, Product, ProductIdRef, User, UserIdRef},
    profile::ProfileUpdate,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tracing::debug;

/// [`MarketplaceApi`] over the real REST backend
#[derive(Clone, Debug)]
pub struct HttpMarketplaceApi {
    client: Client,
    base_url: String,
}

impl HttpMarketplaceApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn new_shared(base_url: &str, timeout: Duration) -> Result<SharedMarketplaceApi, ApiError> {
        Ok(Arc::new(Self::new(base_url, timeout)?))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        debug!(path, "GET");
        self.client.get(self.url(path))
    }

    fn authed(&self, req: RequestBuilder, token: &str) -> RequestBuilder {
        req.bearer_auth(token)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let message = wire::error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
            debug!(status = status.as_u16(), %message, "request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceApi {
    async fn my_bids(&self, token: &str) -> Result<Vec<MyBid>, ApiError> {
        let resp: wire::MyBidsResponse = self
            .send(self.authed(self.get("/user/my_bids"), token))
            .await?;
        if !resp.success {
            return Err(ApiError::Unsuccessful("my_bids".to_owned()));
        }
        Ok(resp.bids.into_iter().map(Into::into).collect())
    }

    async fn product_bidders(
        &self,
        token: &str,
        product_id: ProductIdRef<'_>,
    ) -> Result<Vec<BidderEntry>, ApiError> {
        let resp: wire::BiddersResponse = self
            .send(self.authed(self.get(&format!("/product/bids/{}", product_id)), token))
            .await?;
        match resp {
            wire::BiddersResponse {
                success: true,
                bidders: Some(bidders),
            } => Ok(bidders.into_iter().map(Into::into).collect()),
            _ => Err(ApiError::Unsuccessful(format!("product_bidders({})", product_id))),
        }
    }

    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        let resp: wire::UserResponse = self
            .send(self.authed(self.get("/auth/user"), token))
            .await?;
        Ok(resp.user.into())
    }

    async fn google_auth(&self, id_token: &str) -> Result<AuthGrant, ApiError> {
        debug!("POST /auth/google");
        let resp: wire::GoogleAuthResponse = self
            .send(
                self.client
                    .post(self.url("/auth/google"))
                    .json(&wire::GoogleAuthRequest { token: id_token }),
            )
            .await?;
        match resp {
            wire::GoogleAuthResponse {
                user: Some(user),
                token: Some(token),
                ..
            } => Ok(AuthGrant {
                user: user.into(),
                token,
            }),
            wire::GoogleAuthResponse { msg, .. } => Err(ApiError::Unsuccessful(
                msg.unwrap_or_else(|| "google_auth".to_owned()),
            )),
        }
    }

    async fn verify_email(&self, email: &str, code: &str) -> Result<String, ApiError> {
        debug!("POST /verify_email");
        let resp: wire::MessageResponse = self
            .send(
                self.client
                    .post(self.url("/verify_email"))
                    .json(&wire::VerifyEmailRequest {
                        email,
                        verification_code: code,
                    }),
            )
            .await?;
        Ok(resp.into_text().unwrap_or_default())
    }

    async fn update_profile_info(
        &self,
        token: &str,
        user_id: UserIdRef<'_>,
        update: &ProfileUpdate,
    ) -> Result<String, ApiError> {
        let path = format!("/update_profile_info/{}", user_id);
        debug!(%path, "PUT");
        let resp: wire::MessageResponse = self
            .send(self.authed(self.client.put(self.url(&path)).json(update), token))
            .await?;
        Ok(resp.into_text().unwrap_or_default())
    }

    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let resp: wire::ProductsResponse = self.send(self.get("/public/products_show")).await?;
        Ok(resp
            .products
            .into_iter()
            .map(|p| p.into_product(None))
            .collect())
    }

    async fn product(&self, product_id: ProductIdRef<'_>) -> Result<Product, ApiError> {
        let resp: wire::ProductResponse = self
            .send(self.get(&format!("/public/product/{}", product_id)))
            .await?;
        Ok(resp.product.into_product(Some(product_id.to_owned())))
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let resp: wire::CategoriesResponse = self.send(self.get("/all_categories")).await?;
        Ok(resp.into_categories())
    }
}
