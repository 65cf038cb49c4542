use super::*;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

#[derive(Default)]
struct Inner {
    users: BTreeMap<String, User>,
    my_bids: BTreeMap<String, Vec<MyBid>>,
    bidders: BTreeMap<String, Vec<BidderEntry>>,
    failing_bidders: BTreeSet<String>,
    my_bids_failing: bool,
    google_grants: BTreeMap<String, AuthGrant>,
    products: Vec<Product>,
    categories: Vec<Category>,
    profile_updates: Vec<(String, ProfileUpdate)>,
    bidders_requests: usize,
    latency: Option<Duration>,
}

/// Fake in-memory marketplace backend.
///
/// Useful for unit-tests.
#[derive(Default)]
pub struct InMemoryMarketplace {
    inner: Mutex<Inner>,
}

fn unauthorized() -> ApiError {
    ApiError::Status {
        status: 401,
        message: "invalid token".to_owned(),
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{} not found", what),
    }
}

impl InMemoryMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, token: &str, user: User) {
        self.inner.lock().users.insert(token.to_owned(), user);
    }

    pub fn set_my_bids(&self, token: &str, bids: Vec<MyBid>) {
        self.inner.lock().my_bids.insert(token.to_owned(), bids);
    }

    pub fn set_bidders(&self, product_id: &str, bidders: Vec<BidderEntry>) {
        self.inner
            .lock()
            .bidders
            .insert(product_id.to_owned(), bidders);
    }

    pub fn fail_bidders(&self, product_id: &str) {
        self.inner
            .lock()
            .failing_bidders
            .insert(product_id.to_owned());
    }

    pub fn fail_my_bids(&self, failing: bool) {
        self.inner.lock().my_bids_failing = failing;
    }

    pub fn add_google_grant(&self, id_token: &str, grant: AuthGrant) {
        let mut inner = self.inner.lock();
        inner
            .users
            .insert(grant.token.clone(), grant.user.clone());
        inner.google_grants.insert(id_token.to_owned(), grant);
    }

    pub fn set_products(&self, products: Vec<Product>) {
        self.inner.lock().products = products;
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        self.inner.lock().categories = categories;
    }

    /// Delay every response by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().latency = Some(latency);
    }

    pub fn profile_updates(&self) -> Vec<(String, ProfileUpdate)> {
        self.inner.lock().profile_updates.clone()
    }

    pub fn bidders_requests(&self) -> usize {
        self.inner.lock().bidders_requests
    }

    async fn delay(&self) {
        let latency = self.inner.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn user_for(&self, token: &str) -> Result<User, ApiError> {
        self.inner
            .lock()
            .users
            .get(token)
            .cloned()
            .ok_or_else(unauthorized)
    }
}

#[async_trait]
impl MarketplaceApi for InMemoryMarketplace {
    async fn my_bids(&self, token: &str) -> Result<Vec<MyBid>, ApiError> {
        self.delay().await;
        self.user_for(token)?;
        let inner = self.inner.lock();
        if inner.my_bids_failing {
            return Err(ApiError::Unsuccessful("my_bids".to_owned()));
        }
        Ok(inner.my_bids.get(token).cloned().unwrap_or_default())
    }

    async fn product_bidders(
        &self,
        token: &str,
        product_id: ProductIdRef<'_>,
    ) -> Result<Vec<BidderEntry>, ApiError> {
        self.delay().await;
        self.user_for(token)?;
        let mut inner = self.inner.lock();
        inner.bidders_requests += 1;
        if inner.failing_bidders.contains(product_id) {
            return Err(ApiError::Status {
                status: 500,
                message: "internal error".to_owned(),
            });
        }
        Ok(inner.bidders.get(product_id).cloned().unwrap_or_default())
    }

    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.delay().await;
        self.user_for(token)
    }

    async fn google_auth(&self, id_token: &str) -> Result<AuthGrant, ApiError> {
        self.delay().await;
        self.inner
            .lock()
            .google_grants
            .get(id_token)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 400,
                message: "invalid google token".to_owned(),
            })
    }

    async fn verify_email(&self, email: &str, code: &str) -> Result<String, ApiError> {
        self.delay().await;
        if email.is_empty() || code.is_empty() {
            return Err(ApiError::Status {
                status: 400,
                message: "fields cannot be empty".to_owned(),
            });
        }
        Ok("email verified".to_owned())
    }

    async fn update_profile_info(
        &self,
        token: &str,
        user_id: UserIdRef<'_>,
        update: &ProfileUpdate,
    ) -> Result<String, ApiError> {
        self.delay().await;
        let user = self.user_for(token)?;
        if user.id != user_id {
            return Err(ApiError::Status {
                status: 403,
                message: "not your profile".to_owned(),
            });
        }
        let mut inner = self.inner.lock();
        inner
            .profile_updates
            .push((user_id.to_owned(), update.clone()));
        if let Some(stored) = inner.users.get_mut(token) {
            match update {
                ProfileUpdate::Name(name) => stored.name = name.clone(),
                ProfileUpdate::Email(email) => stored.email = email.clone(),
                ProfileUpdate::Phone(phone) => stored.phone = Some(phone.clone()),
            }
        }
        Ok(format!("{} updated", update.field()))
    }

    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.delay().await;
        Ok(self.inner.lock().products.clone())
    }

    async fn product(&self, product_id: ProductIdRef<'_>) -> Result<Product, ApiError> {
        self.delay().await;
        self.inner
            .lock()
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| not_found("product"))
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.delay().await;
        Ok(self.inner.lock().categories.clone())
    }
}
