//! Marketplace domain types
//!
//! These are the shapes the rest of the crate works with, already
//! normalized from whatever the backend happened to send (see
//! [`crate::api::wire`]).
pub type ProductId = String;
pub type ProductIdRef<'s> = &'s str;
pub type UserId = String;
pub type UserIdRef<'s> = &'s str;
pub type Amount = f64;

/// Smallest step a new bid must clear over the current high
pub const MIN_BID_INCREMENT: Amount = 10_000.0;

/// One user's current bid on a listing
#[derive(Clone, Debug, PartialEq)]
pub struct BidderEntry {
    pub user_id: UserId,
    pub bid_amount: Amount,
}

impl BidderEntry {
    pub fn new(user_id: impl Into<UserId>, bid_amount: Amount) -> Self {
        Self {
            user_id: user_id.into(),
            bid_amount,
        }
    }
}

/// The lowest amount the server is expected to accept on top of `current_high`
pub fn next_valid_bid(current_high: Amount) -> Amount {
    current_high + MIN_BID_INCREMENT
}

/// An auction-style listing
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Amount,
    /// Raw expiry as sent by the server; parse with [`crate::api::parse_expiry`]
    pub bid_expire: Option<String>,
    pub images: Vec<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl Product {
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A bid the signed-in user holds, with the listing it belongs to
#[derive(Clone, Debug, PartialEq)]
pub struct MyBid {
    pub product_id: ProductId,
    pub bid_amount: Amount,
    pub product: Product,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Result of a successful sign-in
#[derive(Clone, Debug, PartialEq)]
pub struct AuthGrant {
    pub user: User,
    pub token: String,
}

/// English ordinal suffix: 1st, 2nd, 3rd, 4th, 11th, 21st, 112th
pub fn ordinal_suffix(n: usize) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
