//! JSON shapes of the backend, and their conversion into domain types
//!
//! The backend is loose with its types: ids arrive as strings or numbers,
//! `productId` is sometimes the populated product, images are either URLs
//! or `{ url }` objects. All of that is absorbed here.
use crate::auction::{BidderEntry, Category, MyBid, Product, User};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(serde_json::Number),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Str(s) => s,
            RawId::Num(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(RawId::deserialize(d)?.into())
}

fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(d)?.map(Into::into))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BiddersResponse {
    #[serde(default)]
    pub success: bool,
    pub bidders: Option<Vec<Bidder>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Bidder {
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    pub bid_amount: f64,
}

impl From<Bidder> for BidderEntry {
    fn from(b: Bidder) -> Self {
        BidderEntry {
            user_id: b.user_id,
            bid_amount: b.bid_amount,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum Image {
    Url(String),
    Object { url: String },
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Object {
        #[serde(default)]
        name: Option<String>,
        #[serde(rename = "_id", default, deserialize_with = "de_opt_id")]
        id: Option<String>,
    },
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    #[serde(rename = "_id", alias = "id", default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub bid_expire: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub product_cat: Option<CategoryRef>,
    #[serde(default)]
    pub description: Option<String>,
}

impl WireProduct {
    pub fn into_product(self, fallback_id: Option<String>) -> Product {
        Product {
            id: self.id.or(fallback_id).unwrap_or_default(),
            name: self.name,
            price: self.price,
            bid_expire: self.bid_expire,
            images: self
                .images
                .into_iter()
                .map(|image| match image {
                    Image::Url(url) | Image::Object { url } => url,
                })
                .collect(),
            category: self.product_cat.and_then(|cat| match cat {
                CategoryRef::Id(id) => Some(id),
                CategoryRef::Object { name, id } => name.or(id),
            }),
            description: self.description,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ProductRef {
    Populated(Box<WireProduct>),
    Id(#[serde(deserialize_with = "de_id")] String),
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireMyBid {
    pub product_id: ProductRef,
    pub bid_amount: f64,
    #[serde(default)]
    pub product: Option<WireProduct>,
}

impl From<WireMyBid> for MyBid {
    fn from(bid: WireMyBid) -> Self {
        let (ref_id, populated) = match bid.product_id {
            ProductRef::Id(id) => (Some(id), None),
            ProductRef::Populated(product) => (product.id.clone(), Some(*product)),
        };
        let product = bid
            .product
            .or(populated)
            .unwrap_or_default()
            .into_product(ref_id.clone());

        MyBid {
            product_id: ref_id.unwrap_or_else(|| product.id.clone()),
            bid_amount: bid.bid_amount,
            product,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct MyBidsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub bids: Vec<WireMyBid>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "profilePicture")]
    pub picture: Option<String>,
}

impl From<WireUser> for User {
    fn from(u: WireUser) -> Self {
        User {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            picture: u.picture,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct UserResponse {
    pub user: WireUser,
}

#[derive(Serialize, Debug)]
pub struct GoogleAuthRequest<'a> {
    pub token: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct GoogleAuthResponse {
    pub user: Option<WireUser>,
    pub token: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest<'a> {
    pub email: &'a str,
    pub verification_code: &'a str,
}

#[derive(Deserialize, Debug, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageResponse {
    pub fn into_text(self) -> Option<String> {
        self.msg.or(self.message)
    }
}

/// Human-readable error message from a failed response body, if it has one
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<MessageResponse>(body)
        .ok()
        .and_then(MessageResponse::into_text)
}

#[derive(Deserialize, Debug)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<WireProduct>,
}

#[derive(Deserialize, Debug)]
pub struct ProductResponse {
    pub product: WireProduct,
}

#[derive(Deserialize, Debug)]
pub struct WireCategory {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl From<WireCategory> for Category {
    fn from(c: WireCategory) -> Self {
        Category {
            id: c.id,
            name: c.name,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum CategoriesResponse {
    Wrapped { categories: Vec<WireCategory> },
    Bare(Vec<WireCategory>),
}

impl CategoriesResponse {
    pub fn into_categories(self) -> Vec<Category> {
        let list = match self {
            CategoriesResponse::Wrapped { categories } => categories,
            CategoriesResponse::Bare(list) => list,
        };
        list.into_iter().map(Into::into).collect()
    }
}
