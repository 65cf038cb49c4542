use crate::{
    api::{ApiError, InMemoryMarketplace, MarketplaceApi},
    auction::{Category, Product},
};
use anyhow::Result;

fn listing(id: &str, name: &str) -> Product {
    Product {
        id: id.to_owned(),
        name: name.to_owned(),
        price: 50_000.0,
        ..Default::default()
    }
}

#[tokio::test]
async fn lists_and_looks_up_products() -> Result<()> {
    let api = InMemoryMarketplace::new();
    api.set_products(vec![listing("p1", "Lamp"), listing("p2", "Chair")]);

    assert_eq!(api.products().await?.len(), 2);
    assert_eq!(api.product("p2").await?.name, "Chair");

    match api.product("p3").await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn categories_are_public() -> Result<()> {
    let api = InMemoryMarketplace::new();
    assert!(api.categories().await?.is_empty());

    api.set_categories(vec![Category {
        id: "c1".to_owned(),
        name: "Furniture".to_owned(),
    }]);
    assert_eq!(api.categories().await?[0].name, "Furniture");
    Ok(())
}

#[tokio::test]
async fn verify_email_needs_both_fields() -> Result<()> {
    let api = InMemoryMarketplace::new();
    assert_eq!(api.verify_email("a@b.co", "123456").await?, "email verified");
    assert!(api.verify_email("a@b.co", "").await.is_err());
    Ok(())
}
