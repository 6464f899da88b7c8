// storefront/src/store/seed.rs

use crate::errors::Result;
use crate::models::{Collection, Product, VariantInventory};
use crate::store::Store;
use tracing::info;

/// Fills an empty catalog with a handful of demo products. Does nothing when
/// products already exist.
pub async fn seed_demo_catalog(store: &dyn Store) -> Result<()> {
  if !store.list_products(&Default::default()).await?.is_empty() {
    info!("Catalog already populated, skipping seed.");
    return Ok(());
  }

  let apparel = Collection {
    id: uuid::Uuid::new_v4(),
    title: "Apparel".to_string(),
    featured_product_id: None,
  };
  store.insert_collection(&apparel).await?;

  let mut tee = Product::new("Classic Tee", 1_999, 40);
  tee.collection_id = Some(apparel.id);
  tee.description = Some("Heavyweight cotton t-shirt".to_string());
  store.insert_product(&tee).await?;
  for (color, surcharge) in [("black", None), ("red", Some(200))] {
    store.insert_variant(&VariantInventory::new(tee.id, Some(color), None, 20, surcharge)).await?;
  }
  for size in ["S", "M", "L"] {
    store.insert_variant(&VariantInventory::new(tee.id, None, Some(size), 15, None)).await?;
  }

  let mut mug = Product::new("Enamel Mug", 1_250, 25);
  mug.description = Some("Camp mug, 350ml".to_string());
  store.insert_product(&mug).await?;

  let mut ebook = Product::new("Field Guide (PDF)", 900, 1_000);
  ebook.is_digital = true;
  store.insert_product(&ebook).await?;

  info!(products = 3, "Demo catalog seeded.");
  Ok(())
}
