// storefront/src/services/inventory.rs

//! Variant matching: which inventory rows a (colour, size) selection draws
//! from, what it costs, and how many units are available.

use crate::errors::{AppError, Result};
use crate::models::{Product, VariantInventory};
use crate::store::CatalogRepository;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct VariantResolution {
  pub matched: Vec<VariantInventory>,
  /// Base price plus every matched surcharge.
  pub unit_price_cents: i64,
  pub available: i32,
}

impl VariantResolution {
  pub fn variant_ids(&self) -> Vec<Uuid> {
    self.matched.iter().map(|v| v.id).collect()
  }
}

/// Combines the rows found for a selection.
///
/// An exact colour+size row wins; otherwise the colour-only and size-only
/// rows apply together. Matched rows are authoritative for availability;
/// with none matched the product total is.
pub fn resolve_rows(product: &Product, exact: Option<VariantInventory>, per_axis: Vec<VariantInventory>) -> VariantResolution {
  let matched: Vec<VariantInventory> = match exact {
    Some(row) => vec![row],
    None => per_axis,
  };

  let surcharge: i64 = matched.iter().filter_map(|v| v.surcharge_cents).sum();
  let available = matched
    .iter()
    .map(|v| v.quantity)
    .min()
    .unwrap_or(product.inventory)
    .max(0);

  VariantResolution {
    unit_price_cents: product.unit_price_cents + surcharge,
    available,
    matched,
  }
}

/// Looks up the variant rows for a selection and resolves them.
#[instrument(name = "inventory::resolve_selection", skip(catalog, product), fields(product_id = %product.id), err(Display))]
pub async fn resolve_selection<C: CatalogRepository + ?Sized>(
  catalog: &C,
  product: &Product,
  color: Option<&str>,
  size: Option<&str>,
) -> Result<VariantResolution> {
  let exact = match (color, size) {
    (Some(_), Some(_)) => catalog.get_variant_inventory(product.id, color, size).await?,
    _ => None,
  };

  let mut per_axis = Vec::new();
  if exact.is_none() {
    if let Some(c) = color {
      per_axis.extend(catalog.get_variant_inventory(product.id, Some(c), None).await?);
    }
    if let Some(s) = size {
      per_axis.extend(catalog.get_variant_inventory(product.id, None, Some(s)).await?);
    }
  }

  let resolution = resolve_rows(product, exact, per_axis);
  debug!(
    matched = resolution.matched.len(),
    unit_price_cents = resolution.unit_price_cents,
    available = resolution.available,
    "Variant selection resolved."
  );
  Ok(resolution)
}

fn offered(variants: &[VariantInventory], wanted: &str, pick: impl Fn(&VariantInventory) -> Option<&str>) -> bool {
  variants.iter().any(|v| pick(v).map_or(false, |have| have.eq_ignore_ascii_case(wanted)))
}

/// Rejects a colour or size the product is not offered in.
pub fn ensure_selection_offered(variants: &[VariantInventory], color: Option<&str>, size: Option<&str>) -> Result<()> {
  if let Some(c) = color {
    if !offered(variants, c, |v| v.color.as_deref()) {
      return Err(AppError::Validation("We don't have that color for this specific product!".to_string()));
    }
  }
  if let Some(s) = size {
    if !offered(variants, s, |v| v.size.as_deref()) {
      return Err(AppError::Validation("We don't have that size for this specific product!".to_string()));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn shirt() -> Product {
    Product::new("Shirt", 2_000, 20)
  }

  #[test]
  fn no_rows_means_product_total_is_authoritative() {
    let r = resolve_rows(&shirt(), None, vec![]);
    assert_eq!(r.available, 20);
    assert_eq!(r.unit_price_cents, 2_000);
    assert!(r.variant_ids().is_empty());
  }

  #[test]
  fn per_axis_rows_add_surcharges_and_cap_availability() {
    let p = shirt();
    let red = VariantInventory::new(p.id, Some("red"), None, 4, Some(150));
    let xl = VariantInventory::new(p.id, None, Some("XL"), 9, Some(300));
    let r = resolve_rows(&p, None, vec![red, xl]);
    assert_eq!(r.unit_price_cents, 2_450);
    assert_eq!(r.available, 4);
  }

  #[test]
  fn exact_row_wins_over_axes() {
    let p = shirt();
    let exact = VariantInventory::new(p.id, Some("red"), Some("XL"), 2, None);
    let r = resolve_rows(&p, Some(exact), vec![VariantInventory::new(p.id, Some("red"), None, 50, Some(100))]);
    assert_eq!(r.available, 2);
    assert_eq!(r.unit_price_cents, 2_000);
  }

  #[test]
  fn unknown_size_is_rejected() {
    let p = shirt();
    let rows = vec![VariantInventory::new(p.id, None, Some("M"), 3, None)];
    assert!(ensure_selection_offered(&rows, None, Some("m")).is_ok());
    let err = ensure_selection_offered(&rows, None, Some("XXL")).unwrap_err();
    assert!(err.to_string().contains("size"));
  }
}
