// storefront/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::models::Product;
use crate::pipelines::contexts::{AddToCartCtxData, UpdateCartItemCtxData};
use crate::services::inventory;
use crate::state::AppState;
use crate::store::add_units;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

fn normalized(value: &Option<String>) -> Option<String> {
  value.as_ref().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Fails when `requested` units of the selection exceed what is on hand.
async fn ensure_in_stock(
  app_state: &AppState,
  product: &Product,
  color: Option<&str>,
  size: Option<&str>,
  requested: i32,
) -> Result<(), AppError> {
  let resolution = inventory::resolve_selection(app_state.store.as_ref(), product, color, size).await?;
  event!(Level::DEBUG, requested, available = resolution.available, "Checking cart stock.");
  if requested > resolution.available {
    warn!(product_id = %product.id, requested, available = resolution.available, "Cart quantity exceeds stock.");
    return Err(AppError::InsufficientInventory {
      product_id: product.id,
      product: product.title.clone(),
      requested,
      available: resolution.available,
    });
  }
  Ok(())
}

/// Registers the add-to-cart pipeline.
pub fn register_add_to_cart_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let mut cart_p = Pipeline::<AddToCartCtxData, AppError>::new(&[
    ("validate_cart_item_input", false, None),
    ("load_cart_and_product", false, None),
    ("check_variant_offered", false, None),
    ("check_stock_for_cart", false, None),
    ("upsert_cart_item", false, None),
  ]);

  cart_p.on_root("validate_cart_item_input", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      if guard.quantity <= 0 {
        return Err(AppError::Validation("Quantity must be greater than zero".to_string()));
      }
      guard.color = normalized(&guard.color);
      guard.size = normalized(&guard.size);
      Ok(PipelineControl::Continue)
    })
  });

  cart_p.on_root("load_cart_and_product", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (cart_id, product_id, app_state) = {
        let guard = ctx_data.read();
        (guard.cart_id, guard.product_id, guard.app_state.clone())
      };

      let cart = app_state
        .store
        .get_cart(cart_id)
        .await?
        .ok_or_else(|| AppError::EmptyOrMissingCart("No cart with the given ID was found.".to_string()))?;
      let product = app_state
        .store
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::Validation("No product with the given ID was found.".to_string()))?;

      let mut guard = ctx_data.write();
      guard.cart = Some(cart);
      guard.product = Some(product);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  cart_p.on_root("check_variant_offered", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (product_id, color, size, app_state) = {
        let guard = ctx_data.read();
        (guard.product_id, guard.color.clone(), guard.size.clone(), guard.app_state.clone())
      };
      if color.is_none() && size.is_none() {
        return Ok(PipelineControl::Continue);
      }

      let variants = app_state.store.list_variants(product_id).await?;
      inventory::ensure_selection_offered(&variants, color.as_deref(), size.as_deref())?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Cumulative: what is already in the cart for this selection counts too.
  cart_p.on_root("check_stock_for_cart", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (product, cart, quantity, color, size, app_state) = {
        let guard = ctx_data.read();
        (
          guard.product.clone(),
          guard.cart.clone(),
          guard.quantity,
          guard.color.clone(),
          guard.size.clone(),
          guard.app_state.clone(),
        )
      };
      let product = product.ok_or_else(|| AppError::Internal("Product missing before stock check".to_string()))?;
      let cart = cart.ok_or_else(|| AppError::Internal("Cart missing before stock check".to_string()))?;

      let in_cart = cart
        .items
        .iter()
        .filter(|item| item.same_selection(product.id, color.as_deref(), size.as_deref()))
        .try_fold(0, |total, item| add_units(total, item.quantity))?;
      let requested = add_units(in_cart, quantity)?;

      ensure_in_stock(&app_state, &product, color.as_deref(), size.as_deref(), requested).await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  cart_p.on_root("upsert_cart_item", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (cart_id, product_id, quantity, color, size, app_state) = {
        let guard = ctx_data.read();
        (
          guard.cart_id,
          guard.product_id,
          guard.quantity,
          guard.color.clone(),
          guard.size.clone(),
          guard.app_state.clone(),
        )
      };

      let item = app_state
        .store
        .add_cart_item(cart_id, product_id, quantity, color.as_deref(), size.as_deref())
        .await?;
      info!(%cart_id, item_id = %item.id, quantity = item.quantity, "Cart line saved.");
      ctx_data.write().cart_item = Some(item);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(cart_p);
  info!("Add-to-cart pipeline registered.");
}

/// Registers the pipeline that sets a cart line to an absolute quantity.
pub fn register_update_cart_item_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let mut update_p = Pipeline::<UpdateCartItemCtxData, AppError>::new(&[
    ("validate_line_quantity", false, None),
    ("load_cart_line", false, None),
    ("check_stock_for_line", false, None),
    ("save_line_quantity", false, None),
  ]);

  update_p.on_root("validate_line_quantity", |ctx_data: ContextData<UpdateCartItemCtxData>| {
    Box::pin(async move {
      if ctx_data.read().quantity <= 0 {
        return Err(AppError::Validation("Quantity must be greater than zero".to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  update_p.on_root("load_cart_line", |ctx_data: ContextData<UpdateCartItemCtxData>| {
    Box::pin(async move {
      let (cart_id, item_id, app_state) = {
        let guard = ctx_data.read();
        (guard.cart_id, guard.item_id, guard.app_state.clone())
      };

      let line = app_state
        .store
        .get_cart(cart_id)
        .await?
        .and_then(|cart| cart.items.into_iter().find(|item| item.id == item_id))
        .ok_or_else(|| AppError::NotFound("No cart item with the given ID was found.".to_string()))?;
      let product = app_state
        .store
        .get_product(line.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", line.product_id)))?;

      let mut guard = ctx_data.write();
      guard.line = Some(line);
      guard.product = Some(product);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // The new quantity replaces the line, so it is compared on its own.
  update_p.on_root("check_stock_for_line", |ctx_data: ContextData<UpdateCartItemCtxData>| {
    Box::pin(async move {
      let (line, product, quantity, app_state) = {
        let guard = ctx_data.read();
        (guard.line.clone(), guard.product.clone(), guard.quantity, guard.app_state.clone())
      };
      let line = line.ok_or_else(|| AppError::Internal("Cart line missing before stock check".to_string()))?;
      let product = product.ok_or_else(|| AppError::Internal("Product missing before stock check".to_string()))?;

      ensure_in_stock(&app_state, &product, line.color.as_deref(), line.size.as_deref(), quantity).await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  update_p.on_root("save_line_quantity", |ctx_data: ContextData<UpdateCartItemCtxData>| {
    Box::pin(async move {
      let (cart_id, item_id, quantity, app_state) = {
        let guard = ctx_data.read();
        (guard.cart_id, guard.item_id, guard.quantity, guard.app_state.clone())
      };

      let item = app_state
        .store
        .update_cart_item_quantity(cart_id, item_id, quantity)
        .await?
        .ok_or_else(|| AppError::NotFound("No cart item with the given ID was found.".to_string()))?;
      info!(%cart_id, %item_id, quantity, "Cart line quantity set.");
      ctx_data.write().cart_item = Some(item);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(update_p);
  info!("Update-cart-item pipeline registered.");
}
