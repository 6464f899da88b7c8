// storefront/src/pipelines/card_pipeline.rs

use crate::errors::AppError;
use crate::models::PaymentMethod;
use crate::pipelines::contexts::AddCardCtxData;
use crate::state::AppState;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{info, warn};

/// Registers the save-a-card pipeline.
pub fn register_add_card_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let mut card_p = Pipeline::<AddCardCtxData, AppError>::new(&[
    ("validate_card_details", false, None),
    ("ensure_gateway_customer", false, None),
    ("reject_duplicate_card", false, None),
    ("create_and_attach_method", false, None),
    ("save_payment_method", false, None),
  ]);

  card_p.on_root("validate_card_details", |ctx_data: ContextData<AddCardCtxData>| {
    Box::pin(async move {
      ctx_data.read().card.validate()?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Users get a gateway customer lazily, on their first card.
  card_p.on_root("ensure_gateway_customer", |ctx_data: ContextData<AddCardCtxData>| {
    Box::pin(async move {
      let (user_id, app_state) = {
        let guard = ctx_data.read();
        (guard.user.id, guard.app_state.clone())
      };
      let mut user = app_state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Auth("User no longer exists".to_string()))?;

      let customer_id = match user.gateway_customer_id.clone() {
        Some(id) => id,
        None => {
          let id = app_state.gateway.create_customer(&user.email).await?;
          user.gateway_customer_id = Some(id.clone());
          app_state.store.update_user(&user).await?;
          info!(%user_id, customer_id = %id, "Gateway customer created.");
          id
        }
      };

      let mut guard = ctx_data.write();
      guard.gateway_customer_id = Some(customer_id);
      guard.user = user;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  card_p.on_root("reject_duplicate_card", |ctx_data: ContextData<AddCardCtxData>| {
    Box::pin(async move {
      let (customer_id, card, app_state) = {
        let guard = ctx_data.read();
        (guard.gateway_customer_id.clone(), guard.card.clone(), guard.app_state.clone())
      };
      let customer_id = customer_id.ok_or_else(|| AppError::Internal("Gateway customer missing".to_string()))?;

      let existing = app_state.gateway.list_payment_methods(&customer_id).await?;
      let duplicate = existing
        .iter()
        .any(|m| m.last4 == card.last4() && m.exp_month == card.exp_month && m.exp_year == card.exp_year);
      if duplicate {
        warn!(last4 = %card.last4(), "Card already saved.");
        return Err(AppError::Validation(
          "A payment method with the same card details already exists".to_string(),
        ));
      }
      Ok(PipelineControl::Continue)
    })
  });

  card_p.on_root("create_and_attach_method", |ctx_data: ContextData<AddCardCtxData>| {
    Box::pin(async move {
      let (customer_id, card, app_state) = {
        let guard = ctx_data.read();
        (guard.gateway_customer_id.clone(), guard.card.clone(), guard.app_state.clone())
      };
      let customer_id = customer_id.ok_or_else(|| AppError::Internal("Gateway customer missing".to_string()))?;

      let method = app_state.gateway.create_payment_method(&card).await?;
      app_state.gateway.attach_payment_method(&method.id, &customer_id).await?;
      ctx_data.write().method = Some(method);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  card_p.on_root("save_payment_method", |ctx_data: ContextData<AddCardCtxData>| {
    Box::pin(async move {
      let (user_id, method, app_state) = {
        let guard = ctx_data.read();
        (guard.user.id, guard.method.clone(), guard.app_state.clone())
      };
      let method = method.ok_or_else(|| AppError::Internal("Gateway method missing before save".to_string()))?;
      app_state.store.insert_payment_method(&PaymentMethod::new(user_id, &method.id)).await?;
      info!(%user_id, method_id = %method.id, "Card added successfully.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(card_p);
  info!("Add-card pipeline registered.");
}
