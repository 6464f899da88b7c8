// storefront/src/web/handlers/account_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::is_valid_phone;
use crate::models::{Gender, NotificationKind, ShippingAddress};
use crate::state::AppState;
use crate::web::{envelope, AuthenticatedUser};

#[derive(Deserialize, Debug)]
pub struct CreateAddressPayload {
  pub name: String,
  pub address: String,
}

/// Partial update; absent fields keep their value.
#[derive(Deserialize, Debug)]
pub struct UpdateAddressPayload {
  pub name: Option<String>,
  pub address: Option<String>,
}

/// Partial update; absent fields keep their value.
#[derive(Deserialize, Debug)]
pub struct UpdateProfilePayload {
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub date_of_birth: Option<NaiveDate>,
  pub gender: Option<Gender>,
}

#[derive(Deserialize, Debug)]
pub struct AnnouncementPayload {
  #[serde(rename = "type")]
  pub kind: NotificationKind,
  pub title: String,
  pub desc: String,
}

#[instrument(name = "handler::list_addresses", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_addresses_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let addresses = app_state.store.list_addresses(auth_user.id()).await?;
  Ok(HttpResponse::Ok().json(envelope("Addresses fetched", addresses)))
}

#[instrument(name = "handler::create_address", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.id()))]
pub async fn create_address_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CreateAddressPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let (name, address) = (req_payload.name.trim(), req_payload.address.trim());
  if name.is_empty() || address.is_empty() {
    return Err(AppError::Validation("Both name and address are required".to_string()));
  }
  let record = ShippingAddress::new(auth_user.id(), name, address);
  app_state.store.insert_address(&record).await?;
  Ok(HttpResponse::Created().json(envelope("Address saved", record)))
}

#[instrument(name = "handler::update_address", skip(app_state, path, req_payload, auth_user), fields(user_id = %auth_user.id()))]
pub async fn update_address_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateAddressPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let address_id = path.into_inner();
  let mut record = app_state
    .store
    .get_address(auth_user.id(), address_id)
    .await?
    .ok_or(AppError::AddressNotFound(address_id))?;

  let req = req_payload.into_inner();
  for (value, target) in [(req.name, &mut record.name), (req.address, &mut record.address)] {
    if let Some(value) = value {
      let value = value.trim();
      if value.is_empty() {
        return Err(AppError::Validation("Both name and address are required".to_string()));
      }
      *target = value.to_string();
    }
  }

  if !app_state.store.update_address(&record).await? {
    return Err(AppError::AddressNotFound(address_id));
  }
  Ok(HttpResponse::Ok().json(envelope("Address updated", record)))
}

#[instrument(name = "handler::delete_address", skip(app_state, path, auth_user), fields(user_id = %auth_user.id()))]
pub async fn delete_address_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let address_id = path.into_inner();
  if !app_state.store.delete_address(auth_user.id(), address_id).await? {
    return Err(AppError::AddressNotFound(address_id));
  }
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::get_profile", skip(auth_user), fields(user_id = %auth_user.id()))]
pub async fn get_profile_handler(auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(envelope("Profile fetched", auth_user.0)))
}

#[instrument(name = "handler::update_profile", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.id()))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<UpdateProfilePayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let mut user = auth_user.0;

  if let Some(full_name) = req.full_name {
    let full_name = full_name.trim();
    if full_name.is_empty() {
      return Err(AppError::Validation("Full name cannot be empty".to_string()));
    }
    user.full_name = full_name.to_string();
  }
  if let Some(phone) = req.phone {
    let phone = phone.trim();
    if !phone.is_empty() && !is_valid_phone(phone) {
      return Err(AppError::Validation("Enter a valid phone number".to_string()));
    }
    user.phone = Some(phone.to_string()).filter(|p| !p.is_empty());
  }
  if let Some(date_of_birth) = req.date_of_birth {
    if date_of_birth > chrono::Utc::now().date_naive() {
      return Err(AppError::Validation("Date of birth cannot be in the future".to_string()));
    }
    user.date_of_birth = Some(date_of_birth);
  }
  if let Some(gender) = req.gender {
    user.gender = gender;
  }

  app_state.store.update_user(&user).await?;
  info!("Profile updated.");
  Ok(HttpResponse::Ok().json(envelope("Profile updated", user)))
}

#[instrument(name = "handler::list_notifications", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_notifications_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let notifications = app_state.notifier.list_for(auth_user.id()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Notified", "data": notifications, "status": true })))
}

/// Staff announcement (offers, feed posts) shown to every user.
#[instrument(name = "handler::announce", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.id()))]
pub async fn announce_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AnnouncementPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  if !auth_user.is_staff() {
    return Err(AppError::Forbidden("Only staff can post announcements".to_string()));
  }
  let req = req_payload.into_inner();
  if req.title.trim().is_empty() {
    return Err(AppError::Validation("A title is required".to_string()));
  }
  let notification = app_state.notifier.broadcast(req.kind, req.title.trim(), &req.desc).await?;
  Ok(HttpResponse::Created().json(envelope("Announcement posted", notification)))
}
