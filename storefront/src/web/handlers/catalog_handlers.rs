// storefront/src/web/handlers/catalog_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Product, Review, ReviewSummary};
use crate::state::AppState;
use crate::store::ProductFilter;
use crate::web::{envelope, AuthenticatedUser};

#[derive(Deserialize, Debug, Default)]
pub struct ListProductsQuery {
  pub collection_id: Option<Uuid>,
  pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateReviewPayload {
  pub rating: i32,
  pub description: String,
}

async fn existing_product(app_state: &AppState, product_id: Uuid) -> Result<Product, AppError> {
  app_state
    .store
    .get_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product_id)))
}

#[instrument(name = "handler::list_collections", skip(app_state))]
pub async fn list_collections_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let collections = app_state.store.list_collections().await?;
  Ok(HttpResponse::Ok().json(envelope("Collections fetched successfully.", collections)))
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let query = query_params.into_inner();
  let filter = ProductFilter {
    collection_id: query.collection_id,
    search: query.search.filter(|s| !s.trim().is_empty()),
  };
  let products = app_state.store.list_products(&filter).await?;
  info!(count = products.len(), "Products fetched.");
  Ok(HttpResponse::Ok().json(envelope("Products fetched successfully.", products)))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = existing_product(&app_state, product_id).await?;
  let variants = app_state.store.list_variants(product_id).await?;

  Ok(HttpResponse::Ok().json(envelope(
    "Product fetched successfully.",
    json!({ "product": product, "variants": variants }),
  )))
}

/// Review count and mean rating of a product, with the reviews themselves.
#[instrument(name = "handler::list_reviews", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn list_reviews_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let product = existing_product(&app_state, path.into_inner()).await?;
  let reviews = app_state.store.list_reviews(product.id).await?;
  let summary = ReviewSummary::of(&reviews);
  Ok(HttpResponse::Ok().json(envelope(
    "Reviews fetched successfully.",
    json!({ "total_reviews": summary.total_reviews, "rating": summary.rating, "reviews": reviews }),
  )))
}

#[instrument(
  name = "handler::create_review",
  skip(app_state, path, req_payload, auth_user),
  fields(product_id = %path.as_ref(), user_id = %auth_user.id())
)]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<CreateReviewPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  if !(1..=5).contains(&req.rating) {
    return Err(AppError::Validation("Rating must be between 1 and 5".to_string()));
  }
  let description = req.description.trim();
  if description.is_empty() {
    return Err(AppError::Validation("A description is required".to_string()));
  }
  let product = existing_product(&app_state, path.into_inner()).await?;

  let review = Review::new(product.id, auth_user.id(), req.rating, description);
  app_state.store.insert_review(&review).await?;
  info!(review_id = %review.id, rating = review.rating, "Review saved.");
  Ok(HttpResponse::Created().json(envelope("Review saved", review)))
}

/// Likes the product, or removes the like when there already is one.
#[instrument(name = "handler::toggle_like", skip(app_state, path, auth_user), fields(product_id = %path.as_ref()))]
pub async fn toggle_like_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let product = existing_product(&app_state, path.into_inner()).await?;
  let liked = app_state.store.toggle_like(auth_user.id(), product.id).await?;
  let message = if liked {
    "Product marked as favorite"
  } else {
    "Product removed from favorite"
  };
  Ok(HttpResponse::Ok().json(envelope(message, json!({ "product_id": product.id, "liked": liked }))))
}

#[instrument(name = "handler::my_favorites", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn my_favorites_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let products = app_state.store.liked_products(auth_user.id()).await?;
  Ok(HttpResponse::Ok().json(envelope("Favorites fetched successfully.", products)))
}
