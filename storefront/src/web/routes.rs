// storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{
  account_handlers, auth_handlers, cart_handlers, catalog_handlers, order_handlers, payment_handlers, tracking_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(auth_handlers::signup_handler))
          .route("/signin", web::post().to(auth_handlers::signin_handler))
          .route("/otp/request", web::post().to(auth_handlers::request_otp_handler))
          .route("/otp/verify", web::post().to(auth_handlers::verify_otp_handler))
          .route("/token/refresh", web::post().to(auth_handlers::refresh_token_handler)),
      )
      .service(
        web::scope("/profile")
          .route("", web::get().to(account_handlers::get_profile_handler))
          .route("", web::patch().to(account_handlers::update_profile_handler)),
      )
      .route("/collections", web::get().to(catalog_handlers::list_collections_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(catalog_handlers::list_products_handler))
          .route("/my-favorites", web::get().to(catalog_handlers::my_favorites_handler))
          .route("/{product_id}", web::get().to(catalog_handlers::get_product_handler))
          .route("/{product_id}/reviews", web::get().to(catalog_handlers::list_reviews_handler))
          .route("/{product_id}/reviews", web::post().to(catalog_handlers::create_review_handler))
          .route("/{product_id}/like", web::post().to(catalog_handlers::toggle_like_handler)),
      )
      .service(
        web::scope("/carts")
          .route("", web::post().to(cart_handlers::create_cart_handler))
          .route("/{cart_id}", web::get().to(cart_handlers::get_cart_handler))
          .route("/{cart_id}", web::delete().to(cart_handlers::delete_cart_handler))
          .route("/{cart_id}/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/{cart_id}/items/{item_id}", web::patch().to(cart_handlers::update_cart_item_handler))
          .route("/{cart_id}/items/{item_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      )
      .route("/make-payment", web::post().to(payment_handlers::make_payment_handler))
      .service(
        web::scope("/payment-methods")
          .route("", web::post().to(payment_handlers::add_payment_method_handler))
          .route("", web::get().to(payment_handlers::list_payment_methods_handler)),
      )
      .service(
        web::scope("/track/order")
          .route("/{order_id}", web::get().to(tracking_handlers::get_tracking_handler))
          .route("/{order_id}", web::patch().to(tracking_handlers::update_tracking_handler)),
      )
      .service(
        web::scope("/addresses")
          .route("", web::get().to(account_handlers::list_addresses_handler))
          .route("", web::post().to(account_handlers::create_address_handler))
          .route("/{address_id}", web::patch().to(account_handlers::update_address_handler))
          .route("/{address_id}", web::delete().to(account_handlers::delete_address_handler)),
      )
      .service(
        web::scope("/notifications")
          .route("", web::get().to(account_handlers::list_notifications_handler))
          .route("", web::post().to(account_handlers::announce_handler)),
      ),
  );
}
