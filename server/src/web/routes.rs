// shopfront-server/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{account_handlers, auth_handlers, cart_handlers, item_handlers, order_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      // Authentication
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(auth_handlers::signup_handler))
          .route("/signin", web::post().to(auth_handlers::signin_handler))
          .route("/signout", web::post().to(auth_handlers::signout_handler))
          .route(
            "/password-reset",
            web::post().to(auth_handlers::request_password_reset_handler),
          )
          .route(
            "/password-reset/confirm",
            web::post().to(auth_handlers::reset_password_handler),
          ),
      )
      // Accounts
      .route("/me", web::get().to(account_handlers::me_handler))
      .service(
        web::scope("/users")
          .route("", web::get().to(account_handlers::list_users_handler))
          .route(
            "/{user_id}/permissions",
            web::put().to(account_handlers::update_permissions_handler),
          ),
      )
      // Catalog
      .service(
        web::scope("/items")
          .route("", web::post().to(item_handlers::create_item_handler))
          .route("/{item_id}", web::get().to(item_handlers::get_item_handler))
          .route("/{item_id}", web::patch().to(item_handlers::update_item_handler))
          .route("/{item_id}", web::delete().to(item_handlers::delete_item_handler)),
      )
      // Cart
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::view_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/items/{cart_item_id}", web::delete().to(cart_handlers::remove_from_cart_handler)),
      )
      // Checkout and orders
      .route("/checkout", web::post().to(order_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      ),
  );
}
