// shopfront-server/src/web/handlers/mod.rs

pub mod account_handlers;
pub mod auth_handlers;
pub mod cart_handlers;
pub mod item_handlers;
pub mod order_handlers;
