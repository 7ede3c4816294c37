// shopfront-server/src/models/mod.rs

//! Row shapes as Postgres returns them, and their conversion into engine entities.

pub mod cart_item;
pub mod item;
pub mod order;
pub mod order_item;
pub mod user;

pub use cart_item::CartItemRow;
pub use item::ItemRow;
pub use order::OrderRow;
pub use order_item::OrderItemRow;
pub use user::UserRow;
