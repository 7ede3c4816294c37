// shopfront/src/model/mod.rs

//! Entities owned by the Data Store Adapter. In-memory values are per-request
//! views; nothing here is cached across requests.

pub mod cart_item;
pub mod item;
pub mod order;
pub mod permission;
pub mod user;

pub use cart_item::{CartItem, CartLine};
pub use item::{Item, ItemPatch, NewItem};
pub use order::{NewOrder, NewOrderLine, Order, OrderLine};
pub use permission::{Permission, PermissionSet};
pub use user::{NewUser, ResetToken, ResetTokenPatch, User, UserPatch};
