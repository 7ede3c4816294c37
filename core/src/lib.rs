// shopfront/src/lib.rs

//! Shopfront: the commerce transaction and authorization engine behind a
//! storefront API.
//!
//! - Auth sessions, credentials and password resets ([`auth`]).
//! - Permission checks and ownership rules ([`guard`], [`ownership`]).
//! - Cart aggregation and the staged checkout transaction ([`cart`], [`checkout`]).
//! - The store, payment gateway and mail transport it coordinates ([`ports`]).
//!
//! [`Shopfront`] wires these together; transports (HTTP, tests) talk to it.

pub mod accounts;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod engine;
pub mod error;
pub mod guard;
pub mod memory;
pub mod model;
pub mod orders;
pub mod ownership;
pub mod ports;
pub mod settings;
pub mod workflow;

pub use crate::accounts::SignupInput;
pub use crate::auth::{Actor, ActorContext, SessionManager, SessionToken};
pub use crate::engine::Shopfront;
pub use crate::error::{CommerceError, CommerceResult, ErrorKind};
pub use crate::memory::MemoryStore;
pub use crate::settings::Settings;
