// shopfront/src/auth/mod.rs

//! Auth Session Manager: credential hashing, stateless session tokens,
//! request actor resolution and the password-reset token lifecycle.

pub mod actor;
pub mod credential;
pub mod reset;
pub mod session;

pub use actor::{Actor, ActorContext};
pub use credential::{hash_credential, verify_credential};
pub use reset::PasswordResets;
pub use session::{SessionManager, SessionToken};
