// shopfront-server/src/services/mod.rs

pub mod email;
pub mod payment_mock;
