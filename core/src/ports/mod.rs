// shopfront/src/ports/mod.rs

//! Traits for the collaborators the engine coordinates but does not own:
//! the durable store, the payment gateway, the mail transport and the
//! operator-facing anomaly sink.

pub mod anomaly;
pub mod mail;
pub mod payment;
pub mod store;

pub use anomaly::{Anomaly, AnomalyReporter, TracingAnomalyReporter};
pub use mail::{DeliveryError, Email, MailTransport};
pub use payment::{Charge, ChargeRequest, GatewayError, PaymentGateway};
pub use store::{Store, StoreError, StoreResult, UserFilter};
