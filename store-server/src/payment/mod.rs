//! Payment provider boundary
//!
//! The provider is consumed as an opaque signer/redirect service plus a
//! webhook source: we hand the client a signed auto-submit form, and later
//! receive an asynchronous form-urlencoded notification at a fixed callback
//! endpoint. Only that notification drives order state; the synchronous
//! browser return is UX-only.

pub mod gateway;

pub use gateway::{PaymentConfig, PaymentError, PaymentGateway};
