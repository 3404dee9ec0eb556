//! Payments
//!
//! One payment record per order, created unpaid in the same transaction as the order
//! and settled once by reconciliation.

mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::PaymentsServiceError;
pub(crate) use repository::PgPaymentsRepository;
pub use service::*;
