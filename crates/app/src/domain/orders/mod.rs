//! Orders
//!
//! Order placement lives in [`service`]; post-placement transitions live in
//! [`lifecycle`]. Each public operation runs as one transaction.

pub mod data;
mod errors;
pub mod lifecycle;
pub mod records;
mod repositories;
pub mod service;

pub use errors::OrdersServiceError;
pub use lifecycle::*;
pub use service::*;
