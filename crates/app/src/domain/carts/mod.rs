//! Carts

mod errors;
pub mod records;
mod repositories;
pub mod service;

pub use errors::CartsServiceError;
pub(crate) use repositories::{PgCartLinesRepository, PgCartsRepository};
pub use service::*;
