//! Coupons

mod errors;
pub mod evaluator;
pub mod records;
mod repository;

pub use errors::CouponError;
pub use evaluator::evaluate;
pub(crate) use repository::PgCouponsRepository;
