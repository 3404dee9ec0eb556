//! Addresses

pub mod records;
mod repository;

pub(crate) use repository::PgAddressesRepository;
