//! Catalog stock accessor.
//!
//! Reads product items and moves their stock counters. Every write happens inside a
//! transaction opened by the orders services; nothing here commits on its own.

pub mod records;
mod repository;

pub(crate) use repository::PgCatalogRepository;
