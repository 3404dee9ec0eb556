//! Order Repositories

mod lines;
mod orders;
mod returns;

pub(crate) use lines::PgOrderLinesRepository;
pub(crate) use orders::PgOrdersRepository;
pub(crate) use returns::PgOrderReturnsRepository;
