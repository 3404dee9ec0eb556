//! Addresses Repository

use sqlx::{Postgres, Transaction, query_scalar};

use crate::domain::{addresses::records::AddressUuid, users::UserUuid};

const ADDRESS_BELONGS_TO_USER_SQL: &str = include_str!("sql/address_belongs_to_user.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAddressesRepository;

impl PgAddressesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn address_belongs_to_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar(ADDRESS_BELONGS_TO_USER_SQL)
            .bind(address.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}
