//! Address Records

use crate::uuids::TypedUuid;

/// Shipping addresses are owned by user management; this crate only checks them.
#[derive(Debug, Clone)]
pub struct AddressRecord;

/// Address UUID
pub type AddressUuid = TypedUuid<AddressRecord>;
