//! Users

use crate::uuids::TypedUuid;

/// Users are managed outside this crate; only their identifier is referenced.
#[derive(Debug, Clone)]
pub struct UserRecord;

/// User UUID
pub type UserUuid = TypedUuid<UserRecord>;
