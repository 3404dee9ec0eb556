//! Catalog Records

use serde::Serialize;

use crate::uuids::TypedUuid;

/// Product Item UUID
pub type ProductItemUuid = TypedUuid<ProductItemRecord>;

/// A purchasable SKU with its current price and available stock.
#[derive(Debug, Clone, Serialize)]
pub struct ProductItemRecord {
    pub uuid: ProductItemUuid,
    pub sku: String,
    pub price: u64,
    pub quantity_in_stock: u32,
}

impl ProductItemRecord {
    #[must_use]
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.quantity_in_stock >= quantity
    }
}
