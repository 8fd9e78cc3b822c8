use scancart_catalog::Product;
use scancart_core::{Entity, Money, ProductId};

/// Clamp a requested quantity into the valid range `1..=u32::MAX`.
///
/// Zero and negative requests become 1.
pub fn clamp_quantity(requested: i64) -> u32 {
    u32::try_from(requested.max(1)).unwrap_or(u32::MAX)
}

/// Cart entry: a product snapshot plus a quantity.
///
/// The subtotal is computed on every read; there is no stored copy to drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    product: Product,
    quantity: u32,
}

impl LineItem {
    pub fn new(product: Product) -> Self {
        Self { product, quantity: 1 }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.product.price
    }

    pub fn subtotal(&self) -> Money {
        self.product.price.times(self.quantity)
    }

    /// Identity match: same product id OR same barcode.
    pub fn matches(&self, incoming: &Product) -> bool {
        self.product.id == incoming.id || self.product.barcode == incoming.barcode
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }
}

impl Entity for LineItem {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.product.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(barcode: &str, price: u64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: format!("item {barcode}"),
            barcode: barcode.to_string(),
            price: Money::from_major(price),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn clamp_quantity_floors_at_one() {
        assert_eq!(clamp_quantity(-3), 1);
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(1), 1);
        assert_eq!(clamp_quantity(42), 42);
        assert_eq!(clamp_quantity(i64::MAX), u32::MAX);
    }

    #[test]
    fn subtotal_follows_quantity() {
        let mut line = LineItem::new(product("123456", 50));
        assert_eq!(line.subtotal(), Money::from_major(50));

        line.set_quantity(3);
        assert_eq!(line.subtotal(), Money::from_major(150));

        line.set_quantity(0);
        assert_eq!(line.quantity(), 1);
    }

    #[test]
    fn matches_on_id_or_barcode() {
        let milk = product("123456", 50);
        let line = LineItem::new(milk.clone());

        let rebarcoded = Product { barcode: "654321".to_string(), ..milk.clone() };
        let same_barcode_other_id = Product { id: ProductId::new(), ..milk.clone() };
        let unrelated = product("999999", 5);

        assert!(line.matches(&rebarcoded));
        assert!(line.matches(&same_barcode_other_id));
        assert!(!line.matches(&unrelated));
    }
}
