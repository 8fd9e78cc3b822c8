use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scancart_core::{DomainError, DomainResult, Entity, Money, ProductId};

/// Catalog product, as returned by a lookup.
///
/// The scan pipeline treats it as an immutable snapshot: a later catalog edit
/// never reaches a line item that already embeds this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub barcode: String,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Editable product fields (create and update payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub barcode: String,
    pub price: Money,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, barcode: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            barcode: barcode.into(),
            price,
        }
    }

    /// Trim surrounding whitespace and reject blank fields.
    pub(crate) fn normalized(&self) -> DomainResult<NewProduct> {
        let name = self.name.trim();
        let barcode = self.barcode.trim();

        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if barcode.is_empty() {
            return Err(DomainError::validation("barcode cannot be empty"));
        }

        Ok(NewProduct {
            name: name.to_string(),
            barcode: barcode.to_string(),
            price: self.price,
        })
    }
}
