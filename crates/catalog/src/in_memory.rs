//! In-memory catalog store for tests, demos and the terminal binary.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use scancart_core::{DomainError, DomainResult, Money, ProductId};

use crate::lookup::{CatalogError, CatalogLookup};
use crate::product::{NewProduct, Product};

/// How queries are compared against names and barcodes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    /// Matches the default collation of the SQL store this replaces.
    #[default]
    Insensitive,
}

impl CaseSensitivity {
    fn fold<'a>(&self, s: &'a str) -> Cow<'a, str> {
        match self {
            CaseSensitivity::Sensitive => Cow::Borrowed(s),
            CaseSensitivity::Insensitive => Cow::Owned(s.to_lowercase()),
        }
    }

    fn equals(&self, a: &str, b: &str) -> bool {
        self.fold(a) == self.fold(b)
    }

    fn starts_with(&self, haystack: &str, prefix: &str) -> bool {
        self.fold(haystack).starts_with(&*self.fold(prefix))
    }
}

/// Seed record: price is a decimal string such as `"12.50"`.
#[derive(Debug, Deserialize)]
struct SeedRecord {
    name: String,
    barcode: String,
    price: String,
}

/// Catalog held in process memory.
///
/// Names and barcodes are unique across the catalog (case-folded the same way
/// lookups are).
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
    case: CaseSensitivity,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case(mut self, case: CaseSensitivity) -> Self {
        self.case = case;
        self
    }

    /// Build a catalog from a JSON array of `{name, barcode, price}` records.
    ///
    /// Records are added in file order, so later records rank as more recent.
    pub fn from_seed_json(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<SeedRecord> = serde_json::from_str(json)?;
        let catalog = Self::new();
        for record in records {
            let price: Money = record.price.parse()?;
            catalog.add_product(NewProduct::new(record.name, record.barcode, price))?;
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.products.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.products.read().ok()?.get(id).cloned()
    }

    pub fn add_product(&self, new: NewProduct) -> DomainResult<Product> {
        let fields = new.normalized()?;
        let mut products = self.write()?;
        self.ensure_unique(&products, &fields, None)?;

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name: fields.name,
            barcode: fields.barcode,
            price: fields.price,
            created_at: now,
            updated_at: now,
        };
        products.insert(product.id, product.clone());
        tracing::debug!(product_id = %product.id, barcode = %product.barcode, "product added");
        Ok(product)
    }

    /// Insert a fully-formed snapshot (explicit id and timestamps).
    pub fn insert(&self, product: Product) -> DomainResult<()> {
        let fields = NewProduct::new(&product.name, &product.barcode, product.price).normalized()?;
        let mut products = self.write()?;
        self.ensure_unique(&products, &fields, Some(product.id))?;
        products.insert(product.id, product);
        Ok(())
    }

    pub fn update_product(&self, id: ProductId, changes: NewProduct) -> DomainResult<Product> {
        let fields = changes.normalized()?;
        let mut products = self.write()?;
        if !products.contains_key(&id) {
            return Err(DomainError::not_found());
        }
        self.ensure_unique(&products, &fields, Some(id))?;

        let product = products.get_mut(&id).ok_or_else(DomainError::not_found)?;
        product.name = fields.name;
        product.barcode = fields.barcode;
        product.price = fields.price;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    pub fn delete_product(&self, id: ProductId) -> DomainResult<Product> {
        self.write()?.remove(&id).ok_or_else(DomainError::not_found)
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<ProductId, Product>>> {
        self.products
            .write()
            .map_err(|_| DomainError::invariant("catalog lock poisoned"))
    }

    fn ensure_unique(
        &self,
        products: &HashMap<ProductId, Product>,
        fields: &NewProduct,
        except: Option<ProductId>,
    ) -> DomainResult<()> {
        let clash = products.values().find(|p| {
            Some(p.id) != except
                && (self.case.equals(&p.name, &fields.name)
                    || self.case.equals(&p.barcode, &fields.barcode))
        });
        match clash {
            Some(_) => Err(DomainError::conflict(
                "a product with this name or barcode already exists",
            )),
            None => Ok(()),
        }
    }

    /// Snapshot of every product, most recent first.
    fn newest_first(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self
            .products
            .read()
            .map_err(|_| CatalogError::unavailable("catalog lock poisoned"))?;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    fn matches_prefix(&self, product: &Product, prefix: &str) -> bool {
        self.case.starts_with(&product.name, prefix)
            || self.case.starts_with(&product.barcode, prefix)
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn lookup(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        let all = self.newest_first()?;

        let exact: Vec<Product> = all
            .iter()
            .filter(|p| self.case.equals(&p.name, query) || self.case.equals(&p.barcode, query))
            .cloned()
            .collect();
        if !exact.is_empty() {
            return Ok(exact);
        }

        // Prefix fallback yields a single candidate: the most recent one.
        Ok(all
            .into_iter()
            .find(|p| self.matches_prefix(p, query))
            .into_iter()
            .collect())
    }

    async fn list_products(&self, filter: &str) -> Result<Vec<Product>, CatalogError> {
        let all = self.newest_first()?;
        if filter.trim().is_empty() {
            return Ok(all);
        }
        Ok(all.into_iter().filter(|p| self.matches_prefix(p, filter)).collect())
    }
}
