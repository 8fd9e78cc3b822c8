//! Product catalog: the product snapshot type, the asynchronous lookup
//! capability the scan pipeline consumes, and an in-memory reference store.

pub mod in_memory;
pub mod lookup;
pub mod product;

pub use in_memory::{CaseSensitivity, InMemoryCatalog};
pub use lookup::{CatalogError, CatalogLookup};
pub use product::{NewProduct, Product};
