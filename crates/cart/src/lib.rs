//! Cart domain module.
//!
//! Pure, deterministic cart rules (no IO, no timers): identity-matching merge
//! of resolved products, most-recently-touched-first ordering, quantity edits
//! and derived totals.

pub mod cart;
pub mod line_item;

pub use cart::{
    AddResolved, Cart, CartCleared, CartCommand, CartEvent, CartSnapshot, ClearCart, LineAdded,
    LineIncremented, LineRemoved, LineSnapshot, QuantitySet, RemoveLine, SetQuantity,
};
pub use line_item::{LineItem, clamp_quantity};
