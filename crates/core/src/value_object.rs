//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. `Money` is the canonical example in this workspace.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one (`price.times(3)` returns a new `Money`).
///
/// ## Value Object vs Entity
///
/// - **Value Object**: no identity (`Money(5000) == Money(5000)`)
/// - **Entity**: has identity (two products with the same id are the same
///   product, even if one snapshot carries an older price)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
