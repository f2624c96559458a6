//! Value object trait: equality by value, not identity.
//!
//! A content line inside a box is the typical value object here: two lines with
//! the same purchase order, ISBN and quantity are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. They are owned by
/// the entity that contains them and have no lifecycle of their own.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Quantity(u32);
///
/// impl ValueObject for Quantity {}
///
/// assert_eq!(Quantity(5), Quantity(5));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
