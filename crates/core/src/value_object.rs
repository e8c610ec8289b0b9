//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity of their own: a `Sku` or a `Price` is defined
/// entirely by its contents. Constructors validate, so an instance that exists is
/// always well-formed. To "change" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
