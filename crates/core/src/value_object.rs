//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values.
/// In this workspace the commission inputs and their computed breakdown are
/// value objects: two breakdowns with the same amounts are the same breakdown,
/// and "changing" one means computing a new one from new inputs.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Percentage(Decimal);
///
/// impl ValueObject for Percentage {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
