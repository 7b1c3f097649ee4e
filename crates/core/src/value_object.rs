//! Value object trait: equality by value, not identity.
//!
//! Alerts, study names and sender addresses carry no identity of their own. They
//! are defined entirely by their attribute values and rebuilt on every run.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// The trait requires:
/// - **Clone**: values are copied between pipeline stages
/// - **PartialEq**: values are compared by their attributes (tests rely on this)
/// - **Debug**: values show up in logs and assertion output
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Milestone(i64);
///
/// impl ValueObject for Milestone {}
///
/// assert_eq!(Milestone(30), Milestone(30));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
