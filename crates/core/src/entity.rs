//! Entity trait: records whose identity outlives their contents.
//!
//! A box keeps its identifier while content lines are appended to it, and
//! sinks deduplicate on that identifier.

pub trait Entity {
    /// Identifier assigned by the supplier, unique per sink.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Whether `other` denotes the same record, regardless of contents.
    fn same_identity(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.id() == other.id()
    }
}
