//! Common types for docent-vector.

/// Dense position of a vector in the index (`0..len`).
pub type Position = usize;

/// A single nearest-neighbor hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Position of the matching vector.
    pub position: Position,
    /// L2 distance from the query (lower is closer).
    pub distance: f32,
}
