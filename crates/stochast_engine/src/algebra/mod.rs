//! Algebraic rewriting of expression trees.

mod normalize;

pub use normalize::{normalize, normalize_event};
