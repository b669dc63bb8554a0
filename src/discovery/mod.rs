//! Resource tree layout
//!
//! Value files live in `res/values*/`; complex documents anywhere else under
//! `res/`, in directories named after their resource type with optional
//! configuration qualifiers (`anim`, `interpolator-v21`).

mod file_finder;

pub use file_finder::{reference_candidates, ResourceTree};
