//! The layout tree editing model.
//!
//! Layouts are stored as flat ordered lists and edited as id-indexed maps.
//! [`convert`] moves between the two forms; [`tree`] holds the editing
//! operations that keep the internal form consistent.

mod convert;
mod tree;

pub use convert::*;
pub use tree::*;
