//! Algorithms over the family relationships of a [`Document`](crate::Document).
//!
//! Both are pure functions of a document and a root individual.

mod connectivity;
mod numbering;

pub use connectivity::find_disconnected;
pub use numbering::{IdMap, ancestor_layers, assign_ids};
