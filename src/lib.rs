//! Genealogy interchange-file reading and person numbering
//!
//! A [`Document`] is loaded once from a line-oriented interchange file. From it,
//! an [`Extractor`] builds per-person views, [`find_disconnected`] checks that
//! everyone is related to a chosen root, and [`assign_ids`] numbers people by
//! generation relative to that root.

pub mod domain;
pub use domain::{Config, FixedBand, IndividualView, Xref};

/// Reading, indexing and extracting records.
pub mod storage;
pub use storage::{Document, Extractor, LoadError, ResolveError};

pub mod graph;
pub use graph::{IdMap, assign_ids, find_disconnected};
