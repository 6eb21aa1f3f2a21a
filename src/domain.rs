//! Domain models for genealogy reports.
//!
//! This module contains the plain data types: cross-references, dates,
//! per-individual views and the run configuration. Nothing here reads files.

mod config;
pub use config::{Config, Error as ConfigError, FixedBand};

/// Date normalization and birth-date ordering.
pub mod date;
pub use date::BirthKey;

/// Per-individual views: names, fields and relations.
pub mod view;
pub use view::{Field, FieldKind, Gender, IndividualView, NameParts, Relation, RelationKind};

/// Cross-reference tokens.
pub mod xref;
pub use xref::{Error as XrefError, Xref};
