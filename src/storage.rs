pub mod extract;
pub mod grammar;
pub mod index;
pub mod loader;
pub mod record;

mod document;

pub use document::{Document, Family, Links, ResolveError};
pub use extract::{Extractor, Normalize, SourceText};
pub use loader::LoadError;
