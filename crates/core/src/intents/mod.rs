pub mod catalog;
pub mod matcher;

pub use catalog::{CatalogError, IntentCatalog, IntentDefinition, BUILTIN_INTENTS};
pub use matcher::{normalize_text, IntentMatcher};
