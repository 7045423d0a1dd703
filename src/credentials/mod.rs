//! Shared credentials file: section naming, path handling and the
//! crash-safe key/value store.

pub mod paths;
pub mod sections;
pub mod store;

pub use paths::expand_home;
pub use sections::{compute_section_names, SectionNames};
pub use store::{Section, Store};
