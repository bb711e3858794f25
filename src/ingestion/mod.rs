//! File ingestion: extension dispatch and format-specific parsing.

pub mod loader;

pub use loader::{load_file, select_loader, LoaderKind, SUPPORTED_EXTENSIONS};
