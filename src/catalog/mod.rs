//! The persisted game catalog and the operations that edit and launch it.

pub mod entry;
pub mod library;
pub mod store;

pub use entry::{new_entry_id, CatalogEntry, RawCatalogEntry, DEFAULT_COLOR, DEFAULT_ICON};
pub use library::{AddOutcome, Library, ScanImportSummary};
pub use store::{CatalogStore, JsonCatalogStore, CATALOG_BACKUP_FILE, CATALOG_FILE};
