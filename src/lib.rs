// College Applications Sync - Core Library
// Normalizes a CSV export of application records and reconciles it against
// the student / college / application tables.

pub mod cell;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalizers;
pub mod preprocess;
pub mod profile;
pub mod reconciliation;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use cell::{AcceptedInput, CellValue};
pub use db::{count_rows, insert_sync_run, latest_sync_run, open_database, setup_database};
pub use error::{IngestError, IngestResult};
pub use models::{Application, ApplicationFields, College, Student};
pub use normalizers::{
    clean_application_result, convert_attending_to_boolean, expand_application_type,
    is_valid_ceeb_code, remove_non_numeric_characters, ApplicationType,
};
pub use preprocess::{preprocess, ApplicationRecord, Preprocessed, PreprocessSummary};
pub use profile::{profile_table, ColumnProfile, TableProfile};
pub use reconciliation::{
    sync_file, sync_snapshot, ReconciliationEngine, SyncCounts, SyncReport,
};
pub use source::{load_table, read_table, RawTable};
pub use store::{ApplicationStore, CollegeLookup, EntityKind, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
