// Crowdfunding Admin - Core Library
// Exposes all modules for use in the CLI and tests

pub mod batch;      // Multi-row INSERT batching
pub mod config;
pub mod db;
pub mod entities;   // Table row models
pub mod error;
pub mod importer;   // Reference data import
pub mod parser;     // XML / GeoNames TXT record parsers
pub mod schema;     // Form schema validation
pub mod submission; // Comment submission handler
pub mod table;      // Generic table row load/store
pub mod xml;

// Re-export commonly used types
pub use batch::{BatchInsert, BatchStats};
pub use config::Config;
pub use db::{count_rows, setup_database, truncate_table};
pub use entities::{Comment, Country, Currency, Location, ProjectType, StateAssignment};
pub use error::{AdminError, Result};
pub use importer::{ImportMode, ImportOptions, ImportReport, Importer, ResourceKind};
pub use parser::{detect_format, IdPolicy, RecordParser, SourceFormat};
pub use schema::{FormRegistry, FormSchema, ValidData, ValidationError, COMMENT_FORM};
pub use submission::{
    CommentController, CommentModel, Redirect, SessionToken, SqliteCommentModel, Submission,
    SubmissionOutcome,
};
pub use table::{Table, TableRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
