#![deny(unsafe_code)]

pub mod as_of;
pub mod discovery;
pub mod error;
pub mod reader;
pub mod workbook;

pub use as_of::detect_as_of;
pub use discovery::{
    DomainFiles, SourceFormat, classify_file, discover_domain_files, list_source_files,
};
pub use error::{IngestError, Result};
pub use reader::{
    DomainTables, FileFailure, read_csv_table, read_domain_tables, read_raw_table,
    validate_encoding,
};
pub use workbook::read_workbook_table;
