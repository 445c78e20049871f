pub mod cell;
pub mod consolidated;
pub mod derived;
pub mod domain;
pub mod error;
pub mod issue;
pub mod options;
pub mod record;
pub mod text;

pub use cell::{CellValue, RawRow, RawTable, SourceFile};
pub use consolidated::{
    ConsolidatedSet, DomainOutcome, FailedDomain, MergeNote, ProcessedRecord, RunOutcome,
    SkippedFile,
};
pub use derived::{AlertLevel, ContactDerived, CreditLineDerived, DerivedFields, Usage};
pub use domain::{Domain, FieldKind, FieldSpec, StandIn};
pub use error::{ConfigError, ConsolidationError, ModelError, SchemaError};
pub use issue::{RecordRef, Severity, ValidationIssue};
pub use options::{ConfigFile, DomainConfig, DomainConfigFile, DomainConfigs, EngineConfig};
pub use record::{
    CanonicalRecord, Contact, CreditLine, Disbursement, DocumentState, DocumentStatus, FieldMap,
    FieldValue, RecordKey,
};
pub use text::{fold_accents, identity_key};
