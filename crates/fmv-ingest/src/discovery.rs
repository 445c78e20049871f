//! File discovery and domain matching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fmv_model::{Domain, identity_key};

use crate::error::{IngestError, Result};

const DOMAIN_KEYWORDS: &[(Domain, &[&str])] = &[
    (Domain::CreditLine, &["lineas", "lines"]),
    (Domain::Disbursement, &["desembolsos", "disbursements"]),
    (Domain::DocumentStatus, &["splaft", "documents", "documentos"]),
    (Domain::Contact, &["contactos", "contacts"]),
];

/// File formats read as source tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// `.xlsx`, `.xlsm` or `.xls`; the first worksheet is read.
    Workbook,
}

impl SourceFormat {
    /// Format by extension. Excel lock files (`~$name.xlsx`) are not sources.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.starts_with("~$") {
            return None;
        }
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xls" => Some(SourceFormat::Workbook),
            _ => None,
        }
    }
}

/// Files grouped by domain, plus the files no keyword matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainFiles {
    pub domains: BTreeMap<Domain, Vec<PathBuf>>,
    pub ignored: Vec<PathBuf>,
}

/// Lists all CSV and Excel files in a directory.
///
/// Returns files sorted by filename.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if SourceFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Domain of a file judged by keywords in its stem (`Lineas ESFS.csv` is a credit line file).
pub fn classify_file(path: &Path) -> Option<Domain> {
    let stem = path.file_stem().and_then(|v| v.to_str())?;
    let key = identity_key(stem);
    let tokens: Vec<&str> = key
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    DOMAIN_KEYWORDS.iter().find_map(|(domain, keywords)| {
        keywords
            .iter()
            .any(|keyword| tokens.iter().any(|token| token.starts_with(keyword)))
            .then_some(*domain)
    })
}

/// Classifies files by domain, keeping their relative order.
pub fn discover_domain_files(files: &[PathBuf]) -> DomainFiles {
    let mut discovered = DomainFiles::default();
    for path in files {
        match classify_file(path) {
            Some(domain) => discovered
                .domains
                .entry(domain)
                .or_default()
                .push(path.clone()),
            None => discovered.ignored.push(path.clone()),
        }
    }
    discovered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_keyword() {
        assert_eq!(
            classify_file(Path::new("Lineas ESFS 2024-03-31.csv")),
            Some(Domain::CreditLine)
        );
        assert_eq!(
            classify_file(Path::new("desembolsos_diarios.csv")),
            Some(Domain::Disbursement)
        );
        assert_eq!(
            classify_file(Path::new("Control SPLAFT.csv")),
            Some(Domain::DocumentStatus)
        );
        assert_eq!(classify_file(Path::new("CONTACTOS.csv")), Some(Domain::Contact));
        assert_eq!(classify_file(Path::new("ContactosIFI.csv")), Some(Domain::Contact));
        assert_eq!(classify_file(Path::new("readme.csv")), None);
    }

    #[test]
    fn source_format_by_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("lineas.CSV")), Some(SourceFormat::Csv));
        assert_eq!(
            SourceFormat::from_path(Path::new("lineas.xlsx")),
            Some(SourceFormat::Workbook)
        );
        assert_eq!(SourceFormat::from_path(Path::new("lineas.xls")), Some(SourceFormat::Workbook));
        assert_eq!(SourceFormat::from_path(Path::new("~$lineas.xlsx")), None);
        assert_eq!(SourceFormat::from_path(Path::new("lineas.pdf")), None);
        assert_eq!(SourceFormat::from_path(Path::new("lineas")), None);
    }
}
