use fmv_model::{Domain, DomainConfig};

use crate::utils::normalize_label;

/// Normalized labels accepted for each header field (canonical fields, then stand-ins),
/// own name first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPatterns {
    pub domain: Domain,
    pub fields: Vec<(&'static str, Vec<String>)>,
}

impl FieldPatterns {
    /// First field claiming `label`. Own field names beat synonyms.
    pub fn lookup(&self, label: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == label)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(_, labels)| labels.iter().any(|candidate| candidate == label))
            })
            .map(|(name, _)| *name)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields
            .iter()
            .flat_map(|(name, labels)| labels.iter().map(move |label| (*name, label.as_str())))
    }
}

pub fn build_field_patterns(domain: Domain, config: &DomainConfig) -> FieldPatterns {
    let mut fields = Vec::new();
    for spec in domain.column_fields() {
        let mut labels = vec![spec.name.to_string()];
        for synonym in config.synonyms_for(spec.name) {
            let label = normalize_label(synonym);
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
        fields.push((spec.name, labels));
    }
    FieldPatterns { domain, fields }
}
