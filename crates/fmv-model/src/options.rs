//! Engine configuration: thresholds, column synonyms, status aliases and date formats.
//!
//! Defaults are built in; a TOML file can override scalars and lists and add synonyms and
//! status aliases on top of the defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::ConfigError;
use crate::record::DocumentState;
use crate::text::identity_key;

const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y", "%Y%m%d", "%d-%b-%Y",
];

const DEFAULT_STATUS_ALIASES: &[(&str, DocumentState)] = &[
    ("pending", DocumentState::Pending),
    ("pendiente", DocumentState::Pending),
    ("received", DocumentState::Received),
    ("recibido", DocumentState::Received),
    ("enviado", DocumentState::Received),
    ("observed", DocumentState::Observed),
    ("observado", DocumentState::Observed),
    ("observada", DocumentState::Observed),
    ("approved", DocumentState::Approved),
    ("aprobado", DocumentState::Approved),
    ("aprobada", DocumentState::Approved),
    ("ok", DocumentState::Approved),
];

/// Per-domain column handling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Canonical field name to alternate header labels.
    pub synonyms: BTreeMap<String, Vec<String>>,
    /// Columns whose absence makes a file unusable.
    pub required_columns: Vec<String>,
    /// Fields that identify a record; empty values are errors.
    pub identifying_fields: Vec<String>,
    /// Fields that should be filled; empty values are warnings.
    pub required_fields: Vec<String>,
}

impl DomainConfig {
    fn new(
        synonyms: &[(&str, &[&str])],
        required_columns: &[&str],
        identifying_fields: &[&str],
        required_fields: &[&str],
    ) -> Self {
        Self {
            synonyms: synonyms
                .iter()
                .map(|(field, labels)| {
                    (
                        (*field).to_string(),
                        labels.iter().map(|label| (*label).to_string()).collect(),
                    )
                })
                .collect(),
            required_columns: to_strings(required_columns),
            identifying_fields: to_strings(identifying_fields),
            required_fields: to_strings(required_fields),
        }
    }

    pub fn synonyms_for(&self, field: &str) -> &[String] {
        self.synonyms.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_identifying(&self, field: &str) -> bool {
        self.identifying_fields.iter().any(|name| name == field)
    }

    fn apply(&mut self, file: DomainConfigFile) {
        if let Some(synonyms) = file.synonyms {
            for (field, labels) in synonyms {
                let entry = self.synonyms.entry(field).or_default();
                for label in labels {
                    if !entry.contains(&label) {
                        entry.push(label);
                    }
                }
            }
        }
        if let Some(columns) = file.required_columns {
            self.required_columns = columns;
        }
        if let Some(fields) = file.identifying_fields {
            self.identifying_fields = fields;
        }
        if let Some(fields) = file.required_fields {
            self.required_fields = fields;
        }
    }

    fn validate(&self, domain: Domain) -> Result<(), ConfigError> {
        // Stand-in columns can be named in header settings but never hold a record value.
        let settings: [(&'static str, Vec<&String>, bool); 4] = [
            ("synonyms", self.synonyms.keys().collect(), true),
            ("required_columns", self.required_columns.iter().collect(), true),
            ("identifying_fields", self.identifying_fields.iter().collect(), false),
            ("required_fields", self.required_fields.iter().collect(), false),
        ];
        for (setting, fields, header_setting) in settings {
            let known = |field: &str| {
                if header_setting {
                    domain.has_column(field)
                } else {
                    domain.has_field(field)
                }
            };
            if let Some(field) = fields.into_iter().find(|field| !known(field)) {
                return Err(ConfigError::UnknownField {
                    domain,
                    field: field.clone(),
                    setting,
                });
            }
        }
        Ok(())
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfigs {
    pub credit_line: DomainConfig,
    pub disbursement: DomainConfig,
    pub document_status: DomainConfig,
    pub contact: DomainConfig,
}

impl DomainConfigs {
    pub fn get(&self, domain: Domain) -> &DomainConfig {
        match domain {
            Domain::CreditLine => &self.credit_line,
            Domain::Disbursement => &self.disbursement,
            Domain::DocumentStatus => &self.document_status,
            Domain::Contact => &self.contact,
        }
    }

    pub fn get_mut(&mut self, domain: Domain) -> &mut DomainConfig {
        match domain {
            Domain::CreditLine => &mut self.credit_line,
            Domain::Disbursement => &mut self.disbursement,
            Domain::DocumentStatus => &mut self.document_status,
            Domain::Contact => &mut self.contact,
        }
    }
}

impl Default for DomainConfigs {
    fn default() -> Self {
        Self {
            credit_line: DomainConfig::new(
                &[
                    ("id", &["id_linea", "codigo_linea", "codigo", "line_id", "nro_linea"]),
                    (
                        "counterparty",
                        &["esfs", "entidad", "institucion", "banco", "contraparte"],
                    ),
                    ("line_type", &["tipo_linea", "tipo", "linea"]),
                    (
                        "limit_amount",
                        &["monto_aprobado", "monto", "monto_linea", "limite", "limit"],
                    ),
                    (
                        "balance_amount",
                        &["monto_utilizado", "saldo_utilizado", "utilizado", "balance"],
                    ),
                    (
                        "available_balance",
                        &["saldo_disponible", "saldo", "saldo_linea", "disponible"],
                    ),
                    (
                        "expiry_date",
                        &[
                            "fecha_vigencia",
                            "vigencia",
                            "fecha_vencimiento",
                            "vencimiento",
                            "expiry",
                        ],
                    ),
                ],
                &[
                    "id",
                    "counterparty",
                    "limit_amount",
                    "balance_amount",
                    "expiry_date",
                ],
                &["id", "counterparty"],
                &["limit_amount", "balance_amount", "expiry_date"],
            ),
            disbursement: DomainConfig::new(
                &[
                    ("reference", &["referencia", "nro_operacion", "operacion", "id"]),
                    (
                        "institution",
                        &["ifi", "institucion", "institucion_financiera", "entidad"],
                    ),
                    ("date", &["fecha", "fecha_desembolso"]),
                    (
                        "amount",
                        &["monto_desembolso", "monto", "desembolso", "importe"],
                    ),
                ],
                &["institution", "date", "amount"],
                &["institution", "date"],
                &["amount"],
            ),
            document_status: DomainConfig::new(
                &[
                    ("counterparty", &["esfs", "entidad", "institucion"]),
                    ("document", &["documento", "tipo_documento", "doc"]),
                    ("status", &["estado", "situacion"]),
                    (
                        "updated_at",
                        &["fecha_actualizacion", "actualizacion", "fecha"],
                    ),
                ],
                &["counterparty", "document", "status"],
                &["counterparty", "document"],
                &["status"],
            ),
            contact: DomainConfig::new(
                &[
                    ("institution", &["institucion", "entidad", "esfs", "ifi"]),
                    ("name", &["nombre", "contacto", "nombre_contacto"]),
                    ("role", &["cargo", "puesto"]),
                    ("email", &["correo", "mail", "email", "correo_electronico"]),
                    (
                        "phone",
                        &["telefono", "celular", "telefono_contacto", "movil"],
                    ),
                    (
                        "updated_at",
                        &["ultima_actualizacion", "fecha", "fecha_actualizacion"],
                    ),
                ],
                &["institution", "name"],
                &["institution", "name"],
                &[],
            ),
        }
    }
}

/// Options controlling a consolidation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Credit lines expiring within this many days are flagged as upcoming.
    pub lookahead_days: i64,
    /// Dates further than this many years ahead are flagged as implausible.
    pub far_future_years: u32,
    /// `chrono` format strings, tried in order.
    pub date_formats: Vec<String>,
    /// Identity-keyed status text to workflow state.
    pub status_aliases: BTreeMap<String, DocumentState>,
    /// Contact fields whose absence sets the missing-field flag.
    pub completeness_fields: Vec<String>,
    pub domains: DomainConfigs,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 30,
            far_future_years: 30,
            date_formats: to_strings(DEFAULT_DATE_FORMATS),
            status_aliases: DEFAULT_STATUS_ALIASES
                .iter()
                .map(|(alias, state)| ((*alias).to_string(), *state))
                .collect(),
            completeness_fields: to_strings(&["email", "phone"]),
            domains: DomainConfigs::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookahead_days(mut self, days: i64) -> Self {
        self.lookahead_days = days;
        self
    }

    /// Parses a TOML document and applies it over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|source| ConfigError::Toml { source })?;
        let mut config = Self::default();
        config.apply(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn apply(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        if let Some(days) = file.lookahead_days {
            self.lookahead_days = days;
        }
        if let Some(years) = file.far_future_years {
            self.far_future_years = years;
        }
        if let Some(formats) = file.date_formats {
            self.date_formats = formats;
        }
        if let Some(fields) = file.completeness_fields {
            self.completeness_fields = fields;
        }
        if let Some(aliases) = file.status_aliases {
            for (alias, target) in aliases {
                let state = target
                    .parse::<DocumentState>()
                    .map_err(|_| ConfigError::UnknownStatus {
                        alias: alias.clone(),
                        target: target.clone(),
                    })?;
                self.status_aliases.insert(identity_key(&alias), state);
            }
        }
        if let Some(domains) = file.domains {
            for (name, domain_file) in domains {
                let domain = name
                    .parse::<Domain>()
                    .map_err(|_| ConfigError::UnknownDomain(name.clone()))?;
                self.domains.get_mut(domain).apply(domain_file);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.date_formats.is_empty() {
            return Err(ConfigError::NoDateFormats);
        }
        for domain in Domain::ALL {
            self.domains.get(domain).validate(domain)?;
        }
        if let Some(field) = self
            .completeness_fields
            .iter()
            .find(|field| !Domain::Contact.has_field(field))
        {
            return Err(ConfigError::UnknownField {
                domain: Domain::Contact,
                field: field.clone(),
                setting: "completeness_fields",
            });
        }
        Ok(())
    }

    pub fn domain(&self, domain: Domain) -> &DomainConfig {
        self.domains.get(domain)
    }

    /// Resolves free status text through the alias table (case and accent insensitive).
    pub fn resolve_status(&self, raw: &str) -> Option<DocumentState> {
        self.status_aliases.get(&identity_key(raw)).copied()
    }
}

/// On-disk configuration. Every setting is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub lookahead_days: Option<i64>,
    pub far_future_years: Option<u32>,
    pub date_formats: Option<Vec<String>>,
    pub status_aliases: Option<BTreeMap<String, String>>,
    pub completeness_fields: Option<Vec<String>>,
    /// Keyed by domain name (`credit_line`, `contact`, ...).
    pub domains: Option<BTreeMap<String, DomainConfigFile>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainConfigFile {
    pub synonyms: Option<BTreeMap<String, Vec<String>>>,
    pub required_columns: Option<Vec<String>>,
    pub identifying_fields: Option<Vec<String>>,
    pub required_fields: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lookahead_days, 30);
        assert_eq!(config.date_formats.first().map(String::as_str), Some("%Y-%m-%d"));
    }

    #[test]
    fn resolves_status_aliases() {
        let config = EngineConfig::default();
        assert_eq!(config.resolve_status(" Pendiente "), Some(DocumentState::Pending));
        assert_eq!(config.resolve_status("OK"), Some(DocumentState::Approved));
        assert_eq!(config.resolve_status("archivado"), None);
    }

    #[test]
    fn toml_adds_synonyms_and_overrides_scalars() {
        let config = EngineConfig::from_toml_str(
            r#"
lookahead_days = 45

[status_aliases]
"en tramite" = "pending"

[domains.credit_line.synonyms]
limit_amount = ["cupo"]
"#,
        )
        .unwrap();
        assert_eq!(config.lookahead_days, 45);
        assert_eq!(config.resolve_status("En trámite"), Some(DocumentState::Pending));
        let synonyms = config.domain(Domain::CreditLine).synonyms_for("limit_amount");
        assert!(synonyms.iter().any(|label| label == "cupo"));
        assert!(synonyms.iter().any(|label| label == "monto_aprobado"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = EngineConfig::from_toml_str(
            r#"
[domains.contact]
required_columns = ["salary"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { field, .. } if field == "salary"));
    }

    #[test]
    fn available_balance_is_a_header_setting_only() {
        let config = EngineConfig::from_toml_str(
            r#"
[domains.credit_line.synonyms]
available_balance = ["cupo_libre"]
"#,
        )
        .unwrap();
        let synonyms = config.domain(Domain::CreditLine).synonyms_for("available_balance");
        assert!(synonyms.iter().any(|label| label == "saldo_disponible"));
        assert!(synonyms.iter().any(|label| label == "cupo_libre"));

        let err = EngineConfig::from_toml_str(
            r#"
[domains.credit_line]
required_fields = ["available_balance"]
"#,
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::UnknownField { setting, .. } if setting == "required_fields")
        );
    }

    #[test]
    fn rejects_unknown_status_target() {
        let err = EngineConfig::from_toml_str("[status_aliases]\nlisto = \"done\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStatus { .. }));
    }

    #[test]
    fn rejects_unknown_domain_section() {
        let err = EngineConfig::from_toml_str("[domains.ledger]\nrequired_columns = []\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDomain(name) if name == "ledger"));
    }

    #[test]
    fn rejects_empty_date_formats() {
        let err = EngineConfig::from_toml_str("date_formats = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::NoDateFormats));
    }
}
