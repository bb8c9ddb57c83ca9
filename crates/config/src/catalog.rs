//! Report catalog
//!
//! Static, indexed-once description of every report: which fields it takes,
//! their defaults, the closed value enumerations, and the alias strings
//! users actually type ("wl", "sb", "saba bb", ...). Derived from
//! configuration at startup and never mutated at request time.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use report_agent_core::{EntityMap, Field, FieldValue, ReportId};

use crate::ConfigError;

const EMBEDDED_CATALOG: &str = include_str!("reports.yaml");

/// One field of a report's parameter schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: Field,
    /// Value a request gets when the user never mentions this field
    pub default: FieldValue,
    /// Closed enumeration of valid values; `None` for free-text/date/int
    /// fields
    #[serde(default)]
    pub values: Option<Vec<String>>,
    /// Canonical value -> alias strings, for prompt glossaries and the
    /// abbreviation index
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl FieldSpec {
    pub fn is_enumerated(&self) -> bool {
        self.values.is_some()
    }

    /// Whether `value` is acceptable for this field: a member of the
    /// enumeration (when one exists) or the field default.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        if value == &self.default {
            return true;
        }
        match (&self.values, value) {
            (Some(values), FieldValue::Text(s)) => values.iter().any(|v| v == s),
            (Some(_), FieldValue::Int(_)) => false,
            (None, _) => true,
        }
    }
}

/// One report's schema and alias glossary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSpec {
    pub id: ReportId,
    pub description: String,
    /// Alias strings for the report name itself
    #[serde(default)]
    pub aliases: Vec<String>,
    pub fields: Vec<FieldSpec>,
}

impl ReportSpec {
    pub fn field(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field == field)
    }

    pub fn field_names(&self) -> Vec<Field> {
        self.fields.iter().map(|f| f.field).collect()
    }

    /// Schema defaults as an entity map
    pub fn defaults(&self) -> EntityMap {
        self.fields
            .iter()
            .map(|f| (f.field, f.default.clone()))
            .collect()
    }

    pub fn enumerated_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_enumerated())
    }

    /// Every alias string across this report's fields, lowercased, for
    /// detecting column values echoed back as usernames.
    pub fn alias_terms_lowercase(&self) -> Vec<String> {
        let mut terms = Vec::new();
        for field in &self.fields {
            for (canonical, aliases) in &field.aliases {
                terms.push(canonical.to_lowercase());
                terms.extend(aliases.iter().map(|a| a.to_lowercase()));
            }
        }
        terms
    }
}

/// The full report catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCatalog {
    pub reports: Vec<ReportSpec>,
}

impl ReportCatalog {
    /// The catalog compiled into the binary
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_yaml(EMBEDDED_CATALOG)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let catalog: ReportCatalog = serde_yaml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn report(&self, id: ReportId) -> Option<&ReportSpec> {
        self.reports.iter().find(|r| r.id == id)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for report in &self.reports {
            if report.fields.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "report {} has no fields",
                    report.id.endpoint()
                )));
            }
            for field in &report.fields {
                if !field.accepts(&field.default) {
                    return Err(ConfigError::Validation(format!(
                        "default of {}.{} is outside its enumeration",
                        report.id.endpoint(),
                        field.field.name()
                    )));
                }
                if let Some(values) = &field.values {
                    for canonical in field.aliases.keys() {
                        if !values.iter().any(|v| v == canonical) {
                            return Err(ConfigError::Validation(format!(
                                "alias key '{}' of {}.{} is not an enumerated value",
                                canonical,
                                report.id.endpoint(),
                                field.field.name()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_agent_core::{ALL, UNSPECIFIED};

    #[test]
    fn embedded_catalog_parses() {
        let catalog = ReportCatalog::embedded().unwrap();
        assert_eq!(catalog.reports.len(), 4);
        for report in ReportId::ALL {
            assert!(catalog.report(report).is_some(), "{report:?} missing");
        }
    }

    #[test]
    fn winlost_schema_shape() {
        let catalog = ReportCatalog::embedded().unwrap();
        let spec = catalog.report(ReportId::WinlostDetail).unwrap();
        assert_eq!(
            spec.field_names(),
            vec![
                Field::FromDate,
                Field::ToDate,
                Field::Product,
                Field::ProductDetail,
                Field::Level,
                Field::User
            ]
        );
        let defaults = spec.defaults();
        assert_eq!(defaults[&Field::FromDate], FieldValue::text(UNSPECIFIED));
        assert_eq!(defaults[&Field::Product], FieldValue::text(ALL));
    }

    #[test]
    fn top_outstanding_default_is_ten() {
        let catalog = ReportCatalog::embedded().unwrap();
        let spec = catalog.report(ReportId::TopOutstanding).unwrap();
        assert_eq!(
            spec.field(Field::Top).unwrap().default,
            FieldValue::Int(10)
        );
    }

    #[test]
    fn enumeration_acceptance() {
        let catalog = ReportCatalog::embedded().unwrap();
        let spec = catalog.report(ReportId::WinlostDetail).unwrap();
        let product = spec.field(Field::Product).unwrap();
        assert!(product.accepts(&FieldValue::text("Sportsbook")));
        assert!(product.accepts(&FieldValue::text("All")));
        assert!(!product.accepts(&FieldValue::text("sportsbok")));
    }

    #[test]
    fn alias_terms_are_lowercased() {
        let catalog = ReportCatalog::embedded().unwrap();
        let spec = catalog.report(ReportId::WinlostDetail).unwrap();
        let terms = spec.alias_terms_lowercase();
        assert!(terms.contains(&"sportsbook".to_string()));
        assert!(terms.iter().all(|t| t == &t.to_lowercase()));
    }
}
