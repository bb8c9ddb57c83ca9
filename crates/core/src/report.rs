//! Report vocabulary and typed parameter records
//!
//! The report set is closed: four backend analytics endpoints, each with a
//! fixed parameter shape. Fields are likewise a closed enum so that entity
//! maps, removal detection and merge rules never deal in free-form keys.
//!
//! Sentinels mark "not yet specified": `"N/A"` for free text and dates,
//! `"All"` for categorical fields, `10` for the top-N count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel for unspecified free-text and date fields
pub const UNSPECIFIED: &str = "N/A";
/// Sentinel for unspecified categorical fields
pub const ALL: &str = "All";
/// Default row count for the top-outstanding report
pub const DEFAULT_TOP: i64 = 10;

/// The closed set of backend reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReportId {
    #[serde(rename = "/winlost_detail")]
    WinlostDetail,
    #[serde(rename = "/turnover")]
    Turnover,
    #[serde(rename = "/outstanding")]
    Outstanding,
    #[serde(rename = "/topoutstanding")]
    TopOutstanding,
}

impl ReportId {
    /// All reports, in catalog order
    pub const ALL: [ReportId; 4] = [
        ReportId::WinlostDetail,
        ReportId::Turnover,
        ReportId::Outstanding,
        ReportId::TopOutstanding,
    ];

    /// Backend endpoint path
    pub fn endpoint(&self) -> &'static str {
        match self {
            ReportId::WinlostDetail => "/winlost_detail",
            ReportId::Turnover => "/turnover",
            ReportId::Outstanding => "/outstanding",
            ReportId::TopOutstanding => "/topoutstanding",
        }
    }

    /// Human-readable report name used in response headers
    pub fn display_name(&self) -> &'static str {
        match self {
            ReportId::WinlostDetail => "Win Loss Report",
            ReportId::Turnover => "Turnover Report",
            ReportId::Outstanding => "Outstanding Report",
            ReportId::TopOutstanding => "Top Outstanding Report",
        }
    }

    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.endpoint() == endpoint)
    }

    /// Reports that carry a mandatory date range
    pub fn is_dated(&self) -> bool {
        matches!(self, ReportId::WinlostDetail | ReportId::Turnover)
    }
}

/// The closed set of parameter fields across all reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FromDate,
    ToDate,
    Product,
    ProductDetail,
    Level,
    User,
    Top,
}

impl Field {
    /// Wire name, matching the extraction schema keys
    pub fn name(&self) -> &'static str {
        match self {
            Field::FromDate => "from_date",
            Field::ToDate => "to_date",
            Field::Product => "product",
            Field::ProductDetail => "product_detail",
            Field::Level => "level",
            Field::User => "user",
            Field::Top => "top",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "from_date" => Some(Field::FromDate),
            "to_date" => Some(Field::ToDate),
            "product" => Some(Field::Product),
            "product_detail" => Some(Field::ProductDetail),
            "level" => Some(Field::Level),
            "user" => Some(Field::User),
            "top" => Some(Field::Top),
            _ => None,
        }
    }

    /// Icon used when rendering the parameter summary
    pub fn icon(&self) -> &'static str {
        match self {
            Field::FromDate | Field::ToDate => "📅",
            Field::Product => "🏢",
            Field::ProductDetail => "📋",
            Field::Level => "🎮",
            Field::User => "👤",
            Field::Top => "🔝",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::FromDate => "From Date",
            Field::ToDate => "To Date",
            Field::Product => "Product",
            Field::ProductDetail => "Product Detail",
            Field::Level => "Level",
            Field::User => "Username",
            Field::Top => "Top",
        }
    }
}

/// A single extracted field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Int(i64),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Whether this value means "not specified", given the field's default.
    ///
    /// Text sentinels count regardless of the default; an integer counts
    /// only when it equals the default.
    pub fn is_sentinel(&self, default: &FieldValue) -> bool {
        match self {
            FieldValue::Text(s) => s == UNSPECIFIED || s == ALL || self == default,
            FieldValue::Int(_) => self == default,
        }
    }

    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(n) => n.to_string(),
        }
    }
}

/// Field-keyed value map used throughout extraction and merging.
///
/// `BTreeMap` keeps iteration order deterministic, which the response
/// renderer and tests rely on.
pub type EntityMap = BTreeMap<Field, FieldValue>;

fn text_or<'a>(entities: &'a EntityMap, field: Field, sentinel: &'a str) -> &'a str {
    entities
        .get(&field)
        .and_then(FieldValue::as_text)
        .unwrap_or(sentinel)
}

fn int_or(entities: &EntityMap, field: Field, default: i64) -> i64 {
    entities.get(&field).and_then(FieldValue::as_int).unwrap_or(default)
}

/// Parameters for the win/loss and turnover reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinlostTurnoverParams {
    pub from_date: String,
    pub to_date: String,
    pub product: String,
    pub product_detail: String,
    pub level: String,
    pub user: String,
}

/// Parameters for the outstanding report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingParams {
    pub product: String,
    pub user: String,
}

/// Parameters for the top-outstanding report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOutstandingParams {
    pub product: String,
    pub top: i64,
}

/// Report-specific typed parameter record.
///
/// Construction from an entity map is total: missing keys fall back to the
/// field sentinels, so a persisted turn is never partially typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportParams {
    WinlostTurnover(WinlostTurnoverParams),
    Outstanding(OutstandingParams),
    TopOutstanding(TopOutstandingParams),
}

impl ReportParams {
    pub fn from_entities(report: ReportId, entities: &EntityMap) -> Self {
        match report {
            ReportId::WinlostDetail | ReportId::Turnover => {
                ReportParams::WinlostTurnover(WinlostTurnoverParams {
                    from_date: text_or(entities, Field::FromDate, UNSPECIFIED).to_string(),
                    to_date: text_or(entities, Field::ToDate, UNSPECIFIED).to_string(),
                    product: text_or(entities, Field::Product, ALL).to_string(),
                    product_detail: text_or(entities, Field::ProductDetail, ALL).to_string(),
                    level: text_or(entities, Field::Level, ALL).to_string(),
                    user: text_or(entities, Field::User, UNSPECIFIED).to_string(),
                })
            }
            ReportId::Outstanding => ReportParams::Outstanding(OutstandingParams {
                product: text_or(entities, Field::Product, ALL).to_string(),
                user: text_or(entities, Field::User, UNSPECIFIED).to_string(),
            }),
            ReportId::TopOutstanding => ReportParams::TopOutstanding(TopOutstandingParams {
                product: text_or(entities, Field::Product, ALL).to_string(),
                top: int_or(entities, Field::Top, DEFAULT_TOP),
            }),
        }
    }

    /// Back to the generic representation, for merging against a prior turn
    pub fn to_entities(&self) -> EntityMap {
        let mut map = EntityMap::new();
        match self {
            ReportParams::WinlostTurnover(p) => {
                map.insert(Field::FromDate, FieldValue::text(&p.from_date));
                map.insert(Field::ToDate, FieldValue::text(&p.to_date));
                map.insert(Field::Product, FieldValue::text(&p.product));
                map.insert(Field::ProductDetail, FieldValue::text(&p.product_detail));
                map.insert(Field::Level, FieldValue::text(&p.level));
                map.insert(Field::User, FieldValue::text(&p.user));
            }
            ReportParams::Outstanding(p) => {
                map.insert(Field::Product, FieldValue::text(&p.product));
                map.insert(Field::User, FieldValue::text(&p.user));
            }
            ReportParams::TopOutstanding(p) => {
                map.insert(Field::Product, FieldValue::text(&p.product));
                map.insert(Field::Top, FieldValue::Int(p.top));
            }
        }
        map
    }

    /// The from_date, when this report shape carries one
    pub fn from_date(&self) -> Option<&str> {
        match self {
            ReportParams::WinlostTurnover(p) => Some(&p.from_date),
            _ => None,
        }
    }

    /// Flattened value summary for the analytics sink
    pub fn summary(&self) -> String {
        self.to_entities()
            .values()
            .map(FieldValue::display)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_round_trip() {
        for report in ReportId::ALL {
            assert_eq!(ReportId::from_endpoint(report.endpoint()), Some(report));
        }
        assert_eq!(ReportId::from_endpoint("/betcount"), None);
    }

    #[test]
    fn report_id_serializes_as_endpoint() {
        let json = serde_json::to_string(&ReportId::WinlostDetail).unwrap();
        assert_eq!(json, "\"/winlost_detail\"");
        let back: ReportId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReportId::WinlostDetail);
    }

    #[test]
    fn sentinel_detection() {
        let default = FieldValue::text(ALL);
        assert!(FieldValue::text("All").is_sentinel(&default));
        assert!(FieldValue::text("N/A").is_sentinel(&default));
        assert!(!FieldValue::text("Sportsbook").is_sentinel(&default));

        let top_default = FieldValue::Int(DEFAULT_TOP);
        assert!(FieldValue::Int(10).is_sentinel(&top_default));
        assert!(!FieldValue::Int(40).is_sentinel(&top_default));
    }

    #[test]
    fn params_from_empty_entities_take_sentinels() {
        let params = ReportParams::from_entities(ReportId::WinlostDetail, &EntityMap::new());
        match params {
            ReportParams::WinlostTurnover(p) => {
                assert_eq!(p.from_date, UNSPECIFIED);
                assert_eq!(p.product, ALL);
                assert_eq!(p.user, UNSPECIFIED);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn entities_round_trip() {
        let mut entities = EntityMap::new();
        entities.insert(Field::Product, FieldValue::text("Sportsbook"));
        entities.insert(Field::Top, FieldValue::Int(40));
        let params = ReportParams::from_entities(ReportId::TopOutstanding, &entities);
        assert_eq!(params.to_entities(), entities);
    }
}
