//! Structured field extraction
//!
//! Multi-field reports decompose into independent per-field sub-extractions
//! dispatched through the shared worker pool and joined. Extraction is
//! advisory, validation is authoritative: whatever the model answers, every
//! enum-typed value outside its enumeration is coerced back to the field
//! default, and the returned map always covers the report's full schema.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use report_agent_config::{FieldSpec, ReportCatalog, ReportSpec};
use report_agent_core::{
    EntityMap, Field, FieldValue, LanguageModel, ReportId, WorkerPool, UNSPECIFIED,
};

use crate::dates::{format_iso, normalize_date, RelativeRange};
use crate::prompts::{
    CategoryPrompt, DateRangePrompt, OutstandingPrompt, TopOutstandingPrompt, UserPrompt,
};

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));

/// Extracts a report's typed field record from free text
pub struct FieldExtractor {
    llm: Arc<dyn LanguageModel>,
    catalog: Arc<ReportCatalog>,
    pool: WorkerPool,
    tz: FixedOffset,
}

impl FieldExtractor {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        catalog: Arc<ReportCatalog>,
        pool: WorkerPool,
        timezone_offset_hours: i32,
    ) -> Self {
        let tz = FixedOffset::east_opt(timezone_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset"));
        Self {
            llm,
            catalog,
            pool,
            tz,
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// Extract all fields for `report`. Never fails: every degraded path
    /// lands on schema defaults.
    pub async fn extract(&self, message: &str, report: ReportId) -> EntityMap {
        let Some(spec) = self.catalog.report(report) else {
            return EntityMap::new();
        };

        let mut entities = match report {
            ReportId::WinlostDetail | ReportId::Turnover => {
                self.extract_dated(message, spec).await
            }
            ReportId::Outstanding => self.extract_outstanding(message, spec).await,
            ReportId::TopOutstanding => self.extract_top_outstanding(message, spec).await,
        };

        Self::validate(spec, &mut entities);
        Self::sanitize_user(spec, &mut entities);
        entities
    }

    /// One sub-call under the worker pool; `None` on any failure.
    async fn call(&self, system: &str, user_prompt: String, schema: Value) -> Option<Value> {
        self.pool
            .run(async {
                match self
                    .llm
                    .complete_structured(system, &user_prompt, &schema)
                    .await
                {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!(error = %e, "sub-extraction degraded to defaults");
                        None
                    }
                }
            })
            .await
    }

    async fn extract_category(&self, message: &str, spec: &FieldSpec) -> Option<Value> {
        let prompt = CategoryPrompt { field: spec.field };
        let values = spec.values.clone().unwrap_or_default();
        let rendered = prompt.render(message, &values, &alias_glossary(spec));
        self.call(CategoryPrompt::SYSTEM, rendered, prompt.schema())
            .await
    }

    /// Win/loss and turnover: date range, three categorical fields and the
    /// username extracted concurrently.
    async fn extract_dated(&self, message: &str, spec: &ReportSpec) -> EntityMap {
        let today = self.today();

        let date_call = self.call(
            DateRangePrompt::SYSTEM,
            DateRangePrompt::render(message, today),
            DateRangePrompt::schema(),
        );
        let product_call = self.extract_field_call(message, spec, Field::Product);
        let detail_call = self.extract_field_call(message, spec, Field::ProductDetail);
        let level_call = self.extract_field_call(message, spec, Field::Level);
        let user_call = self.call(
            UserPrompt::SYSTEM,
            UserPrompt::render(message),
            UserPrompt::schema(),
        );

        let (date_value, product_value, detail_value, level_value, user_value) =
            tokio::join!(date_call, product_call, detail_call, level_call, user_call);

        let mut entities = EntityMap::new();
        let (from_date, to_date) = Self::resolve_dates(date_value, today);
        entities.insert(Field::FromDate, FieldValue::text(from_date));
        entities.insert(Field::ToDate, FieldValue::text(to_date));
        insert_text(&mut entities, Field::Product, product_value);
        insert_text(&mut entities, Field::ProductDetail, detail_value);
        insert_text(&mut entities, Field::Level, level_value);
        insert_text(&mut entities, Field::User, user_value);
        entities
    }

    async fn extract_field_call(
        &self,
        message: &str,
        spec: &ReportSpec,
        field: Field,
    ) -> Option<Value> {
        match spec.field(field) {
            Some(field_spec) => self.extract_category(message, field_spec).await,
            None => None,
        }
    }

    async fn extract_outstanding(&self, message: &str, spec: &ReportSpec) -> EntityMap {
        let product_spec = spec.field(Field::Product);
        let values = product_spec
            .and_then(|f| f.values.clone())
            .unwrap_or_default();
        let glossary = product_spec.map(alias_glossary).unwrap_or_default();

        let value = self
            .call(
                OutstandingPrompt::SYSTEM,
                OutstandingPrompt::render(message, &values, &glossary),
                OutstandingPrompt::schema(),
            )
            .await;

        let mut entities = EntityMap::new();
        insert_text(&mut entities, Field::Product, value.clone());
        insert_text(&mut entities, Field::User, value);
        entities
    }

    async fn extract_top_outstanding(&self, message: &str, spec: &ReportSpec) -> EntityMap {
        let product_spec = spec.field(Field::Product);
        let values = product_spec
            .and_then(|f| f.values.clone())
            .unwrap_or_default();
        let glossary = product_spec.map(alias_glossary).unwrap_or_default();

        let value = self
            .call(
                TopOutstandingPrompt::SYSTEM,
                TopOutstandingPrompt::render(message, &values, &glossary),
                TopOutstandingPrompt::schema(),
            )
            .await;

        let mut entities = EntityMap::new();
        insert_text(&mut entities, Field::Product, value.clone());

        let default_top = spec
            .field(Field::Top)
            .and_then(|f| f.default.as_int())
            .unwrap_or(report_agent_core::DEFAULT_TOP);
        let extracted_top = value
            .as_ref()
            .and_then(|v| v.get(Field::Top.name()))
            .and_then(Value::as_i64)
            .filter(|n| *n > 0)
            .unwrap_or(default_top);

        // An explicit number in the text outranks a model-returned default
        let top = if extracted_top == default_top {
            Self::lexical_top(message).unwrap_or(default_top)
        } else {
            extracted_top
        };
        entities.insert(Field::Top, FieldValue::Int(top));
        entities
    }

    /// First positive integer in the raw text, the lexical fallback for the
    /// top count.
    fn lexical_top(message: &str) -> Option<i64> {
        NUMBER
            .find(message)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .filter(|n| *n > 0)
    }

    /// Turn the date sub-extraction into a normalized (from, to) pair.
    /// A recognized relative phrase wins over whatever dates the model
    /// produced; its range is computed deterministically in code.
    fn resolve_dates(value: Option<Value>, today: NaiveDate) -> (String, String) {
        let Some(value) = value else {
            return (UNSPECIFIED.to_string(), UNSPECIFIED.to_string());
        };

        let phrase = value
            .get("date_range")
            .and_then(Value::as_str)
            .unwrap_or(UNSPECIFIED);
        if let Some(relative) = RelativeRange::parse(phrase) {
            let (from, to) = relative.resolve(today);
            return (format_iso(from), format_iso(to));
        }

        let from = normalize_date(
            value
                .get("from_date")
                .and_then(Value::as_str)
                .unwrap_or(UNSPECIFIED),
        );
        let mut to = normalize_date(
            value
                .get("to_date")
                .and_then(Value::as_str)
                .unwrap_or(UNSPECIFIED),
        );
        if from != UNSPECIFIED && to == UNSPECIFIED {
            to = from.clone();
        }
        (from, to)
    }

    /// Authoritative validation: enum-typed values outside their
    /// enumeration reset to the field default, and every schema field gets
    /// a value. Idempotent by construction.
    fn validate(spec: &ReportSpec, entities: &mut EntityMap) {
        for field_spec in &spec.fields {
            let current = entities.get(&field_spec.field).cloned();
            match current {
                Some(value) if field_spec.accepts(&value) => {}
                Some(value) => {
                    tracing::warn!(
                        field = field_spec.field.name(),
                        value = %value.display(),
                        "extracted value outside enumeration, reset to default"
                    );
                    entities.insert(field_spec.field, field_spec.default.clone());
                }
                None => {
                    entities.insert(field_spec.field, field_spec.default.clone());
                }
            }
        }
    }

    /// Reject usernames that are clearly not account ids: multi-word
    /// values, and values that collapse to a known alias (presumed to be
    /// column values echoed back by the model).
    fn sanitize_user(spec: &ReportSpec, entities: &mut EntityMap) {
        let user = match entities.get(&Field::User) {
            Some(FieldValue::Text(user)) => user.clone(),
            _ => return,
        };
        if user == UNSPECIFIED {
            return;
        }
        let rejected = user.split_whitespace().count() > 1
            || spec
                .alias_terms_lowercase()
                .contains(&user.to_lowercase());
        if rejected {
            tracing::warn!(user = %user, "rejected implausible username");
            entities.insert(Field::User, FieldValue::text(UNSPECIFIED));
        }
    }
}

fn alias_glossary(spec: &FieldSpec) -> String {
    if spec.aliases.is_empty() {
        return "  (none)".to_string();
    }
    spec.aliases
        .iter()
        .map(|(canonical, aliases)| format!("  - {} => {}", aliases.join(", "), canonical))
        .collect::<Vec<_>>()
        .join("\n")
}

fn insert_text(entities: &mut EntityMap, field: Field, value: Option<Value>) {
    if let Some(text) = value
        .as_ref()
        .and_then(|v| v.get(field.name()))
        .and_then(Value::as_str)
    {
        entities.insert(field, FieldValue::text(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn winlost_spec() -> ReportSpec {
        ReportCatalog::embedded()
            .unwrap()
            .report(ReportId::WinlostDetail)
            .unwrap()
            .clone()
    }

    #[test]
    fn validation_coerces_and_fills() {
        let spec = winlost_spec();
        let mut entities = EntityMap::new();
        entities.insert(Field::Product, FieldValue::text("sportsbok"));
        entities.insert(Field::Level, FieldValue::text("Super Agent"));

        FieldExtractor::validate(&spec, &mut entities);

        assert_eq!(entities[&Field::Product], FieldValue::text("All"));
        assert_eq!(entities[&Field::Level], FieldValue::text("Super Agent"));
        // Missing fields filled with defaults
        assert_eq!(entities[&Field::FromDate], FieldValue::text("N/A"));
        assert_eq!(entities[&Field::User], FieldValue::text("N/A"));
    }

    #[test]
    fn validation_is_idempotent() {
        let spec = winlost_spec();
        let mut once = EntityMap::new();
        once.insert(Field::Product, FieldValue::text("whatever"));
        FieldExtractor::validate(&spec, &mut once);
        let mut twice = once.clone();
        FieldExtractor::validate(&spec, &mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn username_sanitation() {
        let spec = winlost_spec();

        let mut entities = EntityMap::new();
        entities.insert(Field::User, FieldValue::text("john doe"));
        FieldExtractor::sanitize_user(&spec, &mut entities);
        assert_eq!(entities[&Field::User], FieldValue::text("N/A"));

        let mut entities = EntityMap::new();
        entities.insert(Field::User, FieldValue::text("SB"));
        FieldExtractor::sanitize_user(&spec, &mut entities);
        assert_eq!(entities[&Field::User], FieldValue::text("N/A"));

        let mut entities = EntityMap::new();
        entities.insert(Field::User, FieldValue::text("leon2346"));
        FieldExtractor::sanitize_user(&spec, &mut entities);
        assert_eq!(entities[&Field::User], FieldValue::text("leon2346"));
    }

    #[test]
    fn relative_phrase_wins_over_model_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let value = json!({
            "date_range": "last week",
            "from_date": "01/01/2020",
            "to_date": "02/01/2020"
        });
        let (from, to) = FieldExtractor::resolve_dates(Some(value), today);
        assert_eq!(from, "2024-02-28");
        assert_eq!(to, "2024-03-06");
    }

    #[test]
    fn absolute_dates_are_normalized() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let value = json!({
            "date_range": "01/02/2024 to 15/02/2024",
            "from_date": "01/02/2024",
            "to_date": "15/02/2024"
        });
        let (from, to) = FieldExtractor::resolve_dates(Some(value), today);
        assert_eq!(from, "2024-02-01");
        assert_eq!(to, "2024-02-15");
    }

    #[test]
    fn single_date_covers_both_ends() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let value = json!({
            "date_range": "26/03/2024",
            "from_date": "26/03/2024",
            "to_date": "N/A"
        });
        let (from, to) = FieldExtractor::resolve_dates(Some(value), today);
        assert_eq!(from, "2024-03-26");
        assert_eq!(to, "2024-03-26");
    }

    #[test]
    fn missing_extraction_is_unspecified() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let (from, to) = FieldExtractor::resolve_dates(None, today);
        assert_eq!(from, "N/A");
        assert_eq!(to, "N/A");
    }

    #[test]
    fn lexical_top_parses_first_number() {
        assert_eq!(FieldExtractor::lexical_top("top 23 outstanding"), Some(23));
        assert_eq!(FieldExtractor::lexical_top("top outstanding"), None);
    }
}
