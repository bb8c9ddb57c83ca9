//! Response rendering
//!
//! Human-readable parameter summaries with field icons, the confirmation
//! question / acknowledgement, and the warning blocks for missing dates or
//! an unresolved report.

use report_agent_config::ReportSpec;
use report_agent_core::{EntityMap, Field, FieldValue, ReportId, UNSPECIFIED};

const CONFIRM_QUESTION: &str =
    "⚠️ Would you like to confirm this information and proceed with the report generation?";
const CONFIRMED_NOTE: &str =
    "✅ Your request has been confirmed, please wait for a moment to get the report.";
const DATE_WARNING: &str =
    "❌ Please specify the date range for your request to proceed with generating the report.";

fn display(entities: &EntityMap, field: Field) -> String {
    entities
        .get(&field)
        .map(FieldValue::display)
        .unwrap_or_else(|| UNSPECIFIED.to_string())
}

/// One line per parameter, dates folded into a single range line.
pub fn render_parameters(spec: &ReportSpec, entities: &EntityMap) -> String {
    let mut lines = Vec::new();
    if spec.field(Field::FromDate).is_some() {
        lines.push(format!(
            "📅 Date Range: {} - {}",
            display(entities, Field::FromDate),
            display(entities, Field::ToDate)
        ));
    }
    for field in [
        Field::Product,
        Field::ProductDetail,
        Field::Level,
        Field::User,
        Field::Top,
    ] {
        if spec.field(field).is_some() {
            lines.push(format!(
                "{} {}: {}",
                field.icon(),
                field.label(),
                display(entities, field)
            ));
        }
    }
    lines.join("\n")
}

/// Requirement reminder block shown when an action is missing its dates.
fn render_requirements(spec: &ReportSpec) -> String {
    let mut lines = vec!["⚠️ NOTE THAT:".to_string()];
    for field_spec in &spec.fields {
        let field = field_spec.field;
        let requirement = match field {
            Field::FromDate | Field::ToDate => "REQUIRED".to_string(),
            _ => format!("Default is {}", field_spec.default.display()),
        };
        lines.push(format!(
            "    {} {}: {}",
            field.icon(),
            field.label(),
            requirement
        ));
    }
    lines.join("\n")
}

fn missing_dates(report: ReportId, entities: &EntityMap) -> bool {
    report.is_dated() && display(entities, Field::FromDate) == UNSPECIFIED
}

/// Full response body for a report-flow turn.
pub fn render_report_response(
    report: ReportId,
    spec: &ReportSpec,
    entities: &EntityMap,
    is_action: bool,
) -> String {
    let header = format!(
        "🎲 Here is the summary of parameters for {}:",
        report.display_name()
    );
    let parameters = render_parameters(spec, entities);
    let dates_missing = missing_dates(report, entities);

    if is_action {
        if dates_missing {
            format!(
                "{header}\n{requirements}\n\n✅ YOUR CURRENT PARAMETERS:\n{parameters}\n\n{DATE_WARNING}",
                requirements = render_requirements(spec),
            )
        } else {
            format!("{header}\n{parameters}\n\n{CONFIRMED_NOTE}")
        }
    } else if dates_missing {
        format!("{header}\n{parameters}\n\n{CONFIRM_QUESTION}\n{DATE_WARNING}")
    } else {
        format!("{header}\n{parameters}\n\n{CONFIRM_QUESTION}")
    }
}

/// Short-circuit response when no report can be resolved at all.
pub fn render_unresolved() -> String {
    "❌ Could not find the Function/Report. Please specify one of the available reports \
     (Win Loss, Turnover, Outstanding, Top Outstanding) to proceed with generating the \
     report.\n\
     ⚠️ NOTE THAT: You should not confirm the information before a report has been chosen."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_agent_config::ReportCatalog;

    fn spec(report: ReportId) -> ReportSpec {
        ReportCatalog::embedded()
            .unwrap()
            .report(report)
            .unwrap()
            .clone()
    }

    fn winlost_entities(from: &str, to: &str) -> EntityMap {
        let mut map = EntityMap::new();
        map.insert(Field::FromDate, FieldValue::text(from));
        map.insert(Field::ToDate, FieldValue::text(to));
        map.insert(Field::Product, FieldValue::text("Sportsbook"));
        map.insert(Field::ProductDetail, FieldValue::text("All"));
        map.insert(Field::Level, FieldValue::text("All"));
        map.insert(Field::User, FieldValue::text("N/A"));
        map
    }

    #[test]
    fn non_action_asks_for_confirmation() {
        let spec = spec(ReportId::WinlostDetail);
        let entities = winlost_entities("2024-02-01", "2024-02-15");
        let response = render_report_response(ReportId::WinlostDetail, &spec, &entities, false);
        assert!(response.contains("Win Loss Report"));
        assert!(response.contains("📅 Date Range: 2024-02-01 - 2024-02-15"));
        assert!(response.contains(CONFIRM_QUESTION));
        assert!(!response.contains(CONFIRMED_NOTE));
    }

    #[test]
    fn action_with_dates_confirms() {
        let spec = spec(ReportId::WinlostDetail);
        let entities = winlost_entities("2024-02-01", "2024-02-15");
        let response = render_report_response(ReportId::WinlostDetail, &spec, &entities, true);
        assert!(response.contains(CONFIRMED_NOTE));
        assert!(!response.contains("REQUIRED"));
    }

    #[test]
    fn action_without_dates_warns() {
        let spec = spec(ReportId::WinlostDetail);
        let entities = winlost_entities("N/A", "N/A");
        let response = render_report_response(ReportId::WinlostDetail, &spec, &entities, true);
        assert!(response.contains("REQUIRED"));
        assert!(response.contains(DATE_WARNING));
        assert!(!response.contains(CONFIRMED_NOTE));
    }

    #[test]
    fn undated_report_never_warns_about_dates() {
        let spec = spec(ReportId::TopOutstanding);
        let mut entities = EntityMap::new();
        entities.insert(Field::Product, FieldValue::text("All"));
        entities.insert(Field::Top, FieldValue::Int(40));
        let response = render_report_response(ReportId::TopOutstanding, &spec, &entities, true);
        assert!(response.contains("🔝 Top: 40"));
        assert!(response.contains(CONFIRMED_NOTE));
        assert!(!response.contains(DATE_WARNING));
    }
}
