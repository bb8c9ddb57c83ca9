//! Dialogue composer
//!
//! One `compose()` invocation walks a fixed state machine:
//!
//! `START -> {CASUAL, REPORT_FLOW}` and within the report flow
//! `SELECT_REPORT -> LOAD_PRIOR -> EXTRACT_FIELDS -> DETECT_REMOVALS ->
//! MERGE -> BUILD_RESPONSE -> PERSIST -> RETURN`.
//!
//! Stages are strictly ordered; within a stage, independent sub-tasks (the
//! two top-level recognizers, the per-field extraction calls) fan out over
//! the shared worker pool and join. Persistence happens exactly once, after
//! every stage has completed, under the user's lock.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use report_agent_config::ReportCatalog;
use report_agent_core::{
    AnalyticsEvent, AnalyticsSink, ConversationStore, EntityMap, Field, LanguageModel, Reply,
    ReportId, ReportParams, Status, Turn, UserLocks, WorkerPool, UNSPECIFIED,
};

use crate::extractor::FieldExtractor;
use crate::greeting::Greeter;
use crate::merge::{apply_removals, merge_entities};
use crate::recognizer::Recognizer;
use crate::removal::RemovalDetector;
use crate::respond;
use crate::selector::ReportSelector;

/// Everything the composer talks to, injected at construction
pub struct Collaborators {
    pub casual: Recognizer,
    pub confirmation: Recognizer,
    pub selector: ReportSelector,
    pub extractor: FieldExtractor,
    pub removal: RemovalDetector,
    pub greeter: Greeter,
    pub store: Arc<dyn ConversationStore>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub catalog: Arc<ReportCatalog>,
}

/// The multi-turn dialogue state machine
pub struct DialogueComposer {
    casual: Recognizer,
    confirmation: Recognizer,
    selector: ReportSelector,
    extractor: FieldExtractor,
    removal: RemovalDetector,
    greeter: Greeter,
    store: Arc<dyn ConversationStore>,
    analytics: Arc<dyn AnalyticsSink>,
    catalog: Arc<ReportCatalog>,
    locks: UserLocks,
}

impl DialogueComposer {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            casual: collaborators.casual,
            confirmation: collaborators.confirmation,
            selector: collaborators.selector,
            extractor: collaborators.extractor,
            removal: collaborators.removal,
            greeter: collaborators.greeter,
            store: collaborators.store,
            analytics: collaborators.analytics,
            catalog: collaborators.catalog,
            locks: UserLocks::new(),
        }
    }

    /// Wire every agent against a single language model.
    pub fn with_default_agents(
        llm: Arc<dyn LanguageModel>,
        catalog: Arc<ReportCatalog>,
        store: Arc<dyn ConversationStore>,
        analytics: Arc<dyn AnalyticsSink>,
        pool: WorkerPool,
        timezone_offset_hours: i32,
    ) -> Self {
        Self::new(Collaborators {
            casual: Recognizer::casual(llm.clone()),
            confirmation: Recognizer::confirmation(llm.clone()),
            selector: ReportSelector::new(llm.clone(), catalog.clone()),
            extractor: FieldExtractor::new(
                llm.clone(),
                catalog.clone(),
                pool,
                timezone_offset_hours,
            ),
            removal: RemovalDetector::new(llm.clone()),
            greeter: Greeter::new(llm),
            store,
            analytics,
            catalog,
        })
    }

    /// Process one inbound message for one user.
    pub async fn compose(&self, user_id: &str, message: &str) -> (Reply, Status) {
        let started = Instant::now();

        // Independent top-level checks, joined before any branching
        let (casual, confirmed) =
            tokio::join!(self.casual.decide(message), self.confirmation.decide(message));
        let is_casual = casual && !confirmed;
        tracing::debug!(user_id, casual, confirmed, "top-level classification");

        if is_casual {
            let response = self.greeter.chat(message).await;
            let reply = Reply {
                user_id: user_id.to_string(),
                report: None,
                params: None,
                response,
                is_new_session: false,
                is_action: false,
            };
            return (reply, Status::Casual);
        }

        let selected = self.selector.select(message).await;

        // The store contract is read-then-replace; hold this user's lock
        // across the whole cycle so racing requests cannot drop a turn.
        let guard = self.locks.lock(user_id).await;
        let history = self.store.get(user_id).await;
        let prior = history.last();
        let prior_report = prior.and_then(|turn| turn.report);
        let prior_entities: EntityMap = prior
            .and_then(|turn| turn.params.as_ref())
            .map(ReportParams::to_entities)
            .unwrap_or_default();

        // Unresolved with no usable prior context: terminal short-circuit,
        // nothing is persisted.
        let Some(report) = selected.or(prior_report) else {
            drop(guard);
            let status = if confirmed {
                Status::ParamsAndReportMissing
            } else {
                Status::ReportMissing
            };
            self.record_analytics(message, None, None, started);
            let reply = Reply {
                user_id: user_id.to_string(),
                report: None,
                params: None,
                response: respond::render_unresolved(),
                is_new_session: false,
                is_action: confirmed,
            };
            return (reply, status);
        };

        let Some(spec) = self.catalog.report(report) else {
            // Catalog covers the closed report set; reaching this means a
            // broken deployment, answered like an unresolved report.
            drop(guard);
            tracing::error!(report = report.endpoint(), "report missing from catalog");
            let reply = Reply {
                user_id: user_id.to_string(),
                report: None,
                params: None,
                response: respond::render_unresolved(),
                is_new_session: false,
                is_action: false,
            };
            return (reply, Status::ReportMissing);
        };

        // Switching reports starts a fresh session: prior history is
        // dropped and nothing carries forward.
        let is_new_session = prior_report.map(|p| p != report).unwrap_or(false);

        let fields: Vec<Field> = spec.field_names();
        let (extracted, removals) = tokio::join!(
            self.extractor.extract(message, report),
            self.removal.detect(message, &fields)
        );

        let defaults = spec.defaults();
        let mut entities = if is_new_session {
            extracted
        } else {
            merge_entities(&prior_entities, &extracted, &defaults)
        };
        apply_removals(&mut entities, &removals, &defaults);

        let is_action = confirmed;
        let response = respond::render_report_response(report, spec, &entities, is_action);
        let params = ReportParams::from_entities(report, &entities);

        let turn = Turn {
            report: Some(report),
            params: Some(params.clone()),
            response: response.clone(),
            is_new_session,
            is_action,
            timestamp: Utc::now(),
        };
        let mut chain = if is_new_session { Vec::new() } else { history };
        chain.push(turn);
        if !self.store.insert(user_id, chain).await {
            // Durability defect, not a user-facing failure
            tracing::warn!(user_id, "turn persist failed, reply still returned");
        }
        drop(guard);

        let status = if is_action {
            Self::action_status(Some(report), Some(&entities))
        } else {
            Status::Success
        };

        self.record_analytics(
            message,
            Some(params.summary()),
            Some(report.endpoint().to_string()),
            started,
        );

        // Action gating: the caller only sees an executable report/params
        // pair on a confirmed turn with a complete date range.
        let executable = is_action
            && !matches!(status, Status::DateRangeMissing | Status::FromDateMissing);
        let (visible_report, visible_params) = if executable {
            (Some(report), Some(params))
        } else {
            (None, None)
        };

        let reply = Reply {
            user_id: user_id.to_string(),
            report: visible_report,
            params: visible_params,
            response,
            is_new_session,
            is_action,
        };
        (reply, status)
    }

    /// Status of a confirmed request. Total over the missing-params and
    /// missing-report combinations even though the normal flow always has
    /// both.
    fn action_status(report: Option<ReportId>, entities: Option<&EntityMap>) -> Status {
        match (entities, report) {
            (None, None) => Status::ParamsAndReportMissing,
            (None, Some(_)) => Status::ParamsMissing,
            (Some(_), None) => Status::ReportMissing,
            (Some(entities), Some(report)) => {
                if !report.is_dated() {
                    return Status::Confirmed;
                }
                let date = |field: Field| {
                    entities
                        .get(&field)
                        .and_then(|v| v.as_text())
                        .unwrap_or(UNSPECIFIED)
                        .to_string()
                };
                let from = date(Field::FromDate);
                let to = date(Field::ToDate);
                if from == UNSPECIFIED && to == UNSPECIFIED {
                    Status::DateRangeMissing
                } else if from == UNSPECIFIED {
                    Status::FromDateMissing
                } else {
                    Status::Confirmed
                }
            }
        }
    }

    fn record_analytics(
        &self,
        message: &str,
        entities: Option<String>,
        endpoint: Option<String>,
        started: Instant,
    ) {
        let latency_secs = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        self.analytics.record(AnalyticsEvent {
            question: message.to_string(),
            entities,
            endpoint,
            latency_secs,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_agent_core::FieldValue;

    fn entities(from: &str, to: &str) -> EntityMap {
        let mut map = EntityMap::new();
        map.insert(Field::FromDate, FieldValue::text(from));
        map.insert(Field::ToDate, FieldValue::text(to));
        map
    }

    #[test]
    fn action_status_mapping() {
        assert_eq!(
            DialogueComposer::action_status(None, None),
            Status::ParamsAndReportMissing
        );
        assert_eq!(
            DialogueComposer::action_status(Some(ReportId::WinlostDetail), None),
            Status::ParamsMissing
        );
        assert_eq!(
            DialogueComposer::action_status(None, Some(&EntityMap::new())),
            Status::ReportMissing
        );
        assert_eq!(
            DialogueComposer::action_status(
                Some(ReportId::WinlostDetail),
                Some(&entities("N/A", "N/A"))
            ),
            Status::DateRangeMissing
        );
        assert_eq!(
            DialogueComposer::action_status(
                Some(ReportId::WinlostDetail),
                Some(&entities("N/A", "2024-02-15"))
            ),
            Status::FromDateMissing
        );
        assert_eq!(
            DialogueComposer::action_status(
                Some(ReportId::WinlostDetail),
                Some(&entities("2024-02-01", "2024-02-15"))
            ),
            Status::Confirmed
        );
        assert_eq!(
            DialogueComposer::action_status(
                Some(ReportId::Outstanding),
                Some(&EntityMap::new())
            ),
            Status::Confirmed
        );
    }
}
