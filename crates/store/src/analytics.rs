//! Analytics sinks

use report_agent_core::{AnalyticsEvent, AnalyticsSink};

/// Emits each audit record as a structured tracing event.
///
/// Downstream collection (log shipping, a relational sink) happens outside
/// the process; the request path only ever pays for a log line.
#[derive(Default)]
pub struct TracingAnalytics;

impl TracingAnalytics {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyticsSink for TracingAnalytics {
    fn record(&self, event: AnalyticsEvent) {
        tracing::info!(
            target: "report_agent::analytics",
            question = %event.question,
            entities = event.entities.as_deref().unwrap_or("-"),
            endpoint = event.endpoint.as_deref().unwrap_or("-"),
            latency_secs = event.latency_secs,
            "entity extraction recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_does_not_panic_on_sparse_event() {
        TracingAnalytics::new().record(AnalyticsEvent {
            question: "hello".to_string(),
            entities: None,
            endpoint: None,
            latency_secs: 0.01,
        });
    }
}
