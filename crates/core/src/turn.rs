//! Conversation turns and the caller-visible reply

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::{ReportId, ReportParams};

/// One resolved exchange, persisted in the user's history.
///
/// Turns are immutable once appended; a history is only ever extended or
/// reset, never edited in place. The last turn of a history is the current
/// conversational context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub report: Option<ReportId>,
    pub params: Option<ReportParams>,
    pub response: String,
    pub is_new_session: bool,
    pub is_action: bool,
    pub timestamp: DateTime<Utc>,
}

/// Caller-visible result of `compose()`.
///
/// `report`/`params` are only populated when the turn is a confirmed,
/// executable action; while negotiation is still in flight the caller sees
/// `None` for both, regardless of what was persisted internally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub user_id: String,
    pub report: Option<ReportId>,
    pub params: Option<ReportParams>,
    pub response: String,
    pub is_new_session: bool,
    pub is_action: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{OutstandingParams, ReportParams};

    #[test]
    fn turn_json_round_trip() {
        let turn = Turn {
            report: Some(ReportId::Outstanding),
            params: Some(ReportParams::Outstanding(OutstandingParams {
                product: "Sportsbook".to_string(),
                user: "N/A".to_string(),
            })),
            response: "summary".to_string(),
            is_new_session: true,
            is_action: false,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
