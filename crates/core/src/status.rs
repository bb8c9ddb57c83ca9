//! Status codes attached to every composed reply
//!
//! A status describes why a request is or is not ready to execute. It is
//! part of the reply envelope only and is never persisted with a turn.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Outcome of one `compose()` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Small talk, the report pipeline was skipped
    Casual,
    /// Parameters gathered, awaiting confirmation
    Success,
    /// Confirmed and complete, ready to execute
    Confirmed,
    /// Confirmed but no parameters could be resolved
    ParamsMissing,
    /// No report could be resolved from the message or prior context
    ReportMissing,
    /// Confirmed but neither dates are set on a dated report
    DateRangeMissing,
    /// Confirmed with a to_date but no from_date
    FromDateMissing,
    /// Confirmed with neither parameters nor a report
    ParamsAndReportMissing,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Casual => 104,
            Status::Success => 200,
            Status::Confirmed => 209,
            Status::ParamsMissing => 410,
            Status::ReportMissing => 411,
            Status::DateRangeMissing => 412,
            Status::FromDateMissing => 413,
            Status::ParamsAndReportMissing => 414,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Status::Casual => "Casual conversation",
            Status::Success => "Success",
            Status::Confirmed => "Confirmation is accepted",
            Status::ParamsMissing => "Do not provide any params",
            Status::ReportMissing => "Could not find any function/report",
            Status::DateRangeMissing => "Do not provide any date range (required)",
            Status::FromDateMissing => "From date is required when to date is provided",
            Status::ParamsAndReportMissing => "Do not provide any params and function/report",
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Status", 2)?;
        s.serialize_field("status_code", &self.code())?;
        s.serialize_field("message", self.message())?;
        s.end()
    }
}
