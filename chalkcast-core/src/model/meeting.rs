use serde::{Deserialize, Serialize};

/// Single row per meeting. Set once by the host on explicit termination;
/// read by every participant to trigger client-side teardown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingStatus {
    pub ended: bool,
    pub ended_at: Option<i64>,
}
