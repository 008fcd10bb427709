use crate::model::ids::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// The closed set of messages two peers exchange through the mailbox.
/// Anything else in a mailbox row fails to decode and is skipped by the
/// consumer without aborting the batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SignalBody {
    Offer { sdp: String },
    Answer { sdp: String },
    Ice(IceCandidate),
}

/// One immutable mailbox row. `created_at` is assigned by the store and is
/// strictly monotonic per meeting; consumers feed it back as the `since`
/// cursor and never synthesize cursor values of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRow {
    pub created_at: i64,
    pub from_id: ParticipantId,
    pub to_id: ParticipantId,
    #[serde(flatten)]
    pub body: serde_json::Value,
}

impl SignalRow {
    pub fn decode(&self) -> Result<SignalBody, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}
