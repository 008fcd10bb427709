use serde::{Deserialize, Serialize};

/// Per-frame verdict of the focus classifier. Wire strings match the
/// classifier's output, including the space in `NO FACE`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FocusStatus {
    #[serde(rename = "FOCUSED")]
    Focused,
    #[serde(rename = "DISTRACTED")]
    Distracted,
    #[serde(rename = "NO FACE")]
    NoFace,
    #[serde(rename = "ERROR")]
    Error,
}

impl FocusStatus {
    /// Only definite verdicts count toward the meeting-wide ratio; lost
    /// faces and classifier errors are excluded from both numerator and
    /// denominator.
    pub fn counts_toward_total(self) -> bool {
        matches!(self, FocusStatus::Focused | FocusStatus::Distracted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FocusSample {
    pub status: FocusStatus,
    pub head_yaw: Option<f32>,
    pub head_pitch: Option<f32>,
    pub gaze_ratio: Option<f32>,
}

impl FocusSample {
    pub fn status_only(status: FocusStatus) -> Self {
        Self {
            status,
            head_yaw: None,
            head_pitch: None,
            gaze_ratio: None,
        }
    }
}
