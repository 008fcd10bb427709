use chalkcast_core::{
    FocusSample, FocusStatus, MeetingId, ParticipantId, STALE_AFTER_MS, now_ms,
};
use dashmap::DashMap;

/// Running per-participant tally kept alongside the latest classifier
/// verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusTally {
    pub status: FocusStatus,
    pub total_checks: u64,
    pub distracted_checks: u64,
    /// Highest distraction percentage seen so far, and when it was reached.
    pub peak_distraction_pct: f32,
    pub peak_at: i64,
    pub last_seen: i64,
}

/// Meeting-wide ratio reported to the host dashboard. Only definite
/// verdicts contribute; lost faces and classifier errors are invisible
/// here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusSummary {
    pub distracted_count: u64,
    pub total_count: u64,
}

/// Aggregates focus classifications across a meeting. Entries go stale on
/// the same window the presence registry uses, so a vanished participant
/// drops out of the ratio at the same moment it drops off the roster.
#[derive(Default)]
pub struct DistractionBoard {
    entries: DashMap<(MeetingId, ParticipantId), FocusTally>,
}

impl DistractionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, meeting: &MeetingId, participant: &ParticipantId, sample: &FocusSample) {
        self.record_at(meeting, participant, sample, now_ms());
    }

    pub fn record_at(
        &self,
        meeting: &MeetingId,
        participant: &ParticipantId,
        sample: &FocusSample,
        now_ms: i64,
    ) {
        let key = (meeting.clone(), participant.clone());
        let mut entry = self.entries.entry(key).or_insert_with(|| FocusTally {
            status: sample.status,
            total_checks: 0,
            distracted_checks: 0,
            peak_distraction_pct: 0.0,
            peak_at: now_ms,
            last_seen: now_ms,
        });

        entry.status = sample.status;
        entry.last_seen = now_ms;

        if sample.status.counts_toward_total() {
            entry.total_checks += 1;
            if sample.status == FocusStatus::Distracted {
                entry.distracted_checks += 1;
            }

            let pct = entry.distracted_checks as f32 / entry.total_checks as f32 * 100.0;
            if pct > entry.peak_distraction_pct {
                entry.peak_distraction_pct = pct;
                entry.peak_at = now_ms;
            }
        }
    }

    pub fn summary(&self, meeting: &MeetingId) -> FocusSummary {
        self.summary_at(meeting, now_ms())
    }

    pub fn summary_at(&self, meeting: &MeetingId, now_ms: i64) -> FocusSummary {
        self.prune_stale(meeting, now_ms);

        let mut summary = FocusSummary::default();
        for entry in self.entries.iter() {
            let (m, _) = entry.key();
            if m != meeting {
                continue;
            }
            if entry.status.counts_toward_total() {
                summary.total_count += 1;
                if entry.status == FocusStatus::Distracted {
                    summary.distracted_count += 1;
                }
            }
        }
        summary
    }

    pub fn tally(&self, meeting: &MeetingId, participant: &ParticipantId) -> Option<FocusTally> {
        self.entries
            .get(&(meeting.clone(), participant.clone()))
            .map(|e| e.clone())
    }

    pub fn remove(&self, meeting: &MeetingId, participant: &ParticipantId) {
        self.entries.remove(&(meeting.clone(), participant.clone()));
    }

    fn prune_stale(&self, meeting: &MeetingId, now_ms: i64) {
        self.entries
            .retain(|(m, _), entry| m != meeting || now_ms - entry.last_seen <= STALE_AFTER_MS);
    }
}
