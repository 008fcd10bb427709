use crate::error::StoreError;
use async_trait::async_trait;
use chalkcast_core::{MeetingId, MeetingStatus};

/// Single ended-flag per meeting. Set once by the host; participants poll it
/// to tear themselves down.
#[async_trait]
pub trait MeetingLifecycle: Send + Sync {
    async fn status(&self, meeting: &MeetingId) -> Result<MeetingStatus, StoreError>;

    async fn end(&self, meeting: &MeetingId) -> Result<(), StoreError>;
}
