use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationStatus, ContactDetails, JobId, ResumeArtifact, UserId,
};

/// Persisted application linking one applicant to one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job: JobId,
    pub applicant: UserId,
    pub contact: ContactDetails,
    pub resume: ResumeArtifact,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            status: self.status.label(),
        }
    }
}

/// Storage abstraction for application records.
///
/// Implementations own the `(applicant, job)` uniqueness constraint: `create` must reject a
/// second record for the same pair even when two submissions race past the service pre-check.
/// Listing operations return records newest first.
pub trait ApplicationRepository: Send + Sync {
    fn create(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn find_by_pair(
        &self,
        applicant: &UserId,
        job: &JobId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn find_by_applicant(&self, applicant: &UserId)
        -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn find_by_job(&self, job: &JobId) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Orders records newest first; ties fall back to the identifier so output is deterministic.
pub fn sort_newest_first(records: &mut [ApplicationRecord]) {
    records.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });
}

/// Minimal status payload returned after a transition.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
}
