//! Ports for the systems the lifecycle core reads from but does not own: the user and job
//! directory, and the blob store holding résumé files.

use super::domain::{
    ApplicantProfile, ApplicationId, Company, CompanyId, JobId, JobPosting, ResumeArtifact, UserId,
};

/// Namespace every stored résumé lives under.
pub const RESUME_NAMESPACE: &str = "resumes";

/// Read access to applicants, companies and jobs, plus the job's application index.
pub trait Directory: Send + Sync {
    fn applicant(&self, id: &UserId) -> Result<Option<ApplicantProfile>, DirectoryError>;
    fn job(&self, id: &JobId) -> Result<Option<JobPosting>, DirectoryError>;
    fn company(&self, id: &CompanyId) -> Result<Option<Company>, DirectoryError>;
    /// Append an application reference to the job's collection.
    fn record_application(
        &self,
        job: &JobId,
        application: &ApplicationId,
    ) -> Result<(), DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory entry not found")]
    NotFound,
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Blob storage for résumé files.
pub trait ResumeStore: Send + Sync {
    /// Persist an uploaded file and return its artifact path inside [`RESUME_NAMESPACE`].
    fn store(&self, original_name: &str, bytes: &[u8]) -> Result<ResumeArtifact, ResumeStoreError>;
    fn exists(&self, artifact: &ResumeArtifact) -> Result<bool, ResumeStoreError>;
    /// Read a stored file by its bare file name (the last segment of an artifact path).
    fn read(&self, file_name: &str) -> Result<Vec<u8>, ResumeStoreError>;
    /// Remove a file written for a submission that was later rejected.
    fn discard(&self, artifact: &ResumeArtifact) -> Result<(), ResumeStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeStoreError {
    #[error("resume not found")]
    NotFound,
    #[error("invalid resume file name '{0}'")]
    InvalidName(String),
    #[error("resume storage unavailable: {0}")]
    Unavailable(String),
}

/// Accept only a single, non-hidden path segment so lookups cannot escape the namespace.
pub fn validate_file_name(raw: &str) -> Result<&str, ResumeStoreError> {
    let trimmed = raw.trim();
    let invalid = trimmed.is_empty()
        || trimmed.starts_with('.')
        || trimmed.contains(['/', '\\', '\0'])
        || trimmed.contains("..");
    if invalid {
        return Err(ResumeStoreError::InvalidName(raw.to_string()));
    }
    Ok(trimmed)
}

/// Reduce an arbitrary upload name to `[A-Za-z0-9._-]`, keeping the extension readable.
pub fn sanitize_upload_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').replace("..", ".");
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned
    }
}

/// Artifact path for a file name inside the résumé namespace.
pub fn artifact_for(file_name: &str) -> ResumeArtifact {
    ResumeArtifact(format!("{RESUME_NAMESPACE}/{file_name}"))
}
