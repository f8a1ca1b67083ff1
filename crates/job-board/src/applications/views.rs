use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicantProfile, Company, CompanyId, JobId, JobPosting};
use super::repository::ApplicationRecord;

/// Application as returned to API callers, with a link to its résumé.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub record: ApplicationRecord,
    pub resume_url: String,
}

impl From<ApplicationRecord> for ApplicationView {
    fn from(record: ApplicationRecord) -> Self {
        let resume_url = record.resume.download_path();
        Self { record, resume_url }
    }
}

/// Read-only projection of a job with its company embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub title: String,
    pub deadline: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub company_id: CompanyId,
    pub company: Option<Company>,
}

impl JobView {
    pub fn new(job: &JobPosting, company: Option<Company>) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            deadline: job.deadline,
            location: job.location.clone(),
            company_id: job.company.clone(),
            company,
        }
    }
}

/// One entry of the applicant-facing list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedJobView {
    #[serde(flatten)]
    pub application: ApplicationView,
    /// `None` when the job has since been removed from the catalogue.
    pub job: Option<JobView>,
}

/// One applicant on a recruiter's roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub application: ApplicationView,
    pub applicant: Option<ApplicantProfile>,
}

/// Job record with its application collection populated, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRoster {
    #[serde(flatten)]
    pub job: JobView,
    pub applications: Vec<RosterEntry>,
}
