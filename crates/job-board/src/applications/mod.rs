//! Application lifecycle: submission, recruiter rosters, and status transitions.
//!
//! Storage, the user/job directory, and résumé blobs sit behind traits so the service and
//! router can be exercised with in-memory doubles.

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod domain;
pub(crate) mod eligibility;
pub mod identity;
pub mod repository;
pub mod router;
pub mod service;
pub mod transition;
pub mod views;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock};
pub use collaborators::{
    Directory, DirectoryError, ResumeStore, ResumeStoreError, RESUME_NAMESPACE,
};
pub use config::LifecycleConfig;
pub use domain::{
    ApplicantProfile, ApplicationId, ApplicationStatus, ApplicationSubmission, Company, CompanyId,
    ContactDetails, JobId, JobPosting, ResumeArtifact, ResumeSource, ResumeUpload, UnknownStatus,
    UserId,
};
pub use eligibility::EligibilityViolation;
pub use identity::{AuthenticatedUser, USER_ID_HEADER};
pub use repository::{
    sort_newest_first, ApplicationRecord, ApplicationRepository, ApplicationStatusView,
    RepositoryError,
};
pub use router::application_router;
pub use service::{ApplicationService, ApplicationServiceError, FailureKind};
pub use transition::{TransitionError, TransitionPolicy};
pub use views::{AppliedJobView, ApplicationView, JobRoster, JobView, RosterEntry};
