use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::collaborators::{
    validate_file_name, Directory, DirectoryError, ResumeStore, ResumeStoreError,
};
use super::config::LifecycleConfig;
use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, JobId, ResumeArtifact, UserId,
};
use super::eligibility::{EligibilityGuard, EligibilityViolation, ResumePlan};
use super::repository::{ApplicationRecord, ApplicationRepository, RepositoryError};
use super::transition::{StatusTransitionAuthority, TransitionError, TransitionOutcome};
use super::views::{AppliedJobView, ApplicationView, JobRoster, JobView, RosterEntry};

/// Service composing the eligibility guard, transition authority, repository and collaborators.
pub struct ApplicationService<R, D, S> {
    guard: Arc<EligibilityGuard>,
    transitions: StatusTransitionAuthority,
    repository: Arc<R>,
    directory: Arc<D>,
    resumes: Arc<S>,
    clock: Arc<dyn Clock>,
}

fn next_application_id() -> ApplicationId {
    ApplicationId(format!("app-{}", Uuid::new_v4().simple()))
}

impl<R, D, S> ApplicationService<R, D, S>
where
    R: ApplicationRepository + 'static,
    D: Directory + 'static,
    S: ResumeStore + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        resumes: Arc<S>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            guard: Arc::new(EligibilityGuard::from_config(&config)),
            transitions: StatusTransitionAuthority::new(config.transition_policy),
            repository,
            directory,
            resumes,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_resume_bytes(&self) -> usize {
        self.guard.policy().max_resume_bytes()
    }

    /// Validate a submission and persist it as a pending application.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let ApplicationSubmission {
            applicant,
            job,
            contact,
            resume,
        } = submission;

        let profile = self
            .directory
            .applicant(&applicant)?
            .ok_or_else(|| ApplicationServiceError::ApplicantNotFound(applicant.clone()))?;
        let posting = self
            .directory
            .job(&job)?
            .ok_or_else(|| ApplicationServiceError::JobNotFound(job.clone()))?;

        let now = self.clock.now();
        self.guard.check_deadline(&posting, now)?;
        let contact = self.guard.sanitize_contact(contact)?;
        let plan = self.guard.resume_plan(resume, &profile)?;

        // Fast path only; the repository enforces the pair constraint on insert.
        if self.repository.find_by_pair(&applicant, &job)?.is_some() {
            warn!(%applicant, %job, "duplicate application rejected");
            return Err(ApplicationServiceError::DuplicateApplication);
        }

        let (resume, orphan) = match plan {
            ResumePlan::Upload(upload) => {
                let artifact = self.resumes.store(&upload.file_name, &upload.bytes)?;
                (artifact.clone(), Some(artifact))
            }
            ResumePlan::Profile(artifact) => {
                if !self.resumes.exists(&artifact)? {
                    return Err(EligibilityViolation::ProfileResumeUnavailable(artifact.0).into());
                }
                (artifact, None)
            }
        };

        let record = ApplicationRecord {
            id: next_application_id(),
            job: job.clone(),
            applicant: applicant.clone(),
            contact,
            resume,
            status: ApplicationStatus::Pending,
            created_at: now,
        };

        let stored = match self.repository.create(record) {
            Ok(stored) => stored,
            Err(err) => {
                if let Some(artifact) = &orphan {
                    self.discard_upload(artifact);
                }
                return Err(match err {
                    RepositoryError::Conflict => {
                        warn!(%applicant, %job, "concurrent duplicate application rejected");
                        ApplicationServiceError::DuplicateApplication
                    }
                    other => other.into(),
                });
            }
        };

        // The roster reads from the repository, so a stale job index is logged, not fatal.
        if let Err(err) = self.directory.record_application(&job, &stored.id) {
            error!(application = %stored.id, %job, error = %err, "failed to index application on job");
        }

        info!(application = %stored.id, %applicant, %job, "application submitted");
        Ok(stored)
    }

    /// Apply a recruiter-requested status change.
    pub fn transition(
        &self,
        application_id: &ApplicationId,
        requested: &str,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let status = self.transitions.parse_requested(requested)?;
        let record = self
            .repository
            .find_by_id(application_id)?
            .ok_or_else(|| ApplicationServiceError::ApplicationNotFound(application_id.clone()))?;

        match self.transitions.authorize(record.status, status)? {
            TransitionOutcome::Unchanged => Ok(record),
            TransitionOutcome::Changed => {
                let updated = self
                    .repository
                    .update_status(application_id, status)
                    .map_err(|err| match err {
                        RepositoryError::NotFound => {
                            ApplicationServiceError::ApplicationNotFound(application_id.clone())
                        }
                        other => other.into(),
                    })?;
                info!(
                    application = %application_id,
                    from = %record.status,
                    to = %updated.status,
                    "application status updated"
                );
                Ok(updated)
            }
        }
    }

    /// Fetch a single application.
    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.repository
            .find_by_id(application_id)?
            .ok_or_else(|| ApplicationServiceError::ApplicationNotFound(application_id.clone()))
    }

    /// Applicant-facing list, newest first. No applications is an empty list.
    pub fn applications_for_applicant(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<AppliedJobView>, ApplicationServiceError> {
        let records = self.repository.find_by_applicant(applicant)?;
        let mut views = Vec::with_capacity(records.len());

        for record in records {
            let job = match self.directory.job(&record.job)? {
                Some(posting) => {
                    let company = self.directory.company(&posting.company)?;
                    Some(JobView::new(&posting, company))
                }
                None => None,
            };
            views.push(AppliedJobView {
                application: ApplicationView::from(record),
                job,
            });
        }

        Ok(views)
    }

    /// Recruiter roster for a job. Any lookup failure fails the whole roster.
    pub fn applicants_for_job(&self, job: &JobId) -> Result<JobRoster, ApplicationServiceError> {
        let posting = self
            .directory
            .job(job)?
            .ok_or_else(|| ApplicationServiceError::JobNotFound(job.clone()))?;
        let company = self.directory.company(&posting.company)?;

        let records = self.repository.find_by_job(job)?;
        let mut applications = Vec::with_capacity(records.len());
        for record in records {
            let applicant = self.directory.applicant(&record.applicant)?;
            applications.push(RosterEntry {
                application: ApplicationView::from(record),
                applicant,
            });
        }

        Ok(JobRoster {
            job: JobView::new(&posting, company),
            applications,
        })
    }

    /// Bytes of a stored résumé, addressed by bare file name.
    pub fn resume(&self, file_name: &str) -> Result<Vec<u8>, ApplicationServiceError> {
        let file_name = validate_file_name(file_name)?;
        Ok(self.resumes.read(file_name)?)
    }

    fn discard_upload(&self, artifact: &ResumeArtifact) {
        if let Err(err) = self.resumes.discard(artifact) {
            error!(artifact = %artifact.0, error = %err, "failed to discard orphaned resume");
        }
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("applicant {0} not found")]
    ApplicantNotFound(UserId),
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("you have already applied for this job")]
    DuplicateApplication,
    #[error(transparent)]
    Eligibility(#[from] EligibilityViolation),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Resume(#[from] ResumeStoreError),
}

/// Caller-facing failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    ValidationFailed,
    Conflict,
    DeadlinePassed,
    Internal,
}

impl ApplicationServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApplicationServiceError::ApplicantNotFound(_)
            | ApplicationServiceError::JobNotFound(_)
            | ApplicationServiceError::ApplicationNotFound(_)
            | ApplicationServiceError::Resume(ResumeStoreError::NotFound) => FailureKind::NotFound,
            ApplicationServiceError::Eligibility(EligibilityViolation::DeadlinePassed { .. }) => {
                FailureKind::DeadlinePassed
            }
            ApplicationServiceError::Eligibility(_)
            | ApplicationServiceError::Transition(TransitionError::MissingStatus)
            | ApplicationServiceError::Transition(TransitionError::UnknownStatus(_))
            | ApplicationServiceError::Resume(ResumeStoreError::InvalidName(_)) => {
                FailureKind::ValidationFailed
            }
            ApplicationServiceError::DuplicateApplication
            | ApplicationServiceError::Transition(TransitionError::TerminalStatus { .. })
            | ApplicationServiceError::Repository(RepositoryError::Conflict) => {
                FailureKind::Conflict
            }
            ApplicationServiceError::Repository(_)
            | ApplicationServiceError::Directory(_)
            | ApplicationServiceError::Resume(_) => FailureKind::Internal,
        }
    }

    /// Message safe to return to callers; internal failures are reduced to a generic string.
    pub fn public_message(&self) -> String {
        match self.kind() {
            FailureKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}
