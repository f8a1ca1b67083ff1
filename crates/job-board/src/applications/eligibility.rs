use chrono::{DateTime, Utc};

use super::collaborators::artifact_for;
use super::config::LifecycleConfig;
use super::domain::{ApplicantProfile, ContactDetails, JobPosting, ResumeArtifact, ResumeSource, ResumeUpload};

/// Validation errors raised before an application is persisted.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityViolation {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("email address '{0}' is malformed")]
    MalformedEmail(String),
    #[error("Please upload a CV or set a resume in your profile")]
    MissingResume,
    #[error("profile resume '{0}' is no longer available; please upload a CV")]
    ProfileResumeUnavailable(String),
    #[error("uploaded CV is empty")]
    EmptyResume,
    #[error("uploaded CV exceeds the {limit} byte limit (found {found})")]
    ResumeTooLarge { limit: usize, found: usize },
    #[error("uploaded CV must be one of: {accepted}")]
    UnsupportedResumeType { accepted: String },
    #[error("applications for this job closed at {deadline}")]
    DeadlinePassed { deadline: DateTime<Utc> },
}

const DEFAULT_ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Policy dial backing upload validation.
#[derive(Debug, Clone)]
pub struct EligibilityPolicy {
    max_resume_bytes: usize,
    accepted_extensions: Vec<String>,
}

impl EligibilityPolicy {
    pub fn new(max_resume_bytes: usize) -> Self {
        let max_resume_bytes = if max_resume_bytes == 0 {
            LifecycleConfig::DEFAULT_MAX_RESUME_BYTES
        } else {
            max_resume_bytes
        };

        Self {
            max_resume_bytes,
            accepted_extensions: DEFAULT_ACCEPTED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }

    pub fn max_resume_bytes(&self) -> usize {
        self.max_resume_bytes
    }

    fn accepts(&self, file_name: &str) -> bool {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension {
            Some(ext) => self.accepted_extensions.iter().any(|known| *known == ext),
            None => false,
        }
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new(LifecycleConfig::DEFAULT_MAX_RESUME_BYTES)
    }
}

impl From<&LifecycleConfig> for EligibilityPolicy {
    fn from(config: &LifecycleConfig) -> Self {
        Self::new(config.max_resume_bytes)
    }
}

/// Which résumé a submission will be filed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumePlan {
    /// Store the file supplied with the request.
    Upload(ResumeUpload),
    /// Reuse the applicant's stored profile résumé under the shared namespace.
    Profile(ResumeArtifact),
}

/// Guard deciding whether a submission may become an application.
#[derive(Debug, Clone, Default)]
pub struct EligibilityGuard {
    policy: EligibilityPolicy,
}

impl EligibilityGuard {
    pub fn with_policy(policy: EligibilityPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self::with_policy(EligibilityPolicy::from(config))
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn check_deadline(
        &self,
        job: &JobPosting,
        now: DateTime<Utc>,
    ) -> Result<(), EligibilityViolation> {
        if job.deadline_passed(now) {
            return Err(EligibilityViolation::DeadlinePassed {
                deadline: job.deadline,
            });
        }
        Ok(())
    }

    /// Trim and validate the contact snapshot.
    pub fn sanitize_contact(
        &self,
        contact: ContactDetails,
    ) -> Result<ContactDetails, EligibilityViolation> {
        let full_name = required(contact.full_name, "fullName")?;
        let email = required(contact.email, "email")?;
        let phone = required(contact.phone, "phone")?;

        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        };
        if !well_formed {
            return Err(EligibilityViolation::MalformedEmail(email));
        }

        Ok(ContactDetails {
            full_name,
            email,
            phone,
        })
    }

    /// Pick the résumé source: the uploaded file wins, otherwise a stored profile résumé.
    /// External URL profile résumés cannot be attached.
    pub fn resume_plan(
        &self,
        upload: Option<ResumeUpload>,
        applicant: &ApplicantProfile,
    ) -> Result<ResumePlan, EligibilityViolation> {
        if let Some(upload) = upload {
            self.check_upload(&upload)?;
            return Ok(ResumePlan::Upload(upload));
        }

        match &applicant.resume {
            ResumeSource::StoredFile(path) => {
                let file_name = path.rsplit(['/', '\\']).next().unwrap_or_default().trim();
                if file_name.is_empty() {
                    return Err(EligibilityViolation::MissingResume);
                }
                Ok(ResumePlan::Profile(artifact_for(file_name)))
            }
            ResumeSource::ExternalUrl(_) | ResumeSource::None => {
                Err(EligibilityViolation::MissingResume)
            }
        }
    }

    pub fn check_upload(&self, upload: &ResumeUpload) -> Result<(), EligibilityViolation> {
        if upload.bytes.is_empty() {
            return Err(EligibilityViolation::EmptyResume);
        }

        if upload.bytes.len() > self.policy.max_resume_bytes {
            return Err(EligibilityViolation::ResumeTooLarge {
                limit: self.policy.max_resume_bytes,
                found: upload.bytes.len(),
            });
        }

        if !self.policy.accepts(&upload.file_name) {
            return Err(EligibilityViolation::UnsupportedResumeType {
                accepted: self.policy.accepted_extensions.join(", "),
            });
        }

        Ok(())
    }
}

fn required(value: String, field: &'static str) -> Result<String, EligibilityViolation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EligibilityViolation::MissingField(field));
    }
    Ok(trimmed.to_string())
}
