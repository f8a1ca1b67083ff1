use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::applications::clock::Clock;
use crate::applications::collaborators::{
    artifact_for, sanitize_upload_name, validate_file_name, Directory, DirectoryError,
    ResumeStore, ResumeStoreError,
};
use crate::applications::domain::{
    ApplicantProfile, ApplicationId, ApplicationStatus, ApplicationSubmission, Company, CompanyId,
    ContactDetails, JobId, JobPosting, ResumeArtifact, ResumeSource, ResumeUpload, UserId,
};
use crate::applications::identity::USER_ID_HEADER;
use crate::applications::repository::{
    sort_newest_first, ApplicationRecord, ApplicationRepository, RepositoryError,
};
use crate::applications::{application_router, ApplicationService, LifecycleConfig};

pub(super) const OPEN_JOB: &str = "job-backend";
pub(super) const CLOSED_JOB: &str = "job-closed";
pub(super) const SEEKER_WITH_FILE: &str = "seeker-file";
pub(super) const SEEKER_WITH_URL: &str = "seeker-url";
pub(super) const SEEKER_WITHOUT_RESUME: &str = "seeker-none";
pub(super) const SEEKER_WITH_STALE_FILE: &str = "seeker-stale";
pub(super) const RECRUITER: &str = "recruiter-1";
pub(super) const PROFILE_RESUME: &str = "profile-cv.pdf";

pub(super) type TestService = ApplicationService<MemoryRepository, MemoryDirectory, MemoryResumes>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(super) fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    pub(super) records: Mutex<HashMap<ApplicationId, ApplicationRecord>>,
}

impl MemoryRepository {
    fn select(
        &self,
        filter: impl Fn(&ApplicationRecord) -> bool,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard.values().filter(|r| filter(r)).cloned().collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

impl ApplicationRepository for MemoryRepository {
    fn create(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let duplicate = guard.contains_key(&record.id)
            || guard
                .values()
                .any(|existing| existing.applicant == record.applicant && existing.job == record.job);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_pair(
        &self,
        applicant: &UserId,
        job: &JobId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self
            .select(|record| &record.applicant == applicant && &record.job == job)?
            .into_iter()
            .next())
    }

    fn find_by_applicant(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.select(|record| &record.applicant == applicant)
    }

    fn find_by_job(&self, job: &JobId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.select(|record| &record.job == job)
    }

    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.status = status;
        Ok(record.clone())
    }
}

/// Passes the service pre-check but reports the pair constraint on insert, as a store does
/// when a concurrent submission commits first.
#[derive(Default)]
pub(super) struct RacingRepository;

impl ApplicationRepository for RacingRepository {
    fn create(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn find_by_id(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn find_by_pair(
        &self,
        _applicant: &UserId,
        _job: &JobId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn find_by_applicant(
        &self,
        _applicant: &UserId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(Vec::new())
    }

    fn find_by_job(&self, _job: &JobId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(Vec::new())
    }

    fn update_status(
        &self,
        _id: &ApplicationId,
        _status: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn create(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_id(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_pair(
        &self,
        _applicant: &UserId,
        _job: &JobId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_applicant(
        &self,
        _applicant: &UserId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_job(&self, _job: &JobId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_status(
        &self,
        _id: &ApplicationId,
        _status: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    applicants: Mutex<HashMap<UserId, ApplicantProfile>>,
    jobs: Mutex<HashMap<JobId, JobPosting>>,
    companies: Mutex<HashMap<CompanyId, Company>>,
    pub(super) fail_applicant_lookups: Mutex<bool>,
}

impl MemoryDirectory {
    pub(super) fn add_applicant(&self, applicant: ApplicantProfile) {
        self.applicants
            .lock()
            .expect("directory mutex poisoned")
            .insert(applicant.id.clone(), applicant);
    }

    pub(super) fn add_job(&self, job: JobPosting) {
        self.jobs
            .lock()
            .expect("directory mutex poisoned")
            .insert(job.id.clone(), job);
    }

    pub(super) fn add_company(&self, company: Company) {
        self.companies
            .lock()
            .expect("directory mutex poisoned")
            .insert(company.id.clone(), company);
    }

    pub(super) fn job_applications(&self, job: &str) -> Vec<ApplicationId> {
        self.jobs
            .lock()
            .expect("directory mutex poisoned")
            .get(&JobId::from(job))
            .map(|posting| posting.applications.clone())
            .unwrap_or_default()
    }
}

impl Directory for MemoryDirectory {
    fn applicant(&self, id: &UserId) -> Result<Option<ApplicantProfile>, DirectoryError> {
        if *self.fail_applicant_lookups.lock().expect("directory mutex poisoned") {
            return Err(DirectoryError::Unavailable("user service offline".to_string()));
        }
        Ok(self
            .applicants
            .lock()
            .expect("directory mutex poisoned")
            .get(id)
            .cloned())
    }

    fn job(&self, id: &JobId) -> Result<Option<JobPosting>, DirectoryError> {
        Ok(self
            .jobs
            .lock()
            .expect("directory mutex poisoned")
            .get(id)
            .cloned())
    }

    fn company(&self, id: &CompanyId) -> Result<Option<Company>, DirectoryError> {
        Ok(self
            .companies
            .lock()
            .expect("directory mutex poisoned")
            .get(id)
            .cloned())
    }

    fn record_application(
        &self,
        job: &JobId,
        application: &ApplicationId,
    ) -> Result<(), DirectoryError> {
        let mut guard = self.jobs.lock().expect("directory mutex poisoned");
        let posting = guard.get_mut(job).ok_or(DirectoryError::NotFound)?;
        posting.applications.push(application.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryResumes {
    pub(super) files: Mutex<HashMap<String, Vec<u8>>>,
    sequence: Mutex<u32>,
}

impl MemoryResumes {
    pub(super) fn put(&self, file_name: &str, bytes: &[u8]) {
        self.files
            .lock()
            .expect("resume mutex poisoned")
            .insert(file_name.to_string(), bytes.to_vec());
    }

    pub(super) fn count(&self) -> usize {
        self.files.lock().expect("resume mutex poisoned").len()
    }
}

impl ResumeStore for MemoryResumes {
    fn store(&self, original_name: &str, bytes: &[u8]) -> Result<ResumeArtifact, ResumeStoreError> {
        let mut sequence = self.sequence.lock().expect("resume mutex poisoned");
        *sequence += 1;
        let file_name = format!("{:04}-{}", *sequence, sanitize_upload_name(original_name));
        self.put(&file_name, bytes);
        Ok(artifact_for(&file_name))
    }

    fn exists(&self, artifact: &ResumeArtifact) -> Result<bool, ResumeStoreError> {
        Ok(self
            .files
            .lock()
            .expect("resume mutex poisoned")
            .contains_key(artifact.file_name()))
    }

    fn read(&self, file_name: &str) -> Result<Vec<u8>, ResumeStoreError> {
        let file_name = validate_file_name(file_name)?;
        self.files
            .lock()
            .expect("resume mutex poisoned")
            .get(file_name)
            .cloned()
            .ok_or(ResumeStoreError::NotFound)
    }

    fn discard(&self, artifact: &ResumeArtifact) -> Result<(), ResumeStoreError> {
        self.files
            .lock()
            .expect("resume mutex poisoned")
            .remove(artifact.file_name());
        Ok(())
    }
}

pub(super) fn company() -> Company {
    Company {
        id: CompanyId::from("acme"),
        name: "Acme Robotics".to_string(),
        location: Some("Pune".to_string()),
        website: Some("https://acme.example.com".to_string()),
    }
}

pub(super) fn job(id: &str, deadline: DateTime<Utc>) -> JobPosting {
    JobPosting {
        id: JobId::from(id),
        title: "Backend Engineer".to_string(),
        company: CompanyId::from("acme"),
        deadline,
        location: Some("Remote".to_string()),
        applications: Vec::new(),
    }
}

pub(super) fn applicant(id: &str, resume: ResumeSource) -> ApplicantProfile {
    ApplicantProfile {
        id: UserId::from(id),
        full_name: "Asha Verma".to_string(),
        email: format!("{id}@example.com"),
        phone: Some("+91 98200 00000".to_string()),
        resume,
    }
}

pub(super) fn contact() -> ContactDetails {
    ContactDetails {
        full_name: "Asha Verma".to_string(),
        email: "asha@example.com".to_string(),
        phone: "+91 98200 00000".to_string(),
    }
}

pub(super) fn upload() -> ResumeUpload {
    ResumeUpload {
        file_name: "Asha CV.pdf".to_string(),
        bytes: b"%PDF-1.7 asha".to_vec(),
    }
}

pub(super) fn submission(
    applicant: &str,
    job: &str,
    resume: Option<ResumeUpload>,
) -> ApplicationSubmission {
    ApplicationSubmission {
        applicant: UserId::from(applicant),
        job: JobId::from(job),
        contact: contact(),
        resume,
    }
}

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) directory: Arc<MemoryDirectory>,
    pub(super) resumes: Arc<MemoryResumes>,
    pub(super) clock: Arc<ManualClock>,
}

pub(super) fn seeded_directory() -> MemoryDirectory {
    let directory = MemoryDirectory::default();
    directory.add_company(company());
    directory.add_job(job(OPEN_JOB, now() + Duration::days(7)));
    directory.add_job(job(CLOSED_JOB, now() - Duration::days(1)));
    directory.add_applicant(applicant(
        SEEKER_WITH_FILE,
        ResumeSource::StoredFile(format!("uploads/resumes/{PROFILE_RESUME}")),
    ));
    directory.add_applicant(applicant(
        SEEKER_WITH_URL,
        ResumeSource::ExternalUrl("https://drive.example.com/asha-cv".to_string()),
    ));
    directory.add_applicant(applicant(SEEKER_WITHOUT_RESUME, ResumeSource::None));
    directory.add_applicant(applicant(
        SEEKER_WITH_STALE_FILE,
        ResumeSource::StoredFile("resumes/deleted.pdf".to_string()),
    ));
    directory
}

pub(super) fn harness() -> Harness {
    harness_with(LifecycleConfig::default())
}

pub(super) fn harness_with(config: LifecycleConfig) -> Harness {
    let repository = Arc::new(MemoryRepository::default());
    let directory = Arc::new(seeded_directory());
    let resumes = Arc::new(MemoryResumes::default());
    resumes.put(PROFILE_RESUME, b"%PDF-1.4 profile");
    let clock = Arc::new(ManualClock::starting_at(now()));

    let service = ApplicationService::new(
        repository.clone(),
        directory.clone(),
        resumes.clone(),
        config,
    )
    .with_clock(clock.clone());

    Harness {
        service: Arc::new(service),
        repository,
        directory,
        resumes,
        clock,
    }
}

pub(super) fn router(harness: &Harness) -> axum::Router {
    application_router(harness.service.clone())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

const BOUNDARY: &str = "job-board-test-boundary";

/// Build a multipart apply request; `cv` is `(file name, bytes)`.
pub(super) fn apply_request(
    job: &str,
    user: Option<&str>,
    fields: &[(&str, &str)],
    cv: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = cv {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::post(format!("/application/apply/{job}")).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    builder.body(Body::from(body)).expect("request")
}

pub(super) fn contact_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("fullName", "Asha Verma"),
        ("email", "asha@example.com"),
        ("phone", "+91 98200 00000"),
    ]
}
