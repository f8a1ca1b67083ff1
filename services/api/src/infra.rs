use chrono::{DateTime, Duration, Utc};
use job_board::applications::collaborators::{
    artifact_for, sanitize_upload_name, validate_file_name,
};
use job_board::applications::{
    sort_newest_first, ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationRepository,
    ApplicationService, ApplicationStatus, Company, CompanyId, Directory, DirectoryError, JobId,
    JobPosting, RepositoryError, ResumeArtifact, ResumeSource, ResumeStore, ResumeStoreError,
    UserId, RESUME_NAMESPACE,
};
use job_board::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub(crate) type LifecycleService =
    ApplicationService<InMemoryApplicationRepository, InMemoryDirectory, DiskResumeStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct ApplicationTable {
    records: HashMap<ApplicationId, ApplicationRecord>,
    pairs: HashMap<(UserId, JobId), ApplicationId>,
}

/// Application store keeping a unique `(applicant, job)` index next to the records.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    table: Arc<Mutex<ApplicationTable>>,
}

impl InMemoryApplicationRepository {
    fn select(
        &self,
        keep: impl Fn(&ApplicationRecord) -> bool,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.table.lock().map_err(poisoned)?;
        let mut records: Vec<_> = guard
            .records
            .values()
            .filter(|record| keep(record))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("application table lock poisoned".to_string())
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn create(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.table.lock().map_err(poisoned)?;
        let pair = (record.applicant.clone(), record.job.clone());
        if guard.pairs.contains_key(&pair) || guard.records.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.pairs.insert(pair, record.id.clone());
        guard.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.table.lock().map_err(poisoned)?;
        Ok(guard.records.get(id).cloned())
    }

    fn find_by_pair(
        &self,
        applicant: &UserId,
        job: &JobId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.table.lock().map_err(poisoned)?;
        Ok(guard
            .pairs
            .get(&(applicant.clone(), job.clone()))
            .and_then(|id| guard.records.get(id))
            .cloned())
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
        let mut guard = self.table.lock().map_err(poisoned)?;
        let record = guard.records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.status = status;
        Ok(record.clone())
    }
}

/// JSON document the in-memory directory is seeded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct DirectorySeed {
    #[serde(default)]
    pub(crate) companies: Vec<Company>,
    #[serde(default)]
    pub(crate) jobs: Vec<JobPosting>,
    #[serde(default)]
    pub(crate) applicants: Vec<ApplicantProfile>,
}

impl DirectorySeed {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Small catalogue used when no seed file is configured.
    pub(crate) fn sample(now: DateTime<Utc>) -> Self {
        let company = Company {
            id: CompanyId::from("northwind"),
            name: "Northwind Labs".to_string(),
            location: Some("Hyderabad".to_string()),
            website: Some("https://northwind.example.com".to_string()),
        };

        let jobs = vec![
            JobPosting {
                id: JobId::from("job-rust-backend"),
                title: "Rust Backend Engineer".to_string(),
                company: company.id.clone(),
                deadline: now + Duration::days(30),
                location: Some("Remote".to_string()),
                applications: Vec::new(),
            },
            JobPosting {
                id: JobId::from("job-data-intern"),
                title: "Data Engineering Intern".to_string(),
                company: company.id.clone(),
                deadline: now - Duration::days(2),
                location: Some("Hyderabad".to_string()),
                applications: Vec::new(),
            },
        ];

        let applicants = vec![
            ApplicantProfile {
                id: UserId::from("seeker-priya"),
                full_name: "Priya Nair".to_string(),
                email: "priya@example.com".to_string(),
                phone: Some("+91 98450 11111".to_string()),
                resume: ResumeSource::None,
            },
            ApplicantProfile {
                id: UserId::from("seeker-arjun"),
                full_name: "Arjun Mehta".to_string(),
                email: "arjun@example.com".to_string(),
                phone: Some("+91 98450 22222".to_string()),
                resume: ResumeSource::ExternalUrl("https://drive.example.com/arjun".to_string()),
            },
        ];

        Self {
            companies: vec![company],
            jobs,
            applicants,
        }
    }
}

#[derive(Default)]
struct DirectoryTables {
    applicants: HashMap<UserId, ApplicantProfile>,
    jobs: HashMap<JobId, JobPosting>,
    companies: HashMap<CompanyId, Company>,
}

/// Directory adapter backed by a seeded in-process catalogue.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDirectory {
    tables: Arc<Mutex<DirectoryTables>>,
}

impl InMemoryDirectory {
    pub(crate) fn from_seed(seed: DirectorySeed) -> Self {
        let tables = DirectoryTables {
            applicants: seed
                .applicants
                .into_iter()
                .map(|applicant| (applicant.id.clone(), applicant))
                .collect(),
            jobs: seed.jobs.into_iter().map(|job| (job.id.clone(), job)).collect(),
            companies: seed
                .companies
                .into_iter()
                .map(|company| (company.id.clone(), company))
                .collect(),
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    pub(crate) fn upsert_applicant(&self, applicant: ApplicantProfile) -> Result<(), DirectoryError> {
        let mut guard = self.tables.lock().map_err(directory_poisoned)?;
        guard.applicants.insert(applicant.id.clone(), applicant);
        Ok(())
    }

    fn read<T>(
        &self,
        pick: impl FnOnce(&DirectoryTables) -> Option<T>,
    ) -> Result<Option<T>, DirectoryError> {
        let guard = self.tables.lock().map_err(directory_poisoned)?;
        Ok(pick(&guard))
    }
}

fn directory_poisoned<T>(_: std::sync::PoisonError<T>) -> DirectoryError {
    DirectoryError::Unavailable("directory lock poisoned".to_string())
}

impl Directory for InMemoryDirectory {
    fn applicant(&self, id: &UserId) -> Result<Option<ApplicantProfile>, DirectoryError> {
        self.read(|tables| tables.applicants.get(id).cloned())
    }

    fn job(&self, id: &JobId) -> Result<Option<JobPosting>, DirectoryError> {
        self.read(|tables| tables.jobs.get(id).cloned())
    }

    fn company(&self, id: &CompanyId) -> Result<Option<Company>, DirectoryError> {
        self.read(|tables| tables.companies.get(id).cloned())
    }

    fn record_application(
        &self,
        job: &JobId,
        application: &ApplicationId,
    ) -> Result<(), DirectoryError> {
        let mut guard = self.tables.lock().map_err(directory_poisoned)?;
        let posting = guard.jobs.get_mut(job).ok_or(DirectoryError::NotFound)?;
        if !posting.applications.contains(application) {
            posting.applications.push(application.clone());
        }
        Ok(())
    }
}

/// Résumé files on local disk under `<root>/resumes/`.
#[derive(Debug, Clone)]
pub(crate) struct DiskResumeStore {
    namespace: PathBuf,
}

impl DiskResumeStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            namespace: root.into().join(RESUME_NAMESPACE),
        }
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf, ResumeStoreError> {
        Ok(self.namespace.join(validate_file_name(file_name)?))
    }
}

fn unavailable(err: std::io::Error) -> ResumeStoreError {
    ResumeStoreError::Unavailable(err.to_string())
}

impl ResumeStore for DiskResumeStore {
    fn store(&self, original_name: &str, bytes: &[u8]) -> Result<ResumeArtifact, ResumeStoreError> {
        fs::create_dir_all(&self.namespace).map_err(unavailable)?;
        let file_name = format!(
            "{}-{}",
            Uuid::new_v4().simple(),
            sanitize_upload_name(original_name)
        );
        fs::write(self.path_for(&file_name)?, bytes).map_err(unavailable)?;
        Ok(artifact_for(&file_name))
    }

    fn exists(&self, artifact: &ResumeArtifact) -> Result<bool, ResumeStoreError> {
        match self.path_for(artifact.file_name()) {
            Ok(path) => Ok(path.is_file()),
            Err(ResumeStoreError::InvalidName(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn read(&self, file_name: &str) -> Result<Vec<u8>, ResumeStoreError> {
        let path = self.path_for(file_name)?;
        fs::read(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ResumeStoreError::NotFound,
            _ => unavailable(err),
        })
    }

    fn discard(&self, artifact: &ResumeArtifact) -> Result<(), ResumeStoreError> {
        let path = self.path_for(artifact.file_name())?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(unavailable(err)),
        }
    }
}
