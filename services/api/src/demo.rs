use crate::infra::{
    DirectorySeed, DiskResumeStore, InMemoryApplicationRepository, InMemoryDirectory,
    LifecycleService,
};
use chrono::Utc;
use clap::Args;
use job_board::applications::{
    ApplicationRecord, ApplicationServiceError, ApplicationSubmission, ContactDetails, Directory,
    JobId, LifecycleConfig, ResumeSource, ResumeStore, ResumeUpload, UserId,
};
use job_board::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

const OPEN_JOB: &str = "job-rust-backend";
const CLOSED_JOB: &str = "job-data-intern";
const PRIYA: &str = "seeker-priya";
const ARJUN: &str = "seeker-arjun";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Directory résumé files are written to. Defaults to a folder under the system temp dir.
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let upload_dir = args
        .upload_dir
        .unwrap_or_else(|| std::env::temp_dir().join("job-board-demo"));

    let directory = Arc::new(InMemoryDirectory::from_seed(DirectorySeed::sample(
        Utc::now(),
    )));
    let resumes = Arc::new(DiskResumeStore::new(&upload_dir));
    let service = LifecycleService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        directory.clone(),
        resumes.clone(),
        LifecycleConfig::default(),
    );

    println!("Job board application lifecycle demo");
    println!("Résumé storage: {}", upload_dir.display());

    println!("\n1. Priya applies with an uploaded CV");
    let priya = report(service.submit(submission(
        PRIYA,
        OPEN_JOB,
        Some(ResumeUpload {
            file_name: "Priya Nair CV.pdf".to_string(),
            bytes: b"%PDF-1.7 demo resume".to_vec(),
        }),
    )));

    println!("\n2. Priya applies to the same job again");
    report(service.submit(submission(PRIYA, OPEN_JOB, None)));

    println!("\n3. Arjun applies with only a linked CV");
    report(service.submit(submission(ARJUN, OPEN_JOB, None)));

    println!("\n4. Arjun uploads a profile résumé and applies with it");
    let artifact = resumes
        .store("arjun-profile.docx", b"PK demo resume")
        .map_err(ApplicationServiceError::from)?;
    if let Some(mut profile) = directory
        .applicant(&UserId::from(ARJUN))
        .map_err(ApplicationServiceError::from)?
    {
        profile.resume = ResumeSource::StoredFile(artifact.0.clone());
        directory
            .upsert_applicant(profile)
            .map_err(ApplicationServiceError::from)?;
    }
    let arjun = report(service.submit(submission(ARJUN, OPEN_JOB, None)));

    println!("\n5. Priya applies to a job whose deadline has passed");
    report(service.submit(submission(
        PRIYA,
        CLOSED_JOB,
        Some(ResumeUpload {
            file_name: "Priya Nair CV.pdf".to_string(),
            bytes: b"%PDF-1.7 demo resume".to_vec(),
        }),
    )));

    println!("\n6. Recruiter roster for {OPEN_JOB}");
    let roster = service.applicants_for_job(&JobId::from(OPEN_JOB))?;
    println!(
        "  {} at {} (deadline {})",
        roster.job.title,
        roster
            .job
            .company
            .as_ref()
            .map(|company| company.name.as_str())
            .unwrap_or("unknown company"),
        roster.job.deadline.format("%Y-%m-%d")
    );
    for entry in &roster.applications {
        let name = entry
            .applicant
            .as_ref()
            .map(|applicant| applicant.full_name.as_str())
            .unwrap_or("unknown applicant");
        println!(
            "  - {} {} [{}] résumé {}",
            entry.application.record.id,
            name,
            entry.application.record.status,
            entry.application.resume_url
        );
    }

    println!("\n7. Recruiter decisions");
    if let Some(record) = &priya {
        report(service.transition(&record.id, "Accepted"));
        println!("  Repeating the decision:");
        report(service.transition(&record.id, "accepted"));
        println!("  Trying to reverse it:");
        report(service.transition(&record.id, "rejected"));
    }
    if let Some(record) = &arjun {
        println!("  Unrecognised status:");
        report(service.transition(&record.id, "shortlisted"));
        report(service.transition(&record.id, "rejected"));
    }

    println!("\n8. Priya's applied jobs");
    for view in service.applications_for_applicant(&UserId::from(PRIYA))? {
        let title = view
            .job
            .as_ref()
            .map(|job| job.title.as_str())
            .unwrap_or("job no longer listed");
        println!(
            "  - {} for {} [{}] submitted {}",
            view.application.record.id,
            title,
            view.application.record.status,
            view.application.record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    if let Some(record) = &priya {
        let bytes = service.resume(record.resume.file_name())?;
        println!(
            "\nDownloaded {} ({} bytes)",
            record.resume.download_path(),
            bytes.len()
        );
    }

    Ok(())
}

fn submission(applicant: &str, job: &str, resume: Option<ResumeUpload>) -> ApplicationSubmission {
    let (full_name, email) = match applicant {
        PRIYA => ("Priya Nair", "priya@example.com"),
        _ => ("Arjun Mehta", "arjun@example.com"),
    };
    ApplicationSubmission {
        applicant: UserId::from(applicant),
        job: JobId::from(job),
        contact: ContactDetails {
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: "+91 98450 00000".to_string(),
        },
        resume,
    }
}

fn report(
    outcome: Result<ApplicationRecord, ApplicationServiceError>,
) -> Option<ApplicationRecord> {
    match outcome {
        Ok(record) => {
            println!(
                "  {} is {} (résumé {})",
                record.id, record.status, record.resume.0
            );
            Some(record)
        }
        Err(err) => {
            println!("  Rejected ({:?}): {}", err.kind(), err.public_message());
            None
        }
    }
}
