use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::collaborators::{Directory, ResumeStore};
use super::domain::{ApplicationId, ApplicationSubmission, ContactDetails, JobId, ResumeUpload};
use super::identity::AuthenticatedUser;
use super::repository::ApplicationRepository;
use super::service::{ApplicationService, ApplicationServiceError, FailureKind};
use super::views::ApplicationView;

/// Room for the text fields and multipart framing on top of the résumé itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const MALFORMED_FORM: &str =
    "request must be a multipart form with fullName, email, phone and an optional cv";

/// Router builder exposing the application lifecycle over HTTP.
pub fn application_router<R, D, S>(service: Arc<ApplicationService<R, D, S>>) -> Router
where
    R: ApplicationRepository + 'static,
    D: Directory + 'static,
    S: ResumeStore + 'static,
{
    let body_limit = service
        .max_resume_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/application/apply/:job_id", post(apply_handler::<R, D, S>))
        .route("/application/get", get(applied_jobs_handler::<R, D, S>))
        .route(
            "/application/:job_id/applicants",
            get(applicants_handler::<R, D, S>),
        )
        .route(
            "/application/status/:application_id/update",
            post(update_status_handler::<R, D, S>),
        )
        .route("/api/resume/:filename", get(resume_handler::<R, D, S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// Multipart fields accepted by the apply endpoint.
#[derive(Debug, Default)]
pub(crate) struct ApplyForm {
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) cv: Option<ResumeUpload>,
}

impl ApplyForm {
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "fullName" => form.full_name = field.text().await?,
                "email" => form.email = field.text().await?,
                "phone" => form.phone = field.text().await?,
                "cv" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen.
                    if !(file_name.is_empty() && bytes.is_empty()) {
                        form.cv = Some(ResumeUpload {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {
                    field.bytes().await?;
                }
            }
        }

        Ok(form)
    }

    pub(crate) fn into_submission(
        self,
        applicant: AuthenticatedUser,
        job: JobId,
    ) -> ApplicationSubmission {
        ApplicationSubmission {
            applicant: applicant.0,
            job,
            contact: ContactDetails {
                full_name: self.full_name,
                email: self.email,
                phone: self.phone,
            },
            resume: self.cv,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

pub(crate) async fn apply_handler<R, D, S>(
    State(service): State<Arc<ApplicationService<R, D, S>>>,
    caller: AuthenticatedUser,
    Path(job_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: Directory + 'static,
    S: ResumeStore + 'static,
{
    let form = match multipart {
        Ok(multipart) => ApplyForm::read(multipart).await,
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "apply request is not a multipart form");
            return failure_response(StatusCode::BAD_REQUEST, MALFORMED_FORM);
        }
    };
    let form = match form {
        Ok(form) => form,
        Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(reason = %err.body_text(), "apply form exceeded the body limit");
            return failure_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!(
                    "uploaded CV exceeds the {} byte limit",
                    service.max_resume_bytes()
                ),
            );
        }
        Err(err) => {
            warn!(reason = %err.body_text(), "apply form could not be read");
            return failure_response(StatusCode::BAD_REQUEST, MALFORMED_FORM);
        }
    };

    let submission = form.into_submission(caller, JobId(job_id));
    match blocking(service, move |service| service.submit(submission)).await {
        Ok(record) => {
            let payload = json!({
                "success": true,
                "message": "Application submitted successfully.",
                "application": ApplicationView::from(record),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn applied_jobs_handler<R, D, S>(
    State(service): State<Arc<ApplicationService<R, D, S>>>,
    AuthenticatedUser(applicant): AuthenticatedUser,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: Directory + 'static,
    S: ResumeStore + 'static,
{
    match blocking(service, move |service| {
        service.applications_for_applicant(&applicant)
    })
    .await
    {
        Ok(applications) => {
            let payload = json!({
                "success": true,
                "applications": applications,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn applicants_handler<R, D, S>(
    State(service): State<Arc<ApplicationService<R, D, S>>>,
    _recruiter: AuthenticatedUser,
    Path(job_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: Directory + 'static,
    S: ResumeStore + 'static,
{
    let job = JobId(job_id);
    match blocking(service, move |service| service.applicants_for_job(&job)).await {
        Ok(roster) => {
            let payload = json!({
                "success": true,
                "job": roster,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn update_status_handler<R, D, S>(
    State(service): State<Arc<ApplicationService<R, D, S>>>,
    _recruiter: AuthenticatedUser,
    Path(application_id): Path<String>,
    request: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: Directory + 'static,
    S: ResumeStore + 'static,
{
    // Absent, non-JSON and mistyped bodies all mean no usable status was sent.
    let requested = match request {
        Ok(Json(request)) => request.status.unwrap_or_default(),
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "status update body rejected");
            return failure_response(StatusCode::BAD_REQUEST, "status is required");
        }
    };

    let id = ApplicationId(application_id);
    match blocking(service, move |service| service.transition(&id, &requested)).await {
        Ok(record) => {
            let payload = json!({
                "success": true,
                "message": "Status updated successfully.",
                "application": record.status_view(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn resume_handler<R, D, S>(
    State(service): State<Arc<ApplicationService<R, D, S>>>,
    _caller: AuthenticatedUser,
    Path(filename): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: Directory + 'static,
    S: ResumeStore + 'static,
{
    let requested = filename.clone();
    match blocking(service, move |service| service.resume(&requested)).await {
        Ok(bytes) => {
            let mut headers = HeaderMap::new();
            if let Ok(value) = HeaderValue::from_str(mime::APPLICATION_PDF.as_ref()) {
                headers.insert(header::CONTENT_TYPE, value);
            }
            if let Ok(value) = HeaderValue::from_str(&format!("inline; filename=\"{filename}\"")) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            (StatusCode::OK, headers, bytes).into_response()
        }
        Err(response) => response,
    }
}

/// Run a service call on the blocking pool; ports may touch disk or a database.
async fn blocking<R, D, S, T, F>(
    service: Arc<ApplicationService<R, D, S>>,
    call: F,
) -> Result<T, Response>
where
    R: ApplicationRepository + 'static,
    D: Directory + 'static,
    S: ResumeStore + 'static,
    T: Send + 'static,
    F: FnOnce(&ApplicationService<R, D, S>) -> Result<T, ApplicationServiceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || call(&service)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(failure(&err)),
        Err(err) => {
            error!(error = %err, "application task did not complete");
            Err(failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
    }
}

/// HTTP status for each failure class.
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::ValidationFailed => StatusCode::BAD_REQUEST,
        FailureKind::Conflict => StatusCode::CONFLICT,
        FailureKind::DeadlinePassed => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: &ApplicationServiceError) -> Response {
    let kind = err.kind();
    if kind == FailureKind::Internal {
        error!(error = %err, "application request failed");
    }
    failure_response(status_for(kind), &err.public_message())
}

pub(crate) fn failure_response(status: StatusCode, message: &str) -> Response {
    let payload = json!({
        "success": false,
        "message": message,
    });
    (status, Json(payload)).into_response()
}
