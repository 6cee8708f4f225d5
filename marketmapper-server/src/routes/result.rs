//! Submission analysis

use std::sync::Arc;

use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form, Json};
use marketmapper_core::{RawSubmission, Submission};
use tower_cookies::Cookies;

use super::guard::CurrentUser;
use super::session::{load_session, page_context};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Flash, NewReport, Report, ReportStore, SessionStore, UserStore};
use crate::views;

pub const SUBMISSION_REQUIRED: &str = "Submit a business and location to get a report.";

/// Submission body, accepted as JSON or as an urlencoded form
#[derive(Debug)]
pub struct SubmissionPayload(pub RawSubmission);

#[axum::async_trait]
impl<St> FromRequest<St> for SubmissionPayload
where
    St: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        let raw = if is_json {
            let Json(raw) = Json::<RawSubmission>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            raw
        } else {
            let Form(raw) = Form::<RawSubmission>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            raw
        };
        Ok(Self(raw))
    }
}

/// POST /result
///
/// Validates the submission, runs the analysis and stores the report. The
/// report is written only once the full score has been decoded.
pub async fn submit<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    SubmissionPayload(raw): SubmissionPayload,
) -> Result<Response, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let mut session = load_session(&state, &cookies)?;
    let ctx = page_context(&state, &mut session)?;

    tracing::debug!(user_id = user.id.0, "Received submission");
    match analyze_and_store(&state, &raw).await {
        Ok(report) => Ok(views::result_page(&ctx, &report).into_response()),
        Err(e) => Ok(e.into_page(&ctx)),
    }
}

async fn analyze_and_store<U, S, R>(
    state: &AppState<U, S, R>,
    raw: &RawSubmission,
) -> Result<Report, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let submission = Submission::validate(raw)?;
    let analysis = state.analyzer.analyze(&submission).await?;

    let report = state.report_store.create_report(NewReport {
        business: submission.business,
        location: submission.location,
        latitude: submission.latitude,
        longitude: submission.longitude,
        score: analysis.score,
    })?;
    tracing::info!(report_id = report.id.0, "Stored report");
    Ok(report)
}

/// GET /result
///
/// Results only exist as the response to a submission.
pub async fn show<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let mut session = load_session(&state, &cookies)?;
    session.push_flash(Flash::error(SUBMISSION_REQUIRED));
    state.session_store.save(&session)?;
    Ok(Redirect::to("/"))
}
