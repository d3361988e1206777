use crate::types::run::{RunParams, RunStatus};
use crate::{LeadsError, router::LeadsState};
use axum::{
    Json,
    extract::{Query, State},
    http::Method,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQuery {
    pub instance_id: Option<String>,
    pub email: Option<String>,
    pub since: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: RunStatus,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Any other path: `instanceId` looks a run up, `email` starts one.
pub async fn workflow_fallback(
    State(state): State<LeadsState>,
    method: Method,
    Query(query): Query<RunQuery>,
) -> Result<Response, LeadsError> {
    if method != Method::GET {
        return Err(LeadsError::UnsupportedRequest);
    }

    if let Some(instance_id) = present(query.instance_id) {
        let id = Uuid::parse_str(&instance_id)
            .map_err(|_| LeadsError::RunNotFound(instance_id.clone()))?;
        let status = state
            .runs
            .get(id)
            .await?
            .ok_or(LeadsError::RunNotFound(instance_id))?;
        return Ok(Json(StatusResponse { status }).into_response());
    }

    let Some(user_email) = present(query.email) else {
        return Err(LeadsError::MissingParameter("email"));
    };

    let snapshot = state
        .runs
        .create(RunParams {
            user_email,
            since: present(query.since),
        })
        .await?;
    info!(run_id = %snapshot.id, "run created from request");
    Ok(Json(snapshot).into_response())
}
