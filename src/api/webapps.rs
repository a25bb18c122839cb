use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::AppState;
use crate::models::{
    Branch, CreateWebAppRequest, DeploymentLogEntry, DeploymentStatus, Organization,
    PERSONAL_ORGANIZATION, Repository,
};
use crate::reconciler::AutoDeployHandoff;

use super::bad_gateway;
use super::types::*;

/// Create a web app. A pending first deployment is handed to the dashboard,
/// which starts it and follows it to completion.
pub async fn create_webapp(
    State(state): State<AppState>,
    Json(body): Json<CreateWebAppRequest>,
) -> Result<Json<CreateWebAppResult>, (StatusCode, String)> {
    let created = state
        .client
        .create_webapp(&body)
        .await
        .map_err(bad_gateway("failed to create webapp"))?;
    info!(
        web_app_id = %created.web_app_id,
        deployment_id = %created.deployment_id,
        status = %created.status,
        "webapp created"
    );

    let auto_deploy = DeploymentStatus::parse(&created.status) == DeploymentStatus::Pending;
    if auto_deploy {
        state.navigation().replace(AutoDeployHandoff {
            web_app_id: created.web_app_id.clone(),
            deployment_id: created.deployment_id.clone(),
        });
        state.dashboard.load_list().await;
        state.reconciler.mount();
    }

    Ok(Json(CreateWebAppResult {
        web_app_id: created.web_app_id,
        deployment_id: created.deployment_id,
        status: created.status,
        auto_deploy,
    }))
}

pub async fn deployment_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DeploymentLogEntry>>, (StatusCode, String)> {
    let logs = state
        .client
        .deployment_logs(&id)
        .await
        .map_err(bad_gateway("failed to fetch deployment logs"))?;
    Ok(Json(logs))
}

pub async fn catalog(
    State(state): State<AppState>,
) -> Result<Json<CatalogResponse>, (StatusCode, String)> {
    let (metadata, plans) = futures::try_join!(state.client.metadata(), state.client.plans())
        .map_err(bad_gateway("failed to fetch catalog"))?;
    Ok(Json(CatalogResponse { metadata, plans }))
}

pub async fn github_organizations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Organization>>, (StatusCode, String)> {
    let orgs = state
        .client
        .github_organizations()
        .await
        .map_err(bad_gateway("failed to list github organizations"))?;
    Ok(Json(orgs))
}

pub async fn github_repositories(
    State(state): State<AppState>,
    Query(params): Query<RepositoryParams>,
) -> Result<Json<Vec<Repository>>, (StatusCode, String)> {
    let org = params
        .org
        .as_deref()
        .filter(|org| !org.is_empty() && *org != PERSONAL_ORGANIZATION);
    let repos = state
        .client
        .github_repositories(org)
        .await
        .map_err(bad_gateway("failed to list github repositories"))?;
    Ok(Json(repos))
}

pub async fn github_branches(
    State(state): State<AppState>,
    Query(params): Query<BranchParams>,
) -> Result<Json<Vec<Branch>>, (StatusCode, String)> {
    let branches = state
        .client
        .github_branches(&params.owner, &params.repo)
        .await
        .map_err(bad_gateway("failed to list github branches"))?;
    Ok(Json(branches))
}
