//! Dashboard actions. Every handler answers with the refreshed view; backend
//! failures are part of the view rather than HTTP errors.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::AppState;
use crate::dashboard::DashboardView;

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.dashboard.view())
}

pub async fn reload_webapps(State(state): State<AppState>) -> Json<DashboardView> {
    state.dashboard.load_list().await;
    Json(state.dashboard.view())
}

pub async fn select_webapp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<DashboardView> {
    state.dashboard.select(&id).await;
    Json(state.dashboard.view())
}

pub async fn close_detail(State(state): State<AppState>) -> Json<DashboardView> {
    state.dashboard.close_detail();
    Json(state.dashboard.view())
}

pub async fn retry_detail(State(state): State<AppState>) -> Json<DashboardView> {
    state.dashboard.retry_detail().await;
    Json(state.dashboard.view())
}

pub async fn start_deployment(State(state): State<AppState>) -> Json<DashboardView> {
    state.dashboard.start_current_deployment().await;
    Json(state.dashboard.view())
}

pub async fn toggle_deployments(State(state): State<AppState>) -> Json<DashboardView> {
    state.dashboard.toggle_deployments();
    Json(state.dashboard.view())
}

pub async fn toggle_env_vars(
    State(state): State<AppState>,
    Path(env_id): Path<String>,
) -> Json<DashboardView> {
    state.dashboard.toggle_env_vars(&env_id);
    Json(state.dashboard.view())
}

pub async fn toggle_public_ip(
    State(state): State<AppState>,
    Path(env_id): Path<String>,
) -> Json<DashboardView> {
    state.dashboard.toggle_public_ip(&env_id);
    Json(state.dashboard.view())
}
