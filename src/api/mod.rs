pub mod dashboard;
pub mod types;
pub mod webapps;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    routing::{delete, get, post, put},
};

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::errors::ApiError;
use crate::poller::PollSettings;
use crate::reconciler::{AutoDeployReconciler, NavigationSlot};
use crate::session_store::{MemorySessionStore, SessionStore};
use crate::webapp_client::WebAppClient;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<WebAppClient>,
    pub dashboard: Arc<Dashboard<WebAppClient>>,
    pub reconciler: Arc<AutoDeployReconciler<WebAppClient>>,
}

impl AppState {
    pub fn new(client: WebAppClient, config: &Config) -> Self {
        Self::with_store(
            client,
            Arc::new(MemorySessionStore::new()),
            config.detail_refresh_interval(),
            config.poll_settings(),
        )
    }

    pub fn with_store(
        client: WebAppClient,
        store: Arc<dyn SessionStore>,
        refresh_interval: Duration,
        poll_settings: PollSettings,
    ) -> Self {
        let client = Arc::new(client);
        let dashboard = Dashboard::new(client.clone(), refresh_interval);
        let reconciler = AutoDeployReconciler::new(
            dashboard.clone(),
            store,
            Arc::new(NavigationSlot::new()),
            poll_settings,
        );
        Self {
            client,
            dashboard,
            reconciler: Arc::new(reconciler),
        }
    }

    pub fn navigation(&self) -> &Arc<NavigationSlot> {
        self.reconciler.navigation()
    }
}

/// Backend failures surface as 502 carrying the backend's message.
pub(crate) fn bad_gateway(context: &str) -> impl Fn(ApiError) -> (StatusCode, String) + '_ {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        (StatusCode::BAD_GATEWAY, e.message())
    }
}

/// Create router for all API endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/dashboard/webapps/reload", post(dashboard::reload_webapps))
        .route("/dashboard/selection/{id}", put(dashboard::select_webapp))
        .route("/dashboard/selection", delete(dashboard::close_detail))
        .route("/dashboard/detail/retry", post(dashboard::retry_detail))
        .route("/dashboard/detail/deploy", post(dashboard::start_deployment))
        .route(
            "/dashboard/detail/deployments/toggle",
            post(dashboard::toggle_deployments),
        )
        .route(
            "/dashboard/detail/environments/{env_id}/env-vars/toggle",
            post(dashboard::toggle_env_vars),
        )
        .route(
            "/dashboard/detail/environments/{env_id}/public-ip/toggle",
            post(dashboard::toggle_public_ip),
        )
        .route("/webapps", post(webapps::create_webapp))
        .route("/deployments/{id}/logs", get(webapps::deployment_logs))
        .route("/catalog", get(webapps::catalog))
        .route("/github/orgs", get(webapps::github_organizations))
        .route("/github/repos", get(webapps::github_repositories))
        .route("/github/branches", get(webapps::github_branches))
}
