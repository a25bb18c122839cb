//! Starts and supervises the deployment handed over by the create flow.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::WebAppBackend;
use crate::dashboard::Dashboard;
use crate::errors::ApiError;
use crate::poller::{PollSettings, PollState, poll_deployment};
use crate::session_store::SessionStore;

const MARKER_PREFIX: &str = "autoDeploy.";

/// Session key marking a deployment whose start was already requested.
pub fn marker_key(deployment_id: &str) -> String {
    format!("{}{}", MARKER_PREFIX, deployment_id)
}

/// Mark `deployment_id` as started. Returns whether it already was.
pub fn claim_marker(store: &dyn SessionStore, deployment_id: &str) -> bool {
    let key = marker_key(deployment_id);
    let already_started = store.get(&key).is_some();
    if !already_started {
        store.set(&key, "1");
    }
    already_started
}

/// Instruction to start and watch a freshly created deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDeployHandoff {
    #[serde(rename = "autoDeployWebAppId")]
    pub web_app_id: String,
    #[serde(rename = "autoDeployDeploymentId")]
    pub deployment_id: String,
}

/// Ephemeral navigation state carrying the handoff to the dashboard. It
/// stays put until a reconciliation completes so a remount sees it again.
#[derive(Debug, Default)]
pub struct NavigationSlot {
    handoff: Mutex<Option<AutoDeployHandoff>>,
}

impl NavigationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<AutoDeployHandoff>> {
        self.handoff.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn replace(&self, handoff: AutoDeployHandoff) {
        *self.slot() = Some(handoff);
    }

    pub fn current(&self) -> Option<AutoDeployHandoff> {
        self.slot().clone()
    }

    pub fn clear(&self) {
        *self.slot() = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Polling ended (terminal, exhausted or errored) and the view was updated
    Completed(PollState),

    /// Starting the deployment failed; the message is shown to the user
    Failed(String),

    /// The owning mount went away; no view state was touched afterwards
    Cancelled,
}

/// Runs at most one reconciliation per mount of the dashboard.
pub struct AutoDeployReconciler<B> {
    dashboard: Arc<Dashboard<B>>,
    store: Arc<dyn SessionStore>,
    navigation: Arc<NavigationSlot>,
    settings: PollSettings,
    mounted: Mutex<Option<CancellationToken>>,
}

impl<B: WebAppBackend> AutoDeployReconciler<B> {
    pub fn new(
        dashboard: Arc<Dashboard<B>>,
        store: Arc<dyn SessionStore>,
        navigation: Arc<NavigationSlot>,
        settings: PollSettings,
    ) -> Self {
        Self {
            dashboard,
            store,
            navigation,
            settings,
            mounted: Mutex::new(None),
        }
    }

    pub fn navigation(&self) -> &Arc<NavigationSlot> {
        &self.navigation
    }

    fn mounted(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.mounted.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mount the dashboard: tear down any previous run and reconcile the
    /// pending handoff, if there is one.
    ///
    /// The session marker is read and set before the run is spawned, so a
    /// remount always sees the marker of the run it replaces.
    pub fn mount(&self) -> Option<JoinHandle<ReconcileOutcome>> {
        let mut mounted = self.mounted();
        if let Some(previous) = mounted.take() {
            previous.cancel();
        }

        let handoff = self.navigation.current()?;
        let already_started = claim_marker(self.store.as_ref(), &handoff.deployment_id);
        let cancel = CancellationToken::new();
        *mounted = Some(cancel.clone());

        let dashboard = self.dashboard.clone();
        let store = self.store.clone();
        let navigation = self.navigation.clone();
        let settings = self.settings;

        Some(tokio::spawn(async move {
            reconcile(
                &dashboard,
                store.as_ref(),
                &navigation,
                handoff,
                already_started,
                settings,
                &cancel,
            )
            .await
        }))
    }

    /// Tear down the current mount; an in-flight run stops writing state and
    /// the auto-deploying indicator is dropped together with its refresher.
    pub fn unmount(&self) {
        if let Some(cancel) = self.mounted().take() {
            cancel.cancel();
            self.dashboard.abandon_auto_deploy();
        }
    }
}

/// Start `handoff.deployment_id` once per session and follow it to the end.
///
/// `already_started` comes from [`claim_marker`]. A cancelled run leaves the
/// marker to whichever run replaced it.
pub async fn reconcile<B: WebAppBackend>(
    dashboard: &Arc<Dashboard<B>>,
    store: &dyn SessionStore,
    navigation: &NavigationSlot,
    handoff: AutoDeployHandoff,
    already_started: bool,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> ReconcileOutcome {
    let AutoDeployHandoff {
        web_app_id,
        deployment_id,
    } = handoff;

    if cancel.is_cancelled() {
        return ReconcileOutcome::Cancelled;
    }
    dashboard.begin_auto_deploy(&web_app_id);
    info!(%web_app_id, %deployment_id, already_started, "auto-deploy started");

    let result = start_and_poll(
        dashboard,
        &web_app_id,
        &deployment_id,
        already_started,
        settings,
        cancel,
    )
    .await;

    if cancel.is_cancelled() {
        info!(%web_app_id, %deployment_id, "auto-deploy cancelled");
        return ReconcileOutcome::Cancelled;
    }
    store.delete(&marker_key(&deployment_id));

    let error = match &result {
        Ok(PollState::Errored { message, .. }) => Some(message.clone()),
        Ok(_) => None,
        Err(e) => Some(e.message()),
    };
    if let Some(message) = &error {
        warn!(%web_app_id, %deployment_id, error = %message, "auto-deploy failed");
    }

    // list badges reflect the outcome
    let list = dashboard.backend().list_webapps().await;
    if cancel.is_cancelled() {
        return ReconcileOutcome::Cancelled;
    }
    dashboard.apply_list(list);

    dashboard.finish_auto_deploy(error);
    navigation.clear();

    match result {
        Ok(state) => {
            info!(%web_app_id, %deployment_id, ?state, "auto-deploy finished");
            ReconcileOutcome::Completed(state)
        }
        Err(e) => ReconcileOutcome::Failed(e.message()),
    }
}

async fn start_and_poll<B: WebAppBackend>(
    dashboard: &Arc<Dashboard<B>>,
    web_app_id: &str,
    deployment_id: &str,
    already_started: bool,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<PollState, ApiError> {
    match dashboard.backend().start_deployment(deployment_id).await {
        Ok(resp) => {
            info!(web_app_id, deployment_id, status = %resp.status, "deployment start accepted")
        }
        // a remount re-sends the start; the backend's conflict is authoritative
        Err(e) if already_started && e.is_not_startable() => {
            info!(web_app_id, deployment_id, "deployment already started")
        }
        Err(e) => return Err(e),
    }

    Ok(poll_deployment(
        dashboard.backend().as_ref(),
        dashboard.as_ref(),
        web_app_id,
        deployment_id,
        settings,
        cancel,
    )
    .await)
}
