//! Bounded status polling for a single deployment.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::WebAppBackend;
use crate::models::{DeploymentStatus, WebAppDetail};

/// Poller settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Maximum number of detail fetches
    pub max_attempts: u32,

    /// Delay between fetches
    pub delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 40,
            delay: Duration::from_millis(2000),
        }
    }
}

/// Poll state. `attempts` counts fetches issued so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the next fetch
    Polling {
        attempts: u32,
        last_status: Option<DeploymentStatus>,
    },

    /// The deployment reached `active` or `failed`
    TerminalReached {
        status: DeploymentStatus,
        attempts: u32,
    },

    /// Budget used up without a terminal status. Not an error.
    Exhausted {
        attempts: u32,
        last_status: Option<DeploymentStatus>,
    },

    /// Stopped by the owner; no further updates are published
    Cancelled { attempts: u32 },

    /// A fetch failed
    Errored { attempts: u32, message: String },
}

impl PollState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, PollState::Polling { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollState::Polling { attempts, .. }
            | PollState::TerminalReached { attempts, .. }
            | PollState::Exhausted { attempts, .. }
            | PollState::Cancelled { attempts }
            | PollState::Errored { attempts, .. } => *attempts,
        }
    }
}

/// Poll event
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A detail fetch resolved; `None` when the deployment was not in it
    Fetched(Option<DeploymentStatus>),

    /// A detail fetch failed
    FetchFailed(String),

    /// The owner cancelled polling
    Cancel,
}

/// Explicit state machine behind [`poll_deployment`].
#[derive(Debug, Clone)]
pub struct PollMachine {
    state: PollState,
    max_attempts: u32,
}

impl PollMachine {
    pub fn new(max_attempts: u32) -> Self {
        let state = if max_attempts == 0 {
            PollState::Exhausted {
                attempts: 0,
                last_status: None,
            }
        } else {
            PollState::Polling {
                attempts: 0,
                last_status: None,
            }
        };
        Self {
            state,
            max_attempts,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn into_state(self) -> PollState {
        self.state
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: PollEvent) -> Result<&PollState, String> {
        let new_state = match (&self.state, event) {
            (PollState::Polling { attempts, .. }, PollEvent::Fetched(status)) => {
                let attempts = attempts + 1;
                match status {
                    Some(status) if status.is_terminal() => {
                        PollState::TerminalReached { status, attempts }
                    }
                    last_status if attempts >= self.max_attempts => PollState::Exhausted {
                        attempts,
                        last_status,
                    },
                    last_status => PollState::Polling {
                        attempts,
                        last_status,
                    },
                }
            }
            (PollState::Polling { attempts, .. }, PollEvent::FetchFailed(message)) => {
                PollState::Errored {
                    attempts: attempts + 1,
                    message,
                }
            }
            (PollState::Polling { attempts, .. }, PollEvent::Cancel) => PollState::Cancelled {
                attempts: *attempts,
            },

            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(&self.state)
    }
}

/// Receives every detail the poller fetches.
///
/// `dispatch` is called right before a fetch is issued and returns a ticket
/// that is handed back to `publish` with the resolved detail.
pub trait DetailSink: Send + Sync {
    fn dispatch(&self, web_app_id: &str) -> u64;
    fn publish(&self, ticket: u64, detail: &WebAppDetail);
}

impl DetailSink for () {
    fn dispatch(&self, _web_app_id: &str) -> u64 {
        0
    }

    fn publish(&self, _ticket: u64, _detail: &WebAppDetail) {}
}

/// Poll `web_app_id` until deployment `deployment_id` reaches a terminal
/// status, the attempt budget runs out, a fetch fails or `cancel` fires.
pub async fn poll_deployment<B, S>(
    backend: &B,
    sink: &S,
    web_app_id: &str,
    deployment_id: &str,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> PollState
where
    B: WebAppBackend + ?Sized,
    S: DetailSink + ?Sized,
{
    let mut machine = PollMachine::new(settings.max_attempts);

    while !machine.state().is_finished() {
        if cancel.is_cancelled() {
            transition(&mut machine, PollEvent::Cancel);
            break;
        }

        let ticket = sink.dispatch(web_app_id);
        let result = backend.get_webapp(web_app_id).await;

        if cancel.is_cancelled() {
            transition(&mut machine, PollEvent::Cancel);
            break;
        }

        let event = match result {
            Ok(detail) => {
                sink.publish(ticket, &detail);
                PollEvent::Fetched(detail.find_deployment(deployment_id).map(|d| d.status()))
            }
            Err(e) => PollEvent::FetchFailed(e.message()),
        };
        transition(&mut machine, event);
        debug!(web_app_id, deployment_id, state = ?machine.state(), "poll attempt finished");

        if machine.state().is_finished() {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                transition(&mut machine, PollEvent::Cancel);
            }
            _ = tokio::time::sleep(settings.delay) => {}
        }
    }

    let state = machine.into_state();
    match &state {
        PollState::Errored { message, .. } => {
            warn!(web_app_id, deployment_id, error = %message, "deployment polling failed")
        }
        PollState::Exhausted { attempts, .. } => {
            info!(web_app_id, deployment_id, attempts, "deployment polling budget exhausted")
        }
        state => debug!(web_app_id, deployment_id, ?state, "deployment polling finished"),
    }
    state
}

fn transition(machine: &mut PollMachine, event: PollEvent) {
    if let Err(e) = machine.process(event) {
        warn!(error = %e, "ignored poll event");
    }
}
