use std::future::Future;

use crate::errors::ApiError;
use crate::models::{StartDeploymentResponse, WebAppDetail, WebAppListItem};
use crate::webapp_client::WebAppClient;

/// The backend calls the dashboard, poller and reconciler depend on.
pub trait WebAppBackend: Send + Sync + 'static {
    fn list_webapps(&self) -> impl Future<Output = Result<Vec<WebAppListItem>, ApiError>> + Send;

    fn get_webapp(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<WebAppDetail, ApiError>> + Send;

    fn start_deployment(
        &self,
        deployment_id: &str,
    ) -> impl Future<Output = Result<StartDeploymentResponse, ApiError>> + Send;
}

impl WebAppBackend for WebAppClient {
    async fn list_webapps(&self) -> Result<Vec<WebAppListItem>, ApiError> {
        WebAppClient::list_webapps(self).await
    }

    async fn get_webapp(&self, id: &str) -> Result<WebAppDetail, ApiError> {
        WebAppClient::get_webapp(self, id).await
    }

    async fn start_deployment(
        &self,
        deployment_id: &str,
    ) -> Result<StartDeploymentResponse, ApiError> {
        WebAppClient::start_deployment(self, deployment_id).await
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory backend for tests.

    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use reqwest::StatusCode;

    use super::*;
    use crate::models::{DeploymentSummary, EnvironmentSummary};

    #[derive(Default)]
    pub struct FakeBackend {
        pub webapps: Mutex<Vec<WebAppListItem>>,
        /// Statuses returned for successive `get_webapp` calls; the last one repeats.
        pub statuses: Mutex<HashMap<String, VecDeque<String>>>,
        pub start_error: Mutex<Option<String>>,
        pub detail_error: Mutex<Option<String>>,
        pub list_calls: Mutex<u32>,
        pub detail_calls: Mutex<Vec<String>>,
        pub start_calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            let fake = Self::default();
            fake.webapps.lock().unwrap().push(list_item("w1"));
            fake
        }

        /// Script the status of deployment `d1` of `webapp_id` for each fetch.
        pub fn script(&self, webapp_id: &str, statuses: &[&str]) {
            self.statuses.lock().unwrap().insert(
                webapp_id.to_string(),
                statuses.iter().map(|s| s.to_string()).collect(),
            );
        }

        pub fn fail_start(&self, message: &str) {
            *self.start_error.lock().unwrap() = Some(message.to_string());
        }

        pub fn fail_detail(&self, message: &str) {
            *self.detail_error.lock().unwrap() = Some(message.to_string());
        }

        pub fn detail_calls(&self) -> usize {
            self.detail_calls.lock().unwrap().len()
        }

        pub fn start_calls(&self) -> Vec<String> {
            self.start_calls.lock().unwrap().clone()
        }

        pub fn list_calls(&self) -> u32 {
            *self.list_calls.lock().unwrap()
        }

        fn next_status(&self, webapp_id: &str) -> String {
            let mut statuses = self.statuses.lock().unwrap();
            match statuses.get_mut(webapp_id) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
                Some(queue) => queue.front().cloned().unwrap_or_default(),
                None => "pending".to_string(),
            }
        }
    }

    pub fn list_item(id: &str) -> WebAppListItem {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap();
        WebAppListItem {
            id: id.to_string(),
            name: "demo".to_string(),
            region: "eu-west".to_string(),
            plan: "starter".to_string(),
            framework: "nextjs".to_string(),
            repo_provider: "github".to_string(),
            repo_owner: "acme".to_string(),
            repo_name: "demo".to_string(),
            default_branch: "main".to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn detail(id: &str, status: &str) -> WebAppDetail {
        let webapp = list_item(id);
        let ts = webapp.created_at;
        WebAppDetail {
            environments: vec![EnvironmentSummary {
                id: "e1".to_string(),
                web_app_id: id.to_string(),
                name: "production".to_string(),
                branch: "main".to_string(),
                port: 3000,
                env_vars: [("NODE_ENV".to_string(), "production".to_string())].into(),
                status: status.to_string(),
                created_at: ts,
                updated_at: ts,
                instance: None,
                deployments: vec![],
            }],
            deployments: vec![DeploymentSummary {
                id: "d1".to_string(),
                web_app_id: id.to_string(),
                environment_id: "e1".to_string(),
                status: status.to_string(),
                started_at: None,
                finished_at: None,
                error_message: None,
                created_at: ts,
            }],
            webapp,
        }
    }

    impl WebAppBackend for FakeBackend {
        async fn list_webapps(&self) -> Result<Vec<WebAppListItem>, ApiError> {
            *self.list_calls.lock().unwrap() += 1;
            Ok(self.webapps.lock().unwrap().clone())
        }

        async fn get_webapp(&self, id: &str) -> Result<WebAppDetail, ApiError> {
            self.detail_calls.lock().unwrap().push(id.to_string());
            if let Some(message) = self.detail_error.lock().unwrap().clone() {
                return Err(ApiError::backend(StatusCode::BAD_GATEWAY, Some(message)));
            }
            Ok(detail(id, &self.next_status(id)))
        }

        async fn start_deployment(
            &self,
            deployment_id: &str,
        ) -> Result<StartDeploymentResponse, ApiError> {
            self.start_calls
                .lock()
                .unwrap()
                .push(deployment_id.to_string());
            if let Some(message) = self.start_error.lock().unwrap().clone() {
                return Err(ApiError::backend(StatusCode::CONFLICT, Some(message)));
            }
            Ok(StartDeploymentResponse {
                status: "active".to_string(),
                public_ip: Some("10.0.0.7".to_string()),
            })
        }
    }
}
