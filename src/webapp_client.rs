use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Method, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::errors::{ApiError, FALLBACK_MESSAGE};
use crate::models::{
    Branch, CreateWebAppRequest, CreateWebAppResponse, DeploymentLogEntry, GithubBranchRaw,
    GithubOrgRaw, GithubRepoRaw, Metadata, Organization, Plan, Repository,
    StartDeploymentResponse, WebAppDetail, WebAppListItem,
};

/// Thin wrapper around the webapp backend. Session cookies ride along on
/// every request through the client's cookie jar; nothing is retried.
#[derive(Clone, Debug)]
pub struct WebAppClient {
    base_url: String,
    http: reqwest::Client,
}

impl WebAppClient {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ApiError> {
        Self::with_options(
            base_url,
            None,
            Duration::from_secs(15),
            Duration::from_secs(30),
        )
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::with_options(
            &config.api_base_url,
            config.session_cookie.as_ref(),
            config.connect_timeout(),
            config.request_timeout(),
        )
    }

    pub fn with_options(
        base_url: impl AsRef<str>,
        session_cookie: Option<&SecretString>,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)?;

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = session_cookie {
            jar.add_cookie_str(cookie.expose_secret(), &parsed);
        }

        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn join_url(&self, url: &str) -> String {
        format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, ApiError> {
        tracing::debug!(%method, url, "backend request");
        let mut req = self.http.request(method, self.join_url(url));
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        decode_response(resp).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        self.request::<T>(Method::GET, url, None::<&Value>).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, ApiError> {
        self.request::<T>(Method::POST, url, Some(body)).await
    }

    pub async fn list_webapps(&self) -> Result<Vec<WebAppListItem>, ApiError> {
        self.get("/api/webapps").await
    }

    pub async fn get_webapp(&self, id: &str) -> Result<WebAppDetail, ApiError> {
        let url = format!("/api/webapps/{}", urlencoding::encode(id));
        self.get(&url).await
    }

    /// Create a web app together with its first (pending) deployment.
    pub async fn create_webapp(
        &self,
        req: &CreateWebAppRequest,
    ) -> Result<CreateWebAppResponse, ApiError> {
        self.post("/api/webapps", req).await
    }

    pub async fn start_deployment(
        &self,
        deployment_id: &str,
    ) -> Result<StartDeploymentResponse, ApiError> {
        let url = format!(
            "/api/deployments/{}/start",
            urlencoding::encode(deployment_id)
        );
        self.post(&url, &serde_json::json!({})).await
    }

    pub async fn deployment_logs(
        &self,
        deployment_id: &str,
    ) -> Result<Vec<DeploymentLogEntry>, ApiError> {
        let url = format!(
            "/api/deployments/{}/logs",
            urlencoding::encode(deployment_id)
        );
        self.get(&url).await
    }

    /// Regions, frameworks and database types offered by the backend.
    pub async fn metadata(&self) -> Result<Metadata, ApiError> {
        self.get("/api/metadata").await
    }

    pub async fn plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.get("/api/plans").await
    }

    pub async fn github_organizations(&self) -> Result<Vec<Organization>, ApiError> {
        let orgs: Vec<GithubOrgRaw> = self.get("/git/github/orgs").await?;
        Ok(orgs.into_iter().map(Organization::from).collect())
    }

    /// Repositories of `org`, or of the connected user when `org` is `None`.
    pub async fn github_repositories(
        &self,
        org: Option<&str>,
    ) -> Result<Vec<Repository>, ApiError> {
        let url = match org {
            Some(org) => format!("/git/github/repos?org={}", urlencoding::encode(org)),
            None => "/git/github/repos".to_string(),
        };
        let repos: Vec<GithubRepoRaw> = self.get(&url).await?;
        Ok(repos
            .into_iter()
            .map(|r| Repository::from_raw(r, org))
            .collect())
    }

    pub async fn github_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>, ApiError> {
        let url = format!(
            "/git/github/branches?owner={}&repo={}",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        let branches: Vec<GithubBranchRaw> = self.get(&url).await?;
        Ok(branches
            .into_iter()
            .map(|b| Branch::from_raw(b, owner, repo))
            .collect())
    }
}

/// Normalize a backend response. Bodies wrapped in `{success, message, data}`
/// are unwrapped; anything else is decoded as the payload itself.
async fn decode_response<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let text = resp.text().await?;
    let payload: Option<Value> = if text.trim().is_empty() {
        None
    } else {
        serde_json::from_str(&text).ok()
    };

    if !status.is_success() {
        let message = payload.as_ref().and_then(message_of);
        tracing::warn!(%status, message = message.as_deref().unwrap_or(FALLBACK_MESSAGE), "backend request failed");
        return Err(ApiError::backend(status, message));
    }

    let payload = match payload {
        Some(payload) => payload,
        None if text.trim().is_empty() => Value::Null,
        // 2xx with a body that is not JSON; surface the parse error
        None => serde_json::from_str::<Value>(&text)?,
    };

    match payload {
        Value::Object(mut obj) if obj.get("success").is_some_and(Value::is_boolean) => {
            if obj.get("success") == Some(&Value::Bool(false)) {
                let message =
                    message_of(&Value::Object(obj)).unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
                return Err(ApiError::Rejected { message });
            }
            let data = obj.remove("data").unwrap_or(Value::Null);
            Ok(serde_json::from_value(data)?)
        }
        payload => Ok(serde_json::from_value(payload)?),
    }
}

fn message_of(payload: &Value) -> Option<String> {
    match payload.get("message")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::json;
    use std::collections::HashMap;

    use super::*;

    fn detail_json(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "name": "demo",
            "region": "eu-west",
            "plan": "starter",
            "framework": "nextjs",
            "repoProvider": "github",
            "repoOwner": "acme",
            "repoName": "demo",
            "defaultBranch": "main",
            "createdAt": "2026-01-02T10:00:00Z",
            "updatedAt": "2026-01-02T10:00:00Z",
            "environments": [],
            "deployments": [{
                "id": "d1",
                "webAppId": id,
                "environmentId": "e1",
                "status": status,
                "startedAt": null,
                "finishedAt": null,
                "errorMessage": null,
                "createdAt": "2026-01-02T10:00:00Z"
            }]
        })
    }

    async fn serve(router: Router) -> WebAppClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let cookie = SecretString::from("sid=test-session".to_string());
        WebAppClient::with_options(
            format!("http://{}/", addr),
            Some(&cookie),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn backend() -> Router {
        Router::new()
            .route(
                "/api/webapps",
                get(|| async {
                    let mut item = detail_json("w1", "pending");
                    let obj = item.as_object_mut().unwrap();
                    obj.remove("environments");
                    obj.remove("deployments");
                    Json(json!([item]))
                }),
            )
            .route(
                "/api/webapps/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "missing" {
                        (StatusCode::NOT_FOUND, Json(json!({"message": "WebApp not found"})))
                    } else {
                        (StatusCode::OK, Json(detail_json(&id, "pending")))
                    }
                }),
            )
            .route(
                "/api/deployments/{id}/start",
                post(|Path(id): Path<String>, headers: HeaderMap| async move {
                    let cookie = headers
                        .get("cookie")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    if !cookie.contains("sid=test-session") {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"})));
                    }
                    match id.as_str() {
                        "busy" => (
                            StatusCode::CONFLICT,
                            Json(json!({"message": "Deployment cannot be started from status active"})),
                        ),
                        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
                        _ => (
                            StatusCode::OK,
                            Json(json!({"status": "active", "publicIp": "10.0.0.7"})),
                        ),
                    }
                }),
            )
            .route(
                "/git/github/orgs",
                get(|| async {
                    Json(json!({
                        "success": true,
                        "message": "ok",
                        "data": [{"id": 1, "login": "acme", "avatar_url": "https://a/1.png"}]
                    }))
                }),
            )
            .route(
                "/git/github/repos",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    if q.get("org").map(String::as_str) == Some("locked") {
                        return Json(json!({"success": false, "message": "GitHub not connected", "data": null}));
                    }
                    Json(json!({
                        "success": true,
                        "message": "ok",
                        "data": [{"name": "demo", "full_name": "acme/demo"}]
                    }))
                }),
            )
            .route(
                "/git/github/branches",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let name = format!("{}-{}", q["owner"], q["repo"]);
                    Json(json!({"success": true, "message": "ok", "data": [{"name": name}]}))
                }),
            )
    }

    #[tokio::test]
    async fn lists_and_fetches_webapps() {
        let client = serve(backend()).await;

        let list = client.list_webapps().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "w1");
        assert_eq!(list[0].name, "demo");

        let detail = client.get_webapp("w1").await.unwrap();
        assert_eq!(detail.id(), "w1");
        assert_eq!(detail.deployments[0].id, "d1");
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let client = serve(backend()).await;
        let first = client.get_webapp("w1").await.unwrap();
        let second = client.get_webapp("w1").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn surfaces_backend_message_on_error() {
        let client = serve(backend()).await;
        let err = client.get_webapp("missing").await.unwrap_err();
        assert_eq!(err.message(), "WebApp not found");
        assert!(matches!(err, ApiError::Backend { status, .. } if status == StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn falls_back_to_generic_message() {
        let client = serve(backend()).await;
        let err = client.start_deployment("broken").await.unwrap_err();
        assert_eq!(err.message(), "Request failed");
        assert!(!err.is_not_startable());
    }

    #[tokio::test]
    async fn start_deployment_sends_session_cookie() {
        let client = serve(backend()).await;
        let resp = client.start_deployment("d1").await.unwrap();
        assert_eq!(resp.status, "active");
        assert_eq!(resp.public_ip.as_deref(), Some("10.0.0.7"));

        let err = client.start_deployment("busy").await.unwrap_err();
        assert!(err.is_not_startable());
    }

    #[tokio::test]
    async fn unwraps_envelope_payloads() {
        let client = serve(backend()).await;

        let orgs = client.github_organizations().await.unwrap();
        assert_eq!(orgs[0].id, "acme");
        assert_eq!(orgs[0].avatar.as_deref(), Some("https://a/1.png"));

        let repos = client.github_repositories(Some("acme")).await.unwrap();
        assert_eq!(repos[0].id, "acme/demo");
        assert_eq!(repos[0].organization_id, "acme");

        let branches = client.github_branches("acme", "demo").await.unwrap();
        assert_eq!(branches[0].name, "acme-demo");
        assert_eq!(branches[0].repository_id, "acme/demo");
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_an_error() {
        let client = serve(backend()).await;
        let err = client.github_repositories(Some("locked")).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
        assert_eq!(err.message(), "GitHub not connected");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            WebAppClient::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
