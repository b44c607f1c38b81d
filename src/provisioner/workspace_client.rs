use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::provisioner::credentials::DatabaseCredential;
use crate::provisioner::errors::ProvisionError;
use crate::provisioner::{CatalogRequest, DatabaseInstance, WorkspaceApi};
use crate::types::InstanceName;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CurrentUser {
    #[serde(rename = "userName")]
    user_name: String
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>
}

#[derive(Debug, Serialize)]
struct CreateInstanceBody<'a> {
    name: &'a str,
    capacity: &'a str
}

/// REST client for the workspace database API, authenticated with a bearer token.
pub struct WorkspaceClient {
    http: Client,
    host: String,
    token: String
}

impl WorkspaceClient {
    pub fn new(host: &str, token: &str) -> Result<Self, ProvisionError> {
        if token.trim().is_empty() {
            return Err(ProvisionError::Client("workspace token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| ProvisionError::Client(error.to_string()))?;

        Ok(Self {
            http,
            host: normalize_host(host)?,
            token: token.trim().to_string()
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<Option<T>, ProvisionError> {
        debug!("Workspace request to [{endpoint}]");

        let response = request.bearer_auth(&self.token)
            .send()
            .await
            .map_err(|error| ProvisionError::connectivity(endpoint, error))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisionError::Api {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: api_error_message(&body)
            });
        }

        response.json::<T>()
            .await
            .map(Some)
            .map_err(|error| ProvisionError::decode(endpoint, error))
    }

    async fn send_required<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T, ProvisionError> {
        self.send(endpoint, request).await?.ok_or_else(|| ProvisionError::Api {
            endpoint: endpoint.to_string(),
            status: StatusCode::NOT_FOUND.as_u16(),
            message: "resource not found".to_string()
        })
    }
}

#[async_trait]
impl WorkspaceApi for WorkspaceClient {
    async fn current_user(&self) -> Result<String, ProvisionError> {
        let endpoint = self.endpoint("/api/2.0/preview/scim/v2/Me");
        let user: CurrentUser = self.send_required(&endpoint, self.http.get(&endpoint)).await?;

        Ok(user.user_name)
    }

    async fn get_instance(&self, name: &InstanceName) -> Result<Option<DatabaseInstance>, ProvisionError> {
        let endpoint = self.endpoint(&format!("/api/2.0/database/instances/{name}"));

        self.send(&endpoint, self.http.get(&endpoint)).await
    }

    async fn create_instance(&self, name: &InstanceName, capacity: &str) -> Result<DatabaseInstance, ProvisionError> {
        let endpoint = self.endpoint("/api/2.0/database/instances");
        let body = CreateInstanceBody { name: name.as_str(), capacity };

        self.send_required(&endpoint, self.http.post(&endpoint).json(&body)).await
    }

    async fn generate_credential(&self, name: &InstanceName) -> Result<DatabaseCredential, ProvisionError> {
        let endpoint = self.endpoint("/api/2.0/database/credentials");
        let body = json!({
            "request_id": Uuid::new_v4().to_string(),
            "instance_names": [name.as_str()]
        });

        self.send_required(&endpoint, self.http.post(&endpoint).json(&body)).await
    }

    async fn create_catalog(&self, request: &CatalogRequest) -> Result<(), ProvisionError> {
        let endpoint = self.endpoint("/api/2.0/database/catalogs");
        let _: serde_json::Value = self.send_required(&endpoint, self.http.post(&endpoint).json(request)).await?;

        Ok(())
    }
}

/// Accepts `adb-123.azuredatabricks.net`, `https://host/` and similar forms.
pub(crate) fn normalize_host(host: &str) -> Result<String, ProvisionError> {
    let host = host.trim().trim_end_matches('/');

    if host.is_empty() {
        return Err(ProvisionError::Client("workspace host is empty".to_string()));
    }

    if host.starts_with("https://") || host.starts_with("http://") {
        Ok(host.to_string())
    } else {
        Ok(format!("https://{host}"))
    }
}

pub(crate) fn api_error_message(body: &str) -> String {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();

    match (parsed.error_code, parsed.message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message,
        (Some(code), None) => code,
        (None, None) if body.trim().is_empty() => "empty response body".to_string(),
        (None, None) => body.trim().to_string()
    }
}
