use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::utils::IsTransient;
use super::model::Department;

// ============================================================================
// Department Client - external department lookup
// ============================================================================
//
// `Ok(None)` means the department service answered and the department does
// not exist. Every `Err` means the call itself failed; only those feed the
// retry loop and the circuit breaker.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DepartmentClientError {
    #[error("Department service unreachable: {0}")]
    Transport(String),

    #[error("Department service returned status {0}")]
    Status(u16),

    #[error("Invalid department payload: {0}")]
    Decode(String),
}

impl IsTransient for DepartmentClientError {
    fn is_transient(&self) -> bool {
        match self {
            DepartmentClientError::Transport(_) => true,
            DepartmentClientError::Status(code) => *code >= 500 || *code == 429,
            DepartmentClientError::Decode(_) => false,
        }
    }
}

#[async_trait]
pub trait DepartmentClient: Send + Sync {
    async fn get_department_by_id(&self, id: i64) -> Result<Option<Department>, DepartmentClientError>;
}

/// JSON over HTTP: `GET {base_url}/departments/{id}`
pub struct HttpDepartmentClient {
    http_client: Client,
    base_url: String,
}

impl HttpDepartmentClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn department_url(&self, id: i64) -> String {
        format!("{}/departments/{}", self.base_url, id)
    }
}

#[async_trait]
impl DepartmentClient for HttpDepartmentClient {
    async fn get_department_by_id(&self, id: i64) -> Result<Option<Department>, DepartmentClientError> {
        let url = self.department_url(id);
        tracing::debug!(department_id = id, url = %url, "Fetching department");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| DepartmentClientError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<Department>()
                .await
                .map(Some)
                .map_err(|e| DepartmentClientError::Decode(e.to_string())),
            status => Err(DepartmentClientError::Status(status.as_u16())),
        }
    }
}
