//! GraphQL-over-HTTP client shared by the Annict and AniList services.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::utils::RateLimitedClient;

#[derive(Serialize)]
struct GraphQlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

/// Posts queries and mutations to one GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    transport: RateLimitedClient,
    endpoint: String,
    service: &'static str,
}

impl GraphQlClient {
    pub fn new(transport: RateLimitedClient, endpoint: impl Into<String>, service: &'static str) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            service,
        }
    }

    /// Name of the remote service, for logs and errors.
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Run a query (or mutation) and decode its `data` member.
    pub async fn query<V, T>(&self, query: &str, variables: V) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let request = self
            .transport
            .client()
            .post(&self.endpoint)
            .json(&GraphQlRequest { query, variables })
            .build()?;

        let response = self.transport.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(AppError::status(
                self.service,
                status.as_u16(),
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }

        let body: GraphQlResponse = serde_json::from_slice(&bytes)?;
        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::graphql(self.service, message));
        }

        match body.data {
            Some(data) if !data.is_null() => Ok(serde_json::from_value(data)?),
            _ => Err(AppError::graphql(self.service, "response carried no data")),
        }
    }
}
