// src/config.rs

//! Access token loading.
//!
//! A service token comes from `access_token` in the config when set, and
//! otherwise from the service's token file in `sync.token_directory`. Token
//! files hold the OAuth token response as saved at authorization time:
//!
//! ```text
//! { "access_token": "...", "token_type": "Bearer", ... }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::ServiceConfig;

#[derive(Deserialize)]
struct TokenFile {
    access_token: String,
}

/// Resolve the access token of one service.
pub fn load_access_token(service: &ServiceConfig, token_directory: &Path) -> Result<String> {
    if let Some(token) = service.access_token.as_deref().map(str::trim) {
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    let path = token_directory.join(&service.token_file);
    let content = std::fs::read_to_string(&path).map_err(|e| {
        AppError::auth(format!("cannot read token file {}: {}", path.display(), e))
    })?;
    let token: TokenFile = serde_json::from_str(&content).map_err(|e| {
        AppError::auth(format!("token file {} is malformed: {}", path.display(), e))
    })?;

    if token.access_token.trim().is_empty() {
        return Err(AppError::auth(format!(
            "token file {} has an empty access_token",
            path.display()
        )));
    }
    log::debug!("Loaded access token from {}", path.display());
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service(access_token: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            endpoint: "https://graphql.anilist.co".into(),
            access_token: access_token.map(String::from),
            token_file: "token-anilist.json".into(),
            page_size: 500,
        }
    }

    #[test]
    fn test_config_token_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("token-anilist.json"), r#"{"access_token":"from-file"}"#).unwrap();

        let token = load_access_token(&service(Some("from-config")), dir.path()).unwrap();
        assert_eq!(token, "from-config");
    }

    #[test]
    fn test_token_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("token-anilist.json"),
            r#"{"access_token":"from-file","token_type":"Bearer","expires_in":31536000}"#,
        )
        .unwrap();

        let token = load_access_token(&service(Some("  ")), dir.path()).unwrap();
        assert_eq!(token, "from-file");
    }

    #[test]
    fn test_missing_token_file() {
        let dir = TempDir::new().unwrap();
        let err = load_access_token(&service(None), dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn test_malformed_token_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("token-anilist.json"), r#"{"token":"x"}"#).unwrap();

        let err = load_access_token(&service(None), dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
