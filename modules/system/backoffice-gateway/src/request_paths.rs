//! Classification of request paths for the preview and anti-forgery stages.

use crate::config::PathsConfig;

/// Path policy built once from [`PathsConfig`].
#[derive(Debug, Clone)]
pub struct RequestPathPolicy {
    backoffice_path: String,
    server_side_extensions: Vec<String>,
}

impl RequestPathPolicy {
    #[must_use]
    pub fn from_config(cfg: &PathsConfig) -> Self {
        let trimmed = cfg.backoffice_path.trim().trim_end_matches('/');
        let backoffice_path = if trimmed.starts_with('/') {
            trimmed.to_ascii_lowercase()
        } else {
            format!("/{}", trimmed.to_ascii_lowercase())
        };

        Self {
            backoffice_path,
            server_side_extensions: cfg
                .server_side_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// A request for a static client-side asset: the last path segment has a
    /// file extension that is not served dynamically.
    #[must_use]
    pub fn is_client_side_request(&self, path: &str) -> bool {
        let last_segment = path.rsplit('/').next().unwrap_or_default();
        let Some((stem, ext)) = last_segment.rsplit_once('.') else {
            return false;
        };
        if stem.is_empty() || ext.is_empty() {
            return false;
        }
        !self
            .server_side_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// A request targeting the back-office surface itself.
    #[must_use]
    pub fn is_back_office_request(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        match path.strip_prefix(&self.backoffice_path) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
