use client_core::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Upload size limit enforced before any transfer starts.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_485_760;

#[derive(Debug, Deserialize, Clone)]
pub struct ManagerConfig {
    /// Root of the file REST API (e.g., http://localhost:8080/api).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Endpoint returning the download API key.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Host prefix the server embeds in `fileUrl`; stripped when building
    /// download links so they resolve against `public_origin`.
    #[serde(default)]
    pub api_host: String,
    #[serde(default = "default_public_origin")]
    pub public_origin: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "default_sort")]
    pub default_sort: String,
    /// Role required for any mutation.
    #[serde(default = "default_write_role")]
    pub write_role: String,
    /// Roles held by the local user (used by the command-line binary).
    #[serde(default)]
    pub granted_roles: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_upload_chunk_size")]
    pub upload_chunk_size: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_token_url() -> String {
    "http://localhost:8080/api/api-key/token".to_string()
}

fn default_public_origin() -> String {
    "http://localhost:4200".to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_limit() -> u32 {
    10
}

fn default_sort() -> String {
    "name".to_string()
}

fn default_write_role() -> String {
    "BASIC_WRITE".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_upload_chunk_size() -> usize {
    64 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            api_host: String::new(),
            public_origin: default_public_origin(),
            max_file_size: default_max_file_size(),
            default_limit: default_limit(),
            default_sort: default_sort(),
            write_role: default_write_role(),
            granted_roles: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_chunk_size: default_upload_chunk_size(),
            log_level: default_log_level(),
        }
    }
}

impl ManagerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let base_path = std::env::current_dir().unwrap_or_default();

        // Check if we're already in the crate directory or need to navigate to it
        let configuration_directory = if base_path.ends_with("document-manager") {
            base_path.join("config")
        } else {
            base_path.join("document-manager").join("config")
        };

        client_core::config::load_layered(&configuration_directory.join("base.yaml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
