use crate::config::ManagerConfig;
use crate::error::DocumentError;
use crate::models::DocumentRecord;
use reqwest::Url;

/// Builds browser-facing download links for file records.
///
/// The file service reports absolute URLs on its own host; links are rebuilt
/// on the public origin so they pass through the same gateway as the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLinks {
    api_host: String,
    origin: Url,
}

impl DownloadLinks {
    pub fn new(api_host: impl Into<String>, origin: &str) -> Result<Self, DocumentError> {
        let origin = Url::parse(origin).map_err(|e| DocumentError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            api_host: api_host.into(),
            origin,
        })
    }

    pub fn from_config(config: &ManagerConfig) -> Result<Self, DocumentError> {
        Self::new(config.api_host.clone(), &config.public_origin)
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn download_url(&self, record: &DocumentRecord, token: &str) -> Option<Url> {
        let path = record
            .file_url
            .strip_prefix(self.api_host.as_str())
            .unwrap_or(&record.file_url);

        let mut url = match self.origin.join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(file_uuid = %record.uuid, error = %e, "Unusable file URL");
                return None;
            }
        };
        url.query_pairs_mut()
            .append_pair("apiKey", token)
            .append_pair("filename", &record.preferred_file_name);
        Some(url)
    }
}
