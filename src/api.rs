// API client module: contains a small blocking HTTP client that talks to
// the remote document-intelligence service. It is intentionally small and
// synchronous; the whole flow is one request after another.

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Credentials for the authentication endpoint. Persisted verbatim to
/// `authentication.json` when `store_info` is requested so later runs can
/// skip re-entering them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthInfo {
    pub username: String,
    pub api_key: Option<String>,
    pub password: Option<String>,
}

/// Response from the authentication endpoint. `token` is only present
/// when `success` is true.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
}

/// Acknowledgment from the configuration upload endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfigResponse {
    pub success: bool,
    pub message: String,
}

/// Response from the document upload/index endpoint. `indexed` reports
/// whether vector embeddings were stored for the document; it gates the
/// extraction step. This record is what gets persisted to the upload cache.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub indexed: bool,
    pub message: String,
}

/// Response from the information-extraction endpoint; persisted to the
/// extraction cache on success.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExtractResponse {
    pub success: bool,
    pub answer: Option<String>,
    pub message: String,
}

/// The remote service boundary. The flow talks to this trait rather than
/// the HTTP client directly so tests can substitute a mock service and
/// assert which calls (if any) were made.
pub trait RemoteService {
    fn authenticate(&self, info: &AuthInfo) -> Result<AuthResponse>;
    fn upload_config(&self, token: &str, config_path: &Path) -> Result<ConfigResponse>;
    fn upload_document(
        &self,
        token: &str,
        document_path: &Path,
        index_name: &str,
        overwrite: &str,
    ) -> Result<UploadResponse>;
    fn extract_information(
        &self,
        token: &str,
        query: &str,
        index_name: &str,
    ) -> Result<ExtractResponse>;
}

/// Blocking HTTP client holding a reqwest client and the base URL of the
/// remote service. Tokens are passed per call, mirroring the remote API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create an ApiClient configured from the environment variable
    /// `DOCQUERY_API_URL` or fallback to `http://localhost:8000`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("DOCQUERY_API_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { client, base_url })
    }

    /// Helper to build the Authorization header map for a session token.
    fn auth_headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let val = format!("Bearer {}", token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&val).context("Token is not a valid header value")?,
        );
        Ok(headers)
    }

    /// Open a local file as a multipart part named after the file itself.
    fn file_part(path: &Path) -> Result<multipart::Part> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        let part = multipart::Part::reader(file)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .context("Failed to build multipart part")?;
        Ok(part)
    }
}

impl RemoteService for ApiClient {
    /// POST credentials to /auth and parse the AuthResponse JSON. A
    /// non-2xx status is a transport-level error; application failures
    /// come back as `success: false` in the body.
    fn authenticate(&self, info: &AuthInfo) -> Result<AuthResponse> {
        let url = format!("{}/auth", &self.base_url);
        let res = self
            .client
            .post(&url)
            .json(info)
            .send()
            .context("Failed to send auth request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Authentication failed: {} - {}", status, txt);
        }
        let resp: AuthResponse = res.json().context("Parsing auth response json")?;
        Ok(resp)
    }

    /// Upload a configuration file to /config using multipart/form-data.
    fn upload_config(&self, token: &str, config_path: &Path) -> Result<ConfigResponse> {
        let url = format!("{}/config", &self.base_url);
        let form = multipart::Form::new().part("file", Self::file_part(config_path)?);
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers(token)?)
            .multipart(form)
            .send()
            .context("Failed to send config upload request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Config upload failed: {} - {}", status, txt);
        }
        let resp: ConfigResponse = res.json().context("Parsing config response json")?;
        Ok(resp)
    }

    /// Upload a document to /upload_document for indexing. The index name
    /// and the overwrite option ("yes"/"no") travel as plain form fields
    /// alongside the file part.
    fn upload_document(
        &self,
        token: &str,
        document_path: &Path,
        index_name: &str,
        overwrite: &str,
    ) -> Result<UploadResponse> {
        let url = format!("{}/upload_document", &self.base_url);
        let form = multipart::Form::new()
            .part("file", Self::file_part(document_path)?)
            .text("index_name", index_name.to_string())
            .text("overwrite", overwrite.to_string());
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers(token)?)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Upload failed: {} - {}", status, txt);
        }
        let resp: UploadResponse = res.json().context("Parsing upload response json")?;
        Ok(resp)
    }

    /// POST a query to /extract_information against a named index.
    fn extract_information(
        &self,
        token: &str,
        query: &str,
        index_name: &str,
    ) -> Result<ExtractResponse> {
        let url = format!("{}/extract_information", &self.base_url);
        let body = serde_json::json!({
            "query": query,
            "index_name": index_name,
        });
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers(token)?)
            .json(&body)
            .send()
            .context("Failed to send extraction request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Extraction failed: {} - {}", status, txt);
        }
        let resp: ExtractResponse = res.json().context("Parsing extraction response json")?;
        Ok(resp)
    }
}
