use super::{DriveError, DriveProvider, RemoteFile, UploadRequest};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a Google service-account key file the client needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DriveError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DriveError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| DriveError::Credentials(format!("invalid key file: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
    web_content_link: Option<String>,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Google Drive v3 client authenticated as a service account.
pub struct GoogleDriveClient {
    http: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
    api_base: String,
    upload_base: String,
}

impl GoogleDriveClient {
    pub fn new(key: ServiceAccountKey) -> Result<Self, DriveError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| DriveError::Credentials(format!("invalid private key: {}", e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            key,
            encoding_key,
            token: Mutex::new(None),
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    async fn access_token(&self) -> Result<String, DriveError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(token.access_token.clone());
            }
        }

        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| DriveError::Auth(format!("failed to sign assertion: {}", e)))?;

        let res = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DriveError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| DriveError::Decode(e.to_string()))?;

        debug!("Obtained Drive access token valid for {}s", token.expires_in);

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });

        Ok(access_token)
    }
}

#[async_trait]
impl DriveProvider for GoogleDriveClient {
    fn provider_id(&self) -> &'static str {
        "google_drive"
    }

    async fn upload(&self, request: UploadRequest) -> Result<RemoteFile, DriveError> {
        let token = self.access_token().await?;

        let mut file_metadata = json!({
            "name": request.name,
            "parents": [request.parent_folder],
            "mimeType": request.mime_type,
        });
        if let Some(description) = &request.description {
            file_metadata["description"] = Value::String(description.clone());
        }
        if let Some(text) = &request.indexable_text {
            file_metadata["contentHints"] = json!({ "indexableText": text });
        }

        let boundary = format!("drive-image-bot-{}", Uuid::new_v4().simple());
        let body = multipart_related(&boundary, &file_metadata, &request.mime_type, &request.data);

        let res = self
            .http
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(&token)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id,name,webViewLink,webContentLink"),
            ])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error(res).await);
        }

        let file: DriveFile = res
            .json()
            .await
            .map_err(|e| DriveError::Decode(e.to_string()))?;

        let view_link = file
            .web_view_link
            .ok_or_else(|| DriveError::Decode("response has no webViewLink".to_string()))?;

        info!("☁️  Uploaded '{}' to Drive as {}", request.name, file.id);

        Ok(RemoteFile {
            id: file.id,
            view_link,
            content_link: file.web_content_link,
        })
    }

    async fn set_public_read_permission(&self, file_id: &str) -> Result<(), DriveError> {
        let token = self.access_token().await?;

        let res = self
            .http
            .post(format!("{}/files/{}/permissions", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true")])
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error(res).await);
        }
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> Result<(), DriveError> {
        let token = self.access_token().await?;

        let res = self
            .http
            .delete(format!("{}/files/{}", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error(res).await);
        }
        Ok(())
    }
}

fn multipart_related(boundary: &str, metadata: &Value, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {t}\r\n\r\n",
            b = boundary,
            m = metadata,
            t = mime_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

async fn api_error(res: Response) -> DriveError {
    let status = res.status();
    if status == StatusCode::NOT_FOUND {
        return DriveError::NotFound;
    }

    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    DriveError::Api {
        status: status.as_u16(),
        message,
    }
}
