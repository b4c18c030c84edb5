//! API gateway client for the model hosting backend
//!
//! Wraps every backend endpoint behind typed methods, attaching the
//! bearer token from the shared session store and mapping HTTP failures
//! onto [`ApiError`]. A 401 from any endpoint clears the session store
//! before the error is returned, so callers observe a forced logout.

use std::sync::Arc;
use std::time::Duration;

use maquette_core::{Credentials, Model, ModelFormat, ModelId, Viewpoint, ViewpointDraft};
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::session::SessionStore;
use crate::token::decode_claims;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the backend REST API
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize)]
struct SaveViewpointRequest<'a> {
    #[serde(rename = "modelId")]
    model_id: &'a ModelId,
    #[serde(flatten)]
    draft: &'a ViewpointDraft,
}

impl ApiClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, session, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::from_transport)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token (when present), send, and map the status
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let req = match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req.send().await.map_err(ApiError::from_transport)?;
        self.check_status(resp).await
    }

    async fn check_status(&self, resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = error_message(resp).await;
        match status.as_u16() {
            401 => {
                warn!("Backend rejected bearer token, clearing stored session");
                self.session.clear();
                Err(ApiError::AuthExpired)
            }
            403 => Err(ApiError::Forbidden),
            404 => Err(ApiError::NotFound),
            s => Err(ApiError::Api { status: s, message }),
        }
    }

    /// Register a new account; on success the returned token is decoded
    /// and the credentials are stored.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Credentials, ApiError> {
        let body = RegisterRequest {
            username,
            email,
            password,
        };
        let resp = self
            .send(self.http.post(self.url("/register")).json(&body))
            .await?;
        let body: TokenResponse = resp.json().await.map_err(ApiError::from_transport)?;
        self.complete_login(body.token)
    }

    /// Log in; the backend returns only a token, so the user identity is
    /// decoded from its payload client-side.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credentials, ApiError> {
        let body = LoginRequest { email, password };
        let resp = self
            .send(self.http.post(self.url("/login")).json(&body))
            .await?;
        let body: TokenResponse = resp.json().await.map_err(ApiError::from_transport)?;
        self.complete_login(body.token)
    }

    fn complete_login(&self, token: String) -> Result<Credentials, ApiError> {
        let claims = decode_claims(&token)?;
        let creds = Credentials {
            token,
            email: claims.email,
            username: claims.username,
        };
        self.session.store(creds.clone())?;
        info!(user = %creds.username, "Signed in");
        Ok(creds)
    }

    /// Sign out. Client-side only; the backend keeps no session state.
    pub fn logout(&self) {
        self.session.clear();
        info!("Signed out");
    }

    /// List the models owned by the current user
    pub async fn list_models(&self) -> Result<Vec<Model>, ApiError> {
        let resp = self.send(self.http.get(self.url("/user"))).await?;
        resp.json().await.map_err(ApiError::from_transport)
    }

    /// Upload a model file as a multipart form (field `file`).
    /// Unsupported extensions are rejected before any network I/O.
    pub async fn upload_model(&self, file_name: &str, bytes: Vec<u8>) -> Result<Model, ApiError> {
        if ModelFormat::from_name(file_name).is_none() {
            return Err(ApiError::UnsupportedFormat {
                extension: extension_of(file_name),
            });
        }

        debug!(file = %file_name, size = bytes.len(), "Uploading model");
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let resp = self
            .send(self.http.post(self.url("/user/upload")).multipart(form))
            .await?;
        resp.json().await.map_err(ApiError::from_transport)
    }

    /// Delete a model (and, server-side, its viewpoints)
    pub async fn delete_model(&self, id: &ModelId) -> Result<(), ApiError> {
        self.send(self.http.delete(self.url(&format!("/user/{id}"))))
            .await?;
        info!(model = %id, "Deleted model");
        Ok(())
    }

    /// Fetch one model's metadata
    pub async fn model_by_id(&self, id: &ModelId) -> Result<Model, ApiError> {
        let resp = self
            .send(self.http.get(self.url(&format!("/user/{id}"))))
            .await?;
        resp.json().await.map_err(ApiError::from_transport)
    }

    /// Fetch one model's binary payload
    pub async fn model_file(&self, id: &ModelId) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .send(self.http.get(self.url(&format!("/user/{id}/file"))))
            .await?;
        let bytes = resp.bytes().await.map_err(ApiError::from_transport)?;
        Ok(bytes.to_vec())
    }

    /// Persist a viewpoint snapshot; the backend assigns id and timestamp
    pub async fn save_viewpoint(
        &self,
        model_id: &ModelId,
        draft: &ViewpointDraft,
    ) -> Result<Viewpoint, ApiError> {
        draft.validate()?;
        let body = SaveViewpointRequest { model_id, draft };
        let resp = self
            .send(self.http.post(self.url("/scene")).json(&body))
            .await?;
        resp.json().await.map_err(ApiError::from_transport)
    }

    /// Fetch the viewpoints saved for one model
    pub async fn viewpoints(&self, model_id: &ModelId) -> Result<Vec<Viewpoint>, ApiError> {
        let resp = self
            .send(self.http.get(self.url(&format!("/scene/{model_id}"))))
            .await?;
        resp.json().await.map_err(ApiError::from_transport)
    }
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_default()
}

/// Pull a human-readable message out of an error response body.
/// The backend uses `{"error": ...}`; older endpoints use `{"message": ...}`.
async fn error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        for key in ["error", "message"] {
            if let Some(msg) = value.get(key).and_then(|m| m.as_str()) {
                return msg.to_string();
            }
        }
    }
    if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, Path};
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn test_token() -> String {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"email":"ada@example.com","username":"ada"}"#);
        format!("header.{payload}.sig")
    }

    fn client_for(base_url: &str) -> ApiClient {
        let session = Arc::new(SessionStore::in_memory());
        ApiClient::new(base_url, session).unwrap()
    }

    #[tokio::test]
    async fn test_login_stores_credentials() {
        let token = test_token();
        let router = Router::new().route(
            "/login",
            post(move || {
                let token = token.clone();
                async move { Json(serde_json::json!({ "token": token })) }
            }),
        );
        let base = serve(router).await;

        let client = client_for(&base);
        let creds = client.login("ada@example.com", "pw").await.unwrap();
        assert_eq!(creds.username, "ada");
        assert_eq!(creds.email, "ada@example.com");
        assert!(client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let router = Router::new().route(
            "/user",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": "token expired" })),
                )
            }),
        );
        let base = serve(router).await;

        let session = Arc::new(SessionStore::in_memory());
        session
            .store(Credentials {
                token: "stale".to_string(),
                email: "ada@example.com".to_string(),
                username: "ada".to_string(),
            })
            .unwrap();
        let client = ApiClient::new(&base, session.clone()).unwrap();

        let err = client.list_models().await.unwrap_err();
        assert!(err.is_auth_expired());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let router = Router::new().route(
            "/user",
            get(|headers: HeaderMap| async move {
                match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
                    Some("Bearer tok-123") => Json(Vec::<Model>::new()).into_response(),
                    _ => StatusCode::UNAUTHORIZED.into_response(),
                }
            }),
        );
        let base = serve(router).await;

        let session = Arc::new(SessionStore::in_memory());
        session
            .store(Credentials {
                token: "tok-123".to_string(),
                email: "ada@example.com".to_string(),
                username: "ada".to_string(),
            })
            .unwrap();
        let client = ApiClient::new(&base, session).unwrap();
        assert!(client.list_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_extension() {
        // No server: the rejection must happen before any network I/O
        let client = client_for("http://127.0.0.1:1");
        let err = client
            .upload_model("scan.stl", vec![0u8; 16])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::UnsupportedFormat { ref extension } if extension == "stl"
        ));
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_file_field() {
        let router = Router::new().route(
            "/user/upload",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                assert_eq!(field.name(), Some("file"));
                let name = field.file_name().unwrap().to_string();
                let data = field.bytes().await.unwrap();
                assert!(!data.is_empty());
                Json(serde_json::json!({
                    "id": "m-new",
                    "originalName": name,
                    "fileExtension": "obj",
                }))
            }),
        );
        let base = serve(router).await;

        let client = client_for(&base);
        let model = client
            .upload_model("cube.obj", b"v 0 0 0\n".to_vec())
            .await
            .unwrap();
        assert_eq!(model.id.as_str(), "m-new");
        assert_eq!(model.original_name, "cube.obj");
    }

    #[tokio::test]
    async fn test_not_found_mapping() {
        let router = Router::new().route(
            "/user/{id}",
            get(|Path(_id): Path<String>| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({ "message": "no such model" })),
                )
            }),
        );
        let base = serve(router).await;

        let client = client_for(&base);
        let err = client.model_by_id(&ModelId::from("missing")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn test_save_viewpoint_round_trip() {
        let router = Router::new().route(
            "/scene",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["modelId"], "m1");
                assert_eq!(body["name"], "Front");
                assert!(body.get("rotation").is_some());
                Json(serde_json::json!({
                    "id": "vp1",
                    "modelId": "m1",
                    "name": "Front",
                    "cameraPosition": [0.0, 0.0, 5.0],
                    "rotation": [0.0, 0.0, 0.0],
                    "zoom": 1.0,
                    "createdAt": chrono::Utc::now(),
                }))
            }),
        );
        let base = serve(router).await;

        let client = client_for(&base);
        let draft = ViewpointDraft {
            name: "Front".to_string(),
            camera_position: [0.0, 0.0, 5.0],
            target_position: [0.0, 0.0, 0.0],
            zoom: 1.0,
        };
        let saved = client
            .save_viewpoint(&ModelId::from("m1"), &draft)
            .await
            .unwrap();
        assert_eq!(saved.id, "vp1");
        assert_eq!(saved.name, "Front");
    }

    #[tokio::test]
    async fn test_save_viewpoint_validates_draft() {
        let client = client_for("http://127.0.0.1:1");
        let draft = ViewpointDraft {
            name: "  ".to_string(),
            camera_position: [0.0; 3],
            target_position: [0.0; 3],
            zoom: 1.0,
        };
        let err = client
            .save_viewpoint(&ModelId::from("m1"), &draft)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
