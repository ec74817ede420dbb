//! Shared test helpers.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actix_web::{App, dev::ServiceResponse, test, web};
use akuit_lib::AppState;
use akuit_lib::config::{Config, EnvKeys, Environment, ModelSettings};
use akuit_lib::db::DbPool;
use akuit_lib::services::gateway::{GatewayError, InlineImage};
use akuit_lib::services::{ModelGateway, Provider, Storage};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tempfile::TempDir;

pub const BOUNDARY: &str = "akuit-test-boundary";
pub const GEMINI_KEY: &str = "AIzaSyTestKeyForIntegrationTests000000";

/// One recorded gateway call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub provider: Provider,
    pub key: String,
    pub vision: bool,
}

/// Gateway that replays queued responses and records every call.
///
/// An empty queue answers with a transport error, which reads like a timeout.
#[derive(Default)]
pub struct ScriptedGateway {
    vision: Mutex<VecDeque<Result<String, GatewayError>>>,
    text: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn push_vision(&self, response: Result<String, GatewayError>) {
        self.vision.lock().unwrap().push_back(response);
    }

    pub fn push_text(&self, response: Result<String, GatewayError>) {
        self.text.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, provider: Provider, key: &SecretString, vision: bool) {
        self.calls.lock().unwrap().push(RecordedCall {
            provider,
            key: key.expose_secret().to_string(),
            vision,
        });
    }
}

pub fn timeout(provider: Provider) -> GatewayError {
    GatewayError::Transport {
        provider,
        message: "operation timed out".to_string(),
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete_text(
        &self,
        provider: Provider,
        api_key: &SecretString,
        _prompt: &str,
    ) -> Result<String, GatewayError> {
        self.record(provider, api_key, false);
        self.text
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(timeout(provider)))
    }

    async fn complete_vision(
        &self,
        provider: Provider,
        api_key: &SecretString,
        _prompt: &str,
        _image: &InlineImage,
    ) -> Result<String, GatewayError> {
        self.record(provider, api_key, true);
        self.vision
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(timeout(provider)))
    }
}

/// Everything a test needs to drive the API.
pub struct TestEnv {
    pub state: AppState,
    pub gateway: Arc<ScriptedGateway>,
    pub upload_dir: TempDir,
}

impl TestEnv {
    pub fn upload_root(&self) -> PathBuf {
        self.upload_dir.path().to_path_buf()
    }
}

pub fn test_config(upload_dir: PathBuf) -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        upload_dir,
        static_dir: None,
        max_upload_size: 1024 * 1024,
        max_files_per_request: 5,
        encryption_key: "integration-test-passphrase".to_string(),
        model: ModelSettings::default(),
    }
}

/// Fresh database, upload directory and gateway.
pub async fn setup(env_keys: EnvKeys) -> TestEnv {
    let upload_dir = TempDir::new().unwrap();
    let config = test_config(upload_dir.path().to_path_buf());

    let pool = DbPool::connect(&config.database_url, 1).await.unwrap();
    pool.run_migrations().await.unwrap();

    let storage = Storage::new(&config.upload_dir).unwrap();
    let gateway = Arc::new(ScriptedGateway::default());
    let dyn_gateway: Arc<dyn ModelGateway> = gateway.clone();

    let state = AppState::new(config, pool, storage, dyn_gateway, env_keys);
    TestEnv {
        state,
        gateway,
        upload_dir,
    }
}

/// Setup with no environment provider keys.
pub async fn setup_default() -> TestEnv {
    setup(EnvKeys::default()).await
}

/// Build the API service for a test environment.
pub async fn init_app(
    env: &TestEnv,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let state = env.state.clone();
    test::init_service(
        App::new()
            .configure(|cfg| state.register(cfg))
            .service(web::scope("/api/v1").configure(akuit_lib::api::configure_api)),
    )
    .await
}

/// Encode files as a multipart/form-data body.
pub fn multipart_body(field: &str, files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content_type, data) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Build an upload request, optionally carrying a model key header.
pub fn upload_request(files: &[(&str, &str, &[u8])], key: Option<&str>) -> test::TestRequest {
    let mut req = test::TestRequest::post()
        .uri("/api/v1/upload")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body("files", files));
    if let Some(key) = key {
        req = req.insert_header(("X-Model-Api-Key", key));
    }
    req
}

/// A small solid grey PNG.
pub fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(32, 32, image::Rgb([150, 150, 150]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Upload one receipt with canned model answers and return the response body.
pub async fn upload_receipt<S>(app: &S, env: &TestEnv, filename: &str) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    env.gateway.push_vision(Ok(
        r#"{"documentType":"receipt","organization":"Corner Cafe","totalAmount":"$42.50","extractedText":"Corner Cafe receipt total 42.50"}"#
            .to_string(),
    ));
    env.gateway.push_text(Ok(
        r#"[{"severity":"warning","title":"No signature","description":"The receipt is not signed","confidence":0.7}]"#
            .to_string(),
    ));

    let png = sample_png();
    let req = upload_request(&[(filename, "image/png", &png)], Some(GEMINI_KEY)).to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200);
    test::read_body_json(resp).await
}
