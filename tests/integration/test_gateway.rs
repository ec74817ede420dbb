//! HTTP gateway against a local scripted upstream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use akuit_lib::config::{ModelSettings, ProviderEndpoint};
use akuit_lib::services::gateway::GatewayError;
use akuit_lib::services::{HttpGateway, ModelGateway, Provider};
use secrecy::SecretString;

const COMPLETION: &str = r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#;

/// Replies served in order; every request is counted.
#[derive(Clone, Default)]
struct Upstream {
    replies: Arc<Mutex<VecDeque<(u16, String)>>>,
    hits: Arc<AtomicUsize>,
}

impl Upstream {
    fn with_replies(replies: &[(u16, &str)]) -> Self {
        let upstream = Self::default();
        upstream
            .replies
            .lock()
            .unwrap()
            .extend(replies.iter().map(|(s, b)| (*s, b.to_string())));
        upstream
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn scripted_reply(upstream: web::Data<Upstream>) -> HttpResponse {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = upstream
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((500, "{}".to_string()));
    HttpResponse::build(StatusCode::from_u16(status).unwrap())
        .content_type("application/json")
        .body(body)
}

/// Start the upstream and return a gateway pointed at it.
fn start(upstream: &Upstream, max_retries: u32) -> HttpGateway {
    let data = upstream.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(data.clone()))
            .default_service(web::to(scripted_reply))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());

    let mut settings = ModelSettings {
        default_provider: Provider::OpenAi,
        timeout_secs: 10,
        max_retries,
        initial_backoff_ms: 1,
        ..ModelSettings::default()
    };
    settings.openai = ProviderEndpoint {
        base_url: format!("http://{}", addr),
        model: "gpt-test".to_string(),
    };
    HttpGateway::new(settings).unwrap()
}

fn key() -> SecretString {
    SecretString::from("sk-test-key-for-the-gateway".to_string())
}

#[actix_rt::test]
async fn test_rate_limit_is_retried_until_success() {
    let upstream = Upstream::with_replies(&[(429, "{}"), (429, "{}"), (200, COMPLETION)]);
    let gateway = start(&upstream, 3);

    let text = gateway
        .complete_text(Provider::OpenAi, &key(), "check this")
        .await
        .unwrap();
    assert_eq!(text, "[]");
    assert_eq!(upstream.hits(), 3);
}

#[actix_rt::test]
async fn test_rate_limit_gives_up_after_max_retries() {
    let upstream = Upstream::with_replies(&[
        (429, "{}"),
        (429, "{}"),
        (429, "{}"),
        (200, COMPLETION),
    ]);
    let gateway = start(&upstream, 2);

    let err = gateway
        .complete_text(Provider::OpenAi, &key(), "check this")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::RateLimited {
            provider: Provider::OpenAi,
            ..
        }
    ));
    // The first attempt plus two retries
    assert_eq!(upstream.hits(), 3);
}

#[actix_rt::test]
async fn test_server_error_fails_without_retry() {
    let upstream = Upstream::with_replies(&[
        (500, r#"{"error":{"message":"model overloaded","type":"server_error"}}"#),
        (200, COMPLETION),
    ]);
    let gateway = start(&upstream, 3);

    let err = gateway
        .complete_text(Provider::OpenAi, &key(), "check this")
        .await
        .unwrap_err();
    match err {
        GatewayError::Upstream {
            provider,
            status,
            message,
        } => {
            assert_eq!(provider, Provider::OpenAi);
            assert_eq!(status, 500);
            assert_eq!(message, "model overloaded");
        }
        other => panic!("expected an upstream error, got {:?}", other),
    }
    assert_eq!(upstream.hits(), 1);
}
