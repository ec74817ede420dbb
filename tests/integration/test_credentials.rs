//! Stored credential management and its use during intake.

use std::sync::Arc;

use actix_web::{App, test, web};
use akuit_lib::AppState;
use akuit_lib::config::EnvKeys;
use akuit_lib::services::{ModelGateway, Storage};
use serde_json::{Value, json};
use uuid::Uuid;

use super::helpers::{
    GEMINI_KEY, init_app, sample_png, setup_default, test_config, upload_request,
};

const OPENAI_KEY: &str = "sk-proj-stored-openai-key-1234";

async fn create<S>(app: &S, body: Value) -> actix_web::dev::ServiceResponse
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/credentials")
        .set_json(body)
        .to_request();
    test::call_service(app, req).await
}

#[actix_rt::test]
async fn test_create_and_list_masked() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let resp = create(
        &app,
        json!({"provider": "gemini", "label": "Team key", "key": GEMINI_KEY}),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["credential"]["provider"], "gemini");
    assert_eq!(body["credential"]["masked_key"], "AIza...0000");
    assert_eq!(body["credential"]["is_valid"], true);
    assert_eq!(body["credential"]["is_active"], false);

    let req = test::TestRequest::get().uri("/api/v1/credentials").to_request();
    let resp = test::call_service(&app, req).await;
    let raw = test::read_body(resp).await;
    let text = String::from_utf8(raw.to_vec()).unwrap();
    assert!(!text.contains(GEMINI_KEY));

    let list: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(list["credentials"].as_array().unwrap().len(), 1);
    assert_eq!(list["credentials"][0]["label"], "Team key");
    assert!(list["env_providers"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_malformed_key_rejected() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let resp = create(
        &app,
        json!({"provider": "gemini", "label": "Bad", "key": "sk-this-is-not-gemini-at-all"}),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let resp = create(
        &app,
        json!({"provider": "openai", "label": "Spaces", "key": "sk-has some spaces in it ok"}),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::get().uri("/api/v1/credentials").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert!(list["credentials"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_activate_switches_active_credential() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let first: Value = test::read_body_json(
        create(
            &app,
            json!({"provider": "gemini", "label": "First", "key": GEMINI_KEY, "activate": true}),
        )
        .await,
    )
    .await;
    let second: Value = test::read_body_json(
        create(
            &app,
            json!({"provider": "openai", "label": "Second", "key": OPENAI_KEY}),
        )
        .await,
    )
    .await;
    assert_eq!(first["credential"]["is_active"], true);

    let second_id = second["credential"]["id"].as_str().unwrap();
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/credentials/{}/activate", second_id))
        .to_request();
    let activated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(activated["credential"]["is_active"], true);

    let req = test::TestRequest::get().uri("/api/v1/credentials").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    let active: Vec<&Value> = list["credentials"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["is_active"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"], second_id);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/credentials/{}/activate", Uuid::now_v7()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_delete_credential() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let created: Value = test::read_body_json(
        create(
            &app,
            json!({"provider": "gemini", "label": "Temp", "key": GEMINI_KEY}),
        )
        .await,
    )
    .await;
    let id = created["credential"]["id"].as_str().unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/credentials/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/credentials/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_active_stored_key_used_for_intake() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    create(
        &app,
        json!({"provider": "openai", "label": "Stored", "key": OPENAI_KEY, "activate": true}),
    )
    .await;

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let calls = env.gateway.calls();
    assert_eq!(calls[0].key, OPENAI_KEY);

    let req = test::TestRequest::get().uri("/api/v1/credentials").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert!(!list["credentials"][0]["last_used_at"].is_null());
}

#[actix_rt::test]
async fn test_stored_key_ignored_for_other_provider() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    create(
        &app,
        json!({"provider": "openai", "label": "Stored", "key": OPENAI_KEY, "activate": true}),
    )
    .await;

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], None)
        .insert_header(("X-Model-Provider", "gemini"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    assert!(env.gateway.calls().is_empty());
}

#[actix_rt::test]
async fn test_undecryptable_stored_key_is_a_credential_error() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    create(
        &app,
        json!({"provider": "gemini", "label": "Old", "key": GEMINI_KEY, "activate": true}),
    )
    .await;

    // Same database, different encryption passphrase
    let mut config = test_config(env.upload_root());
    config.encryption_key = "a-rotated-passphrase".to_string();
    let gateway: Arc<dyn ModelGateway> = env.gateway.clone();
    let rotated = AppState::new(
        config,
        env.state.pool.get_ref().clone(),
        Storage::new(env.upload_root()).unwrap(),
        gateway,
        EnvKeys::default(),
    );
    let rotated_app = test::init_service(
        App::new()
            .configure(|cfg| rotated.register(cfg))
            .service(web::scope("/api/v1").configure(akuit_lib::api::configure_api)),
    )
    .await;

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], None).to_request();
    let resp = test::call_service(&rotated_app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "MISSING_CREDENTIAL");
    assert!(body["message"].as_str().unwrap().contains("unreadable"));
    assert!(env.gateway.calls().is_empty());
}
