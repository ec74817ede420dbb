//! Upload and analysis through POST /upload.

use actix_web::test;
use akuit_lib::config::EnvKeys;
use akuit_lib::services::Provider;
use serde_json::Value;

use super::helpers::{
    GEMINI_KEY, init_app, sample_png, setup, setup_default, upload_receipt, upload_request,
};

#[actix_rt::test]
async fn test_model_timeout_still_creates_report() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], Some(GEMINI_KEY)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "REVIEWED");
    assert_eq!(body["documents_processed"], 1);
    assert_eq!(body["documents_analyzed"], 0);
    assert_eq!(body["issues"].as_array().unwrap().len(), 0);
    assert!(body["total_amount"].is_null());

    // Extraction failed, so compliance never ran
    let calls = env.gateway.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].vision);

    let report_id = body["report_id"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", report_id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["report"]["document_count"], 1);
}

#[actix_rt::test]
async fn test_prose_wrapped_extraction_is_parsed() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    env.gateway.push_vision(Ok(concat!(
        "Here is what I found on the receipt:\n```json\n",
        r#"{"documentType":"receipt","organization":"Harbour Supplies","totalAmount":"$1,204.50","extractedText":"Harbour Supplies tax invoice, total due 1,204.50, paid by card"}"#,
        "\n```\nLet me know if you need anything else."
    )
    .to_string()));
    env.gateway.push_text(Ok("[]".to_string()));

    let png = sample_png();
    let req = upload_request(&[("invoice.png", "image/png", &png)], Some(GEMINI_KEY)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["documents_analyzed"], 1);
    assert_eq!(body["name"], "Harbour Supplies");
    assert_eq!(body["total_amount"], 1204.5);
    assert!(
        body["summary"]
            .as_str()
            .unwrap()
            .starts_with("Analyzed 1 of 1 document(s)")
    );

    let report_id = body["report_id"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", report_id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    let data = &detail["report"]["documents"][0]["extracted_data"];
    assert_eq!(data["documentType"], "receipt");
    assert_eq!(data["imageQuality"]["metrics"]["width"], 32);
}

#[actix_rt::test]
async fn test_percentage_confidence_is_normalized() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    env.gateway.push_vision(Ok(
        r#"{"documentType":"receipt","extractedText":"Receipt with no date and no signature anywhere on it at all"}"#
            .to_string(),
    ));
    env.gateway.push_text(Ok(
        r#"[{"severity":"CRITICAL","title":"Missing date","description":"No transaction date","confidence":95},
            {"severity":"moderate","title":"Unsigned","description":"No signature"},
            {"severity":"info"}]"#
            .to_string(),
    ));

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], Some(GEMINI_KEY)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let issues = body["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);

    let critical = issues.iter().find(|i| i["title"] == "Missing date").unwrap();
    assert_eq!(critical["severity"], "critical");
    assert!((critical["confidence"].as_f64().unwrap() - 0.95).abs() < 1e-9);
    assert_eq!(critical["resolved"], false);

    let warning = issues.iter().find(|i| i["title"] == "Unsigned").unwrap();
    assert_eq!(warning["severity"], "warning");
    assert!((warning["confidence"].as_f64().unwrap() - 0.8).abs() < 1e-9);
}

#[actix_rt::test]
async fn test_missing_credential_is_rejected_before_work() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "MISSING_CREDENTIAL");
    assert!(env.gateway.calls().is_empty());

    let req = test::TestRequest::get().uri("/api/v1/reports").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list["total"], 0);
}

#[actix_rt::test]
async fn test_environment_key_is_used_without_header() {
    let env = setup(EnvKeys::from_lookup(|name| {
        (name == "OPENAI_API_KEY").then(|| "sk-env-key-for-integration-tests".to_string())
    }))
    .await;
    let app = init_app(&env).await;

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let calls = env.gateway.calls();
    assert_eq!(calls[0].provider, Provider::OpenAi);
    assert_eq!(calls[0].key, "sk-env-key-for-integration-tests");
}

#[actix_rt::test]
async fn test_requested_provider_without_key_is_rejected() {
    let env = setup(EnvKeys::from_lookup(|name| {
        (name == "OPENAI_API_KEY").then(|| "sk-env-key-for-integration-tests".to_string())
    }))
    .await;
    let app = init_app(&env).await;

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], None)
        .insert_header(("X-Model-Provider", "zai"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_unknown_provider_header() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let png = sample_png();
    let req = upload_request(&[("receipt.png", "image/png", &png)], Some(GEMINI_KEY))
        .insert_header(("X-Model-Provider", "anthropic"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_no_files() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let req = upload_request(&[], Some(GEMINI_KEY)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_empty_file_is_reported_as_failed() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let req = upload_request(&[("blank.png", "image/png", b"")], Some(GEMINI_KEY)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["documents_processed"], 0);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["failed_files"][0]["filename"], "blank.png");
    assert!(env.gateway.calls().is_empty());
}

#[actix_rt::test]
async fn test_multiple_files_are_aggregated() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    env.gateway.push_vision(Ok(
        r#"{"organization":"Alpha Pty Ltd","totalAmount":100,"extractedText":"Alpha Pty Ltd invoice number 1001 for consulting services rendered"}"#
            .to_string(),
    ));
    env.gateway.push_text(Ok("[]".to_string()));
    env.gateway.push_vision(Ok(
        r#"{"organization":"Beta Co","totalAmount":"50.25","extractedText":"Beta Co receipt for catering, total 50.25, paid in cash on the day"}"#
            .to_string(),
    ));
    env.gateway.push_text(Ok("[]".to_string()));

    let png = sample_png();
    let req = upload_request(
        &[
            ("alpha.png", "image/png", &png),
            ("beta.png", "image/png", &png),
        ],
        Some(GEMINI_KEY),
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["documents_processed"], 2);
    assert_eq!(body["documents_analyzed"], 2);
    assert_eq!(body["name"], "Alpha Pty Ltd (+1 more)");
    assert!((body["total_amount"].as_f64().unwrap() - 150.25).abs() < 1e-9);
}

#[actix_rt::test]
async fn test_receipt_helper_round_trip() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let body = upload_receipt(&app, &env, "cafe.png").await;
    assert_eq!(body["name"], "Corner Cafe");
    assert_eq!(body["total_amount"], 42.5);
    assert_eq!(body["issues"][0]["title"], "No signature");
}
