//! Image quality endpoints.

use actix_web::test;
use serde_json::Value;

use super::helpers::{BOUNDARY, init_app, multipart_body, sample_png, setup_default};

fn quality_request(uri: &str, filename: &str, content_type: &str, data: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body("file", &[(filename, content_type, data)]))
}

#[actix_rt::test]
async fn test_analyze_png() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let png = sample_png();
    let req = quality_request("/api/v1/quality/analyze", "scan.png", "image/png", &png).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["filename"], "scan.png");
    let quality = &body["quality"];
    assert_eq!(quality["metrics"]["width"], 32);
    assert_eq!(quality["metrics"]["isGrayscale"], true);
    assert!(quality["tier"].is_string());
    let score = quality["score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));

    // Quality checks never call the model
    assert!(env.gateway.calls().is_empty());
}

#[actix_rt::test]
async fn test_analyze_undecodable() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let req = quality_request(
        "/api/v1/quality/analyze",
        "notes.png",
        "image/png",
        b"definitely not an image",
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let quality = &body["quality"];
    assert!(quality["metrics"].is_null());
    assert_eq!(quality["documentType"]["kind"], "digital");
    assert_eq!(quality["documentType"]["confidence"], 0.3);
}

#[actix_rt::test]
async fn test_enhance_returns_png() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let png = sample_png();
    let req = quality_request("/api/v1/quality/enhance", "scan.png", "image/png", &png).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("content-type").unwrap(), "image/png");

    let bytes = test::read_body(resp).await;
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 32);
    assert_eq!(decoded.height(), 32);
}

#[actix_rt::test]
async fn test_enhance_rejects_garbage() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let req = quality_request(
        "/api/v1/quality/enhance",
        "notes.txt",
        "text/plain",
        b"plain text",
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}
