//! Report listing, detail, export, document files, and deletion.

use actix_web::test;
use serde_json::Value;
use uuid::Uuid;

use super::helpers::{init_app, sample_png, setup_default, upload_receipt};

#[actix_rt::test]
async fn test_list_reports_empty() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let req = test::TestRequest::get().uri("/api/v1/reports").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 0);
    assert!(body["reports"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_report_round_trip() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let uploaded = upload_receipt(&app, &env, "cafe.png").await;
    let report_id = uploaded["report_id"].as_str().unwrap();

    let req = test::TestRequest::get().uri("/api/v1/reports").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list["total"], 1);
    let listed = &list["reports"][0];
    assert_eq!(listed["id"], report_id);
    assert_eq!(listed["document_count"], 1);
    assert_eq!(listed["issue_count"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", report_id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    let report = &detail["report"];
    assert_eq!(report["name"], "Corner Cafe");
    assert_eq!(report["status"], "REVIEWED");
    assert_eq!(report["total_amount"], 42.5);
    assert_eq!(report["documents"][0]["filename"], "cafe.png");
    assert_eq!(report["documents"][0]["mime_type"], "image/png");
    assert_eq!(report["issues"][0]["severity"], "warning");
    assert_eq!(report["issues"][0]["report_id"], report_id);
}

#[actix_rt::test]
async fn test_list_filters_by_status() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    upload_receipt(&app, &env, "cafe.png").await;

    let req = test::TestRequest::get()
        .uri("/api/v1/reports?status=PENDING")
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending["total"], 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/reports?status=REVIEWED&limit=5")
        .to_request();
    let reviewed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reviewed["total"], 1);
}

#[actix_rt::test]
async fn test_get_report_not_found() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", Uuid::now_v7()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get()
        .uri("/api/v1/reports/not-a-uuid")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_document_file_served_and_missing() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let uploaded = upload_receipt(&app, &env, "cafe.png").await;
    let report_id = uploaded["report_id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", report_id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    let document = &detail["report"]["documents"][0];
    let url = document["url"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri(&url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("content-type").unwrap(), "image/png");
    let bytes = test::read_body(resp).await;
    assert_eq!(bytes.as_ref(), sample_png().as_slice());

    // Remove the file behind the server's back
    std::fs::remove_dir_all(env.upload_root().join(report_id)).unwrap();
    let req = test::TestRequest::get().uri(&url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{}/file", Uuid::now_v7()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_export_csv() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let uploaded = upload_receipt(&app, &env, "cafe.png").await;
    let report_id = uploaded["report_id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}/export.csv", report_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("report_name,report_status,severity"));
    let row = lines.next().unwrap();
    assert!(row.contains("Corner Cafe"));
    assert!(row.contains("No signature"));
}

#[actix_rt::test]
async fn test_delete_report_removes_rows_and_files() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let uploaded = upload_receipt(&app, &env, "cafe.png").await;
    let report_id = uploaded["report_id"].as_str().unwrap();
    let report_dir = env.upload_root().join(report_id);
    assert!(report_dir.exists());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/reports/{}", report_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["deleted_reports"], 1);
    assert_eq!(body["deleted_files"], 1);
    assert!(!report_dir.exists());

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", report_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/reports/{}", report_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_clear_all_reports() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    upload_receipt(&app, &env, "first.png").await;
    upload_receipt(&app, &env, "second.png").await;

    let req = test::TestRequest::delete().uri("/api/v1/reports").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["deleted_reports"], 2);
    assert_eq!(body["deleted_files"], 2);

    let req = test::TestRequest::get().uri("/api/v1/reports").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list["total"], 0);
}

#[actix_rt::test]
async fn test_health_and_ready() {
    let env = setup_default().await;
    let app = init_app(&env).await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/api/v1/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}
