use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fleet_dispatch::api::rest::router;
use fleet_dispatch::seed::{apply, SeedData};
use fleet_dispatch::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> axum::Router {
    router(Arc::new(AppState::in_memory()))
}

fn seeded() -> axum::Router {
    let state = AppState::in_memory();
    apply(&state, SeedData::demo()).unwrap();
    router(Arc::new(state))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn order_body(driver: Option<&str>) -> Value {
    json!({
        "pickup": { "address": "Depot North", "lat": 52.51, "lng": 13.39 },
        "destination": { "address": "Alexanderplatz 1", "lat": 52.52, "lng": 13.41 },
        "recipient": { "name": "Jonas", "phone": "+49 30 1111" },
        "payment": { "kind": "PayOnDelivery", "amount_to_collect": 42.0 },
        "assigned_driver": driver
    })
}

async fn create_driver(app: &axum::Router, id: &str) {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({
                "id": id,
                "name": "Mara",
                "phone": "+49 30 2222",
                "location": { "lat": 52.50, "lng": 13.38 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

async fn create_order(app: &axum::Router, driver: Option<&str>) -> String {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/orders", order_body(driver)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

async fn set_status(app: &axum::Router, id: &str, body: Value) -> axum::response::Response {
    app.clone()
        .oneshot(json_request("PATCH", &format!("/orders/{id}/status"), body))
        .await
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["drivers"], 0);
    assert_eq!(body["orders"], 0);
    assert_eq!(body["drivers_with_active_order"], 0);
    assert_eq!(body["sos_alerts"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("orders_created_total"));
    assert!(body.contains("drivers_with_active_order"));
}

#[tokio::test]
async fn create_order_returns_pending() {
    let app = setup();
    let res = app
        .oneshot(json_request("POST", "/orders", order_body(None)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["id"], "ORD-0001");
    assert_eq!(body["status"], "Pending");
    assert!(body["completed_at"].is_null());
    assert!(body["assigned_driver"].is_null());
    assert_eq!(body["payment"]["kind"], "PayOnDelivery");
}

#[tokio::test]
async fn create_order_with_blank_address_returns_400() {
    let app = setup();
    let mut body = order_body(None);
    body["pickup"]["address"] = json!("  ");

    let res = app
        .oneshot(json_request("POST", "/orders", body))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_order_returns_404() {
    let app = setup();
    let res = app.oneshot(get_request("/orders/ORD-9999")).await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = body_json(res).await;
    assert_eq!(body["error"], "order ORD-9999 not found");
}

#[tokio::test]
async fn status_update_on_missing_order_returns_404() {
    let app = setup();
    let res = set_status(&app, "ORD-404", json!({ "status": "Delivered" })).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn returning_sets_reason_and_completion() {
    let app = setup();
    create_driver(&app, "DRV-1").await;
    let id = create_order(&app, Some("DRV-1")).await;

    let res = set_status(&app, &id, json!({ "status": "In Transit" })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let moving = body_json(res).await;
    assert_eq!(moving["status"], "Moving");
    assert!(moving["completed_at"].is_null());

    let res = set_status(
        &app,
        &id,
        json!({ "status": "Returning", "return_reason": "nobody home" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let returning = body_json(res).await;
    assert_eq!(returning["return_reason"], "nobody home");
    assert!(returning["completed_at"].is_string());
}

#[tokio::test]
async fn second_active_order_returns_409() {
    let app = setup();
    create_driver(&app, "DRV-1").await;
    let first = create_order(&app, Some("DRV-1")).await;
    let second = create_order(&app, Some("DRV-1")).await;

    let res = set_status(&app, &first, json!({ "status": "Moving" })).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = set_status(&app, &second, json!({ "status": "Moving" })).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/orders/{second}")))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["status"], "Pending");
}

#[tokio::test]
async fn driver_queue_puts_moving_order_first() {
    let app = setup();
    create_driver(&app, "DRV-1").await;
    let first = create_order(&app, Some("DRV-1")).await;
    let second = create_order(&app, Some("DRV-1")).await;
    set_status(&app, &second, json!({ "status": "Moving" })).await;

    let res = app
        .clone()
        .oneshot(get_request("/drivers/DRV-1/queue"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let queue = body_json(res).await;
    let entries = queue.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], second.as_str());
    assert_eq!(entries[0]["actionable"], true);
    assert_eq!(entries[1]["id"], first.as_str());
    assert_eq!(entries[1]["actionable"], false);
    assert!(entries[0]["distance_km"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn signature_confirmation_delivers_order() {
    let app = seeded();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders/ORD-0002/confirmation",
            json!({ "method": "SIGNATURE", "payload": "data:image/png;base64,iVBOR" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "Delivered");
    assert_eq!(body["confirmation"]["method"], "SIGNATURE");
    assert!(body["completed_at"].is_string());

    let res = set_status(&app, "ORD-0001", json!({ "status": "Moving" })).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn photo_confirmation_keeps_returning_status() {
    let app = seeded();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders/ORD-0005/confirmation",
            json!({ "method": "PHOTO", "payload": "data:image/jpeg;base64,/9j/4AAQ" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "Returning");
    assert_eq!(body["return_reason"], "recipient refused damaged parcel");

    let res = app
        .clone()
        .oneshot(get_request("/drivers/DRV-0002/queue"))
        .await
        .unwrap();
    let queue = body_json(res).await;
    let ids: Vec<&str> = queue
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["ORD-0004"]);
}

#[tokio::test]
async fn unknown_confirmation_method_is_rejected() {
    let app = seeded();
    let res = app
        .oneshot(json_request(
            "POST",
            "/orders/ORD-0002/confirmation",
            json!({ "method": "FINGERPRINT", "payload": "x" }),
        ))
        .await
        .unwrap();

    assert!(res.status().is_client_error());
}

#[tokio::test]
async fn assign_driver_and_filter_orders() {
    let app = seeded();

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/orders/ORD-0006/driver",
            json!({ "driver_id": "DRV-0003" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["assigned_driver"], "DRV-0003");

    let res = app
        .clone()
        .oneshot(get_request("/orders?driver=DRV-0003&status=Pending"))
        .await
        .unwrap();
    let orders = body_json(res).await;
    let list = orders.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "ORD-0006");

    let res = app
        .oneshot(json_request(
            "PATCH",
            "/orders/ORD-0002/driver",
            json!({ "driver_id": "DRV-0003" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_driver_location() {
    let app = setup();
    create_driver(&app, "DRV-7").await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/drivers/DRV-7/location",
            json!({ "location": { "lat": 48.85, "lng": 2.35 } }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["location"]["lat"], 48.85);
    assert_eq!(body["location"]["lng"], 2.35);

    let res = app
        .oneshot(json_request(
            "PATCH",
            "/drivers/DRV-404/location",
            json!({ "location": { "lat": 1.0, "lng": 1.0 } }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sos_log_reads_newest_first() {
    let app = setup();
    create_driver(&app, "DRV-1").await;

    for (message, code) in [("tyre burst", "VEHICLE_BREAKDOWN"), ("bridge shut", "ROAD_CLOSED")] {
        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/sos",
                json!({
                    "driver_id": "DRV-1",
                    "message": message,
                    "problem_code": code,
                    "location": "A100 near exit 4"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let stored = body_json(res).await;
        assert_eq!(stored["driver_name"], "Mara");
    }

    let res = app.clone().oneshot(get_request("/sos")).await.unwrap();
    let log = body_json(res).await;
    let list = log.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["message"], "bridge shut");
    assert_eq!(list[0]["severity"], "blockage");
    assert_eq!(list[1]["message"], "tyre burst");
    assert_eq!(list[1]["severity"], "critical");

    let res = app.oneshot(get_request("/sos/codes")).await.unwrap();
    let codes = body_json(res).await;
    assert_eq!(codes.as_array().unwrap().len(), 14);
}

#[tokio::test]
async fn sos_with_empty_message_returns_400() {
    let app = setup();
    let res = app
        .oneshot(json_request(
            "POST",
            "/sos",
            json!({ "driver_id": "DRV-1", "message": "", "problem_code": "ACCIDENT" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
