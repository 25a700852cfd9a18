use std::net::SocketAddr;
use std::time::Duration;

use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::{Value, json};

use crate::common::{TestApp, routes};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nvegetable drawer";

/// Serve `router` on a random local port and return its address.
async fn spawn_vision_endpoint(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake vision endpoint");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn spawn_with_endpoint(addr: SocketAddr, timeout: Option<&str>) -> TestApp {
    let endpoint = format!("http://{addr}/detect");
    let timeout = timeout.map(str::to_string);
    TestApp::spawn_with(move |config| {
        config.vision.http.endpoint = Some(endpoint);
        config.vision.http.timeout = timeout;
    })
    .await
}

mod providers {
    use super::*;

    #[tokio::test]
    async fn lists_providers_with_availability() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::PROVIDERS).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["id"], "http");
        assert_eq!(data[0]["available"], false);
        assert!(data[0]["reason"].as_str().is_some());
        assert_eq!(data[1]["id"], "mock");
        assert_eq!(data[1]["available"], true);
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::DETECTIONS,
                &json!({ "image_id": "demo_random", "provider": "llava" }),
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "PROVIDER_NOT_FOUND");
    }

    #[tokio::test]
    async fn top_k_out_of_range_is_rejected() {
        let app = TestApp::spawn().await;
        for top_k in [0, 51] {
            let res = app
                .post(
                    routes::DETECTIONS,
                    &json!({ "image_id": "demo_random", "top_k": top_k }),
                )
                .await;
            assert_eq!(res.status, 400, "top_k={top_k}");
        }
    }
}

mod mock {
    use super::*;

    #[tokio::test]
    async fn same_reference_gives_identical_detections() {
        let app = TestApp::spawn().await;
        let body = json!({ "image_id": "demo_random", "top_k": 5 });

        let first = app.post(routes::DETECTIONS, &body).await;
        let second = app.post(routes::DETECTIONS, &body).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["provider"], "mock");
        assert_eq!(first.body["detections"], second.body["detections"]);

        let detections = first.body["detections"].as_array().unwrap();
        assert_eq!(detections.len(), 5);

        let mut ids: Vec<i64> = detections
            .iter()
            .map(|d| d["item_id"].as_i64().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5, "items are sampled without replacement");

        for d in detections {
            let confidence = d["confidence"].as_f64().unwrap();
            assert!((0.60..=0.95).contains(&confidence));
            let quantity = d["quantity"].as_f64().unwrap();
            assert!((1.0..=4.0).contains(&quantity));
            assert!(d["temp_id"].as_str().unwrap().starts_with("det_"));
            assert_eq!(d["location"], "fridge");
            assert!(d["suggest_expire_date"].as_str().is_some());
        }
    }

    #[tokio::test]
    async fn different_references_differ() {
        let app = TestApp::spawn().await;
        let a = app
            .post(routes::DETECTIONS, &json!({ "image_id": "demo_random" }))
            .await;
        let b = app
            .post(routes::DETECTIONS, &json!({ "image_id": "demo_fridge" }))
            .await;
        assert_ne!(a.body["detections"], b.body["detections"]);
    }

    #[tokio::test]
    async fn default_top_k_caps_at_ten() {
        let app = TestApp::spawn().await;
        let res = app
            .post(routes::DETECTIONS, &json!({ "image_id": "demo_random" }))
            .await;
        assert_eq!(res.body["detections"].as_array().unwrap().len(), 10);
    }
}

mod http {
    use super::*;

    #[tokio::test]
    async fn unconfigured_endpoint_is_unavailable() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::DETECTIONS,
                &json!({ "image_id": "demo_random", "provider": "http" }),
            )
            .await;
        assert_eq!(res.status, 503);
        assert_eq!(res.code(), "PROVIDER_UNAVAILABLE");
    }

    #[tokio::test]
    async fn malformed_extra_headers_are_a_config_error() {
        let app = TestApp::spawn_with(|config| {
            config.vision.http.endpoint = Some("http://127.0.0.1:9/detect".into());
            config.vision.http.headers_json = Some(r#"{"X-Key": 42}"#.into());
        })
        .await;
        let image_id = app.upload_image(PNG_BYTES).await;

        let res = app
            .post(
                routes::DETECTIONS,
                &json!({ "image_id": image_id, "provider": "http" }),
            )
            .await;
        assert_eq!(res.status, 503);
        assert_eq!(res.code(), "PROVIDER_CONFIG_ERROR");
    }

    #[tokio::test]
    async fn unknown_image_is_not_found() {
        let addr = spawn_vision_endpoint(Router::new()).await;
        let app = spawn_with_endpoint(addr, None).await;

        let res = app
            .post(
                routes::DETECTIONS,
                &json!({ "image_id": "nope", "provider": "http" }),
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "IMAGE_NOT_FOUND");
    }

    #[tokio::test]
    async fn response_entries_are_normalized() {
        async fn detect(Json(req): Json<Value>) -> Json<Value> {
            assert!(req["image_base64"].as_str().is_some_and(|s| !s.is_empty()));
            assert_eq!(req["top_k"], 3);
            Json(json!({
                "detections": [
                    { "name": "鸡蛋", "confidence": 1.7, "quantity": 6, "temp_id": 77 },
                    "not an object",
                    {
                        "item_name": "火龙果",
                        "confidence": "0.4",
                        "quantity": -3,
                        "location": "freezer",
                        "suggest_expire_days": "3",
                    },
                    { "suggest_expire_date": "not-a-date", "unit": "bag" },
                ]
            }))
        }

        let addr = spawn_vision_endpoint(Router::new().route("/detect", post(detect))).await;
        let app = spawn_with_endpoint(addr, None).await;
        let image_id = app.upload_image(PNG_BYTES).await;

        let res = app
            .post(
                routes::DETECTIONS,
                &json!({ "image_id": image_id, "provider": "http", "top_k": 3 }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["provider"], "http");

        let d = res.body["detections"].as_array().unwrap();
        assert_eq!(d.len(), 3);

        assert_eq!(d[0]["item_name"], "鸡蛋");
        assert!(d[0]["item_id"].as_i64().is_some());
        assert_eq!(d[0]["temp_id"], "77");
        assert_eq!(d[0]["confidence"].as_f64().unwrap(), 1.0);
        assert_eq!(d[0]["quantity"].as_f64().unwrap(), 6.0);
        assert_eq!(d[0]["unit"], "pcs");
        assert_eq!(d[0]["location"], "fridge");
        assert!(d[0]["suggest_expire_date"].is_null());

        assert_eq!(d[1]["item_name"], "火龙果");
        assert!(d[1]["item_id"].is_null());
        assert_eq!(d[1]["temp_id"], format!("det_http_{image_id}_2"));
        assert_eq!(d[1]["quantity"].as_f64().unwrap(), 1.0);
        assert_eq!(d[1]["unit"], "unit");
        assert_eq!(d[1]["location"], "freezer");
        let expected = crate::common::days_from_today(3).to_string();
        assert_eq!(d[1]["suggest_expire_date"].as_str().unwrap(), expected);

        assert_eq!(d[2]["item_name"], "未知");
        assert_eq!(d[2]["unit"], "bag");
        assert_eq!(d[2]["confidence"].as_f64().unwrap(), 0.0);
        assert!(d[2]["suggest_expire_date"].is_null());
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        async fn detect() -> StatusCode {
            StatusCode::INTERNAL_SERVER_ERROR
        }

        let addr = spawn_vision_endpoint(Router::new().route("/detect", post(detect))).await;
        let app = spawn_with_endpoint(addr, None).await;
        let image_id = app.upload_image(PNG_BYTES).await;

        let res = app
            .post(
                routes::DETECTIONS,
                &json!({ "image_id": image_id, "provider": "http" }),
            )
            .await;
        assert_eq!(res.status, 502);
        assert_eq!(res.code(), "PROVIDER_ERROR");
        assert!(res.text.contains("500"), "{}", res.text);
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        async fn detect() -> Json<Value> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "detections": [] }))
        }

        let addr = spawn_vision_endpoint(Router::new().route("/detect", post(detect))).await;
        let app = spawn_with_endpoint(addr, Some("1")).await;
        let image_id = app.upload_image(PNG_BYTES).await;

        let res = app
            .post(
                routes::DETECTIONS,
                &json!({ "image_id": image_id, "provider": "http" }),
            )
            .await;
        assert_eq!(res.status, 504);
        assert_eq!(res.code(), "PROVIDER_TIMEOUT");
    }
}
