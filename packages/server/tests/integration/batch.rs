use serde_json::json;

use crate::common::{TestApp, TestResponse, routes};

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn egg_batch_is_consumed_down_to_zero() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("鸡蛋", 12.0).await;

        let res = app.consume(id, 5.0).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["quantity"].as_f64().unwrap(), 7.0);
        assert_eq!(res.body["status"], "in_stock");

        let res = app.consume(id, 7.0).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["quantity"].as_f64().unwrap(), 0.0);
        assert_eq!(res.body["status"], "consumed");

        assert_eq!(app.event_deltas(id).await, vec![12.0, -5.0, -7.0]);
    }

    #[tokio::test]
    async fn created_batch_takes_item_defaults() {
        let app = TestApp::spawn().await;
        let res = app
            .post(routes::BATCHES, &json!({ "item_name": "牛奶", "quantity": 500 }))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["item_name"], "牛奶");
        assert_eq!(res.body["unit"], "ml");
        assert_eq!(res.body["location"], "fridge");
        assert_eq!(res.body["source_type"], "manual");
        assert!(res.body["source_ref"].is_null());
        let expected = crate::common::days_from_today(7).to_string();
        assert_eq!(res.body["expire_date"].as_str().unwrap(), expected);

        let events = app.get(&routes::batch_events(res.id())).await;
        assert_eq!(events.body[0]["event_type"], "created");
        assert_eq!(events.body[0]["note"], "manual");
    }

    #[tokio::test]
    async fn unknown_item_name_creates_the_item() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::BATCHES,
                &json!({ "item_name": "  豆腐 ", "quantity": 1, "unit": "block" }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["item_name"], "豆腐");
        assert_eq!(res.body["unit"], "block");

        let items = app.get(routes::ITEMS).await;
        let tofu = items.body
            .as_array()
            .unwrap()
            .iter()
            .find(|i| i["name"] == "豆腐")
            .expect("item should be created");
        assert_eq!(tofu["category"], "uncategorized");
        assert_eq!(tofu["default_unit"], "block");
    }

    #[tokio::test]
    async fn unknown_item_id_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .post(routes::BATCHES, &json!({ "item_id": 9999, "quantity": 1 }))
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "ITEM_NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_item_reference_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post(routes::BATCHES, &json!({ "item_name": "   ", "quantity": 1 }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected() {
        let app = TestApp::spawn().await;
        for quantity in [0.0, -2.0] {
            let res = app
                .post(
                    routes::BATCHES,
                    &json!({ "item_name": "鸡蛋", "quantity": quantity }),
                )
                .await;
            assert_eq!(res.status, 422, "{}", res.text);
            assert_eq!(res.code(), "INVALID_QUANTITY");
        }
    }

    #[tokio::test]
    async fn unknown_batch_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::batch(4242)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "BATCH_NOT_FOUND");

        let res = app.consume(4242, 1.0).await;
        assert_eq!(res.status, 404);
    }
}

mod outflow {
    use super::*;

    #[tokio::test]
    async fn over_consume_leaves_batch_untouched() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("番茄", 3.0).await;

        let res = app.consume(id, 3.5).await;
        assert_eq!(res.status, 422);
        assert_eq!(res.code(), "INVALID_QUANTITY");

        let batch = app.get(&routes::batch(id)).await;
        assert_eq!(batch.body["quantity"].as_f64().unwrap(), 3.0);
        assert_eq!(batch.body["status"], "in_stock");
        assert_eq!(app.event_deltas(id).await, vec![3.0]);
    }

    #[tokio::test]
    async fn terminal_batch_rejects_further_changes() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("生菜", 100.0).await;
        assert_eq!(app.consume(id, 100.0).await.status, 200);

        let res = app.consume(id, 1.0).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "BATCH_TERMINAL");

        let res = app
            .post(&routes::batch_discard(id), &json!({ "quantity": 1 }))
            .await;
        assert_eq!(res.status, 409);

        let res = app.patch(&routes::batch(id), &json!({ "quantity": 5 })).await;
        assert_eq!(res.status, 409);

        assert_eq!(app.event_deltas(id).await, vec![100.0, -100.0]);
    }

    #[tokio::test]
    async fn discard_records_reason_and_ends_batch() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("酸奶", 300.0).await;

        let res = app
            .post(
                &routes::batch_discard(id),
                &json!({ "quantity": 100, "reason": "lid cracked" }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "in_stock");

        let res = app
            .post(&routes::batch_discard(id), &json!({ "quantity": 200 }))
            .await;
        assert_eq!(res.body["status"], "discarded");
        assert_eq!(res.body["quantity"].as_f64().unwrap(), 0.0);

        let events = app.get(&routes::batch_events(id)).await;
        let data = events.body.as_array().unwrap();
        assert_eq!(data[1]["event_type"], "discarded");
        assert_eq!(data[1]["note"], "lid cracked");
        assert_eq!(data[2]["event_type"], "discarded");
    }

    #[tokio::test]
    async fn near_total_consume_clears_float_residue() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("洋葱", 0.3).await;
        assert_eq!(app.consume(id, 0.1).await.status, 200);

        let res = app.consume(id, 0.2).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "consumed");
        assert_eq!(res.body["quantity"].as_f64().unwrap(), 0.0);

        let sum: f64 = app.event_deltas(id).await.iter().sum();
        assert!(sum.abs() < 1e-9, "event log should sum to zero, got {sum}");
    }

    #[tokio::test]
    async fn concurrent_consumes_apply_exactly_once() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("鸡胸", 3.0).await;

        let url = format!("http://{}{}", app.addr, routes::batch_consume(id));
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let client = app.client.clone();
                let url = url.clone();
                tokio::spawn(async move {
                    let res = client
                        .post(url)
                        .json(&json!({ "quantity": 3 }))
                        .send()
                        .await
                        .expect("Failed to send POST request");
                    TestResponse::from_response(res).await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        let ok = results.iter().filter(|r| r.status == 200).count();
        let terminal = results
            .iter()
            .filter(|r| r.status == 409 && r.code() == "BATCH_TERMINAL")
            .count();
        assert_eq!(ok, 1);
        assert_eq!(terminal, 4);
        assert_eq!(app.event_deltas(id).await, vec![3.0, -3.0]);
    }
}

mod adjust {
    use super::*;

    #[tokio::test]
    async fn quantity_patch_records_adjusted_delta() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("土豆", 4.0).await;

        let res = app
            .patch(
                &routes::batch(id),
                &json!({ "quantity": 6, "location": "pantry" }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["quantity"].as_f64().unwrap(), 6.0);
        assert_eq!(res.body["location"], "pantry");

        assert_eq!(app.event_deltas(id).await, vec![4.0, 2.0]);
    }

    /// Cached quantity and the sum of the event log, read straight from
    /// the database so no JSON float parsing is involved.
    async fn stored_projection(app: &TestApp, id: i32) -> (f64, f64) {
        use larder::entity::{batch, batch_event};
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

        let cached = batch::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .expect("batch should exist")
            .quantity;
        let events = batch_event::Entity::find()
            .filter(batch_event::Column::BatchId.eq(id))
            .order_by_asc(batch_event::Column::CreatedAt)
            .order_by_asc(batch_event::Column::Id)
            .all(&app.db)
            .await
            .unwrap();
        let replayed = ::common::quantity::replay(events.iter().map(|e| e.delta_quantity));
        (cached, replayed)
    }

    #[tokio::test]
    async fn fractional_adjust_replays_exactly() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("鸡蛋", 0.1).await;

        let res = app.patch(&routes::batch(id), &json!({ "quantity": 0.3 })).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let (cached, replayed) = stored_projection(&app, id).await;
        assert_eq!(cached, replayed);
        assert!((cached - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn large_quantity_adjust_replays_exactly() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("大米", 123_456_789_012.3).await;

        let res = app.patch(&routes::batch(id), &json!({ "quantity": 0.7 })).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "in_stock");

        let (cached, replayed) = stored_projection(&app, id).await;
        assert_eq!(cached, replayed);
        assert!(cached > 0.0);

        // Later outflows still line up with the log.
        let res = app.consume(id, cached / 2.0).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let (cached, replayed) = stored_projection(&app, id).await;
        assert_eq!(cached, replayed);
    }

    #[tokio::test]
    async fn metadata_patch_appends_no_event() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("大米", 1000.0).await;
        let date = crate::common::days_from_today(30);

        let res = app
            .patch(&routes::batch(id), &json!({ "expire_date": date }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["expire_date"].as_str().unwrap(), date.to_string());
        assert_eq!(app.event_deltas(id).await, vec![1000.0]);
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("面条", 200.0).await;

        let res = app.patch(&routes::batch(id), &json!({})).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn zero_quantity_patch_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("面条", 200.0).await;

        let res = app.patch(&routes::batch(id), &json!({ "quantity": 0 })).await;
        assert_eq!(res.status, 422);
        assert_eq!(res.code(), "INVALID_QUANTITY");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn filters_by_status_location_and_keyword() {
        let app = TestApp::spawn().await;
        let eggs = app.create_batch("鸡蛋", 6.0).await;
        let milk = app.create_batch("牛奶", 250.0).await;
        app.post(
            routes::BATCHES,
            &json!({ "item_name": "大米", "quantity": 500, "location": "pantry" }),
        )
        .await;
        app.consume(milk, 250.0).await;

        let res = app.get(&format!("{}?status=in_stock", routes::BATCHES)).await;
        assert_eq!(res.body["pagination"]["total"], 2);

        let res = app.get(&format!("{}?location=pantry", routes::BATCHES)).await;
        assert_eq!(res.body["data"][0]["item_name"], "大米");

        let res = app
            .get(&format!("{}?keyword=%E9%B8%A1", routes::BATCHES))
            .await;
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"].as_i64().unwrap() as i32, eggs);

        let res = app.get(&format!("{}?status=rotten", routes::BATCHES)).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn newest_batches_come_first() {
        let app = TestApp::spawn().await;
        let first = app.create_batch("番茄", 1.0).await;
        let second = app.create_batch("番茄", 2.0).await;

        let res = app.get(&format!("{}?per_page=1", routes::BATCHES)).await;
        assert_eq!(res.body["data"][0]["id"].as_i64().unwrap() as i32, second);
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["pagination"]["total_pages"], 2);

        let res = app
            .get(&format!("{}?per_page=1&page=2", routes::BATCHES))
            .await;
        assert_eq!(res.body["data"][0]["id"].as_i64().unwrap() as i32, first);
    }

    #[tokio::test]
    async fn event_feed_is_newest_first_and_limited() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("胡萝卜", 5.0).await;
        app.consume(id, 1.0).await;
        app.consume(id, 1.0).await;

        let res = app.get(&format!("{}?limit=2", routes::EVENTS)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.body.as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.iter().all(|e| e["event_type"] == "consumed"));
    }
}

mod bulk {
    use super::*;

    #[tokio::test]
    async fn bulk_create_is_all_or_nothing() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::BATCHES_BULK,
                &json!({
                    "batches": [
                        { "item_name": "鸡蛋", "quantity": 6 },
                        { "item_name": "牛奶", "quantity": -1 },
                    ]
                }),
            )
            .await;
        assert_eq!(res.status, 422);
        assert!(res.text.contains("batch #1"), "{}", res.text);

        let list = app.get(routes::BATCHES).await;
        assert_eq!(list.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn bulk_with_unknown_item_id_rolls_back() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::BATCHES_BULK,
                &json!({
                    "batches": [
                        { "item_name": "鸡蛋", "quantity": 6 },
                        { "item_id": 9999, "quantity": 1 },
                    ]
                }),
            )
            .await;
        assert_eq!(res.status, 404);

        let list = app.get(routes::BATCHES).await;
        assert_eq!(list.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn empty_bulk_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post(routes::BATCHES_BULK, &json!({ "batches": [] }))
            .await;
        assert_eq!(res.status, 400);
    }
}

mod items {
    use super::*;

    #[tokio::test]
    async fn seeded_catalog_is_listed() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::ITEMS).await;
        assert_eq!(res.status, 200);
        let data = res.body.as_array().unwrap();
        assert_eq!(data.len(), 12);
        assert_eq!(data[0]["name"], "鸡蛋");
        assert_eq!(data[0]["shelf_life_days_default"], 10);
    }

    #[tokio::test]
    async fn duplicate_item_name_conflicts() {
        let app = TestApp::spawn().await;
        let body = json!({ "name": "黄油", "category": "dairy", "default_unit": "g" });

        let res = app.post(routes::ITEMS, &body).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["category"], "dairy");

        let res = app.post(routes::ITEMS, &body).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn negative_shelf_life_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::ITEMS,
                &json!({ "name": "黄油", "shelf_life_days_default": -1 }),
            )
            .await;
        assert_eq!(res.status, 400);
    }
}
