use serde_json::json;

use crate::common::{TestApp, routes};

fn recipe<'a>(body: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .unwrap_or_else(|| panic!("recipe {name} missing"))
}

#[tokio::test]
async fn nothing_is_feasible_with_empty_stock() {
    let app = TestApp::spawn().await;
    let res = app.get(routes::RECIPES_FEASIBLE).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["count"], 0);
    assert!(res.body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn stock_covering_every_ingredient_makes_recipe_feasible() {
    let app = TestApp::spawn().await;
    app.create_batch("鸡蛋", 4.0).await;
    app.create_batch("番茄", 2.0).await;
    app.create_batch("洋葱", 1.0).await;

    let res = app.get(routes::RECIPES_FEASIBLE).await;
    assert_eq!(res.body["data"], json!(["番茄炒蛋"]));
    assert_eq!(res.body["count"], 1);
}

#[tokio::test]
async fn stock_is_summed_across_batches() {
    let app = TestApp::spawn().await;
    app.create_batch("牛奶", 100.0).await;
    app.create_batch("牛奶", 150.0).await;
    app.create_batch("酸奶", 150.0).await;

    let res = app.get(routes::RECIPES_FEASIBLE).await;
    assert_eq!(res.body["data"], json!(["牛奶燕麦"]));
}

#[tokio::test]
async fn consumed_stock_no_longer_counts() {
    let app = TestApp::spawn().await;
    app.create_batch("鸡蛋", 2.0).await;
    app.create_batch("番茄", 2.0).await;
    let onion = app.create_batch("洋葱", 0.5).await;
    assert_eq!(app.get(routes::RECIPES_FEASIBLE).await.body["count"], 1);

    app.consume(onion, 0.5).await;
    assert_eq!(app.get(routes::RECIPES_FEASIBLE).await.body["count"], 0);
}

#[tokio::test]
async fn recipe_list_reports_shortfalls_in_stored_order() {
    let app = TestApp::spawn().await;
    app.create_batch("鸡蛋", 3.0).await;
    app.create_batch("大米", 100.0).await;

    let res = app.get(routes::RECIPES).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let names: Vec<&str> = res.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "蛋炒饭");
    assert_eq!(names[7], "蔬菜沙拉");

    let fried_rice = recipe(&res.body, "蛋炒饭");
    assert_eq!(fried_rice["feasible"], false);
    assert_eq!(fried_rice["tags"], json!(["rice", "quick"]));
    assert_eq!(fried_rice["nutrition"]["calories"], 520);

    let ingredients = fried_rice["ingredients"].as_array().unwrap();
    assert_eq!(ingredients[0]["item_name"], "鸡蛋");
    assert_eq!(ingredients[0]["shortfall"].as_f64().unwrap(), 0.0);
    assert_eq!(ingredients[1]["item_name"], "大米");
    assert_eq!(ingredients[1]["available"].as_f64().unwrap(), 100.0);
    assert_eq!(ingredients[1]["shortfall"].as_f64().unwrap(), 50.0);
    assert_eq!(ingredients[2]["shortfall"].as_f64().unwrap(), 0.5);
}

mod seeding {
    use larder::catalog::{CountedEntity, count_rows};

    use super::*;

    #[tokio::test]
    async fn reseeding_adds_nothing() {
        let app = TestApp::spawn().await;
        larder::seed::seed_catalog(&app.db).await.unwrap();

        assert_eq!(count_rows(&app.db, CountedEntity::Item).await.unwrap(), 12);
        assert_eq!(count_rows(&app.db, CountedEntity::Recipe).await.unwrap(), 8);
        assert_eq!(
            count_rows(&app.db, CountedEntity::RecipeIngredient)
                .await
                .unwrap(),
            23
        );
    }

    #[tokio::test]
    async fn rejected_outflow_writes_no_rows() {
        let app = TestApp::spawn().await;
        let id = app.create_batch("鸡蛋", 2.0).await;
        assert_eq!(app.consume(id, 3.0).await.status, 422);

        assert_eq!(count_rows(&app.db, CountedEntity::Batch).await.unwrap(), 1);
        assert_eq!(
            count_rows(&app.db, CountedEntity::BatchEvent).await.unwrap(),
            1
        );
        assert_eq!(count_rows(&app.db, CountedEntity::Image).await.unwrap(), 0);
    }
}
