use chrono::Utc;
use sea_orm::sea_query::{
    Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder, SqliteQueryBuilder,
};
use sea_orm::*;
use tracing::{info, warn};

use crate::catalog::{self, CountedEntity, NewItem};
use crate::entity::{batch, batch_event, recipe, recipe_ingredient};

/// Demo catalog: (name, category, default unit, shelf life days).
const ITEMS: &[(&str, &str, &str, i32)] = &[
    ("鸡蛋", "protein", "pcs", 10),
    ("牛奶", "dairy", "ml", 7),
    ("鸡胸", "protein", "g", 4),
    ("番茄", "vegetable", "pcs", 5),
    ("蘑菇", "vegetable", "g", 4),
    ("洋葱", "vegetable", "pcs", 10),
    ("大米", "staple", "g", 180),
    ("面条", "staple", "g", 120),
    ("土豆", "vegetable", "pcs", 20),
    ("胡萝卜", "vegetable", "pcs", 14),
    ("生菜", "vegetable", "g", 5),
    ("酸奶", "dairy", "ml", 7),
];

struct SeedRecipe {
    name: &'static str,
    tags: &'static str,
    allergens: &'static str,
    steps: &'static str,
    calories: u32,
    ingredients: &'static [(&'static str, f64, &'static str)],
}

const RECIPES: &[SeedRecipe] = &[
    SeedRecipe {
        name: "蛋炒饭",
        tags: "rice,quick",
        allergens: "egg",
        steps: "炒蛋后下饭翻炒",
        calories: 520,
        ingredients: &[("鸡蛋", 2.0, "pcs"), ("大米", 150.0, "g"), ("洋葱", 0.5, "pcs")],
    },
    SeedRecipe {
        name: "番茄炒蛋",
        tags: "egg",
        allergens: "egg",
        steps: "番茄炒软后下蛋",
        calories: 320,
        ingredients: &[("鸡蛋", 2.0, "pcs"), ("番茄", 2.0, "pcs"), ("洋葱", 0.5, "pcs")],
    },
    SeedRecipe {
        name: "鸡胸沙拉",
        tags: "salad,protein",
        allergens: "",
        steps: "鸡胸煎熟切片拌生菜",
        calories: 280,
        ingredients: &[("鸡胸", 200.0, "g"), ("生菜", 120.0, "g"), ("番茄", 1.0, "pcs")],
    },
    SeedRecipe {
        name: "蘑菇汤",
        tags: "soup",
        allergens: "",
        steps: "蘑菇洋葱炒香加水煮",
        calories: 180,
        ingredients: &[("蘑菇", 150.0, "g"), ("洋葱", 1.0, "pcs"), ("牛奶", 200.0, "ml")],
    },
    SeedRecipe {
        name: "洋葱土豆炖鸡",
        tags: "stew",
        allergens: "",
        steps: "鸡胸与洋葱土豆炖煮",
        calories: 450,
        ingredients: &[("鸡胸", 200.0, "g"), ("土豆", 2.0, "pcs"), ("洋葱", 1.0, "pcs")],
    },
    SeedRecipe {
        name: "牛奶燕麦",
        tags: "breakfast",
        allergens: "dairy",
        steps: "牛奶加热与燕麦同煮",
        calories: 300,
        ingredients: &[("牛奶", 250.0, "ml"), ("酸奶", 150.0, "ml")],
    },
    SeedRecipe {
        name: "炒面",
        tags: "noodle",
        allergens: "",
        steps: "面条煮熟后与蔬菜翻炒",
        calories: 480,
        ingredients: &[("面条", 200.0, "g"), ("胡萝卜", 1.0, "pcs"), ("洋葱", 0.5, "pcs")],
    },
    SeedRecipe {
        name: "蔬菜沙拉",
        tags: "salad",
        allergens: "",
        steps: "生菜番茄胡萝卜拌匀",
        calories: 200,
        ingredients: &[("生菜", 150.0, "g"), ("番茄", 1.0, "pcs"), ("胡萝卜", 1.0, "pcs")],
    },
];

/// Seed the demo item catalog, recipes and recipe ingredients.
///
/// Every insert is skipped on conflict, so running this on a populated
/// database leaves existing rows untouched.
pub async fn seed_catalog(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut items_inserted = 0u32;
    for &(name, category, unit, shelf_life) in ITEMS {
        let new_item = NewItem {
            name: name.to_string(),
            category: category.to_string(),
            default_unit: unit.to_string(),
            shelf_life_days_default: Some(shelf_life),
        };
        if catalog::insert_item_if_absent(db, &new_item).await? {
            items_inserted += 1;
        }
    }
    if items_inserted > 0 {
        info!("Seeded {} new items", items_inserted);
    }

    let mut recipes_inserted = 0u32;
    for seed in RECIPES {
        let model = recipe::ActiveModel {
            name: Set(seed.name.to_string()),
            tags: Set(seed.tags.to_string()),
            allergens: Set(seed.allergens.to_string()),
            steps: Set(seed.steps.to_string()),
            nutrition: Set(serde_json::json!({ "calories": seed.calories })),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let result = recipe::Entity::insert(model)
            .on_conflict(
                OnConflict::column(recipe::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(rows) if rows > 0 => recipes_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }
    if recipes_inserted > 0 {
        info!("Seeded {} new recipes", recipes_inserted);
    }

    let ingredients_inserted = seed_ingredients(db).await?;
    if ingredients_inserted > 0 {
        info!("Seeded {} new recipe ingredients", ingredients_inserted);
    }

    info!(
        items = catalog::count_rows(db, CountedEntity::Item).await?,
        recipes = catalog::count_rows(db, CountedEntity::Recipe).await?,
        "Catalog ready"
    );
    Ok(())
}

async fn seed_ingredients(db: &DatabaseConnection) -> Result<u32, DbErr> {
    let items = catalog::list_items(db).await?;
    let recipes = catalog::list_recipes(db).await?;

    let mut inserted = 0u32;
    for seed in RECIPES {
        let Some(recipe) = recipes.iter().find(|r| r.name == seed.name) else {
            continue;
        };

        for (position, &(item_name, quantity, unit)) in seed.ingredients.iter().enumerate() {
            let Some(item) = items.iter().find(|i| i.name == item_name) else {
                warn!(recipe = seed.name, item = item_name, "Seed ingredient has no item");
                continue;
            };

            let model = recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe.id),
                item_id: Set(item.id),
                quantity: Set(quantity),
                unit: Set(unit.to_string()),
                position: Set(position as i32),
                ..Default::default()
            };

            let result = recipe_ingredient::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        recipe_ingredient::Column::RecipeId,
                        recipe_ingredient::Column::ItemId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await;

            match result {
                Ok(rows) if rows > 0 => inserted += 1,
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(e) => return Err(e),
            }
        }
    }

    Ok(inserted)
}

/// Ensure the composite indexes the ledger queries rely on.
///
/// Schema sync only creates single-column indexes, so these are added on
/// startup. A failure is logged and skipped.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Expiring list: WHERE status = ? AND expire_date <= ?
    let batch_status_expire = Index::create()
        .if_not_exists()
        .name("idx_batch_status_expire")
        .table(batch::Entity)
        .col(batch::Column::Status)
        .col(batch::Column::ExpireDate)
        .to_owned();
    create_index(db, "idx_batch_status_expire", &batch_status_expire).await;

    // Event replay: WHERE batch_id = ? ORDER BY created_at, id
    let event_batch_created = Index::create()
        .if_not_exists()
        .name("idx_batch_event_batch_created")
        .table(batch_event::Entity)
        .col(batch_event::Column::BatchId)
        .col(batch_event::Column::CreatedAt)
        .to_owned();
    create_index(db, "idx_batch_event_batch_created", &event_batch_created).await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: &IndexCreateStatement) {
    let sql = match db.get_database_backend() {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    };

    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => warn!("Failed to create index {}: {}", name, e),
    }
}
