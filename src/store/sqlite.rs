use super::{
    Collection, Ingredient, Meal, MealAggregate, MealStore, MealTransaction, MethodStep,
    NewIngredient, NewMeal, Recipe, RecipeAggregate,
};
use crate::error::ImportError;
use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS collections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS meals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
        url TEXT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS recipes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ingredients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        amount TEXT,
        unit TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS method_steps (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
        description TEXT NOT NULL
    )
    "#,
];

/// Amounts are kept to two decimal places.
const AMOUNT_SCALE: u32 = 2;

/// [`MealStore`] backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteMealStore {
    pool: SqlitePool,
}

impl SqliteMealStore {
    /// Open (creating if missing) the database at `url` and apply the schema.
    ///
    /// `sqlite::memory:` databases live on a single connection, since each
    /// connection would otherwise see its own empty database.
    pub async fn connect(url: &str) -> Result<Self, ImportError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        let store = Self::from_pool(pool);
        store.migrate().await?;
        info!("Opened meal store at {}", url);
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), ImportError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn create_collection(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Collection, ImportError> {
        let id = sqlx::query("INSERT INTO collections (title, description) VALUES (?, ?)")
            .bind(title)
            .bind(description)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Collection {
            id,
            title: title.to_string(),
            description: description.to_string(),
        })
    }

    /// Every ingredient belonging to the given recipes, in insertion order.
    pub async fn ingredients_for_recipes(
        &self,
        recipe_ids: &[i64],
    ) -> Result<Vec<Ingredient>, ImportError> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; recipe_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, recipe_id, name, amount, unit FROM ingredients \
             WHERE recipe_id IN ({}) ORDER BY id",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in recipe_ids {
            query = query.bind(*id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(ingredient_from_row).collect()
    }

    async fn load_recipe_children(
        &self,
        recipe: Recipe,
    ) -> Result<RecipeAggregate, ImportError> {
        let ingredients = sqlx::query(
            "SELECT id, recipe_id, name, amount, unit FROM ingredients \
             WHERE recipe_id = ? ORDER BY id",
        )
        .bind(recipe.id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(ingredient_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        let method = sqlx::query(
            "SELECT id, recipe_id, description FROM method_steps \
             WHERE recipe_id = ? ORDER BY id",
        )
        .bind(recipe.id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(step_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(RecipeAggregate {
            recipe,
            ingredients,
            method,
        })
    }
}

#[async_trait]
impl MealStore for SqliteMealStore {
    async fn begin(&self) -> Result<Box<dyn MealTransaction>, ImportError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTransaction { tx: Some(tx) }))
    }

    async fn load_meal(&self, meal_id: i64) -> Result<Option<Meal>, ImportError> {
        let row = sqlx::query(
            "SELECT id, collection_id, url, title, description FROM meals WHERE id = ?",
        )
        .bind(meal_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(meal_from_row).transpose()
    }

    async fn load_aggregate(&self, meal_id: i64) -> Result<Option<MealAggregate>, ImportError> {
        let Some(meal) = self.load_meal(meal_id).await? else {
            return Ok(None);
        };

        let recipes = sqlx::query(
            "SELECT id, meal_id, title, description FROM recipes WHERE meal_id = ? ORDER BY id",
        )
        .bind(meal_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(recipe_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        let mut aggregates = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            aggregates.push(self.load_recipe_children(recipe).await?);
        }

        Ok(Some(MealAggregate {
            meal,
            recipes: aggregates,
        }))
    }
}

struct SqliteTransaction {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteTransaction {
    fn conn(&mut self) -> Result<&mut SqliteConnection, ImportError> {
        self.tx.as_deref_mut().ok_or_else(|| {
            ImportError::Store(sqlx::Error::Protocol(
                "transaction already finished".to_string(),
            ))
        })
    }
}

#[async_trait]
impl MealTransaction for SqliteTransaction {
    async fn insert_meal(&mut self, meal: &NewMeal) -> Result<Meal, ImportError> {
        let conn = self.conn()?;
        let id = sqlx::query(
            "INSERT INTO meals (collection_id, url, title, description) VALUES (?, ?, ?, ?)",
        )
        .bind(meal.collection_id)
        .bind(meal.url.as_deref())
        .bind(&meal.title)
        .bind(&meal.description)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(Meal {
            id,
            collection_id: meal.collection_id,
            url: meal.url.clone(),
            title: meal.title.clone(),
            description: meal.description.clone(),
        })
    }

    async fn update_meal(&mut self, meal: &Meal) -> Result<(), ImportError> {
        let conn = self.conn()?;
        sqlx::query("UPDATE meals SET url = ?, title = ?, description = ? WHERE id = ?")
            .bind(meal.url.as_deref())
            .bind(&meal.title)
            .bind(&meal.description)
            .bind(meal.id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn delete_recipes(&mut self, meal_id: i64) -> Result<u64, ImportError> {
        let conn = self.conn()?;

        sqlx::query(
            "DELETE FROM ingredients WHERE recipe_id IN (SELECT id FROM recipes WHERE meal_id = ?)",
        )
        .bind(meal_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "DELETE FROM method_steps WHERE recipe_id IN (SELECT id FROM recipes WHERE meal_id = ?)",
        )
        .bind(meal_id)
        .execute(&mut *conn)
        .await?;

        let removed = sqlx::query("DELETE FROM recipes WHERE meal_id = ?")
            .bind(meal_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        debug!("Deleted {} recipes of meal {}", removed, meal_id);
        Ok(removed)
    }

    async fn insert_recipe(
        &mut self,
        meal_id: i64,
        title: &str,
        description: &str,
    ) -> Result<Recipe, ImportError> {
        let conn = self.conn()?;
        let id = sqlx::query("INSERT INTO recipes (meal_id, title, description) VALUES (?, ?, ?)")
            .bind(meal_id)
            .bind(title)
            .bind(description)
            .execute(&mut *conn)
            .await?
            .last_insert_rowid();

        Ok(Recipe {
            id,
            meal_id,
            title: title.to_string(),
            description: description.to_string(),
        })
    }

    async fn insert_ingredient(
        &mut self,
        recipe_id: i64,
        ingredient: &NewIngredient,
    ) -> Result<Ingredient, ImportError> {
        let amount = ingredient.amount.map(|a| a.round_dp(AMOUNT_SCALE));
        let conn = self.conn()?;
        let id = sqlx::query(
            "INSERT INTO ingredients (recipe_id, name, amount, unit) VALUES (?, ?, ?, ?)",
        )
        .bind(recipe_id)
        .bind(&ingredient.name)
        .bind(amount.map(|a| a.to_string()))
        .bind(&ingredient.unit)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(Ingredient {
            id,
            recipe_id,
            name: ingredient.name.clone(),
            amount,
            unit: ingredient.unit.clone(),
        })
    }

    async fn insert_step(
        &mut self,
        recipe_id: i64,
        description: &str,
    ) -> Result<MethodStep, ImportError> {
        let conn = self.conn()?;
        let id = sqlx::query("INSERT INTO method_steps (recipe_id, description) VALUES (?, ?)")
            .bind(recipe_id)
            .bind(description)
            .execute(&mut *conn)
            .await?
            .last_insert_rowid();

        Ok(MethodStep {
            id,
            recipe_id,
            description: description.to_string(),
        })
    }

    async fn commit(&mut self) -> Result<(), ImportError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), ImportError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

fn meal_from_row(row: &SqliteRow) -> Result<Meal, ImportError> {
    Ok(Meal {
        id: row.try_get("id")?,
        collection_id: row.try_get("collection_id")?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
    })
}

fn recipe_from_row(row: &SqliteRow) -> Result<Recipe, ImportError> {
    Ok(Recipe {
        id: row.try_get("id")?,
        meal_id: row.try_get("meal_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
    })
}

fn ingredient_from_row(row: &SqliteRow) -> Result<Ingredient, ImportError> {
    let amount = row
        .try_get::<Option<String>, _>("amount")?
        .map(|a| Decimal::from_str(&a))
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(Ingredient {
        id: row.try_get("id")?,
        recipe_id: row.try_get("recipe_id")?,
        name: row.try_get("name")?,
        amount,
        unit: row.try_get("unit")?,
    })
}

fn step_from_row(row: &SqliteRow) -> Result<MethodStep, ImportError> {
    Ok(MethodStep {
        id: row.try_get("id")?,
        recipe_id: row.try_get("recipe_id")?,
        description: row.try_get("description")?,
    })
}
