use async_trait::async_trait;
use ourmeals_import::events::{ImportEvent, RecordingSink};
use ourmeals_import::store::{
    Ingredient, Meal, MealAggregate, MealStore, MealTransaction, MethodStep, NewIngredient,
    NewMeal, Recipe,
};
use ourmeals_import::{parse_meal_reply, ImportError, MealDocument, RecipeDataMapper, SqliteMealStore};
use rust_decimal::Decimal;
use std::str::FromStr;

const PASTA_NIGHT: &str = r#"```json
{
  "title": "Pasta Night",
  "description": "Two courses for four",
  "recipes": [
    {
      "title": "Tomato Sauce",
      "description": "Slow simmered",
      "ingredients": [
        {"name": "Tomatoes", "amount": "800", "unit": "g"},
        {"name": "Olive oil", "amount": "2", "unit": "tbsp"},
        {"name": "Salt", "amount": "to taste", "unit": ""},
        {"amount": "1", "unit": "clove"}
      ],
      "method": ["Warm the oil", "   ", "Add tomatoes and simmer"]
    },
    {
      "title": "Garlic Bread",
      "ingredients": [{"name": "Baguette", "amount": "1/2", "unit": ""}],
      "method": ["Slice", "Bake"]
    },
    {
      "ingredients": [{"name": "Mystery", "amount": "1", "unit": ""}],
      "method": ["Untitled recipes are dropped"]
    }
  ]
}
```"#;

fn document(reply: &str) -> MealDocument {
    parse_meal_reply(reply, &RecordingSink::new()).unwrap()
}

async fn setup() -> (SqliteMealStore, i64) {
    let store = SqliteMealStore::connect("sqlite::memory:").await.unwrap();
    let collection = store.create_collection("Weeknights", "").await.unwrap();
    (store, collection.id)
}

async fn count(store: &SqliteMealStore, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_mode_writes_the_whole_aggregate() {
    let (store, collection_id) = setup().await;
    let sink = RecordingSink::new();

    let (aggregate, created) = RecipeDataMapper::new(&store)
        .with_sink(&sink)
        .apply(&document(PASTA_NIGHT), None, Some(collection_id))
        .await
        .unwrap();

    assert!(created);
    assert_eq!(aggregate.meal.title, "Pasta Night");
    assert_eq!(aggregate.meal.description, "Two courses for four");
    assert_eq!(aggregate.meal.collection_id, collection_id);
    assert_eq!(aggregate.recipes.len(), 2);

    let sauce = &aggregate.recipes[0];
    assert_eq!(sauce.recipe.title, "Tomato Sauce");
    let names: Vec<_> = sauce.ingredients.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Tomatoes", "Olive oil", "Salt"]);
    assert_eq!(sauce.ingredients[0].amount, Some(Decimal::from(800)));
    assert_eq!(sauce.ingredients[2].amount, None);
    let steps: Vec<_> = sauce.method.iter().map(|s| s.description.as_str()).collect();
    assert_eq!(steps, vec!["Warm the oil", "Add tomatoes and simmer"]);

    let bread = &aggregate.recipes[1];
    assert_eq!(bread.ingredients[0].amount, Some(Decimal::from_str("0.5").unwrap()));

    let stored = store.load_aggregate(aggregate.meal.id).await.unwrap().unwrap();
    assert_eq!(stored, aggregate);

    assert_eq!(sink.count(|e| matches!(e, ImportEvent::RecipeSkipped { .. })), 1);
    assert_eq!(sink.count(|e| matches!(e, ImportEvent::IngredientSkipped { .. })), 1);
    assert_eq!(sink.count(|e| matches!(e, ImportEvent::StepSkipped { .. })), 1);
    assert_eq!(sink.count(|e| matches!(e, ImportEvent::MealCreated { .. })), 1);
}

#[tokio::test]
async fn test_non_numeric_amount_is_kept_without_amount() {
    let (store, collection_id) = setup().await;
    let sink = RecordingSink::new();
    let doc = document(
        r#"{"title": "Soup", "recipes": [{"title": "Broth", "ingredients": [
            {"name": "Pepper", "amount": "to taste", "unit": ""},
            {"name": "Stock", "amount": "abc123", "unit": "ml"}
        ], "method": []}]}"#,
    );

    let (aggregate, _) = RecipeDataMapper::new(&store)
        .with_sink(&sink)
        .apply(&doc, None, Some(collection_id))
        .await
        .unwrap();

    let ingredients = &aggregate.recipes[0].ingredients;
    assert_eq!(ingredients.len(), 2);
    assert!(ingredients.iter().all(|i| i.amount.is_none()));
    assert_eq!(
        sink.count(|e| matches!(e, ImportEvent::AmountNotNumeric { .. })),
        2
    );
}

#[tokio::test]
async fn test_update_mode_is_idempotent() {
    let (store, collection_id) = setup().await;
    let mapper = RecipeDataMapper::new(&store);
    let doc = document(PASTA_NIGHT);

    let (first, created) = mapper.apply(&doc, None, Some(collection_id)).await.unwrap();
    assert!(created);

    for _ in 0..2 {
        let meal = store.load_meal(first.meal.id).await.unwrap().unwrap();
        let (updated, created) = mapper.apply(&doc, Some(meal), None).await.unwrap();

        assert!(!created);
        assert_eq!(updated.meal.id, first.meal.id);
        assert_eq!(updated.recipes.len(), 2);
        assert_eq!(updated.ingredient_count(), first.ingredient_count());
        assert_eq!(updated.step_count(), first.step_count());
    }

    assert_eq!(count(&store, "meals").await, 1);
    assert_eq!(count(&store, "recipes").await, 2);
    assert_eq!(count(&store, "ingredients").await, 4);
    assert_eq!(count(&store, "method_steps").await, 4);
}

#[tokio::test]
async fn test_update_mode_overwrites_title_and_keeps_url() {
    let (store, collection_id) = setup().await;
    let mapper = RecipeDataMapper::new(&store);

    let original = document(r#"{"title": "Old", "url": "https://example.com/old", "recipes": []}"#);
    let (first, _) = mapper.apply(&original, None, Some(collection_id)).await.unwrap();
    assert_eq!(first.meal.url.as_deref(), Some("https://example.com/old"));

    let replacement = document(r#"{"title": "New", "description": "Fresh", "recipes": []}"#);
    let (updated, created) = mapper
        .apply(&replacement, Some(first.meal.clone()), None)
        .await
        .unwrap();

    assert!(!created);
    assert_eq!(updated.meal.title, "New");
    assert_eq!(updated.meal.description, "Fresh");
    assert_eq!(updated.meal.url.as_deref(), Some("https://example.com/old"));

    let stored = store.load_meal(first.meal.id).await.unwrap().unwrap();
    assert_eq!(stored, updated.meal);
}

#[tokio::test]
async fn test_update_mode_replaces_url_from_document() {
    let (store, collection_id) = setup().await;
    let mapper = RecipeDataMapper::new(&store);

    let original = document(r#"{"title": "Curry", "url": "https://example.com/old", "recipes": []}"#);
    let (first, _) = mapper.apply(&original, None, Some(collection_id)).await.unwrap();

    let moved = document(r#"{"title": "Curry", "url": "https://example.com/new", "recipes": []}"#);
    let (updated, _) = mapper
        .apply(&moved, Some(first.meal.clone()), None)
        .await
        .unwrap();
    assert_eq!(updated.meal.url.as_deref(), Some("https://example.com/new"));

    let aliased = document(
        r#"{"title": "Curry", "source_url": "https://example.com/alias", "recipes": []}"#,
    );
    let meal = store.load_meal(first.meal.id).await.unwrap().unwrap();
    let (updated, created) = mapper.apply(&aliased, Some(meal), None).await.unwrap();
    assert!(!created);
    assert_eq!(updated.meal.url.as_deref(), Some("https://example.com/alias"));

    let stored = store.load_meal(first.meal.id).await.unwrap().unwrap();
    assert_eq!(stored.url.as_deref(), Some("https://example.com/alias"));
    assert_eq!(count(&store, "meals").await, 1);
}

#[tokio::test]
async fn test_empty_title_falls_back() {
    let (store, collection_id) = setup().await;

    let (aggregate, created) = RecipeDataMapper::new(&store)
        .apply(&document(r#"{"title":"","recipes":[]}"#), None, Some(collection_id))
        .await
        .unwrap();

    assert!(created);
    assert_eq!(aggregate.meal.title, "New Meal");
    assert!(aggregate.recipes.is_empty());
    assert_eq!(count(&store, "meals").await, 1);
}

#[tokio::test]
async fn test_missing_collection_writes_nothing() {
    let (store, _) = setup().await;

    let err = RecipeDataMapper::new(&store)
        .apply(&document(PASTA_NIGHT), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::MissingCollection));
    assert!(!err.is_retryable());
    assert_eq!(count(&store, "meals").await, 0);
    assert_eq!(count(&store, "recipes").await, 0);
}

#[tokio::test]
async fn test_malformed_reply_persists_nothing() {
    let (store, _) = setup().await;

    let err = parse_meal_reply(r#"{"title": "X",}"#, &RecordingSink::new()).unwrap_err();
    assert!(matches!(err, ImportError::JsonDecode(_)));
    assert!(err.user_message().starts_with("AI can be temperamental"));
    assert_eq!(count(&store, "meals").await, 0);
}

/// Delegates to SQLite but fails the first method step it is asked to write.
struct FailingStore {
    inner: SqliteMealStore,
}

struct FailingTransaction {
    inner: Box<dyn MealTransaction>,
}

#[async_trait]
impl MealStore for FailingStore {
    async fn begin(&self) -> Result<Box<dyn MealTransaction>, ImportError> {
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin().await?,
        }))
    }

    async fn load_meal(&self, meal_id: i64) -> Result<Option<Meal>, ImportError> {
        self.inner.load_meal(meal_id).await
    }

    async fn load_aggregate(&self, meal_id: i64) -> Result<Option<MealAggregate>, ImportError> {
        self.inner.load_aggregate(meal_id).await
    }
}

#[async_trait]
impl MealTransaction for FailingTransaction {
    async fn insert_meal(&mut self, meal: &NewMeal) -> Result<Meal, ImportError> {
        self.inner.insert_meal(meal).await
    }

    async fn update_meal(&mut self, meal: &Meal) -> Result<(), ImportError> {
        self.inner.update_meal(meal).await
    }

    async fn delete_recipes(&mut self, meal_id: i64) -> Result<u64, ImportError> {
        self.inner.delete_recipes(meal_id).await
    }

    async fn insert_recipe(
        &mut self,
        meal_id: i64,
        title: &str,
        description: &str,
    ) -> Result<Recipe, ImportError> {
        self.inner.insert_recipe(meal_id, title, description).await
    }

    async fn insert_ingredient(
        &mut self,
        recipe_id: i64,
        ingredient: &NewIngredient,
    ) -> Result<Ingredient, ImportError> {
        self.inner.insert_ingredient(recipe_id, ingredient).await
    }

    async fn insert_step(
        &mut self,
        _recipe_id: i64,
        _description: &str,
    ) -> Result<MethodStep, ImportError> {
        Err(ImportError::Store(sqlx::Error::Protocol(
            "disk I/O error".to_string(),
        )))
    }

    async fn commit(&mut self) -> Result<(), ImportError> {
        self.inner.commit().await
    }

    async fn rollback(&mut self) -> Result<(), ImportError> {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn test_failure_mid_aggregate_rolls_back_create() {
    let (store, collection_id) = setup().await;
    let failing = FailingStore {
        inner: store.clone(),
    };
    let sink = RecordingSink::new();

    let err = RecipeDataMapper::new(&failing)
        .with_sink(&sink)
        .apply(&document(PASTA_NIGHT), None, Some(collection_id))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Store(_)));
    assert_eq!(sink.count(|e| matches!(e, ImportEvent::RolledBack { .. })), 1);
    assert_eq!(count(&store, "meals").await, 0);
    assert_eq!(count(&store, "recipes").await, 0);
    assert_eq!(count(&store, "ingredients").await, 0);
}

#[tokio::test]
async fn test_failure_mid_update_keeps_previous_recipes() {
    let (store, collection_id) = setup().await;
    let (first, _) = RecipeDataMapper::new(&store)
        .apply(&document(PASTA_NIGHT), None, Some(collection_id))
        .await
        .unwrap();

    let failing = FailingStore {
        inner: store.clone(),
    };
    let replacement = document(
        r#"{"title": "Changed", "recipes": [{"title": "Only", "ingredients": [], "method": ["Boom"]}]}"#,
    );
    let meal = store.load_meal(first.meal.id).await.unwrap().unwrap();
    let result = RecipeDataMapper::new(&failing)
        .apply(&replacement, Some(meal), None)
        .await;
    assert!(result.is_err());

    let stored = store.load_aggregate(first.meal.id).await.unwrap().unwrap();
    assert_eq!(stored, first);
}
