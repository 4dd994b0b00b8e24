//! Relational persistence for collections, meals and their children.

mod sqlite;

pub use sqlite::SqliteMealStore;

use crate::error::ImportError;
use crate::units::{self, Region};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meal {
    pub id: i64,
    pub collection_id: i64,
    pub url: Option<String>,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub meal_id: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub id: i64,
    pub recipe_id: i64,
    pub name: String,
    pub amount: Option<Decimal>,
    pub unit: String,
}

impl Ingredient {
    pub fn amount_in_grams(&self, region: Region) -> Option<Decimal> {
        self.amount
            .map(|amount| units::to_grams(amount, &self.unit, region))
    }
}

impl std::fmt::Display for Ingredient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.amount {
            Some(amount) => write!(f, "{} {} {}", amount, self.unit, self.name),
            None => write!(f, "{} ({})", self.name, self.unit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodStep {
    pub id: i64,
    pub recipe_id: i64,
    pub description: String,
}

/// Values for a meal row that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewMeal {
    pub collection_id: i64,
    pub url: Option<String>,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub amount: Option<Decimal>,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeAggregate {
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub method: Vec<MethodStep>,
}

/// A meal with all of its recipes, ingredients and steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealAggregate {
    pub meal: Meal,
    pub recipes: Vec<RecipeAggregate>,
}

impl MealAggregate {
    pub fn ingredient_count(&self) -> usize {
        self.recipes.iter().map(|r| r.ingredients.len()).sum()
    }

    pub fn step_count(&self) -> usize {
        self.recipes.iter().map(|r| r.method.len()).sum()
    }
}

#[async_trait]
pub trait MealStore: Send + Sync {
    /// Start an all-or-nothing unit of work.
    async fn begin(&self) -> Result<Box<dyn MealTransaction>, ImportError>;

    async fn load_meal(&self, meal_id: i64) -> Result<Option<Meal>, ImportError>;

    async fn load_aggregate(&self, meal_id: i64) -> Result<Option<MealAggregate>, ImportError>;
}

/// Writes against the store. Nothing is visible to readers until
/// [`MealTransaction::commit`]; dropping the transaction discards it.
#[async_trait]
pub trait MealTransaction: Send {
    async fn insert_meal(&mut self, meal: &NewMeal) -> Result<Meal, ImportError>;

    async fn update_meal(&mut self, meal: &Meal) -> Result<(), ImportError>;

    /// Delete every recipe of a meal together with their ingredients and steps.
    async fn delete_recipes(&mut self, meal_id: i64) -> Result<u64, ImportError>;

    async fn insert_recipe(
        &mut self,
        meal_id: i64,
        title: &str,
        description: &str,
    ) -> Result<Recipe, ImportError>;

    async fn insert_ingredient(
        &mut self,
        recipe_id: i64,
        ingredient: &NewIngredient,
    ) -> Result<Ingredient, ImportError>;

    async fn insert_step(
        &mut self,
        recipe_id: i64,
        description: &str,
    ) -> Result<MethodStep, ImportError>;

    async fn commit(&mut self) -> Result<(), ImportError>;

    async fn rollback(&mut self) -> Result<(), ImportError>;
}
