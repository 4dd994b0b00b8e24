//! Diagnostic events emitted while extracting and mapping a meal.
//!
//! The pipeline never logs through a global directly. It reports typed
//! [`ImportEvent`]s to a [`DiagnosticSink`]; [`LogSink`] forwards them to the
//! `log` facade and [`RecordingSink`] keeps them for inspection.

use log::{debug, error, info, warn};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    /// The candidate text failed to parse as JSON.
    JsonDecodeFailed { message: String, candidate: String },
    MealCreated { meal_id: i64, title: String },
    MealUpdated { meal_id: i64, title: String },
    /// Previous recipes were removed ahead of a full replace.
    RecipesCleared { meal_id: i64, removed: u64 },
    RecipeSkipped { meal_id: i64, position: usize },
    RecipeCreated { meal_id: i64, recipe_id: i64, title: String },
    IngredientSkipped { recipe_id: i64, position: usize },
    /// The ingredient was kept, with no amount.
    AmountNotNumeric { recipe_id: i64, ingredient: String, raw: String },
    IngredientCreated { recipe_id: i64, name: String },
    StepSkipped { recipe_id: i64, position: usize },
    StepCreated { recipe_id: i64, step_id: i64 },
    RolledBack { reason: String },
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: ImportEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, event: ImportEvent) {
        match event {
            ImportEvent::JsonDecodeFailed { message, candidate } => {
                error!("JSON decoding failed: {}", message);
                debug!("Failed JSON string: {}", candidate);
            }
            ImportEvent::MealCreated { meal_id, title } => {
                info!("Created Meal: {} (ID: {})", title, meal_id);
            }
            ImportEvent::MealUpdated { meal_id, title } => {
                info!("Updated Meal: {} (ID: {})", title, meal_id);
            }
            ImportEvent::RecipesCleared { meal_id, removed } => {
                debug!("Removed {} existing recipes from Meal ID: {}", removed, meal_id);
            }
            ImportEvent::RecipeSkipped { meal_id, position } => {
                warn!(
                    "Recipe {} of Meal ID {} has no title. Skipping this recipe.",
                    position, meal_id
                );
            }
            ImportEvent::RecipeCreated {
                meal_id,
                recipe_id,
                title,
            } => {
                info!(
                    "Created Recipe: {} (ID: {}) under Meal ID: {}",
                    title, recipe_id, meal_id
                );
            }
            ImportEvent::IngredientSkipped {
                recipe_id,
                position,
            } => {
                warn!(
                    "Ingredient {} of Recipe ID {} has no name. Skipping this ingredient.",
                    position, recipe_id
                );
            }
            ImportEvent::AmountNotNumeric {
                recipe_id,
                ingredient,
                raw,
            } => {
                warn!(
                    "Amount {:?} for {} in Recipe ID {} is not numeric; storing no amount",
                    raw, ingredient, recipe_id
                );
            }
            ImportEvent::IngredientCreated { recipe_id, name } => {
                info!("Added Ingredient: {} to Recipe ID: {}", name, recipe_id);
            }
            ImportEvent::StepSkipped {
                recipe_id,
                position,
            } => {
                warn!(
                    "Empty method step {} in Recipe ID {}. Skipping.",
                    position, recipe_id
                );
            }
            ImportEvent::StepCreated { recipe_id, step_id } => {
                debug!("Added MethodStep {} to Recipe ID: {}", step_id, recipe_id);
            }
            ImportEvent::RolledBack { reason } => {
                error!("Meal import rolled back: {}", reason);
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ImportEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ImportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&ImportEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, event: ImportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
