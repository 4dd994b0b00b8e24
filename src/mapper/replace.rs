use crate::document::RecipeDocument;
use crate::error::ImportError;
use crate::events::{DiagnosticSink, ImportEvent};
use crate::store::{MealTransaction, NewIngredient, RecipeAggregate};
use async_trait::async_trait;

/// How a meal's recipes are brought in line with a document.
#[async_trait]
pub trait ChildMergeStrategy: Send + Sync {
    async fn merge(
        &self,
        tx: &mut dyn MealTransaction,
        meal_id: i64,
        recipes: &[RecipeDocument],
        sink: &dyn DiagnosticSink,
    ) -> Result<Vec<RecipeAggregate>, ImportError>;
}

/// Delete every existing recipe of the meal, then create the document's
/// recipes from scratch. Applying the same document twice leaves exactly one
/// copy of each child.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplaceChildren;

#[async_trait]
impl ChildMergeStrategy for ReplaceChildren {
    async fn merge(
        &self,
        tx: &mut dyn MealTransaction,
        meal_id: i64,
        recipes: &[RecipeDocument],
        sink: &dyn DiagnosticSink,
    ) -> Result<Vec<RecipeAggregate>, ImportError> {
        let removed = tx.delete_recipes(meal_id).await?;
        if removed > 0 {
            sink.emit(ImportEvent::RecipesCleared { meal_id, removed });
        }

        let mut created = Vec::with_capacity(recipes.len());
        for (position, document) in recipes.iter().enumerate() {
            if let Some(aggregate) = create_recipe(tx, meal_id, position, document, sink).await? {
                created.push(aggregate);
            }
        }
        Ok(created)
    }
}

async fn create_recipe(
    tx: &mut dyn MealTransaction,
    meal_id: i64,
    position: usize,
    document: &RecipeDocument,
    sink: &dyn DiagnosticSink,
) -> Result<Option<RecipeAggregate>, ImportError> {
    let Some(title) = document.title.as_deref() else {
        sink.emit(ImportEvent::RecipeSkipped { meal_id, position });
        return Ok(None);
    };

    let recipe = tx
        .insert_recipe(meal_id, title, document.description.as_deref().unwrap_or(""))
        .await?;
    sink.emit(ImportEvent::RecipeCreated {
        meal_id,
        recipe_id: recipe.id,
        title: recipe.title.clone(),
    });

    let mut ingredients = Vec::with_capacity(document.ingredients.len());
    for (position, ingredient) in document.ingredients.iter().enumerate() {
        let Some(name) = ingredient.name.as_deref() else {
            sink.emit(ImportEvent::IngredientSkipped {
                recipe_id: recipe.id,
                position,
            });
            continue;
        };

        if ingredient.amount_is_unreadable() {
            sink.emit(ImportEvent::AmountNotNumeric {
                recipe_id: recipe.id,
                ingredient: name.to_string(),
                raw: ingredient.amount.clone().unwrap_or_default(),
            });
        }

        let row = tx
            .insert_ingredient(
                recipe.id,
                &NewIngredient {
                    name: name.to_string(),
                    amount: ingredient.amount_decimal(),
                    unit: ingredient.unit.clone(),
                },
            )
            .await?;
        sink.emit(ImportEvent::IngredientCreated {
            recipe_id: recipe.id,
            name: row.name.clone(),
        });
        ingredients.push(row);
    }

    let mut method = Vec::with_capacity(document.method.len());
    for (position, step) in document.method.iter().enumerate() {
        let step = step.trim();
        if step.is_empty() {
            sink.emit(ImportEvent::StepSkipped {
                recipe_id: recipe.id,
                position,
            });
            continue;
        }

        let row = tx.insert_step(recipe.id, step).await?;
        sink.emit(ImportEvent::StepCreated {
            recipe_id: recipe.id,
            step_id: row.id,
        });
        method.push(row);
    }

    Ok(Some(RecipeAggregate {
        recipe,
        ingredients,
        method,
    }))
}
