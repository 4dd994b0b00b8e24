//! Applying a [`MealDocument`] to the stored meal aggregate.

mod replace;

pub use replace::{ChildMergeStrategy, ReplaceChildren};

use crate::document::MealDocument;
use crate::error::ImportError;
use crate::events::{DiagnosticSink, ImportEvent, LogSink};
use crate::store::{Meal, MealAggregate, MealStore, MealTransaction, NewMeal};
use log::warn;

/// Writes a meal document into a [`MealStore`].
///
/// Without an existing meal a new one is created in the given collection
/// (create mode). With one, its title and description are overwritten and its
/// recipes replaced (update mode). Either way the whole aggregate is written
/// in one transaction, so a failure leaves nothing behind.
pub struct RecipeDataMapper<'a, S = ReplaceChildren> {
    store: &'a dyn MealStore,
    sink: &'a dyn DiagnosticSink,
    strategy: S,
}

impl<'a> RecipeDataMapper<'a> {
    pub fn new(store: &'a dyn MealStore) -> Self {
        RecipeDataMapper {
            store,
            sink: &LogSink,
            strategy: ReplaceChildren,
        }
    }
}

impl<'a, S: ChildMergeStrategy> RecipeDataMapper<'a, S> {
    pub fn with_sink(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_strategy<T: ChildMergeStrategy>(self, strategy: T) -> RecipeDataMapper<'a, T> {
        RecipeDataMapper {
            store: self.store,
            sink: self.sink,
            strategy,
        }
    }

    /// Apply `document`, returning the stored aggregate and whether the meal
    /// was newly created.
    ///
    /// # Errors
    /// - [`ImportError::MissingCollection`] when neither `meal` nor
    ///   `collection_id` is given; nothing is written.
    /// - Any store error, after the transaction has been rolled back.
    pub async fn apply(
        &self,
        document: &MealDocument,
        meal: Option<Meal>,
        collection_id: Option<i64>,
    ) -> Result<(MealAggregate, bool), ImportError> {
        if meal.is_none() && collection_id.is_none() {
            return Err(ImportError::MissingCollection);
        }
        let created = meal.is_none();

        let mut tx = self.store.begin().await?;
        match self.apply_in(tx.as_mut(), document, meal, collection_id).await {
            Ok(aggregate) => {
                tx.commit().await?;
                Ok((aggregate, created))
            }
            Err(err) => {
                self.sink.emit(ImportEvent::RolledBack {
                    reason: err.to_string(),
                });
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback after failed import also failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    async fn apply_in(
        &self,
        tx: &mut dyn MealTransaction,
        document: &MealDocument,
        meal: Option<Meal>,
        collection_id: Option<i64>,
    ) -> Result<MealAggregate, ImportError> {
        let meal = match meal {
            Some(mut meal) => {
                meal.title = document.title.clone();
                meal.description = document.description.clone().unwrap_or_default();
                if let Some(url) = &document.source_url {
                    meal.url = Some(url.clone());
                }
                tx.update_meal(&meal).await?;
                self.sink.emit(ImportEvent::MealUpdated {
                    meal_id: meal.id,
                    title: meal.title.clone(),
                });
                meal
            }
            None => {
                let collection_id = collection_id.ok_or(ImportError::MissingCollection)?;
                let meal = tx
                    .insert_meal(&NewMeal {
                        collection_id,
                        url: document.source_url.clone(),
                        title: document.title.clone(),
                        description: document.description.clone().unwrap_or_default(),
                    })
                    .await?;
                self.sink.emit(ImportEvent::MealCreated {
                    meal_id: meal.id,
                    title: meal.title.clone(),
                });
                meal
            }
        };

        let recipes = self
            .strategy
            .merge(tx, meal.id, &document.recipes, self.sink)
            .await?;

        Ok(MealAggregate { meal, recipes })
    }
}
