//! Import meals from recipe pages and pasted text into an OurMeals database.
//!
//! An AI provider turns the text into a JSON meal document; the reply is
//! pulled out of its prose, cleaned up and parsed, then written into the
//! store as one meal with its recipes, ingredients and method steps.

pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod extract;
pub mod grocery;
pub mod mapper;
pub mod providers;
pub mod store;
pub mod units;
pub mod url_to_text;

pub use builder::{ImportOutcome, InputSource, MealImporter, MealImporterBuilder, Target};
pub use config::{AppConfig, ProviderConfig};
pub use document::{
    parse_meal_reply, IngredientDocument, MealDocument, RecipeDocument, DEFAULT_MEAL_TITLE,
};
pub use error::ImportError;
pub use events::{DiagnosticSink, ImportEvent, LogSink, RecordingSink};
pub use extract::{extract_json, extract_json_with};
pub use grocery::{GroceryList, GroceryQuantity};
pub use mapper::{ChildMergeStrategy, RecipeDataMapper, ReplaceChildren};
pub use providers::{CompletionProvider, ProviderFactory, MEAL_PARSER_PROMPT};
pub use store::{MealAggregate, MealStore, MealTransaction, SqliteMealStore};
pub use units::Region;
