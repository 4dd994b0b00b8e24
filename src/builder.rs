use std::time::Duration;

use log::info;

use crate::document::parse_meal_reply;
use crate::events::{DiagnosticSink, LogSink};
use crate::mapper::RecipeDataMapper;
use crate::providers::{CompletionProvider, MEAL_PARSER_PROMPT};
use crate::store::{MealAggregate, MealStore};
use crate::url_to_text::PageFetcher;
use crate::ImportError;

/// Where the meal text comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Fetch a recipe page and read its visible text
    Url(String),
    /// Use text the user pasted in
    Text(String),
}

/// Where the imported meal goes.
#[derive(Debug, Clone, Copy)]
pub enum Target {
    /// Create a new meal in this collection
    Collection(i64),
    /// Replace the contents of this meal
    Meal(i64),
}

/// Result of a meal import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub aggregate: MealAggregate,
    /// `false` when an existing meal was updated
    pub created: bool,
}

/// Builder for configuring and executing meal imports
#[derive(Default)]
pub struct MealImporterBuilder<'a> {
    source: Option<InputSource>,
    target: Option<Target>,
    provider: Option<&'a dyn CompletionProvider>,
    store: Option<&'a dyn MealStore>,
    events: Option<&'a dyn DiagnosticSink>,
    timeout: Option<Duration>,
}

impl<'a> MealImporterBuilder<'a> {
    /// Set the input source to a URL
    ///
    /// # Example
    /// ```
    /// use ourmeals_import::MealImporter;
    ///
    /// let builder = MealImporter::builder()
    ///     .url("https://example.com/recipe");
    /// ```
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(InputSource::Url(url.into()));
        self
    }

    /// Set the input source to plain text
    ///
    /// # Example
    /// ```
    /// use ourmeals_import::MealImporter;
    ///
    /// let builder = MealImporter::builder()
    ///     .text("Pancakes: 1 cup flour, 2 eggs. Whisk and fry.");
    /// ```
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.source = Some(InputSource::Text(text.into()));
        self
    }

    /// Create a new meal in the given collection
    pub fn collection(mut self, collection_id: i64) -> Self {
        self.target = Some(Target::Collection(collection_id));
        self
    }

    /// Replace the recipes of an existing meal
    pub fn existing_meal(mut self, meal_id: i64) -> Self {
        self.target = Some(Target::Meal(meal_id));
        self
    }

    pub fn provider(mut self, provider: &'a dyn CompletionProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn store(mut self, store: &'a dyn MealStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Send import diagnostics somewhere other than the log
    pub fn events(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Set a timeout for page fetches
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Build and execute the import
    ///
    /// # Errors
    /// Returns `ImportError` if:
    /// - No source, provider or store was specified
    /// - The text is empty
    /// - The existing meal does not exist
    /// - The page fetch or the AI request fails
    /// - The reply holds no usable JSON
    /// - Writing to the store fails (nothing is kept in that case)
    ///
    /// # Example
    /// ```no_run
    /// # use ourmeals_import::{MealImporter, ProviderFactory, AppConfig, SqliteMealStore};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = AppConfig::load()?;
    /// let store = SqliteMealStore::connect(&config.database_url).await?;
    /// let provider = ProviderFactory::from_config(&config, None)?;
    ///
    /// let outcome = MealImporter::builder()
    ///     .url("https://example.com/recipe")
    ///     .collection(1)
    ///     .provider(provider.as_ref())
    ///     .store(&store)
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(self) -> Result<ImportOutcome, ImportError> {
        let source = self.source.ok_or_else(|| {
            ImportError::Builder("No input source specified. Use .url() or .text()".to_string())
        })?;
        let provider = self.provider.ok_or_else(|| {
            ImportError::Builder("No AI provider specified. Use .provider()".to_string())
        })?;
        let store = self
            .store
            .ok_or_else(|| ImportError::Builder("No store specified. Use .store()".to_string()))?;
        let sink: &dyn DiagnosticSink = match self.events {
            Some(sink) => sink,
            None => &LogSink,
        };

        if let InputSource::Text(text) = &source {
            if text.trim().is_empty() {
                return Err(ImportError::InvalidInput(
                    "Recipe text cannot be empty".to_string(),
                ));
            }
        }

        let (meal, collection_id) = match self.target {
            Some(Target::Meal(meal_id)) => {
                let meal = store
                    .load_meal(meal_id)
                    .await?
                    .ok_or(ImportError::MealNotFound(meal_id))?;
                (Some(meal), None)
            }
            Some(Target::Collection(collection_id)) => (None, Some(collection_id)),
            None => (None, None),
        };

        let (text, page_url) = match source {
            InputSource::Url(url) => {
                let fetcher = PageFetcher::new(self.timeout)?;
                (fetcher.fetch_text(&url).await?, Some(url))
            }
            InputSource::Text(text) => (text, None),
        };

        info!(
            "Asking {} to read {} characters of meal text",
            provider.provider_name(),
            text.len()
        );
        let reply = provider.complete(MEAL_PARSER_PROMPT, &text).await?;

        let mut document = parse_meal_reply(&reply, sink)?;
        if document.source_url.is_none() {
            document.source_url = page_url;
        }

        let (aggregate, created) = RecipeDataMapper::new(store)
            .with_sink(sink)
            .apply(&document, meal, collection_id)
            .await?;

        info!(
            "Imported meal {} with {} recipes",
            aggregate.meal.id,
            aggregate.recipes.len()
        );
        Ok(ImportOutcome { aggregate, created })
    }
}

/// Main entry point for the builder API
pub struct MealImporter;

impl MealImporter {
    /// Creates a new builder for importing meals
    ///
    /// # Example
    /// ```
    /// use ourmeals_import::MealImporter;
    ///
    /// let builder = MealImporter::builder();
    /// ```
    pub fn builder<'a>() -> MealImporterBuilder<'a> {
        MealImporterBuilder::default()
    }
}
