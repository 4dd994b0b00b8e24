use clap::{Parser, Subcommand};
use log::error;
use ourmeals_import::{
    parse_meal_reply, AppConfig, GroceryList, ImportError, LogSink, MealImporter,
    ProviderFactory, SqliteMealStore,
};
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "ourmeals-import")]
#[command(about = "Import meals into an OurMeals database with the help of an AI model", long_about = None)]
struct Cli {
    /// Database URL (overrides config)
    #[arg(long, global = true, env = "OURMEALS_DATABASE")]
    database: Option<String>,

    /// AI provider to use (overrides config)
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a meal from a recipe page
    Url {
        url: String,
        /// Collection the new meal is added to
        #[arg(long, required_unless_present = "meal")]
        collection: Option<i64>,
        /// Replace the recipes of this meal instead
        #[arg(long)]
        meal: Option<i64>,
    },
    /// Import a meal from a text file, or stdin with "-"
    Text {
        file: String,
        #[arg(long, required_unless_present = "meal")]
        collection: Option<i64>,
        #[arg(long)]
        meal: Option<i64>,
    },
    /// Parse an AI reply and print the meal document as JSON
    Parse { file: String },
    /// Create a collection
    Collection {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Print the combined grocery list for some recipes
    Grocery {
        #[arg(required = true)]
        recipe_ids: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ImportError> {
    let config = AppConfig::load()?;
    let database_url = cli.database.unwrap_or_else(|| config.database_url.clone());

    match cli.command {
        Commands::Url {
            url,
            collection,
            meal,
        } => {
            let store = SqliteMealStore::connect(&database_url).await?;
            let provider = ProviderFactory::from_config(&config, cli.provider.as_deref())?;

            let mut builder = MealImporter::builder()
                .url(url)
                .provider(provider.as_ref())
                .store(&store)
                .timeout(Duration::from_secs(config.timeout));
            builder = target(builder, collection, meal);

            let outcome = builder.build().await?;
            print_json(&outcome.aggregate)
        }
        Commands::Text {
            file,
            collection,
            meal,
        } => {
            let text = read_input(&file).await?;
            let store = SqliteMealStore::connect(&database_url).await?;
            let provider = ProviderFactory::from_config(&config, cli.provider.as_deref())?;

            let mut builder = MealImporter::builder()
                .text(text)
                .provider(provider.as_ref())
                .store(&store);
            builder = target(builder, collection, meal);

            let outcome = builder.build().await?;
            print_json(&outcome.aggregate)
        }
        Commands::Parse { file } => {
            let reply = read_input(&file).await?;
            let document = parse_meal_reply(&reply, &LogSink)?;
            print_json(&document)
        }
        Commands::Collection { title, description } => {
            let store = SqliteMealStore::connect(&database_url).await?;
            let collection = store.create_collection(&title, &description).await?;
            println!("Created collection {} ({})", collection.id, collection.title);
            Ok(())
        }
        Commands::Grocery { recipe_ids } => {
            let store = SqliteMealStore::connect(&database_url).await?;
            let list = GroceryList::for_recipes(&store, &recipe_ids).await?;
            for (item, quantity) in list.iter() {
                println!("{}: {}", item, quantity);
            }
            Ok(())
        }
    }
}

/// An existing meal wins over a collection.
fn target(
    builder: ourmeals_import::MealImporterBuilder<'_>,
    collection: Option<i64>,
    meal: Option<i64>,
) -> ourmeals_import::MealImporterBuilder<'_> {
    match (meal, collection) {
        (Some(meal_id), _) => builder.existing_meal(meal_id),
        (None, Some(collection_id)) => builder.collection(collection_id),
        (None, None) => builder,
    }
}

async fn read_input(path: &str) -> Result<String, ImportError> {
    let result = if path == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map(|_| text)
    } else {
        tokio::fs::read_to_string(path).await
    };

    result.map_err(|e| ImportError::InvalidInput(format!("Could not read {}: {}", path, e)))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ImportError> {
    let json = serde_json::to_string_pretty(value).map_err(ImportError::Output)?;
    println!("{}", json);
    Ok(())
}
