//! The parsed meal document handed from the AI reply to the mapper.
//!
//! Conversion from JSON is lenient: anything the mapper can skip or default
//! is kept here and dealt with there, so nothing in a reply fails the whole
//! import except a top level that is neither an object nor an array.

use crate::error::ImportError;
use crate::events::DiagnosticSink;
use crate::extract::extract_json_with;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Title given to a meal whose document has none.
pub const DEFAULT_MEAL_TITLE: &str = "New Meal";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealDocument {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub recipes: Vec<RecipeDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeDocument {
    /// Recipes without a title are dropped by the mapper.
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ingredients: Vec<IngredientDocument>,
    pub method: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngredientDocument {
    /// Ingredients without a name are dropped by the mapper.
    pub name: Option<String>,
    /// The amount as the reply wrote it; see [`IngredientDocument::amount_decimal`].
    pub amount: Option<String>,
    pub unit: String,
}

impl Default for MealDocument {
    fn default() -> Self {
        MealDocument {
            title: DEFAULT_MEAL_TITLE.to_string(),
            description: None,
            source_url: None,
            recipes: Vec::new(),
        }
    }
}

impl MealDocument {
    /// Build a document from parsed JSON.
    ///
    /// A top-level array is read as the meal's list of recipes.
    pub fn from_value(value: &Value) -> Result<Self, ImportError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Array(items) => Ok(MealDocument {
                recipes: items.iter().map(RecipeDocument::from_value).collect(),
                ..Default::default()
            }),
            other => Err(ImportError::NotAMealDocument(format!(
                "expected an object or an array, found {}",
                kind_of(other)
            ))),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let title = text_field(map, "title").unwrap_or_else(|| DEFAULT_MEAL_TITLE.to_string());
        let source_url = text_field(map, "url").or_else(|| text_field(map, "source_url"));
        let recipes = match map.get("recipes") {
            Some(Value::Array(items)) => items.iter().map(RecipeDocument::from_value).collect(),
            _ => Vec::new(),
        };

        MealDocument {
            title,
            description: text_field(map, "description"),
            source_url,
            recipes,
        }
    }
}

impl RecipeDocument {
    fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return RecipeDocument::default();
        };

        let ingredients = match map.get("ingredients") {
            Some(Value::Array(items)) => items.iter().map(IngredientDocument::from_value).collect(),
            _ => Vec::new(),
        };

        let method = match map.get("method") {
            Some(Value::Array(steps)) => steps.iter().map(step_text).collect(),
            Some(Value::String(text)) => text.lines().map(str::to_string).collect(),
            _ => Vec::new(),
        };

        RecipeDocument {
            title: text_field(map, "title"),
            description: text_field(map, "description"),
            ingredients,
            method,
        }
    }
}

impl IngredientDocument {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => IngredientDocument {
                name: text_field(map, "name"),
                amount: map.get("amount").and_then(raw_amount),
                unit: map
                    .get("unit")
                    .and_then(scalar_text)
                    .unwrap_or_default(),
            },
            // A bare line such as "salt and pepper".
            Value::String(line) if !line.trim().is_empty() => IngredientDocument {
                name: Some(line.trim().to_string()),
                ..Default::default()
            },
            _ => IngredientDocument::default(),
        }
    }

    /// The amount as a decimal, or `None` when absent or not numeric.
    pub fn amount_decimal(&self) -> Option<Decimal> {
        self.amount.as_deref().and_then(coerce_amount)
    }

    /// True when an amount was written but could not be read as a number.
    pub fn amount_is_unreadable(&self) -> bool {
        self.amount.is_some() && self.amount_decimal().is_none()
    }
}

/// Read an amount such as `"1.5"`, `" 2 "`, `"1e2"` or `"-3"` as a decimal.
///
/// Anything else (`"to taste"`, `"abc123"`, `"2 1/4"`) is `None`, as is any
/// amount that does not fit eight digits with two decimal places.
pub fn coerce_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()?;

    // 999999.99
    let limit = Decimal::new(99_999_999, 2);
    if amount.round_dp(2).abs() > limit {
        return None;
    }
    Some(amount)
}

/// Locate, normalize and parse the JSON in an AI reply, then read it as a meal.
pub fn parse_meal_reply(reply: &str, sink: &dyn DiagnosticSink) -> Result<MealDocument, ImportError> {
    let value = extract_json_with(reply, sink)?;
    MealDocument::from_value(&value)
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(scalar_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn raw_amount(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn step_text(value: &Value) -> String {
    scalar_text(value).unwrap_or_default()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
