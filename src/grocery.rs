//! Combining the ingredients of several recipes into one shopping list.

use crate::error::ImportError;
use crate::store::{Ingredient, SqliteMealStore};
use log::warn;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroceryQuantity {
    Amount(Decimal),
    ToTaste,
}

impl fmt::Display for GroceryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroceryQuantity::Amount(amount) => write!(f, "{}", amount.normalize()),
            GroceryQuantity::ToTaste => write!(f, "to taste"),
        }
    }
}

/// Quantities keyed by `"<name> (<unit>)"`, listed alphabetically.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroceryList {
    items: BTreeMap<String, GroceryQuantity>,
}

impl GroceryList {
    /// Sum amounts per name and unit. An ingredient without an amount only
    /// shows as "to taste" while nothing numeric has been seen for its key.
    pub fn from_ingredients<'a>(ingredients: impl IntoIterator<Item = &'a Ingredient>) -> Self {
        let mut items: BTreeMap<String, GroceryQuantity> = BTreeMap::new();

        for ingredient in ingredients {
            let key = format!("{} ({})", ingredient.name, ingredient.unit);
            let entry = items.entry(key.clone()).or_insert(GroceryQuantity::ToTaste);

            if let Some(amount) = ingredient.amount {
                *entry = match *entry {
                    GroceryQuantity::Amount(total) => {
                        GroceryQuantity::Amount(total.checked_add(amount).unwrap_or_else(|| {
                            warn!("Total for {} is out of range, capping it", key);
                            total.saturating_add(amount)
                        }))
                    }
                    GroceryQuantity::ToTaste => GroceryQuantity::Amount(amount),
                };
            }
        }

        GroceryList { items }
    }

    /// Build the list for the given recipes straight from the store.
    pub async fn for_recipes(
        store: &SqliteMealStore,
        recipe_ids: &[i64],
    ) -> Result<Self, ImportError> {
        let ingredients = store.ingredients_for_recipes(recipe_ids).await?;
        Ok(Self::from_ingredients(&ingredients))
    }

    pub fn get(&self, key: &str) -> Option<GroceryQuantity> {
        self.items.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, GroceryQuantity)> {
        self.items.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(name: &str, amount: Option<Decimal>, unit: &str) -> Ingredient {
        Ingredient {
            id: 0,
            recipe_id: 0,
            name: name.to_string(),
            amount,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_sums_matching_name_and_unit() {
        let list = GroceryList::from_ingredients(&[
            ingredient("Flour", Some(Decimal::new(15, 1)), "cup"),
            ingredient("Flour", Some(Decimal::ONE), "cup"),
            ingredient("Flour", Some(Decimal::from(100)), "g"),
        ]);

        assert_eq!(list.len(), 2);
        assert_eq!(
            list.get("Flour (cup)"),
            Some(GroceryQuantity::Amount(Decimal::new(25, 1)))
        );
        assert_eq!(
            list.get("Flour (g)"),
            Some(GroceryQuantity::Amount(Decimal::from(100)))
        );
    }

    #[test]
    fn test_to_taste_only_without_amounts() {
        let list = GroceryList::from_ingredients(&[
            ingredient("Salt", None, ""),
            ingredient("Pepper", Some(Decimal::ONE), "tsp"),
            ingredient("Pepper", None, "tsp"),
        ]);

        assert_eq!(list.get("Salt ()"), Some(GroceryQuantity::ToTaste));
        assert_eq!(
            list.get("Pepper (tsp)"),
            Some(GroceryQuantity::Amount(Decimal::ONE))
        );
    }

    #[test]
    fn test_amount_replaces_to_taste() {
        let list = GroceryList::from_ingredients(&[
            ingredient("Oil", None, "tbsp"),
            ingredient("Oil", Some(Decimal::TWO), "tbsp"),
        ]);
        assert_eq!(
            list.get("Oil (tbsp)"),
            Some(GroceryQuantity::Amount(Decimal::TWO))
        );
    }

    #[test]
    fn test_sorted_iteration_and_display() {
        let list = GroceryList::from_ingredients(&[
            ingredient("Zucchini", Some(Decimal::new(200, 2)), ""),
            ingredient("Apple", None, ""),
        ]);

        let rendered: Vec<String> = list.iter().map(|(k, q)| format!("{}: {}", k, q)).collect();
        assert_eq!(rendered, vec!["Apple (): to taste", "Zucchini (): 2"]);
    }

    #[test]
    fn test_huge_totals_are_capped() {
        let list = GroceryList::from_ingredients(&[
            ingredient("Flour", Some(Decimal::MAX), "g"),
            ingredient("Flour", Some(Decimal::MAX), "g"),
            ingredient("Sugar", Some(Decimal::MIN), "g"),
            ingredient("Sugar", Some(Decimal::MIN), "g"),
        ]);

        assert_eq!(list.get("Flour (g)"), Some(GroceryQuantity::Amount(Decimal::MAX)));
        assert_eq!(list.get("Sugar (g)"), Some(GroceryQuantity::Amount(Decimal::MIN)));
    }
}
