//! Menu-to-ingredient aggregation and shopping-list reconciliation.
//!
//! Pipeline: flatten menu -> resolve against recipe table -> generative
//! fallback for the misses (one call, only if needed) -> merge provenance ->
//! normalize each ingredient against the shopping list.
//!
//! Ingredient keys are the trimmed text exactly as the recipe or the
//! generator wrote it, so `Onion` and `onion` stay separate entries.
use crate::config::ServiceConfig;
use crate::error::GroceryError;
use crate::fallback::{self, TextGenerator};
use crate::menu::{self, MenuDay};
use crate::normalize::normalize;
use crate::recipes::{self, RecipeTable};
use crate::sheets::{self, RowStore, Snapshot};
use crate::shopping_list::StatusTable;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// One merged ingredient with its status and contributing dishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledIngredient {
    pub name: String,
    pub status: String,
    /// Dish names in first-contribution order; never empty.
    pub sources: Vec<String>,
}

/// Response payload for an aggregation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub menu: Vec<MenuDay>,
    pub ingredients: Vec<ReconciledIngredient>,
    /// Why the generative fallback produced nothing, if it failed.
    #[serde(skip)]
    pub fallback_error: Option<String>,
}

/// Ingredient text to the dishes that produced it, in insertion order.
#[derive(Debug, Default)]
struct ProvenanceMap {
    entries: IndexMap<String, IndexSet<String>>,
}

impl ProvenanceMap {
    fn add(&mut self, ingredient: &str, dish: &str) {
        let ingredient = ingredient.trim();
        if ingredient.is_empty() {
            return;
        }
        self.entries
            .entry(ingredient.to_string())
            .or_default()
            .insert(dish.to_string());
    }

    fn reconcile(self, statuses: &StatusTable) -> Vec<ReconciledIngredient> {
        self.entries
            .into_iter()
            .map(|(name, sources)| ReconciledIngredient {
                status: normalize(&name, statuses),
                name,
                sources: sources.into_iter().collect(),
            })
            .collect()
    }
}

/// Read the three row sets and aggregate them.
pub fn run(
    store: &dyn RowStore,
    config: &ServiceConfig,
    generator: &dyn TextGenerator,
) -> Result<Aggregation, GroceryError> {
    let snapshot = sheets::read_snapshot(store, &config.ranges)?;
    Ok(aggregate_snapshot(&snapshot, generator))
}

pub fn aggregate_snapshot(snapshot: &Snapshot, generator: &dyn TextGenerator) -> Aggregation {
    aggregate(
        &snapshot.menu,
        &snapshot.recipes,
        &snapshot.shopping_list,
        generator,
    )
}

/// Build the reconciled ingredient list for a menu.
///
/// Never fails: a generative fallback failure is recorded in
/// `fallback_error` and the unresolved dishes simply add nothing.
pub fn aggregate(
    menu_rows: &[Vec<String>],
    recipe_rows: &[Vec<String>],
    shopping_list_rows: &[Vec<String>],
    generator: &dyn TextGenerator,
) -> Aggregation {
    let days = menu::menu_days(menu_rows);
    let dishes = menu::flatten(&days);
    if dishes.is_empty() {
        tracing::info!("menu has no dishes");
        return Aggregation::default();
    }

    let names = menu::distinct_names(&dishes);
    let table = RecipeTable::from_rows(recipe_rows);
    if table.is_empty() {
        tracing::warn!("recipe table is empty; every dish goes to the fallback");
    }
    let resolution = recipes::resolve(&names, &table);
    tracing::info!(
        dishes = dishes.len(),
        distinct = names.len(),
        recipes = table.len(),
        resolved = resolution.resolved.len(),
        unresolved = resolution.unresolved.len(),
        "dishes resolved"
    );

    let mut provenance = ProvenanceMap::default();
    for (dish, raw) in &resolution.resolved {
        for ingredient in recipes::split_ingredients(raw) {
            provenance.add(ingredient, dish);
        }
    }

    let fallback = fallback::resolve_unknown(generator, &resolution.unresolved);
    for (dish, ingredients) in &fallback.ingredients {
        for ingredient in ingredients {
            provenance.add(ingredient, dish);
        }
    }

    let statuses = StatusTable::from_rows(shopping_list_rows);
    if statuses.is_empty() {
        tracing::debug!("shopping list is empty; every ingredient reports Unknown");
    }
    let ingredients = provenance.reconcile(&statuses);
    tracing::info!(
        ingredients = ingredients.len(),
        shopping_list_items = statuses.len(),
        degraded = fallback.error.is_some(),
        "ingredients reconciled"
    );

    Aggregation {
        menu: days,
        ingredients,
        fallback_error: fallback.error,
    }
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
