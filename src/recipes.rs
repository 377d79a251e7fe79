//! Known-recipe lookup.
//!
//! The recipe table is the source of truth: a dish that matches an entry is
//! never sent to the generative fallback.
use std::collections::HashMap;

/// Dish name (lowercased, trimmed) to raw comma-separated ingredient text.
#[derive(Debug, Clone, Default)]
pub struct RecipeTable {
    entries: HashMap<String, String>,
}

impl RecipeTable {
    /// Build from `(name, ingredients-csv)` rows. The first row for a name wins.
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let mut entries = HashMap::new();
        for row in rows {
            let Some(name) = row.first().map(|name| name.trim()) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let ingredients = row.get(1).cloned().unwrap_or_default();
            entries.entry(name.to_lowercase()).or_insert(ingredients);
        }
        Self { entries }
    }

    pub fn lookup(&self, dish: &str) -> Option<&str> {
        self.entries
            .get(&dish.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Dishes split into table hits and misses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// `(dish name, raw ingredient text)` in input order.
    pub resolved: Vec<(String, String)>,
    /// Dish names with no table entry, in input order.
    pub unresolved: Vec<String>,
}

/// Partition dishes by case-insensitive recipe table membership.
pub fn resolve(dishes: &[String], table: &RecipeTable) -> Resolution {
    let mut resolution = Resolution::default();
    for dish in dishes {
        match table.lookup(dish) {
            Some(raw) => resolution
                .resolved
                .push((dish.clone(), raw.to_string())),
            None => resolution.unresolved.push(dish.clone()),
        }
    }
    resolution
}

/// Split raw recipe text into trimmed, non-empty ingredient names.
pub fn split_ingredients(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|piece| !piece.is_empty())
}
