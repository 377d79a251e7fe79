//! Menu rows and the dish sequence derived from them.
//!
//! A menu row is a `(day, main, side)` triple read from the row store. Each
//! row yields up to two dishes; blank slots are dropped.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which menu slot a dish came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Main,
    Side,
}

/// One menu slot for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub day: String,
    pub slot: Slot,
    /// Trimmed dish name; never empty.
    pub name: String,
}

/// A menu row echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDay {
    pub day: String,
    pub main: String,
    pub side: String,
}

impl MenuDay {
    /// Build from a raw row; missing cells read as empty strings.
    pub fn from_row(row: &[String]) -> Self {
        let cell = |idx: usize| row.get(idx).cloned().unwrap_or_default();
        Self {
            day: cell(0),
            main: cell(1),
            side: cell(2),
        }
    }

    /// Dishes for this day in slot order, skipping blank slots.
    pub fn dishes(&self) -> impl Iterator<Item = Dish> + '_ {
        [(Slot::Main, &self.main), (Slot::Side, &self.side)]
            .into_iter()
            .filter_map(move |(slot, name)| {
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(Dish {
                    day: self.day.clone(),
                    slot,
                    name: name.to_string(),
                })
            })
    }
}

/// Parse menu rows into day records.
pub fn menu_days(rows: &[Vec<String>]) -> Vec<MenuDay> {
    rows.iter().map(|row| MenuDay::from_row(row)).collect()
}

/// Flatten day records into the ordered dish sequence.
pub fn flatten(days: &[MenuDay]) -> Vec<Dish> {
    days.iter().flat_map(|day| day.dishes()).collect()
}

/// Distinct dish names in first-occurrence order.
///
/// Distinctness is exact-text: "Tacos" and "tacos" are two dishes here and
/// only collapse later if the recipe table maps both.
pub fn distinct_names(dishes: &[Dish]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for dish in dishes {
        if seen.insert(dish.name.as_str()) {
            names.push(dish.name.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn flatten_yields_main_then_side_per_day() {
        let days = menu_days(&[row(&["Mon", "Tacos", "Rice"]), row(&["Tue", "Soup", ""])]);
        let dishes = flatten(&days);
        let names: Vec<_> = dishes
            .iter()
            .map(|d| (d.day.as_str(), d.slot, d.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Mon", Slot::Main, "Tacos"),
                ("Mon", Slot::Side, "Rice"),
                ("Tue", Slot::Main, "Soup"),
            ]
        );
    }

    #[test]
    fn short_rows_and_blank_cells_are_dropped() {
        let days = menu_days(&[row(&["Wed"]), row(&["Thu", "   ", " Pasta "])]);
        assert_eq!(days[0].main, "");
        assert_eq!(days[0].side, "");
        let dishes = flatten(&days);
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].name, "Pasta");
        assert_eq!(dishes[0].slot, Slot::Side);
    }

    #[test]
    fn distinct_names_keeps_first_occurrence_order() {
        let days = menu_days(&[
            row(&["Mon", "Tacos", "Rice"]),
            row(&["Tue", "Rice", "Tacos"]),
            row(&["Wed", "tacos", ""]),
        ]);
        assert_eq!(
            distinct_names(&flatten(&days)),
            vec!["Tacos".to_string(), "Rice".to_string(), "tacos".to_string()]
        );
    }
}
