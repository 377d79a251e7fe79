//! Best-effort matching of ingredient names against the shopping list.
//!
//! This is a single-step plural heuristic, not a lemmatizer. `berries` will
//! not find `berry`, and callers rely on that staying true.
use crate::shopping_list::StatusTable;

/// Status reported when no shopping-list row matches.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Look up the shopping-list status for an ingredient name.
///
/// First hit wins:
/// 1. exact case-insensitive match;
/// 2. for names ending in `s`: the name without the `s`, then without `es`;
/// 3. otherwise: the name with `s` appended, then with `es` appended.
pub fn normalize(name: &str, table: &StatusTable) -> String {
    let key = name.trim().to_lowercase();
    if let Some(status) = table.get(&key) {
        return status.to_string();
    }

    let candidates: Vec<String> = if let Some(stem) = key.strip_suffix('s') {
        let mut stems = vec![stem.to_string()];
        if let Some(stem) = key.strip_suffix("es") {
            stems.push(stem.to_string());
        }
        stems
    } else {
        vec![format!("{key}s"), format!("{key}es")]
    };

    candidates
        .iter()
        .find_map(|candidate| table.get(candidate))
        .unwrap_or(UNKNOWN_STATUS)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> StatusTable {
        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|(name, status)| vec![name.to_string(), status.to_string()])
            .collect();
        StatusTable::from_rows(&rows)
    }

    #[test]
    fn plural_name_matches_singular_row() {
        assert_eq!(normalize("tomatoes", &table(&[("tomato", "Got")])), "Got");
        assert_eq!(normalize("Onions", &table(&[("onion", "Need")])), "Need");
    }

    #[test]
    fn singular_name_matches_plural_row() {
        assert_eq!(normalize("tomato", &table(&[("tomatoes", "Got")])), "Got");
        assert_eq!(normalize("potato", &table(&[("potatoes", "Need")])), "Need");
    }

    #[test]
    fn single_s_append_is_tried_before_es_append() {
        let statuses = table(&[("limees", "Need"), ("limes", "Got")]);
        assert_eq!(normalize("lime", &statuses), "Got");
    }

    #[test]
    fn empty_table_reports_unknown() {
        assert_eq!(normalize("kale", &table(&[])), UNKNOWN_STATUS);
    }

    #[test]
    fn exact_match_is_case_insensitive_and_wins() {
        let statuses = table(&[("Eggs", "Got"), ("egg", "Need")]);
        assert_eq!(normalize("EGGS", &statuses), "Got");
    }

    #[test]
    fn single_s_strip_is_tried_before_es_strip() {
        let statuses = table(&[("grape", "Got"), ("grap", "Need")]);
        assert_eq!(normalize("grapes", &statuses), "Got");
    }

    #[test]
    fn ies_endings_are_not_lemmatized() {
        assert_eq!(normalize("berries", &table(&[("berry", "Got")])), UNKNOWN_STATUS);
        assert_eq!(normalize("berry", &table(&[("berries", "Got")])), UNKNOWN_STATUS);
    }

    #[test]
    fn names_ending_in_s_do_not_try_appending() {
        assert_eq!(normalize("hummus", &table(&[("hummuss", "Got")])), UNKNOWN_STATUS);
    }
}
