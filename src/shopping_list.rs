//! Shopping-list rows, the status lookup built from them, and the
//! add-or-bump maintenance path.
use crate::config::ServiceConfig;
use crate::error::GroceryError;
use crate::sheets::{RowStore, SortOrder, SortRequest, SortSpec};
use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Status written for items added through the add path.
pub const NEED_STATUS: &str = "Need";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListEntry {
    pub name: String,
    pub status: String,
    pub last_modified: String,
    /// Times the item was requested; 0 when the cell is blank or not a number.
    pub add_count: u32,
    pub preferred_store: String,
}

impl ShoppingListEntry {
    /// Parse one `(name, status, last_modified, add_count, preferred_store)`
    /// row. Rows without a name are not entries.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let name = row.first()?.trim();
        if name.is_empty() {
            return None;
        }
        let cell = |idx: usize| row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default();
        Some(Self {
            name: name.to_string(),
            status: cell(1),
            last_modified: cell(2),
            add_count: parse_add_count(row.get(3).map(String::as_str)),
            preferred_store: cell(4),
        })
    }
}

/// Leading digit run of the cell, so `"3.0"` and `"2 items"` still count.
/// Blank, signed-negative or non-numeric cells read as 0.
fn parse_add_count(cell: Option<&str>) -> u32 {
    let Some(cell) = cell else { return 0 };
    let cell = cell.trim_start();
    let cell = cell.strip_prefix('+').unwrap_or(cell);
    let end = cell
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(cell.len());
    cell[..end].parse().unwrap_or(0)
}

pub fn entries(rows: &[Vec<String>]) -> Vec<ShoppingListEntry> {
    rows.iter()
        .filter_map(|row| ShoppingListEntry::from_row(row))
        .collect()
}

/// Case-insensitive item name to stored status.
#[derive(Debug, Clone, Default)]
pub struct StatusTable {
    statuses: HashMap<String, String>,
}

impl StatusTable {
    /// Build from shopping-list rows. The first row for a name wins.
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let mut statuses = HashMap::new();
        for entry in entries(rows) {
            statuses
                .entry(entry.name.to_lowercase())
                .or_insert(entry.status);
        }
        Self { statuses }
    }

    /// Look up an already-lowercased key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.statuses.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

// ============================================================================
// Add / update
// ============================================================================

/// Where an add request came from; assistant requests get a spoken reply.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOrigin {
    Direct,
    Assistant { session_id: Value, params: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddItemRequest {
    /// Trimmed, non-empty item name.
    pub item: String,
    pub origin: RequestOrigin,
}

impl AddItemRequest {
    pub fn direct(item: &str) -> Result<Self, GroceryError> {
        Ok(Self {
            item: validate_item_name(item)?,
            origin: RequestOrigin::Direct,
        })
    }

    /// Parse an inbound JSON body: `session.params.itemName` first, then
    /// `itemName`.
    pub fn from_body(body: &Value) -> Result<Self, GroceryError> {
        let session = body.get("session");
        let session_item = session
            .and_then(|session| session.get("params"))
            .and_then(|params| params.get("itemName"))
            .and_then(Value::as_str);

        let (raw, origin) = if let (Some(raw), Some(session)) = (session_item, session) {
            tracing::info!("request from assistant session");
            let origin = RequestOrigin::Assistant {
                session_id: session.get("id").cloned().unwrap_or(Value::Null),
                params: session.get("params").cloned().unwrap_or(Value::Null),
            };
            (raw, origin)
        } else if let Some(raw) = body.get("itemName").and_then(Value::as_str) {
            tracing::info!("direct request");
            (raw, RequestOrigin::Direct)
        } else {
            return Err(GroceryError::validation(
                "Could not find \"itemName\" in request.",
            ));
        };

        Ok(Self {
            item: validate_item_name(raw)?,
            origin,
        })
    }
}

fn validate_item_name(raw: &str) -> Result<String, GroceryError> {
    let item = raw.trim();
    if item.is_empty() {
        return Err(GroceryError::validation("Item name cannot be empty."));
    }
    Ok(item.to_string())
}

/// What the add path did to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Existing row bumped; `row` is the 1-based sheet row.
    Updated { row: u32, add_count: u32 },
    Appended,
}

/// Mark an item as needed: bump its row if present, append it otherwise,
/// then re-sort the list (status descending, name ascending).
pub fn add_item(
    store: &dyn RowStore,
    config: &ServiceConfig,
    item: &str,
) -> Result<AddOutcome, GroceryError> {
    let range = &config.ranges.shopping_list;
    let rows = store
        .get(range)
        .with_context(|| format!("read shopping list range {range}"))?;
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let needle = item.to_lowercase();

    let existing = rows
        .iter()
        .position(|row| row.first().is_some_and(|name| name.to_lowercase() == needle));

    let outcome = match existing {
        Some(index) => {
            let row = first_data_row(config) + index as u32;
            let add_count = parse_add_count(rows[index].get(3).map(String::as_str)) + 1;
            let sheet = sheet_name(range);
            let target = format!("{sheet}!B{row}:D{row}");
            store
                .update(&target, &[vec![json!(NEED_STATUS), json!(now), json!(add_count)]])
                .with_context(|| format!("update shopping list row {row}"))?;
            AddOutcome::Updated { row, add_count }
        }
        None => {
            let target = &config.ranges.shopping_list_append;
            store
                .append(target, &[vec![json!(item), json!(NEED_STATUS), json!(now), json!(1)]])
                .with_context(|| format!("append shopping list item {item}"))?;
            AddOutcome::Appended
        }
    };

    store
        .sort(&sort_request(config))
        .context("sort shopping list")?;
    tracing::info!(item, ?outcome, "shopping list item added");
    Ok(outcome)
}

/// 1-based sheet row of the first data row.
fn first_data_row(config: &ServiceConfig) -> u32 {
    config.header_rows + 1
}

fn sheet_name(range: &str) -> &str {
    range.split_once('!').map_or(range, |(sheet, _)| sheet)
}

pub fn sort_request(config: &ServiceConfig) -> SortRequest {
    SortRequest {
        sheet_id: config.sheet_id,
        start_row_index: config.header_rows,
        specs: vec![
            SortSpec {
                dimension_index: 1,
                sort_order: SortOrder::Descending,
            },
            SortSpec {
                dimension_index: 0,
                sort_order: SortOrder::Ascending,
            },
        ],
    }
}

#[cfg(test)]
#[path = "shopping_list_tests.rs"]
mod tests;
