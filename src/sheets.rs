//! Row store access.
//!
//! The engine only sees ordered string tuples. `SheetsStore` talks to the
//! spreadsheet values REST API; `FixtureStore` serves rows from a local JSON
//! file for offline runs and tests.
use crate::config::{RangeConfig, ServiceConfig};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

pub type Row = Vec<String>;
pub type Rows = Vec<Row>;

/// Ascending or descending sort order for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub dimension_index: u32,
    pub sort_order: SortOrder,
}

/// Sort every row of a sheet from `start_row_index` (0-based) down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub sheet_id: u32,
    pub start_row_index: u32,
    pub specs: Vec<SortSpec>,
}

/// Row-oriented store the service reads from and writes to.
pub trait RowStore: Send + Sync {
    /// Rows in `range`; empty when the range has no data rows.
    fn get(&self, range: &str) -> Result<Rows>;
    /// Overwrite `range` with `rows` (user-entered semantics).
    fn update(&self, range: &str, rows: &[Vec<Value>]) -> Result<()>;
    /// Append `rows` after the last row of `range`.
    fn append(&self, range: &str, rows: &[Vec<Value>]) -> Result<()>;
    fn sort(&self, request: &SortRequest) -> Result<()>;
}

/// One consistent read of the three row sets the engine needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub menu: Rows,
    pub recipes: Rows,
    pub shopping_list: Rows,
}

/// Read menu, recipes and shopping list concurrently.
///
/// All three reads must succeed; the first failure (in menu, recipes,
/// shopping-list order) is returned.
pub fn read_snapshot<S: RowStore + ?Sized>(store: &S, ranges: &RangeConfig) -> Result<Snapshot> {
    let start = Instant::now();
    let (menu, recipes, shopping_list) = thread::scope(|scope| {
        let menu = scope.spawn(|| store.get(&ranges.menu));
        let recipes = scope.spawn(|| store.get(&ranges.recipes));
        let shopping_list = scope.spawn(|| store.get(&ranges.shopping_list));
        (join_read(menu), join_read(recipes), join_read(shopping_list))
    });
    let snapshot = Snapshot {
        menu: menu.with_context(|| format!("read menu range {}", ranges.menu))?,
        recipes: recipes.with_context(|| format!("read recipe range {}", ranges.recipes))?,
        shopping_list: shopping_list
            .with_context(|| format!("read shopping list range {}", ranges.shopping_list))?,
    };
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        menu_rows = snapshot.menu.len(),
        recipe_rows = snapshot.recipes.len(),
        shopping_list_rows = snapshot.shopping_list.len(),
        "row snapshot read"
    );
    Ok(snapshot)
}

fn join_read(handle: ScopedJoinHandle<'_, Result<Rows>>) -> Result<Rows> {
    handle
        .join()
        .map_err(|_| anyhow!("row store reader panicked"))?
}

/// Convert one API cell to text. Numbers and booleans keep their JSON form.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn rows_from_values(values: Vec<Vec<Value>>) -> Rows {
    values
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

// ============================================================================
// Spreadsheet values API
// ============================================================================

/// Values API reply; `values` is omitted entirely for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Spreadsheet-backed store, constructed once and shared per process.
pub struct SheetsStore {
    agent: ureq::Agent,
    api_base: String,
    spreadsheet_id: String,
    token: Option<String>,
}

impl SheetsStore {
    pub fn new(config: &ServiceConfig, token: Option<String>) -> Result<Self> {
        if config.spreadsheet_id.trim().is_empty() {
            return Err(anyhow!(
                "spreadsheet_id is not configured (set it in the config file or {})",
                crate::config::SPREADSHEET_ID_ENV
            ));
        }
        Ok(Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            token,
        })
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}{suffix}",
            self.api_base,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    fn user_agent() -> String {
        format!("groceries/{}", env!("CARGO_PKG_VERSION"))
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request.header("User-Agent", Self::user_agent());
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }
}

impl RowStore for SheetsStore {
    fn get(&self, range: &str) -> Result<Rows> {
        let start = Instant::now();
        let url = self.values_url(range, "");
        let mut response = self
            .authorize(self.agent.get(&url))
            .call()
            .with_context(|| format!("GET values {range}"))?;
        let body: ValueRange = response
            .body_mut()
            .read_json()
            .with_context(|| format!("decode values {range}"))?;
        tracing::debug!(
            range,
            rows = body.values.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "values read"
        );
        Ok(rows_from_values(body.values))
    }

    fn update(&self, range: &str, rows: &[Vec<Value>]) -> Result<()> {
        let url = self.values_url(range, "");
        self.authorize(self.agent.put(&url))
            .query("valueInputOption", "USER_ENTERED")
            .send_json(json!({ "range": range, "values": rows }))
            .with_context(|| format!("PUT values {range}"))?;
        tracing::info!(range, rows = rows.len(), "values updated");
        Ok(())
    }

    fn append(&self, range: &str, rows: &[Vec<Value>]) -> Result<()> {
        let url = self.values_url(range, ":append");
        self.authorize(self.agent.post(&url))
            .query("valueInputOption", "USER_ENTERED")
            .send_json(json!({ "values": rows }))
            .with_context(|| format!("append values {range}"))?;
        tracing::info!(range, rows = rows.len(), "values appended");
        Ok(())
    }

    fn sort(&self, request: &SortRequest) -> Result<()> {
        let url = format!(
            "{}/spreadsheets/{}:batchUpdate",
            self.api_base, self.spreadsheet_id
        );
        let body = json!({
            "requests": [{
                "sortRange": {
                    "range": {
                        "sheetId": request.sheet_id,
                        "startRowIndex": request.start_row_index,
                    },
                    "sortSpecs": request.specs,
                }
            }]
        });
        self.authorize(self.agent.post(&url))
            .send_json(body)
            .context("sort sheet rows")?;
        tracing::info!(sheet_id = request.sheet_id, "sheet sorted");
        Ok(())
    }
}

// ============================================================================
// Fixture store
// ============================================================================

/// A write recorded by the fixture store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FixtureWrite {
    Update { range: String, values: Vec<Vec<Value>> },
    Append { range: String, values: Vec<Vec<Value>> },
    Sort { request: SortRequest },
}

/// On-disk fixture layout: rows per range plus the writes made so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub ranges: BTreeMap<String, Vec<Vec<Value>>>,
    #[serde(default)]
    pub writes: Vec<FixtureWrite>,
}

/// Local JSON stand-in for the spreadsheet.
///
/// Reads of unknown ranges return no rows. Writes are not applied to
/// `ranges`; they are appended to `writes` and saved back to the file the
/// fixture was loaded from.
pub struct FixtureStore {
    path: Option<PathBuf>,
    data: Mutex<FixtureData>,
}

impl FixtureStore {
    pub fn in_memory(data: FixtureData) -> Self {
        Self {
            path: None,
            data: Mutex::new(data),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read fixture {}", path.display()))?;
        let data: FixtureData = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse fixture JSON {}", path.display()))?;
        let mut store = Self::in_memory(data);
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Writes recorded so far, oldest first.
    #[cfg(test)]
    pub fn writes(&self) -> Result<Vec<FixtureWrite>> {
        Ok(self.lock()?.writes.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, FixtureData>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("fixture store lock poisoned"))
    }

    fn record(&self, write: FixtureWrite) -> Result<()> {
        let mut data = self.lock()?;
        data.writes.push(write);
        if let Some(path) = &self.path {
            let text = serde_json::to_string_pretty(&*data).context("serialize fixture")?;
            fs::write(path, text.as_bytes())
                .with_context(|| format!("write fixture {}", path.display()))?;
        }
        Ok(())
    }
}

impl RowStore for FixtureStore {
    fn get(&self, range: &str) -> Result<Rows> {
        let data = self.lock()?;
        Ok(data
            .ranges
            .get(range)
            .cloned()
            .map(rows_from_values)
            .unwrap_or_default())
    }

    fn update(&self, range: &str, rows: &[Vec<Value>]) -> Result<()> {
        self.record(FixtureWrite::Update {
            range: range.to_string(),
            values: rows.to_vec(),
        })
    }

    fn append(&self, range: &str, rows: &[Vec<Value>]) -> Result<()> {
        self.record(FixtureWrite::Append {
            range: range.to_string(),
            values: rows.to_vec(),
        })
    }

    fn sort(&self, request: &SortRequest) -> Result<()> {
        self.record(FixtureWrite::Sort {
            request: request.clone(),
        })
    }
}
