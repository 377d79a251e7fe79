use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod cli;
mod config;
mod error;
mod fallback;
mod menu;
mod normalize;
mod recipes;
mod response;
mod sheets;
mod shopping_list;

use cli::{AddArgs, AggregateArgs, Command, ConfigArgs, ListArgs, RootArgs, StoreArgs};
use config::ServiceConfig;
use error::GroceryError;
use response::ApiResponse;
use sheets::{FixtureStore, RowStore, SheetsStore};
use shopping_list::AddItemRequest;

const LOG_ENV: &str = "GROCERIES_LOG";

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();

    match args.command {
        Command::Aggregate(args) => cmd_aggregate(args),
        Command::Add(args) => cmd_add(args),
        Command::List(args) => cmd_list(args),
        Command::Config(args) => cmd_config(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the row store once; every command receives it explicitly.
fn open_store(args: &StoreArgs, config: &ServiceConfig) -> Result<Box<dyn RowStore>> {
    if let Some(path) = &args.rows {
        tracing::info!(path = %path.display(), "using fixture row store");
        return Ok(Box::new(FixtureStore::load(path)?));
    }
    let token = std::env::var(config::SHEETS_TOKEN_ENV).ok();
    if token.is_none() {
        tracing::warn!(
            "{} is not set; spreadsheet requests are unauthenticated",
            config::SHEETS_TOKEN_ENV
        );
    }
    Ok(Box::new(SheetsStore::new(config, token)?))
}

/// Load config and open the store. Failures here are reported through the
/// same 500 envelope as failed reads.
fn prepare(args: &StoreArgs) -> Result<(ServiceConfig, Box<dyn RowStore>), GroceryError> {
    init_tracing(args.verbose);
    let config = config::load_config(args.config.as_deref())?;
    let store = open_store(args, &config)?;
    Ok((config, store))
}

fn cmd_aggregate(args: AggregateArgs) -> Result<ExitCode> {
    let (mut config, store) = match prepare(&args.store) {
        Ok(prepared) => prepared,
        Err(err) => return emit(&ApiResponse::from_error(&err), args.pretty),
    };
    if let Some(command) = args.lm {
        config.lm_command = Some(command);
    }
    let generator = fallback::generator_for(config.lm_command.as_deref());
    let result = aggregate::run(store.as_ref(), &config, generator.as_ref());
    if let Ok(aggregation) = &result {
        if let Some(reason) = &aggregation.fallback_error {
            tracing::warn!(%reason, "ingredient list is missing fallback dishes");
        }
    }
    emit(&response::aggregation(result), args.pretty)
}

fn cmd_add(args: AddArgs) -> Result<ExitCode> {
    let (config, store) = match prepare(&args.store) {
        Ok(prepared) => prepared,
        Err(err) => return emit(&ApiResponse::from_error(&err), args.pretty),
    };
    let request = match parse_add_request(&args) {
        Ok(request) => request,
        Err(err) => return emit(&ApiResponse::from_error(&err), args.pretty),
    };
    let result = shopping_list::add_item(store.as_ref(), &config, &request.item).map(|_| ());
    emit(&response::item_added(&request, result), args.pretty)
}

fn parse_add_request(args: &AddArgs) -> Result<AddItemRequest, GroceryError> {
    if let Some(item) = &args.item {
        return AddItemRequest::direct(item);
    }
    let body = args.body.as_deref().unwrap_or("{}");
    let body: Value = serde_json::from_str(body)
        .map_err(|e| GroceryError::validation(format!("Request body is not valid JSON: {e}")))?;
    AddItemRequest::from_body(&body)
}

fn cmd_list(args: ListArgs) -> Result<ExitCode> {
    let (config, store) = match prepare(&args.store) {
        Ok(prepared) => prepared,
        Err(err) => return emit(&ApiResponse::from_error(&err), args.pretty),
    };
    let range = &config.ranges.shopping_list;
    let response = match store
        .get(range)
        .with_context(|| format!("read shopping list range {range}"))
    {
        Ok(rows) => {
            let entries = shopping_list::entries(&rows);
            ApiResponse::ok(serde_json::to_value(&entries).context("serialize shopping list")?)
        }
        Err(err) => ApiResponse::from_error(&GroceryError::from(err)),
    };
    emit(&response, args.pretty)
}

fn cmd_config(args: ConfigArgs) -> Result<ExitCode> {
    init_tracing(false);
    let config = config::load_config(args.config.as_deref())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("serialize config")?
    );
    Ok(ExitCode::SUCCESS)
}

fn emit(response: &ApiResponse, pretty: bool) -> Result<ExitCode> {
    let text = if pretty {
        serde_json::to_string_pretty(&response.body)
    } else {
        serde_json::to_string(&response.body)
    }
    .context("serialize response body")?;
    println!("{text}");
    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::info!(status = response.status, "request did not succeed");
        Ok(ExitCode::FAILURE)
    }
}
