//! CLI argument parsing.
//!
//! Every command prints a JSON body on stdout and exits non-zero when the
//! equivalent HTTP status would not be 2xx. Logs go to stderr.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "groceries",
    version,
    about = "Turn the weekly menu into a reconciled shopping list",
    after_help = "Examples:\n  groceries aggregate --pretty\n  groceries aggregate --rows fixture.json --lm 'llm -m gpt-4o-mini'\n  groceries add \"olive oil\"\n  groceries add --body '{\"itemName\": \"eggs\"}'\n  groceries list\n  groceries config",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Aggregate(AggregateArgs),
    Add(AddArgs),
    List(ListArgs),
    Config(ConfigArgs),
}

/// Where rows come from and how chatty to be.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Config file (defaults to $GROCERIES_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Serve rows from a local JSON fixture instead of the spreadsheet
    #[arg(long, value_name = "PATH")]
    pub rows: Option<PathBuf>,

    /// Log progress to stderr (overridden by GROCERIES_LOG)
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Expand the menu into ingredients and reconcile them with the shopping list")]
pub struct AggregateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Generative fallback command (overrides config and GROCERIES_LM_COMMAND)
    #[arg(long, value_name = "CMD")]
    pub lm: Option<String>,

    /// Pretty-print the JSON body
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Mark an item as needed, adding it to the shopping list if absent")]
pub struct AddArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Item name
    #[arg(value_name = "ITEM", conflicts_with = "body")]
    pub item: Option<String>,

    /// Raw JSON request body (`itemName` or `session.params.itemName`)
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,

    /// Pretty-print the JSON body
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print the shopping list as JSON")]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Pretty-print the JSON body
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print the effective configuration")]
pub struct ConfigArgs {
    /// Config file (defaults to $GROCERIES_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
