//! Generative fallback for dishes the recipe table does not know.
//!
//! All unresolved dishes go out in one prompt. The reply must be a JSON
//! object keyed by dish name with arrays of ingredient names. Replies pass
//! through a sanitize-then-parse step; any failure along the way (command
//! error, non-zero exit, bad JSON) degrades to "these dishes contribute no
//! ingredients" rather than failing the request.
//!
//! The text generator is an external command configured as `lm_command` or
//! `GROCERIES_LM_COMMAND`. It receives the prompt on stdin and must write the
//! reply to stdout, e.g. `llm -m gpt-4o-mini` or `ollama run llama3`.
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

const INGREDIENT_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/ingredient_fallback.md"
));

/// Something that turns a prompt into reply text.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Runs a user-configured command with the prompt on stdin.
#[derive(Debug, Clone)]
pub struct LmCommand {
    /// The command to invoke (parsed via shell-words).
    pub command: String,
}

impl TextGenerator for LmCommand {
    fn generate(&self, prompt: &str) -> Result<String> {
        invoke_lm_command(&self.command, prompt)
    }
}

/// Stand-in used when no command is configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl TextGenerator for Unconfigured {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!(
            "no generative command configured (set lm_command or {})",
            crate::config::LM_COMMAND_ENV
        ))
    }
}

/// Pick the generator for an optional configured command.
pub fn generator_for(command: Option<&str>) -> Box<dyn TextGenerator> {
    match command {
        Some(command) => Box::new(LmCommand {
            command: command.to_string(),
        }),
        None => Box::new(Unconfigured),
    }
}

/// Ingredients produced for unresolved dishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackResult {
    /// `(requested dish, trimmed ingredient names)` in request order.
    /// Dishes the reply did not cover are absent.
    pub ingredients: Vec<(String, Vec<String>)>,
    /// Set when the call or parse failed and nothing was produced.
    pub error: Option<String>,
}

/// Resolve unknown dishes with a single generator call.
///
/// An empty dish list never reaches the generator.
pub fn resolve_unknown(generator: &dyn TextGenerator, dishes: &[String]) -> FallbackResult {
    if dishes.is_empty() {
        return FallbackResult::default();
    }

    let start = Instant::now();
    let prompt = build_prompt(dishes);
    let reply = generator
        .generate(&prompt)
        .and_then(|text| parse_ingredient_reply(&text));
    match reply {
        Ok(reply) => {
            let ingredients = assign_to_dishes(dishes, reply);
            tracing::info!(
                elapsed_ms = start.elapsed().as_millis(),
                requested = dishes.len(),
                answered = ingredients.len(),
                "generative fallback complete"
            );
            FallbackResult {
                ingredients,
                error: None,
            }
        }
        Err(err) => {
            tracing::warn!(
                error = %format!("{err:#}"),
                dishes = dishes.len(),
                "generative fallback failed; unresolved dishes contribute no ingredients"
            );
            FallbackResult {
                ingredients: Vec::new(),
                error: Some(format!("{err:#}")),
            }
        }
    }
}

fn build_prompt(dishes: &[String]) -> String {
    let list = dishes
        .iter()
        .map(|dish| format!("- {dish}"))
        .collect::<Vec<_>>()
        .join("\n");
    INGREDIENT_PROMPT.replace("{dishes}", &list)
}

/// Map reply keys back onto requested dish names: exact key first, then a
/// case-insensitive key. Unrequested keys are dropped.
fn assign_to_dishes(
    dishes: &[String],
    mut reply: BTreeMap<String, Vec<Value>>,
) -> Vec<(String, Vec<String>)> {
    let folded: HashMap<String, String> = reply
        .keys()
        .map(|key| (key.trim().to_lowercase(), key.clone()))
        .collect();

    let mut assigned = Vec::new();
    for dish in dishes {
        let key = if reply.contains_key(dish) {
            Some(dish.clone())
        } else {
            folded.get(&dish.to_lowercase()).cloned()
        };
        let Some(values) = key.and_then(|key| reply.remove(&key)) else {
            tracing::debug!(dish = %dish, "fallback reply has no entry for dish");
            continue;
        };
        let names = values
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        assigned.push((dish.clone(), names));
    }
    for key in reply.keys() {
        tracing::debug!(key = %key, "ignoring fallback entry for unrequested dish");
    }
    assigned
}

/// Sanitize reply text and parse the dish-keyed ingredient object.
pub fn parse_ingredient_reply(text: &str) -> Result<BTreeMap<String, Vec<Value>>> {
    let json_text = sanitize_reply(text);
    serde_json::from_str(json_text).map_err(|e| {
        anyhow!(
            "parse fallback reply as JSON: {} at line {}, column {}\n\nFirst 500 chars: {}",
            e,
            e.line(),
            e.column(),
            json_text.chars().take(500).collect::<String>()
        )
    })
}

/// Strip code fences and surrounding prose from a reply.
pub fn sanitize_reply(text: &str) -> &str {
    let text = extract_json(text);
    if text.starts_with('{') {
        return text;
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Extract JSON from text that might have markdown code fences.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip language identifier if present
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    text
}

/// Invoke the LM command with the given prompt.
fn invoke_lm_command(command: &str, prompt: &str) -> Result<String> {
    let args =
        shell_words::split(command).with_context(|| format!("parse LM command: {command}"))?;

    if args.is_empty() {
        return Err(anyhow!("LM command is empty"));
    }

    let start = Instant::now();
    let mut child = Command::new(&args[0])
        .args(&args[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn LM command: {}", args[0]))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(prompt.as_bytes())
            .context("write prompt to LM stdin")?;
    }

    let output = child.wait_with_output().context("wait for LM command")?;

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        prompt_bytes = prompt.len(),
        response_bytes = output.stdout.len(),
        "lm invoke complete"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "LM command failed with status {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8(output.stdout).context("decode LM stdout as UTF-8")
}
