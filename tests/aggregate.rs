mod common;

use common::Workspace;
use serde_json::json;

fn weekly_menu() -> Workspace {
    Workspace::new(json!({
        "Menu!A2:C": [["Mon", "Tacos", "Rice"]],
        "Recipes!A2:B": [["tacos", "beef, tortilla, onion"]],
        "Groceries!A3:E": [["onion", "Got"]]
    }))
}

#[test]
fn failing_fallback_still_returns_recipe_ingredients() {
    let workspace = weekly_menu();
    let result = workspace.run("aggregate", &["--lm", "false"]);
    assert!(result.success, "stderr: {}", result.stderr);
    assert_eq!(
        result.body,
        json!({
            "menu": [{ "day": "Mon", "main": "Tacos", "side": "Rice" }],
            "ingredients": [
                { "name": "beef", "status": "Unknown", "sources": ["Tacos"] },
                { "name": "tortilla", "status": "Unknown", "sources": ["Tacos"] },
                { "name": "onion", "status": "Got", "sources": ["Tacos"] }
            ]
        })
    );
}

#[cfg(unix)]
#[test]
fn fallback_command_fills_in_unknown_dishes() {
    let workspace = weekly_menu();
    let lm = r#"sh -c 'cat >/dev/null; printf "%s" "Here:
{\"Rice\": [\"rice\", \"onion\"]}"'"#;
    let result = workspace.run("aggregate", &["--lm", lm]);
    assert!(result.success, "stderr: {}", result.stderr);
    assert_eq!(
        result.body["ingredients"],
        json!([
            { "name": "beef", "status": "Unknown", "sources": ["Tacos"] },
            { "name": "tortilla", "status": "Unknown", "sources": ["Tacos"] },
            { "name": "onion", "status": "Got", "sources": ["Tacos", "Rice"] },
            { "name": "rice", "status": "Unknown", "sources": ["Rice"] }
        ])
    );
}

#[test]
fn empty_menu_returns_empty_lists() {
    let workspace = Workspace::new(json!({}));
    let result = workspace.run("aggregate", &["--lm", "false"]);
    assert!(result.success, "stderr: {}", result.stderr);
    assert_eq!(result.body, json!({ "menu": [], "ingredients": [] }));
}

#[test]
fn repeated_runs_print_identical_output() {
    let workspace = weekly_menu();
    let first = workspace.run("aggregate", &["--lm", "false"]);
    let second = workspace.run("aggregate", &["--lm", "false"]);
    assert!(first.success && second.success);
    assert_eq!(first.body, second.body);
}

#[test]
fn missing_fixture_fails_before_aggregating() {
    let workspace = weekly_menu();
    std::fs::remove_file(workspace.path("rows.json")).expect("remove fixture");
    let result = workspace.run("aggregate", &[]);
    assert!(!result.success);
    assert_eq!(
        result.body,
        json!({ "error": "An internal error occurred." })
    );
    assert!(
        result.stderr.contains("read fixture"),
        "stderr: {}",
        result.stderr
    );
}
