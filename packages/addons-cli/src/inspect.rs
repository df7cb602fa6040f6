//! Builds a context from JSON definitions and lists its namespace.

use std::fs;
use std::path::Path;

use addons::{
    actions_from_json, actions_from_json_lenient, ApplicationDefinitionRaw, BuildOptions, Context,
    ContextBuilder, LibraryDefinitionRaw, Origin,
};
use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Library file shape: `{ "name": "...", "actions": [[name, metadata], ...] }`.
#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    actions: Value,
}

/// One line of the namespace listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub ordinal: usize,
    pub origin: String,
    pub name: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub metadata: Value,
}

pub fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Turns a JSON library file into a definition with no-op injected functions.
pub fn library_from_json(value: Value, validate: bool) -> Result<LibraryDefinitionRaw<()>> {
    let file: LibraryFile = serde_json::from_value(value).context("Invalid library definition")?;
    let actions = if validate {
        actions_from_json(Origin::Library, &file.actions)?
    } else {
        actions_from_json_lenient(&file.actions)
    };

    Ok(LibraryDefinitionRaw::new(file.name)
        .with_actions(actions)
        .with_app_context_factory(|_, _| Ok(()))
        .with_context_validator(|_, _| Ok(()))
        .with_initial_state_factory(|_, _| Ok(Value::Null)))
}

pub fn build(library: Value, app: Value, options: BuildOptions) -> Result<Context<()>> {
    let library = library_from_json(library, options.validate)?;
    let app = if options.validate {
        ApplicationDefinitionRaw::from_json(app)?
    } else {
        ApplicationDefinitionRaw::from_json_lenient(app)?
    };

    let builder = ContextBuilder::new(library, options)?;
    Ok(builder.build(app)?)
}

/// Library rows first, then application rows, each numbered from zero.
pub fn rows(context: &Context<()>) -> Vec<Row> {
    let listing = |origin: Origin, entries: &[addons::ActionEntry], types: &[String]| {
        entries
            .iter()
            .zip(types)
            .enumerate()
            .map(|(ordinal, (entry, action_type))| Row {
                ordinal,
                origin: origin.to_string(),
                name: entry.name().to_string(),
                action_type: action_type.clone(),
                metadata: entry.metadata().as_ref().clone(),
            })
            .collect::<Vec<_>>()
    };

    let mut rows = listing(Origin::Library, context.lib_actions(), context.lib_action_types());
    rows.extend(listing(
        Origin::Application,
        context.app_actions(),
        context.app_action_types(),
    ));
    rows
}

pub fn print_table(context: &Context<()>, rows: &[Row]) {
    println!(
        "{} {} {} {}",
        "library".bright_cyan().bold(),
        context.lib_name(),
        "application".bright_cyan().bold(),
        context.app_name()
    );
    println!();

    let name_width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0).max(4);
    println!(
        "{:>7}  {:<11}  {:<name_width$}  {}",
        "ordinal".dimmed(),
        "origin".dimmed(),
        "name".dimmed(),
        "type".dimmed(),
    );
    for row in rows {
        let origin = match row.origin.as_str() {
            "library" => row.origin.blue(),
            _ => row.origin.green(),
        };
        println!(
            "{:>7}  {:<11}  {:<name_width$}  {}",
            row.ordinal,
            origin,
            row.name,
            row.action_type.bold()
        );
    }

    println!();
    println!("{} {}", "✓".bright_green(), format!("{} actions", rows.len()).bright_green());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn library() -> Value {
        json!({
            "name": "Idle Monitor",
            "actions": [["activity", { "idle": false }], ["idle", { "idle": true }]]
        })
    }

    #[test]
    fn test_rows_list_library_then_application() {
        let app = json!({ "name": "dash", "actions": [["refresh", { "every": 5 }]] });
        let context = build(library(), app, BuildOptions::default()).unwrap();

        let rows = rows(&context);
        let listed: Vec<_> = rows
            .iter()
            .map(|row| (row.ordinal, row.origin.as_str(), row.action_type.as_str()))
            .collect();
        assert_eq!(
            listed,
            vec![
                (0, "library", "IDLE_MONITOR_DASH_ACTIVITY"),
                (1, "library", "IDLE_MONITOR_DASH_IDLE"),
                (0, "application", "IDLE_MONITOR_DASH_REFRESH"),
            ]
        );
        assert_eq!(rows[2].metadata, json!({ "every": 5 }));
    }

    #[test]
    fn test_row_json_shape() {
        let app = json!({ "name": "dash", "actions": [] });
        let context = build(library(), app, BuildOptions::default()).unwrap();

        let value = serde_json::to_value(&rows(&context)[0]).unwrap();
        assert_eq!(
            value,
            json!({
                "ordinal": 0,
                "origin": "library",
                "name": "activity",
                "type": "IDLE_MONITOR_DASH_ACTIVITY",
                "metadata": { "idle": false }
            })
        );
    }

    #[test]
    fn test_collision_is_reported() {
        let app = json!({ "name": "dash", "actions": [["idle", {}]] });
        let err = build(library(), app, BuildOptions::default()).unwrap_err();
        assert!(err.to_string().contains("idle"));
    }

    #[test]
    fn test_no_validate_tolerates_malformed_entries() {
        let library = json!({ "name": "lib", "actions": [["ok", {}], 3, ["bad", 7]] });
        let app = json!({ "name": "app", "actions": [] });

        assert!(build(library.clone(), app.clone(), BuildOptions::default()).is_err());

        let context = build(library, app, BuildOptions::unvalidated()).unwrap();
        let names: Vec<_> = rows(&context).into_iter().map(|row| row.name).collect();
        assert_eq!(names, vec!["ok", "bad"]);
    }

    #[test]
    fn test_no_validate_tolerates_malformed_application_entries() {
        let app = json!({ "name": "dash", "actions": [["refresh", {}], ["x"], 5] });

        assert!(build(library(), app.clone(), BuildOptions::default()).is_err());

        let context = build(library(), app, BuildOptions::unvalidated()).unwrap();
        let names: Vec<_> = rows(&context)
            .into_iter()
            .filter(|row| row.origin == "application")
            .map(|row| row.name)
            .collect();
        assert_eq!(names, vec!["refresh", "x"]);
    }
}
