//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Operation results are
//! arbitrary JSON, so tables are built column-by-column from the keys the
//! rows actually carry.

use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

/// Longest cell rendered in a table before truncation.
const MAX_CELL: usize = 48;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Paint a status line (stderr) when color is on.
pub fn success(text: &str, color: bool) -> String {
    if color {
        format!("{} {}", "✓".green(), text.bold())
    } else {
        format!("✓ {text}")
    }
}

/// Paint a secondary detail when color is on.
pub fn dim(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_owned()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact` / `yaml`: serializes the original data via serde
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, serde_json::Error>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Json => serde_json::to_string_pretty(data),
        OutputFormat::JsonCompact => serde_json::to_string(data),
        OutputFormat::Yaml => Ok(render_yaml(data)),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render an operation result in the chosen format.
pub fn render_value(format: OutputFormat, value: &Value) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => Ok(render_value_table(value)),
        OutputFormat::Json => serde_json::to_string_pretty(value),
        OutputFormat::JsonCompact => serde_json::to_string(value),
        OutputFormat::Yaml => Ok(render_yaml(value)),
        OutputFormat::Plain => Ok(render_plain(value)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("# yaml error: {e}"))
}

/// The rows of a list payload: a bare array, or the array under one of the
/// envelope keys list endpoints use.
fn rows_of(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => ["data", "items", "results", "rows"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

fn render_value_table(value: &Value) -> String {
    match rows_of(value) {
        Some(rows) if rows.iter().all(Value::is_object) => render_rows(rows),
        _ => match value {
            Value::Object(map) => {
                let mut builder = Builder::default();
                builder.push_record(["field".to_owned(), "value".to_owned()]);
                for (key, val) in map {
                    builder.push_record([key.clone(), cell(val)]);
                }
                builder.build().with(Style::rounded()).to_string()
            }
            Value::Null => String::new(),
            other => cell(other),
        },
    }
}

fn render_rows(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "(no results)".into();
    }

    // `id` first, then the remaining keys alphabetically.
    let keys: BTreeSet<&str> = rows
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();
    let mut columns: Vec<&str> = keys.iter().copied().filter(|k| *k != "id").collect();
    if keys.contains("id") {
        columns.insert(0, "id");
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| (*c).to_owned()));
    for row in rows {
        builder.push_record(columns.iter().map(|c| row.get(*c).map(cell).unwrap_or_default()));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Plain output: one identifier per row for lists, else the bare value.
fn render_plain(value: &Value) -> String {
    if let Some(rows) = rows_of(value) {
        return rows
            .iter()
            .map(|row| row.get("id").or_else(|| row.get("_id")).map_or_else(|| cell(row), scalar))
            .collect::<Vec<_>>()
            .join("\n");
    }
    match value {
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("_id"))
            .map_or_else(|| cell(value), scalar),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn cell(value: &Value) -> String {
    let text = scalar(value);
    if text.chars().count() <= MAX_CELL {
        return text;
    }
    let mut short: String = text.chars().take(MAX_CELL - 1).collect();
    short.push('…');
    short
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn table_uses_union_of_row_keys_with_id_first() {
        let value = json!({
            "data": [
                { "name": "Ada", "id": "u-1" },
                { "id": "u-2", "email": "b@brewdesk.test" },
            ],
            "total": 2,
        });
        let out = render_value(OutputFormat::Table, &value).unwrap();
        let header_line = out.lines().nth(1).unwrap();

        let id = header_line.find("id").unwrap();
        let email = header_line.find("email").unwrap();
        let name = header_line.find("name").unwrap();
        assert!(id < email && email < name, "{header_line}");
        assert!(out.contains("b@brewdesk.test"));
    }

    #[test]
    fn plain_lists_ids() {
        let value = json!([{ "id": 1 }, { "id": "two" }, { "name": "no id" }]);
        let out = render_value(OutputFormat::Plain, &value).unwrap();
        assert_eq!(out, "1\ntwo\n{\"name\":\"no id\"}");
    }

    #[test]
    fn object_renders_as_fields() {
        let out = render_value(OutputFormat::Table, &json!({ "users": 42 })).unwrap();
        assert!(out.contains("users"));
        assert!(out.contains("42"));
    }

    #[test]
    fn long_cells_are_truncated() {
        let long = "x".repeat(200);
        let out = cell(&Value::String(long));
        assert_eq!(out.chars().count(), MAX_CELL);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn empty_list_says_so() {
        let out = render_value(OutputFormat::Table, &json!({ "data": [] })).unwrap();
        assert_eq!(out, "(no results)");
    }
}
