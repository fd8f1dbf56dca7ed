//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;

use brewdesk_core::Args;

use crate::cli::OperationArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so the action is refused.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Collect operation arguments from `--args-json` / `--from-file`, then
/// `--arg key=value` pairs on top.
pub fn parse_args(op: &OperationArgs) -> Result<Args, CliError> {
    let base = if let Some(ref path) = op.from_file {
        read_json_file(path)?
    } else if let Some(ref json) = op.args_json {
        serde_json::from_str(json)?
    } else {
        Value::Null
    };

    let mut args = Args::try_from(base).map_err(|e| CliError::Validation {
        field: "arguments".into(),
        reason: e.to_string(),
    })?;

    for pair in &op.args {
        let (key, raw) = pair.split_once('=').ok_or_else(|| CliError::Validation {
            field: "--arg".into(),
            reason: format!("expected KEY=VALUE, got '{pair}'"),
        })?;
        if key.is_empty() {
            return Err(CliError::Validation {
                field: "--arg".into(),
                reason: format!("empty key in '{pair}'"),
            });
        }
        args.insert(key, parse_value(raw));
    }

    Ok(args)
}

/// JSON when it parses as JSON, a string otherwise. `id=42` is a number,
/// `id=abc` a string, `id='"42"'` the string "42".
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn op(args: &[&str], args_json: Option<&str>) -> OperationArgs {
        OperationArgs {
            operation: "users.list".into(),
            args: args.iter().map(|s| (*s).to_owned()).collect(),
            args_json: args_json.map(str::to_owned),
            from_file: None,
        }
    }

    #[test]
    fn pairs_parse_as_json_or_string() {
        let args = parse_args(&op(&["page=2", "search=ada lovelace", "active=true", "id=\"7\""], None)).unwrap();
        assert_eq!(args.get("page"), Some(&json!(2)));
        assert_eq!(args.get("search"), Some(&json!("ada lovelace")));
        assert_eq!(args.get("active"), Some(&json!(true)));
        assert_eq!(args.get("id"), Some(&json!("7")));
    }

    #[test]
    fn pairs_override_json_object() {
        let args = parse_args(&op(&["limit=5"], Some(r#"{"limit": 20, "page": 1}"#))).unwrap();
        assert_eq!(args.get("limit"), Some(&json!(5)));
        assert_eq!(args.get("page"), Some(&json!(1)));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(parse_args(&op(&["novalue"], None)).is_err());
        assert!(parse_args(&op(&["=1"], None)).is_err());
        assert!(parse_args(&op(&[], Some("[1, 2]"))).is_err());
    }

    #[test]
    fn arguments_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("args.json");
        std::fs::write(&path, r#"{"title": "Maintenance", "message": "Down at 2am"}"#).unwrap();

        let mut args = op(&[], None);
        args.from_file = Some(path);
        let parsed = parse_args(&args).unwrap();
        assert_eq!(parsed.get("title"), Some(&json!("Maintenance")));
    }
}
