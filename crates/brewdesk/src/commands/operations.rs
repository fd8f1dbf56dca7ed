//! `brewdesk operations` -- the catalogue, with the tags each operation
//! provides or invalidates.

use serde::Serialize;
use tabled::Tabled;

use brewdesk_core::{Operation, OperationKind, OperationTable, resource};

use crate::cli::{GlobalOpts, KindFilter, OperationsArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct OperationInfo {
    name: &'static str,
    kind: String,
    tags: Vec<String>,
    /// Queries a mutation refreshes; empty for queries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    refreshes: Vec<&'static str>,
}

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "Operation")]
    name: &'static str,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Refreshes")]
    refreshes: String,
}

fn to_row(info: &OperationInfo) -> OperationRow {
    OperationRow {
        name: info.name,
        kind: info.kind.clone(),
        tags: info.tags.join(", "),
        refreshes: info.refreshes.join(", "),
    }
}

fn matches(op: &Operation, args: &OperationsArgs) -> bool {
    let kind_ok = match args.kind {
        None => true,
        Some(KindFilter::Query) => op.kind == OperationKind::Query,
        Some(KindFilter::Mutation) => op.kind == OperationKind::Mutation,
    };
    let tag_ok = args
        .tag
        .as_deref()
        .is_none_or(|wanted| op.tags.iter().any(|t| t.as_str() == wanted));
    kind_ok && tag_ok
}

fn describe(table: &OperationTable, args: &OperationsArgs) -> Vec<OperationInfo> {
    table
        .iter()
        .filter(|op| matches(op, args))
        .map(|op| OperationInfo {
            name: op.name,
            kind: op.kind.to_string(),
            tags: op.tags.iter().map(ToString::to_string).collect(),
            refreshes: if op.is_query() {
                Vec::new()
            } else {
                table.queries_affected_by(op.name)
            },
        })
        .collect()
}

pub fn handle(args: &OperationsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let table = OperationTable::from_modules(resource::catalog())?;
    let infos = describe(&table, args);

    let out = output::render_list(global.output, &infos, to_row, |i| i.name.to_owned())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
