//! `brewdesk mutate <operation>`

use tracing::debug;

use brewdesk_core::OperationKind;

use super::Connection;
use super::util;
use crate::cli::{GlobalOpts, OperationArgs};
use crate::error::CliError;
use crate::output;

/// Mutations that destroy data and ask before running.
fn is_destructive(operation: &str) -> bool {
    operation.ends_with(".delete") || operation.ends_with(".clear")
}

pub async fn handle(conn: &Connection, op: &OperationArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let args = util::parse_args(op)?;

    let table = conn.client.operations();
    table
        .expect_kind(&op.operation, OperationKind::Mutation)?
        .request(&args)?;

    if is_destructive(&op.operation) {
        let prompt = if args.is_empty() {
            format!("Run {}?", op.operation)
        } else {
            format!("Run {} with {args}?", op.operation)
        };
        if !util::confirm(&prompt, global.yes)? {
            return Err(CliError::NotConfirmed {
                action: op.operation.clone(),
            });
        }
    }

    conn.authenticate(global).await?;

    debug!(
        operation = %op.operation,
        %args,
        refreshes = ?table.queries_affected_by(&op.operation),
        "running mutation"
    );
    let value = conn.client.mutate(&op.operation, &args).await?;

    if value.is_null() {
        if !global.quiet {
            let color = output::should_color(global.color);
            eprintln!("{}", output::success(&format!("{} done", op.operation), color));
        }
        return Ok(());
    }

    let out = output::render_value(global.output, &value)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
