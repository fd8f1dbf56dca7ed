//! `brewdesk query <operation>`

use tracing::debug;

use brewdesk_core::OperationKind;

use super::Connection;
use super::util;
use crate::cli::{GlobalOpts, OperationArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(conn: &Connection, op: &OperationArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let args = util::parse_args(op)?;

    // Reject unknown names and bad arguments before asking for credentials.
    conn.client
        .operations()
        .expect_kind(&op.operation, OperationKind::Query)?
        .request(&args)?;

    conn.authenticate(global).await?;

    debug!(operation = %op.operation, %args, "running query");
    let value = conn.client.query(&op.operation, &args).await?;

    let out = output::render_value(global.output, &value)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
