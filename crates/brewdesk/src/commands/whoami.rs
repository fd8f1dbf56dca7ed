//! `brewdesk whoami` -- log in and show who the session belongs to.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::Connection;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(conn: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    conn.authenticate(global).await?;

    let session = conn.client.session();
    let Some(claims) = session.identity() else {
        if !global.quiet {
            let color = output::should_color(global.color);
            eprintln!(
                "{}",
                output::success("Authenticated (token carries no identity claims)", color)
            );
        }
        return Ok(());
    };

    let value = match global.output {
        OutputFormat::Table => {
            let mut summary = Map::new();
            let fields = [
                ("name", claims.display_name()),
                ("email", claims.email.as_deref()),
                ("role", claims.role.as_deref()),
                ("subject", claims.sub.as_deref()),
            ];
            for (key, val) in fields {
                if let Some(val) = val {
                    summary.insert(key.into(), Value::String(val.to_owned()));
                }
            }
            if let Some(expires) = claims.expires_at() {
                summary.insert("expires".into(), Value::String(describe_expiry(expires, Utc::now())));
            }
            Value::Object(summary)
        }
        _ => serde_json::to_value(claims)?,
    };

    let out = output::render_value(global.output, &value)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn describe_expiry(expires: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let stamp = expires.format("%Y-%m-%d %H:%M UTC");
    let remaining = expires - now;
    if remaining.num_seconds() <= 0 {
        format!("{stamp} (expired)")
    } else if remaining.num_hours() > 0 {
        format!("{stamp} (in {}h {}m)", remaining.num_hours(), remaining.num_minutes() % 60)
    } else {
        format!("{stamp} (in {}m)", remaining.num_minutes().max(1))
    }
}
