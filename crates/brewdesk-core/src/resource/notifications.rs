//! Broadcast notifications sent to customers.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path, list};
use crate::operation::Operation;

const BASE: &str = "/admin/notifications";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "notifications",
        operations: vec![
            Operation::query("notifications.list", &["notifications"], |args| {
                Ok(list(BASE, args))
            }),
            Operation::mutation("notifications.send", &["notifications"], |args| {
                args.require_any("notifications.send", &["title"])?;
                args.require_any("notifications.send", &["message", "body"])?;
                Ok(RequestDescriptor::post(BASE).json(args.body_without(&[])))
            }),
            Operation::mutation("notifications.mark_read", &["notifications"], |args| {
                let path = item_path("notifications.mark_read", BASE, args)?;
                Ok(RequestDescriptor::patch(format!("{path}/read")))
            }),
            Operation::mutation("notifications.delete", &["notifications"], |args| {
                Ok(RequestDescriptor::delete(item_path(
                    "notifications.delete",
                    BASE,
                    args,
                )?))
            }),
        ],
    }
}
