//! Audit log of administrative actions.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path, list};
use crate::operation::Operation;

const BASE: &str = "/admin/audit-logs";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "logs",
        operations: vec![
            Operation::query("logs.list", &["logs"], |args| {
                Ok(list(BASE, args)
                    .query_opt("actor", args.string("actor"))
                    .query_opt("from", args.string("from"))
                    .query_opt("to", args.string("to")))
            }),
            Operation::query("logs.get", &["logs"], |args| {
                Ok(RequestDescriptor::get(item_path("logs.get", BASE, args)?))
            }),
            Operation::mutation("logs.delete", &["logs"], |args| {
                Ok(RequestDescriptor::delete(item_path("logs.delete", BASE, args)?))
            }),
            Operation::mutation("logs.clear", &["logs"], |_| Ok(RequestDescriptor::delete(BASE))),
        ],
    }
}
