//! Internal notes attached to users. Notes are listed per user, but a
//! change to any note invalidates every cached notes list.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path, list};
use crate::operation::Operation;

const BASE: &str = "/admin/notes";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "notes",
        operations: vec![
            Operation::query("notes.list", &["notes"], |args| {
                Ok(list(BASE, args).query_opt("userId", args.string("user_id")))
            }),
            Operation::mutation("notes.create", &["notes"], |args| {
                args.path_segment("notes.create", "user_id")?;
                args.require_any("notes.create", &["content"])?;
                Ok(RequestDescriptor::post(BASE).json(args.body_without(&[])))
            }),
            Operation::mutation("notes.update", &["notes"], |args| {
                let path = item_path("notes.update", BASE, args)?;
                args.require_any("notes.update", &["content"])?;
                Ok(RequestDescriptor::patch(path).json(args.body_without(&["id"])))
            }),
            Operation::mutation("notes.delete", &["notes"], |args| {
                Ok(RequestDescriptor::delete(item_path("notes.delete", BASE, args)?))
            }),
        ],
    }
}
