//! Coffee shops listed on the platform.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path, list};
use crate::args::Args;
use crate::error::CoreError;
use crate::operation::Operation;

const BASE: &str = "/admin/cafes";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "cafes",
        operations: vec![
            Operation::query("cafes.list", &["cafes"], |args| Ok(list(BASE, args))),
            Operation::query("cafes.get", &["cafes"], |args| {
                Ok(RequestDescriptor::get(item_path("cafes.get", BASE, args)?))
            }),
            Operation::mutation("cafes.create", &["cafes", "dashboard"], create),
            Operation::mutation("cafes.update", &["cafes"], |args| {
                let path = item_path("cafes.update", BASE, args)?;
                Ok(RequestDescriptor::patch(path).json(args.body_without(&["id"])))
            }),
            Operation::mutation("cafes.approve", &["cafes", "dashboard"], |args| {
                let path = item_path("cafes.approve", BASE, args)?;
                Ok(RequestDescriptor::post(format!("{path}/approve")))
            }),
            Operation::mutation("cafes.delete", &["cafes", "dashboard"], |args| {
                Ok(RequestDescriptor::delete(item_path("cafes.delete", BASE, args)?))
            }),
        ],
    }
}

fn create(args: &Args) -> Result<RequestDescriptor, CoreError> {
    if args.string("name").is_none() {
        return Err(CoreError::invalid_args("cafes.create", "missing 'name'"));
    }
    Ok(RequestDescriptor::post(BASE).json(args.body_without(&[])))
}
