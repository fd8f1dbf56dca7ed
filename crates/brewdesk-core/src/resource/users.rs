//! Customer accounts.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path, list};
use crate::args::Args;
use crate::error::CoreError;
use crate::operation::Operation;

const BASE: &str = "/admin/user";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "users",
        operations: vec![
            Operation::query("users.list", &["users"], |args| {
                Ok(list("/admin/user/get-users", args))
            }),
            Operation::query("users.get", &["users"], |args| {
                Ok(RequestDescriptor::get(item_path("users.get", BASE, args)?))
            }),
            Operation::mutation("users.update", &["users"], update),
            Operation::mutation("users.set_status", &["users", "dashboard"], set_status),
            Operation::mutation("users.delete", &["users", "dashboard"], |args| {
                Ok(RequestDescriptor::delete(item_path("users.delete", BASE, args)?))
            }),
        ],
    }
}

fn update(args: &Args) -> Result<RequestDescriptor, CoreError> {
    let path = item_path("users.update", BASE, args)?;
    args.require_any("users.update", &["name", "email", "phone", "role"])?;
    Ok(RequestDescriptor::patch(path).json(args.body_without(&["id"])))
}

fn set_status(args: &Args) -> Result<RequestDescriptor, CoreError> {
    let path = item_path("users.set_status", BASE, args)?;
    let status = args
        .string("status")
        .ok_or_else(|| CoreError::invalid_args("users.set_status", "missing 'status'"))?;
    Ok(RequestDescriptor::patch(format!("{path}/status"))
        .json(serde_json::json!({ "status": status })))
}
