//! Console operators and the signed-in operator's own profile.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path, list};
use crate::args::Args;
use crate::error::CoreError;
use crate::operation::Operation;

const BASE: &str = "/admin/admins";
const PROFILE: &str = "/admin/profile";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "admins",
        operations: vec![
            Operation::query("admins.list", &["admins"], |args| Ok(list(BASE, args))),
            Operation::query("admins.get", &["admins"], |args| {
                Ok(RequestDescriptor::get(item_path("admins.get", BASE, args)?))
            }),
            Operation::mutation("admins.create", &["admins"], create),
            Operation::mutation("admins.update", &["admins", "profile"], |args| {
                let path = item_path("admins.update", BASE, args)?;
                Ok(RequestDescriptor::patch(path).json(args.body_without(&["id"])))
            }),
            Operation::mutation("admins.delete", &["admins"], |args| {
                Ok(RequestDescriptor::delete(item_path("admins.delete", BASE, args)?))
            }),
            Operation::query("admins.profile", &["profile"], |_| {
                Ok(RequestDescriptor::get(PROFILE))
            }),
            Operation::mutation("admins.change_password", &["profile"], change_password),
        ],
    }
}

fn create(args: &Args) -> Result<RequestDescriptor, CoreError> {
    for field in ["email", "password"] {
        if args.string(field).is_none() {
            return Err(CoreError::invalid_args(
                "admins.create",
                format!("missing '{field}'"),
            ));
        }
    }
    Ok(RequestDescriptor::post(BASE).json(args.body_without(&[])))
}

fn change_password(args: &Args) -> Result<RequestDescriptor, CoreError> {
    for field in ["current_password", "new_password"] {
        if args.string(field).is_none() {
            return Err(CoreError::invalid_args(
                "admins.change_password",
                format!("missing '{field}'"),
            ));
        }
    }
    Ok(RequestDescriptor::post(format!("{PROFILE}/password")).json(args.body_without(&[])))
}
