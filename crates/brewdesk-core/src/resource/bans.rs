//! Account bans. A ban changes the banned user's record as well, so ban
//! mutations also invalidate `users`.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path, list};
use crate::args::Args;
use crate::error::CoreError;
use crate::operation::Operation;

const BASE: &str = "/admin/bans";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "bans",
        operations: vec![
            Operation::query("bans.list", &["bans"], |args| Ok(list(BASE, args))),
            Operation::mutation("bans.create", &["bans", "users"], create),
            Operation::mutation("bans.delete", &["bans", "users"], |args| {
                Ok(RequestDescriptor::delete(item_path("bans.delete", BASE, args)?))
            }),
        ],
    }
}

fn create(args: &Args) -> Result<RequestDescriptor, CoreError> {
    args.path_segment("bans.create", "user_id")?;
    Ok(RequestDescriptor::post(BASE).json(args.body_without(&[])))
}
