//! Subscription plans offered to cafes.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path};
use crate::operation::Operation;

const BASE: &str = "/admin/plans";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "plans",
        operations: vec![
            // Plans are few; the endpoint is not paginated.
            Operation::query("plans.list", &["plans"], |_| Ok(RequestDescriptor::get(BASE))),
            Operation::query("plans.get", &["plans"], |args| {
                Ok(RequestDescriptor::get(item_path("plans.get", BASE, args)?))
            }),
            Operation::mutation("plans.create", &["plans"], |args| {
                args.require_any("plans.create", &["name"])?;
                Ok(RequestDescriptor::post(BASE).json(args.body_without(&[])))
            }),
            Operation::mutation("plans.update", &["plans", "cafes"], |args| {
                let path = item_path("plans.update", BASE, args)?;
                Ok(RequestDescriptor::put(path).json(args.body_without(&["id"])))
            }),
            Operation::mutation("plans.delete", &["plans", "cafes"], |args| {
                Ok(RequestDescriptor::delete(item_path("plans.delete", BASE, args)?))
            }),
        ],
    }
}
