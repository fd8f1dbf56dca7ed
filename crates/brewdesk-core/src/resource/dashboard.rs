use brewdesk_api::RequestDescriptor;

use super::ResourceModule;
use crate::operation::Operation;

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "dashboard",
        operations: vec![
            Operation::query("dashboard.stats", &["dashboard"], |args| {
                Ok(RequestDescriptor::get("/admin/dashboard/stats")
                    .query_opt("range", args.string("range")))
            }),
            Operation::query("dashboard.activity", &["dashboard"], |args| {
                Ok(RequestDescriptor::get("/admin/dashboard/activity")
                    .query_opt("limit", args.string("limit")))
            }),
        ],
    }
}
