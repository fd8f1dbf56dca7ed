//! Blocked client addresses.

use brewdesk_api::RequestDescriptor;

use super::{ResourceModule, item_path, list};
use crate::error::CoreError;
use crate::operation::Operation;

const BASE: &str = "/admin/ip-blocks";

pub fn module() -> ResourceModule {
    ResourceModule {
        name: "ip",
        operations: vec![
            Operation::query("ip.list", &["ip"], |args| Ok(list(BASE, args))),
            Operation::mutation("ip.block", &["ip"], |args| {
                let ip = args
                    .string("ip")
                    .ok_or_else(|| CoreError::invalid_args("ip.block", "missing 'ip'"))?;
                if ip.parse::<std::net::IpAddr>().is_err() {
                    return Err(CoreError::invalid_args(
                        "ip.block",
                        format!("'{ip}' is not an IP address"),
                    ));
                }
                Ok(RequestDescriptor::post(BASE).json(args.body_without(&[])))
            }),
            Operation::mutation("ip.unblock", &["ip"], |args| {
                Ok(RequestDescriptor::delete(item_path("ip.unblock", BASE, args)?))
            }),
        ],
    }
}
