//! Declarative resource modules.
//!
//! Each module lists the operations of one backend entity together with
//! the tags they provide or invalidate. The modules are pure data: request
//! shapes are built by plain functions from [`Args`], and everything else
//! (dedup, refresh, invalidation) happens in the cache and dispatcher.

pub mod admins;
pub mod bans;
pub mod cafes;
pub mod dashboard;
pub mod ip;
pub mod logs;
pub mod notes;
pub mod notifications;
pub mod plans;
pub mod users;

use brewdesk_api::RequestDescriptor;

use crate::args::Args;
use crate::operation::Operation;

/// The operations of one backend entity.
#[derive(Debug, Clone)]
pub struct ResourceModule {
    pub name: &'static str,
    pub operations: Vec<Operation>,
}

/// Every built-in resource module.
pub fn catalog() -> Vec<ResourceModule> {
    vec![
        users::module(),
        cafes::module(),
        plans::module(),
        bans::module(),
        ip::module(),
        logs::module(),
        notifications::module(),
        notes::module(),
        admins::module(),
        dashboard::module(),
    ]
}

// ── Shared request shapes ────────────────────────────────────────────

/// Query parameters every paginated list endpoint understands.
const LIST_PARAMS: &[&str] = &["page", "limit", "search", "sort", "order", "status"];

/// `GET path` with the standard list parameters copied from `args`.
pub(crate) fn list(path: &str, args: &Args) -> RequestDescriptor {
    LIST_PARAMS
        .iter()
        .fold(RequestDescriptor::get(path), |req, key| {
            req.query_opt(*key, args.string(key))
        })
}

/// `{base}/{id}` with a validated `id` segment.
pub(crate) fn item_path(operation: &str, base: &str, args: &Args) -> Result<String, crate::CoreError> {
    let id = args.path_segment(operation, "id")?;
    Ok(format!("{base}/{id}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operation::{OperationKind, OperationTable};
    use crate::tag::Tag;

    #[test]
    fn catalog_has_unique_names_and_tags_everywhere() {
        let table = OperationTable::from_modules(catalog()).unwrap();
        assert!(table.len() > 40);
        for op in table.iter() {
            assert!(!op.tags.is_empty(), "{} declares no tags", op.name);
        }
    }

    #[test]
    fn every_mutation_invalidates_some_query() {
        let table = OperationTable::from_modules(catalog()).unwrap();
        for op in table.iter().filter(|op| op.kind == OperationKind::Mutation) {
            assert!(
                !table.queries_affected_by(op.name).is_empty(),
                "{} invalidates nothing cached",
                op.name
            );
        }
    }

    #[test]
    fn list_copies_only_known_parameters() {
        let args = Args::new()
            .with("page", 2)
            .with("limit", 25)
            .with("search", "ana")
            .with("unrelated", true);
        let req = list("/admin/user/get-users", &args);
        assert_eq!(
            req.query_params(),
            &[
                ("page".to_owned(), "2".to_owned()),
                ("limit".to_owned(), "25".to_owned()),
                ("search".to_owned(), "ana".to_owned()),
            ]
        );
    }

    #[test]
    fn ban_creation_touches_users() {
        let table = OperationTable::from_modules(catalog()).unwrap();
        let invalidated = table.invalidates("bans.create");
        assert!(invalidated.contains(&Tag::from("bans")));
        assert!(invalidated.contains(&Tag::from("users")));
        assert!(table.queries_affected_by("bans.create").contains(&"users.list"));
    }
}
