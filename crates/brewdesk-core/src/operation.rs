// ── Operation table ──
//
// The invalidation graph as data: every query names the tags its result is
// filed under, every mutation names the tags it invalidates. The cache
// consumes this table uniformly and never looks at a resource module.

use std::collections::HashMap;
use std::fmt;

use brewdesk_api::RequestDescriptor;
use strum::{AsRefStr, Display, EnumString};

use crate::args::Args;
use crate::error::CoreError;
use crate::resource::ResourceModule;
use crate::tag::{self, Tag};

/// Whether an operation reads (and is cached) or writes (and invalidates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Builds the request for one invocation from its arguments.
pub type BuildFn = fn(&Args) -> Result<RequestDescriptor, CoreError>;

/// One declared operation.
///
/// For a query `tags` are the tags it *provides*; for a mutation the tags
/// it *invalidates*.
#[derive(Clone)]
pub struct Operation {
    pub name: &'static str,
    pub kind: OperationKind,
    pub tags: Vec<Tag>,
    build: BuildFn,
}

impl Operation {
    pub fn query(name: &'static str, provides: &[&'static str], build: BuildFn) -> Self {
        Self {
            name,
            kind: OperationKind::Query,
            tags: provides.iter().copied().map(Tag::from_static).collect(),
            build,
        }
    }

    pub fn mutation(name: &'static str, invalidates: &[&'static str], build: BuildFn) -> Self {
        Self {
            name,
            kind: OperationKind::Mutation,
            tags: invalidates.iter().copied().map(Tag::from_static).collect(),
            build,
        }
    }

    /// Produce the request descriptor for `args`.
    pub fn request(&self, args: &Args) -> Result<RequestDescriptor, CoreError> {
        (self.build)(args)
    }

    pub fn is_query(&self) -> bool {
        self.kind == OperationKind::Query
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Every registered operation, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    ops: HashMap<&'static str, Operation>,
    /// Registration order, for stable listings.
    order: Vec<&'static str>,
}

impl OperationTable {
    /// Build the table from resource modules, rejecting duplicate names.
    pub fn from_modules(modules: impl IntoIterator<Item = ResourceModule>) -> Result<Self, CoreError> {
        let mut table = Self::default();
        for module in modules {
            for op in module.operations {
                table.register(op)?;
            }
        }
        Ok(table)
    }

    pub fn register(&mut self, op: Operation) -> Result<(), CoreError> {
        if self.ops.contains_key(op.name) {
            return Err(CoreError::DuplicateOperation {
                name: op.name.to_owned(),
            });
        }
        self.order.push(op.name);
        self.ops.insert(op.name, op);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Operation, CoreError> {
        self.ops.get(name).ok_or_else(|| CoreError::UnknownOperation {
            name: name.to_owned(),
        })
    }

    /// Look up `name` and require it to be of `kind`.
    pub fn expect_kind(&self, name: &str, kind: OperationKind) -> Result<&Operation, CoreError> {
        let op = self.get(name)?;
        if op.kind != kind {
            return Err(CoreError::WrongOperationKind {
                name: name.to_owned(),
                expected: kind,
                actual: op.kind,
            });
        }
        Ok(op)
    }

    /// Tags a query files its result under (empty for mutations).
    pub fn provides(&self, name: &str) -> &[Tag] {
        match self.ops.get(name) {
            Some(op) if op.kind == OperationKind::Query => &op.tags,
            _ => &[],
        }
    }

    /// Tags a mutation invalidates (empty for queries).
    pub fn invalidates(&self, name: &str) -> &[Tag] {
        match self.ops.get(name) {
            Some(op) if op.kind == OperationKind::Mutation => &op.tags,
            _ => &[],
        }
    }

    /// Queries whose cached results a mutation would invalidate.
    pub fn queries_affected_by(&self, mutation: &str) -> Vec<&'static str> {
        let invalidated = self.invalidates(mutation);
        self.iter()
            .filter(|op| op.is_query() && tag::intersects(&op.tags, invalidated))
            .map(|op| op.name)
            .collect()
    }

    /// Operations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.order.iter().filter_map(|name| self.ops.get(name))
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn list(_: &Args) -> Result<RequestDescriptor, CoreError> {
        Ok(RequestDescriptor::get("/things"))
    }

    fn module(ops: Vec<Operation>) -> ResourceModule {
        ResourceModule {
            name: "things",
            operations: ops,
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = OperationTable::from_modules([
            module(vec![Operation::query("things.list", &["things"], list)]),
            module(vec![Operation::query("things.list", &["other"], list)]),
        ]);
        assert!(matches!(result, Err(CoreError::DuplicateOperation { name }) if name == "things.list"));
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let table = OperationTable::from_modules([module(vec![
            Operation::query("things.list", &["things"], list),
            Operation::mutation("things.purge", &["things"], list),
        ])])
        .unwrap();

        let err = table
            .expect_kind("things.purge", OperationKind::Query)
            .unwrap_err();
        assert_eq!(err.to_string(), "Operation 'things.purge' is a mutation, not a query");
        assert!(matches!(
            table.get("things.nope"),
            Err(CoreError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn provides_and_invalidates_are_kind_specific() {
        let table = OperationTable::from_modules([module(vec![
            Operation::query("things.list", &["things"], list),
            Operation::query("stuff.list", &["stuff"], list),
            Operation::mutation("things.purge", &["things", "audit"], list),
        ])])
        .unwrap();

        assert_eq!(table.provides("things.list"), &[Tag::from("things")]);
        assert!(table.provides("things.purge").is_empty());
        assert_eq!(table.invalidates("things.purge").len(), 2);
        assert_eq!(table.queries_affected_by("things.purge"), vec!["things.list"]);
        assert_eq!(
            table.iter().map(|op| op.name).collect::<Vec<_>>(),
            vec!["things.list", "stuff.list", "things.purge"]
        );
    }
}
