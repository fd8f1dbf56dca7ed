use std::fmt;

use crate::args::Args;

/// Identity of one cached result: operation name plus canonical arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    operation: String,
    args: String,
}

impl CacheKey {
    pub fn new(operation: &str, args: &Args) -> Self {
        Self {
            operation: operation.to_owned(),
            args: args.canonical(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Canonical JSON of the arguments.
    pub fn args(&self) -> &str {
        &self.args
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operation, self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_order_does_not_split_keys() {
        let a = CacheKey::new("users.list", &Args::new().with("page", 1).with("limit", 20));
        let b = CacheKey::new("users.list", &Args::new().with("limit", 20).with("page", 1));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), r#"users.list{"limit":20,"page":1}"#);
    }

    #[test]
    fn different_operations_never_share_a_key() {
        let args = Args::new().with("id", "1");
        assert_ne!(CacheKey::new("users.get", &args), CacheKey::new("admins.get", &args));
    }
}
