// ── Cache tags ──
//
// A tag names a category of cached data ("users", "logs", "ip"). It is
// never tied to one record: invalidating "users" hits every cached result
// filed under it, whichever user it was about.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque label grouping cached results that must be invalidated together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Cow<'static, str>);

impl Tag {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Tag {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Whether two tag sets share at least one tag.
pub fn intersects(a: &[Tag], b: &[Tag]) -> bool {
    a.iter().any(|tag| b.contains(tag))
}
