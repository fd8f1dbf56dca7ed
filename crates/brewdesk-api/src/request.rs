// Request descriptors
//
// A descriptor is the complete, replayable description of one API call.
// Resource modules build them; the dispatcher sends them and, after a
// session refresh, re-sends the very same value.

use std::fmt;

use reqwest::Method;
use serde_json::Value;

/// An immutable description of a single HTTP call against the admin API.
///
/// Paths are relative to the configured API base URL (e.g.
/// `"/admin/user/get-users"`). Every descriptor requires authentication
/// unless built with [`public()`](Self::public).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    requires_auth: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            requires_auth: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    // ── Builders ─────────────────────────────────────────────────────

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is present.
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Mark the call as not requiring a bearer credential (login, refresh).
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_to_authenticated() {
        let req = RequestDescriptor::get("/admin/user/get-users");
        assert!(req.requires_auth());
        assert!(!req.clone().public().requires_auth());
    }

    #[test]
    fn query_opt_skips_missing_values() {
        let req = RequestDescriptor::get("/admin/audit-logs")
            .query("page", 2)
            .query_opt("search", None::<&str>)
            .query_opt("limit", Some(50));

        assert_eq!(
            req.query_params(),
            &[
                ("page".to_owned(), "2".to_owned()),
                ("limit".to_owned(), "50".to_owned())
            ]
        );
    }

    #[test]
    fn display_shows_method_and_path() {
        let req = RequestDescriptor::delete("/admin/audit-logs/42").json(json!({}));
        assert_eq!(req.to_string(), "DELETE /admin/audit-logs/42");
        assert_eq!(req.body(), Some(&json!({})));
    }
}
