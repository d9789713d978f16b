//! Request descriptors for the news API
//!
//! Defines endpoint names, scalar parameter values, and the typed filter set
//! that is turned into an endpoint-specific parameter map.

use std::collections::BTreeMap;
use std::fmt;

/// Upper bound the API accepts for `pageSize`
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw parameter map as supplied by a caller; `None` values are dropped
pub type Params = BTreeMap<String, Option<ParamValue>>;

/// A scalar query parameter value
///
/// `Display` is the single canonical string form, used both on the wire and
/// when fingerprinting, so `Int(5)` and `Str("5")` always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        ParamValue::Int(i64::from(n))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// News API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    TopHeadlines,
    Everything,
    Sources,
}

impl Endpoint {
    /// Path segment appended to the base URL
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::TopHeadlines => "top-headlines",
            Endpoint::Everything => "everything",
            Endpoint::Sources => "sources",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters accepted by the article endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub query: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub sources: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort_by: Option<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
}

impl NewsQuery {
    /// Builds the parameter map for `endpoint`
    ///
    /// Only parameters the endpoint understands are emitted. On
    /// `top-headlines`, `sources` cannot be mixed with `country` or
    /// `category`, so a non-empty `sources` suppresses both.
    pub fn to_params(&self, endpoint: Endpoint) -> Params {
        let mut params = Params::new();

        let mut put = |name: &str, value: Option<ParamValue>| {
            params.insert(name.to_string(), value);
        };

        match endpoint {
            Endpoint::TopHeadlines | Endpoint::Everything => {
                put("q", non_empty(&self.query));
                put("language", non_empty(&self.language));
                put(
                    "pageSize",
                    self.page_size
                        .filter(|n| *n > 0)
                        .map(|n| n.min(MAX_PAGE_SIZE).into()),
                );
                put("page", self.page.filter(|n| *n > 0).map(Into::into));
            }
            Endpoint::Sources => {
                put("category", non_empty(&self.category));
                put("language", non_empty(&self.language));
                put("country", non_empty(&self.country));
            }
        }

        match endpoint {
            Endpoint::TopHeadlines => {
                let sources = non_empty(&self.sources);
                if sources.is_some() {
                    put("sources", sources);
                } else {
                    put("country", non_empty(&self.country));
                    put("category", non_empty(&self.category));
                }
            }
            Endpoint::Everything => {
                put("sources", non_empty(&self.sources));
                put("from", non_empty(&self.from));
                put("to", non_empty(&self.to));
                put("sortBy", non_empty(&self.sort_by));
            }
            Endpoint::Sources => {}
        }

        params
    }
}

/// Drops `None` entries and stringifies the rest
pub fn compact(params: &Params) -> BTreeMap<String, String> {
    params
        .iter()
        .filter_map(|(name, value)| {
            value
                .as_ref()
                .map(|value| (name.clone(), value.to_string()))
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<ParamValue> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(ParamValue::from)
}
