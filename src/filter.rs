//! Keyword/color filters used to highlight trace entries.

use crate::error::Error;

/// A keyword to match and the color to render its matches with.
///
/// Both values are opaque strings and are fixed at construction.
///
/// ```
/// use sofa::Filter;
/// let f = Filter::new("malloc", "red");
/// assert_eq!(f.keyword(), "malloc");
/// assert_eq!(f.color(), "red");
/// assert_eq!(f.to_string(), "malloc:red");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    keyword: String,
    color: String,
}

impl Filter {
    pub fn new(keyword: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            color: color.into(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Parse the `keyword:color` form.
    ///
    /// Splits on the last `:`, so symbol keywords like `std::vector:blue` keep
    /// their path separators.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidFilter(s.to_string());
        let (keyword, color) = s.rsplit_once(':').ok_or_else(invalid)?;
        let (keyword, color) = (keyword.trim(), color.trim());
        if keyword.is_empty() || color.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(keyword, color))
    }
}

impl std::str::FromStr for Filter {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.keyword, self.color)
    }
}

/// Parse a comma-separated list of filters, e.g. `idle:black,lock:red`.
///
/// Empty segments are skipped; any malformed segment fails the whole list.
///
/// There is no escaping, so a keyword containing `,` cannot be written in
/// this form. Its joined text (as shown by `SofaConfig::entries`) will not
/// parse back; TOML keeps such filters intact.
pub fn parse_filter_list(s: &str) -> Result<Vec<Filter>, Error> {
    s.split(',')
        .map(str::trim)
        .filter(|seg| !seg.is_empty())
        .map(Filter::parse)
        .collect()
}

pub(crate) fn join_filters(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(Filter::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
