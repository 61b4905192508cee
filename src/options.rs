use serde::Deserialize;

pub const DEFAULT_PER_PAGE: u64 = 15;
pub const MAX_PER_PAGE: u64 = 500;
pub const MAX_ROWS: u64 = 1000;
pub const MAX_GLOBAL_FILTER_LENGTH: usize = 255;

/// Compiler behaviour shared by every request against one table.
///
/// Deserializable so hosts can keep it next to the rest of their settings:
///
/// ```toml
/// [table_query]
/// strict = true
/// max_per_page = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Fail the request on the first filter, search field or sort that cannot be
    /// compiled instead of skipping it.
    pub strict: bool,
    /// Allow dotted `relation.column` paths in filters, search fields and sorting.
    pub relation_paths: bool,
    pub default_per_page: u64,
    pub max_per_page: u64,
    /// Upper bound for the offset-style `rows` parameter.
    pub max_rows: u64,
    pub max_global_filter_len: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            strict: false,
            relation_paths: true,
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
            max_rows: MAX_ROWS,
            max_global_filter_len: MAX_GLOBAL_FILTER_LENGTH,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}
