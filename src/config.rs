//! # Query Options
//!
//! Knobs that change how a request is translated. Both options exist because
//! deployments disagree on them: some rely on power users typing regular
//! expressions into the search box, others must treat all input as literal
//! text; some clients always send paging parameters, others do not.
//!
//! `QueryOptions` deserializes from application configuration:
//!
//! ```rust,ignore
//! let options: QueryOptions = serde_json::from_str(r#"{"pattern_mode": "literal", "paging": "lenient"}"#)?;
//! ```

use serde::{Deserialize, Serialize};

/// How search text is turned into a match pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternMode {
    /// Search text is used as an unanchored, case-insensitive regular expression.
    /// Text that is not a valid expression is matched literally.
    ///
    /// SQL stores evaluate the expression with `~*` on Postgres and
    /// `REGEXP_LIKE` on MySQL. SQLite has no regex function: there the text is
    /// matched as a literal substring and a warning is logged.
    #[default]
    Regex,
    /// Search text is escaped and matched as a case-insensitive substring.
    Literal,
}

/// What to do when `draw`, `start` or `length` is missing or not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingPolicy {
    /// Reject the request with a parameter-validation error.
    #[default]
    Strict,
    /// Fall back to `draw = 1`, `start = 0`, `length = 0`.
    Lenient,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub pattern_mode: PatternMode,
    pub paging: PagingPolicy,
}

impl QueryOptions {
    #[must_use]
    pub const fn with_pattern_mode(mut self, pattern_mode: PatternMode) -> Self {
        self.pattern_mode = pattern_mode;
        self
    }

    #[must_use]
    pub const fn with_paging(mut self, paging: PagingPolicy) -> Self {
        self.paging = paging;
        self
    }
}
