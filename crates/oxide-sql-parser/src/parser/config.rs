//! Parser configuration.

use serde::{Deserialize, Serialize};

/// How strictly the validator treats clause dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Every structural rule applies.
    #[default]
    Production,
    /// HAVING without GROUP BY over aggregates, and joins without a
    /// condition, are accepted.
    Permissive,
}

/// Default for [`ParserConfig::stack_budget`]: 1 MiB.
pub const DEFAULT_STACK_BUDGET: usize = 1024 * 1024;

/// Options for a [`Parser`](super::Parser).
///
/// Deserializable from any serde format; missing fields take their
/// defaults:
///
/// ```
/// use oxide_sql_parser::{ParseMode, ParserConfig};
///
/// let config: ParserConfig = serde_json::from_str(r#"{"mode": "permissive"}"#).unwrap();
/// assert_eq!(config.mode, ParseMode::Permissive);
/// assert_eq!(config.max_depth, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Validation strictness.
    pub mode: ParseMode,
    /// Recursion limit for nested statements and expressions.
    pub max_depth: usize,
    /// Bytes of call stack one parse may use before nesting is rejected;
    /// zero disables the check. The default fits a 2 MiB thread stack.
    pub stack_budget: usize,
    /// Leave parenthesized expressions unwrapped instead of building
    /// `ParenExpr` nodes.
    pub compact_tree: bool,
    /// Reject `==`, `!=`, backtick identifiers and `::` casts.
    pub strict_ansi: bool,
    /// Accept PRAGMA, VACUUM, ATTACH, DETACH, REINDEX and `::` casts.
    pub allow_extensions: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            mode: ParseMode::Production,
            max_depth: 1000,
            stack_budget: DEFAULT_STACK_BUDGET,
            compact_tree: false,
            strict_ansi: false,
            allow_extensions: true,
        }
    }
}

impl ParserConfig {
    /// Sets the validation mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the recursion limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the stack budget in bytes (zero disables it).
    #[must_use]
    pub const fn with_stack_budget(mut self, stack_budget: usize) -> Self {
        self.stack_budget = stack_budget;
        self
    }

    #[must_use]
    pub const fn with_compact_tree(mut self, compact_tree: bool) -> Self {
        self.compact_tree = compact_tree;
        self
    }

    #[must_use]
    pub const fn with_strict_ansi(mut self, strict_ansi: bool) -> Self {
        self.strict_ansi = strict_ansi;
        self
    }

    #[must_use]
    pub const fn with_extensions(mut self, allow_extensions: bool) -> Self {
        self.allow_extensions = allow_extensions;
        self
    }

    /// The recursion limit actually enforced; zero counts as one.
    #[must_use]
    pub const fn depth_limit(&self) -> usize {
        if self.max_depth == 0 {
            1
        } else {
            self.max_depth
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.mode, ParseMode::Production);
        assert_eq!(config.max_depth, 1000);
        assert_eq!(config.stack_budget, DEFAULT_STACK_BUDGET);
        assert!(!config.compact_tree);
        assert!(!config.strict_ansi);
        assert!(config.allow_extensions);
    }

    #[test]
    fn test_builder() {
        let config = ParserConfig::default()
            .with_mode(ParseMode::Permissive)
            .with_max_depth(0)
            .with_stack_budget(0)
            .with_strict_ansi(true)
            .with_extensions(false)
            .with_compact_tree(true);
        assert_eq!(config.mode, ParseMode::Permissive);
        assert_eq!(config.depth_limit(), 1);
        assert_eq!(config.stack_budget, 0);
        assert!(config.strict_ansi);
        assert!(!config.allow_extensions);
        assert!(config.compact_tree);
    }
}
