//! Semantic flags and parse-context markers carried by nodes.

use bitflags::bitflags;

bitflags! {
    /// Modifiers recorded on a node while it is parsed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SemanticFlags: u32 {
        /// `SELECT DISTINCT`, `COUNT(DISTINCT x)`.
        const DISTINCT = 1;
        /// `SELECT ALL`, `UNION ALL`.
        const ALL = 1 << 1;
        /// `WITH RECURSIVE`.
        const RECURSIVE = 1 << 2;
        /// The node's last child is an `Alias`.
        const HAS_ALIAS = 1 << 3;
        /// The node is a parenthesized query used as an expression or table.
        const IS_SUBQUERY = 1 << 4;
        /// `NOT IN`, `NOT LIKE`, `IS NOT`, `NOT EXISTS`, `NOT BETWEEN`.
        const NEGATED = 1 << 5;
        /// `IF EXISTS`.
        const IF_EXISTS = 1 << 6;
        /// `IF NOT EXISTS`.
        const IF_NOT_EXISTS = 1 << 7;
        /// `TEMP` / `TEMPORARY`.
        const TEMPORARY = 1 << 8;
        /// `CREATE UNIQUE INDEX`.
        const UNIQUE = 1 << 9;
        /// `DESC`.
        const DESCENDING = 1 << 10;
        /// Explicit `ASC`.
        const ASCENDING = 1 << 11;
        /// `NULLS FIRST`.
        const NULLS_FIRST = 1 << 12;
        /// `NULLS LAST`.
        const NULLS_LAST = 1 << 13;
        /// `NATURAL JOIN`.
        const NATURAL = 1 << 14;
        /// `LEFT OUTER JOIN` and friends.
        const OUTER = 1 << 15;
        /// `COUNT(*)`.
        const STAR_ARGS = 1 << 16;
        /// `INSERT ... DEFAULT VALUES`.
        const DEFAULT_VALUES = 1 << 17;
        /// `EXPLAIN QUERY PLAN`.
        const QUERY_PLAN = 1 << 18;
        /// Trigger fires `BEFORE`.
        const BEFORE = 1 << 19;
        /// Trigger fires `AFTER`.
        const AFTER = 1 << 20;
        /// Trigger fires `INSTEAD OF`.
        const INSTEAD_OF = 1 << 21;
        /// `FOR EACH ROW`.
        const FOR_EACH_ROW = 1 << 22;
        /// `AUTOINCREMENT` on a primary key.
        const AUTOINCREMENT = 1 << 23;
        /// `WITHOUT ROWID`.
        const WITHOUT_ROWID = 1 << 24;
        /// `CASCADE`.
        const CASCADE = 1 << 25;
        /// `RESTRICT`.
        const RESTRICT = 1 << 26;
        /// `REPLACE INTO` or `INSERT OR REPLACE`.
        const REPLACE = 1 << 27;
        /// The expression was written inside parentheses.
        const PARENTHESIZED = 1 << 28;
    }
}

impl Default for SemanticFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// The grammar production a node was built in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseContext {
    SelectList,
    FromClause,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderByClause,
    JoinCondition,
    CaseExpression,
    FunctionArg,
    Subquery,
}

impl ParseContext {
    /// Returns the marker's display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SelectList => "select list",
            Self::FromClause => "FROM clause",
            Self::WhereClause => "WHERE clause",
            Self::GroupByClause => "GROUP BY clause",
            Self::HavingClause => "HAVING clause",
            Self::OrderByClause => "ORDER BY clause",
            Self::JoinCondition => "join condition",
            Self::CaseExpression => "CASE expression",
            Self::FunctionArg => "function argument",
            Self::Subquery => "subquery",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine() {
        let mut flags = SemanticFlags::default();
        assert!(flags.is_empty());
        flags |= SemanticFlags::DISTINCT | SemanticFlags::HAS_ALIAS;
        assert!(flags.contains(SemanticFlags::DISTINCT));
        assert!(!flags.contains(SemanticFlags::NEGATED));
        flags.remove(SemanticFlags::DISTINCT);
        assert_eq!(flags, SemanticFlags::HAS_ALIAS);
    }

    #[test]
    fn test_context_names() {
        assert_eq!(ParseContext::WhereClause.as_str(), "WHERE clause");
    }
}
