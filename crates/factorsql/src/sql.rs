//! SQL assembly: join plans, the selection query and the base-query join
//!
//! Plain string templates. Table and column names are interpolated as given;
//! nothing is quoted or escaped.

use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;
use crate::source::{DataSource, SourceError, generate_table_id, materialize};

/// Columns every warehouse table is keyed on
pub const JOIN_KEYS: &str = "date, instrument";

/// How the predicate is applied after window functions are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `QUALIFY <predicate>`
    #[default]
    Qualify,
    /// Predicate computed as a column in a subquery, filtered by an outer
    /// `WHERE`. For engines without `QUALIFY`.
    Subquery,
}

impl Dialect {
    pub fn key(self) -> &'static str {
        match self {
            Dialect::Qualify => "qualify",
            Dialect::Subquery => "subquery",
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Dialect {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "qualify" => Ok(Dialect::Qualify),
            "subquery" => Ok(Dialect::Subquery),
            other => Err(ConfigurationError::UnknownDialect(other.to_string())),
        }
    }
}

/// Tables joined on `(date, instrument)`, sorted and de-duplicated
///
/// The lexicographically first table anchors the `FROM` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    anchor: String,
    joined: Vec<String>,
}

impl JoinPlan {
    /// Returns `None` when there are no tables to select from
    pub fn new<I, S>(tables: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = tables.into_iter().map(Into::into).collect();
        let mut tables = sorted.into_iter();
        let anchor = tables.next()?;
        Some(Self {
            anchor,
            joined: tables.collect(),
        })
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn joined(&self) -> &[String] {
        &self.joined
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.anchor.as_str()).chain(self.joined.iter().map(String::as_str))
    }

    /// `anchor` followed by one indented `JOIN .. USING(..)` line per table
    fn from_clause(&self, indent: &str) -> String {
        let mut clause = self.anchor.clone();
        for table in &self.joined {
            clause.push_str(&format!("\n{indent}    JOIN {table} USING({JOIN_KEYS})"));
        }
        clause
    }
}

impl Display for JoinPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.from_clause(""))
    }
}

/// Select the `(date, instrument)` pairs satisfying `predicate`
pub fn build_select_sql(predicate: &str, plan: &JoinPlan, dialect: Dialect) -> String {
    match dialect {
        Dialect::Qualify => format!(
            "SELECT
    date,
    instrument
FROM {from}
QUALIFY {predicate}
ORDER BY date, instrument
",
            from = plan.from_clause(""),
        ),
        Dialect::Subquery => format!(
            "SELECT
    date,
    instrument
FROM (
    SELECT
        date,
        instrument,
        {predicate} AS _qualified
    FROM {from}
) AS _filtered
WHERE _qualified
ORDER BY date, instrument
",
            from = plan.from_clause("    "),
        ),
    }
}

/// Restrict `base` to the rows also selected by `inner_sql`
///
/// The base source is materialized first (its SQL, if any, is emitted ahead of
/// the query) and `inner_sql` becomes a CTE joined on `(date, instrument)`.
pub fn build_joined_sql(base: &DataSource, inner_sql: &str) -> Result<String, SourceError> {
    let base = materialize(base)?;
    let table_id = generate_table_id();
    log::debug!("joining {table_id} against base table {}", base.table_id);
    Ok(format!(
        "{prelude}WITH {table_id} AS (
{inner}
)
SELECT
    {base_id}.*
FROM {base_id}
JOIN {table_id} USING({JOIN_KEYS})
",
        prelude = base.sql,
        inner = inner_sql.trim_end(),
        base_id = base.table_id,
    ))
}
