//! factorsql - stock-selection factors compiled to warehouse SQL
//!
//! A factor choice (or a free-form boolean expression) plus optional range
//! bounds becomes a query selecting the matching `(date, instrument)` pairs,
//! joined across every table the expression references.
//!
//! ## Quick Start
//!
//! ```ignore
//! use factorsql::{FactorChoice, SelectorConfig, ValueType, run};
//!
//! let config = SelectorConfig::new()
//!     .with_factor(FactorChoice::TotalMarketCap)
//!     .with_value_type(ValueType::PctRank)
//!     .with_range(None, Some(0.1));
//!
//! let artifact = run(&config)?;
//! println!("{}", artifact.sql);
//! ```
//!
//! ## Custom Expressions
//!
//! ```ignore
//! let config = SelectorConfig::new().with_user_expr(
//!     "-- small caps with high turnover
//!      c_pct_rank(cn_stock_valuation.total_market_cap) <= 0.1
//!      AND c_pct_rank(cn_stock_bar1d.turn) >= 0.9",
//! );
//! ```
//!
//! ## Intersecting With an Upstream Query
//!
//! ```ignore
//! let config = config.with_base_query(DataSource::sql("SELECT * FROM universe"));
//! ```
//!
//! Pipeline: parse() -> build_predicate() -> JoinPlan -> build_select_sql()
//! -> build_joined_sql()

mod artifact;
mod catalog;
mod config;
mod parse;
mod predicate;
mod source;
mod sql;

use thiserror::Error;

// ============ Primary Public API ============

pub use artifact::SqlArtifact;
pub use catalog::{DEFAULT_USER_EXPR, FactorChoice, ValueType};
pub use config::{ConfigurationError, SelectorConfig};
pub use predicate::RangeBounds;
pub use source::{DataSource, SourceError};
pub use sql::Dialect;

/// Compile a selection into its output artifact
pub fn run(config: &SelectorConfig) -> Result<SqlArtifact, SelectorError> {
    let sql = compile_sql(config)?;
    Ok(SqlArtifact {
        sql,
        lineage: config.base_query.clone(),
    })
}

/// Compile a selection into SQL
pub fn compile_sql(config: &SelectorConfig) -> Result<String, SelectorError> {
    let text = predicate::effective_expr(config.factor, config.user_factor_expr.as_deref());
    let parsed = parse::parse(text);
    let condition =
        predicate::predicate_for(config.factor, config.value_type, config.bounds(), &parsed)?;

    let plan = sql::JoinPlan::new(parsed.referenced_tables).ok_or_else(|| {
        SelectorError::NoTables {
            expr: parsed.normalized_expr.clone(),
        }
    })?;
    log::debug!("join plan: {}", plan.tables().collect::<Vec<_>>().join(", "));

    let select = sql::build_select_sql(&condition, &plan, config.dialect);
    match &config.base_query {
        Some(base) => Ok(sql::build_joined_sql(base, &select)?),
        None => Ok(select),
    }
}

// ============ Errors ============

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),
    #[error("Data source error: {0}")]
    Source(#[from] SourceError),
    #[error("Expression references no tables: {expr:?}")]
    NoTables { expr: String },
}

// ============ Advanced: Pipeline Stages ============

/// Individual compiler stages (for custom pipelines or introspection)
pub mod advanced {
    pub use crate::parse::{ParsedExpression, normalize, parse};
    pub use crate::predicate::{build_predicate, effective_expr};
    pub use crate::source::{Materialized, generate_table_id, materialize, split_statements};
    pub use crate::sql::{JOIN_KEYS, JoinPlan, build_joined_sql, build_select_sql};
}
