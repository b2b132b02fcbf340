//! Selection configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{DEFAULT_USER_EXPR, FactorChoice, ValueType};
use crate::predicate::RangeBounds;
use crate::source::{DataSource, SourceError};
use crate::sql::Dialect;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("no range specified: set range_lower and/or range_upper")]
    NoRange,

    #[error("range bound must be finite, got {0}")]
    NonFiniteBound(f64),

    #[error("Unknown factor: {0}")]
    UnknownFactor(String),

    #[error("Unknown value type: {0}")]
    UnknownValueType(String),

    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),
}

/// Everything a single selection is compiled from
///
/// Every field has a default, so a JSON config only needs the fields it
/// changes:
///
/// ```json
/// { "factor": "total_market_cap", "value_type": "pct_rank", "range_upper": 0.1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Upstream result the selection is intersected with
    pub base_query: Option<DataSource>,
    pub factor: FactorChoice,
    pub value_type: ValueType,
    /// Inclusive lower bound, catalog factors only
    pub range_lower: Option<f64>,
    /// Inclusive upper bound, catalog factors only
    pub range_upper: Option<f64>,
    /// Full boolean expression, used only when `factor` is custom
    pub user_factor_expr: Option<String>,
    pub dialect: Dialect,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            base_query: None,
            factor: FactorChoice::default(),
            value_type: ValueType::default(),
            range_lower: None,
            range_upper: None,
            user_factor_expr: Some(DEFAULT_USER_EXPR.to_string()),
            dialect: Dialect::default(),
        }
    }
}

impl SelectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn with_factor(mut self, factor: FactorChoice) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_range(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.range_lower = lower;
        self.range_upper = upper;
        self
    }

    /// Switch to custom mode with `expr` as the full condition
    pub fn with_user_expr(mut self, expr: impl Into<String>) -> Self {
        self.factor = FactorChoice::Custom;
        self.user_factor_expr = Some(expr.into());
        self
    }

    pub fn with_base_query(mut self, base: DataSource) -> Self {
        self.base_query = Some(base);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn bounds(&self) -> RangeBounds {
        RangeBounds::new(self.range_lower, self.range_upper)
    }
}
