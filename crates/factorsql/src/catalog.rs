//! Fixed lookup tables for factor and value-type choices
//!
//! Each choice has a stable snake_case key (used in config files and on the
//! command line) and a display label. Both are accepted when parsing.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// Example expression used when custom mode is selected without user text.
pub const DEFAULT_USER_EXPR: &str = "-- DAI SQL operators/functions: https://bigquant.com/wiki/doc/dai-PLSbc1SbZX
-- Data & fields: https://bigquant.com/data/home
-- Enter a selection expression here, combine conditions with AND / OR.
-- Table names are parsed from the expression to build the query.
-- c_rank / c_pct_rank are rank and percentile rank, see the operator docs.

c_rank(
    c_normalize(cn_stock_bar1d.turn) + c_normalize(cn_stock_valuation.total_market_cap)
) BETWEEN 1 AND 100
";

// ============ Factors ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorChoice {
    /// User supplies a complete boolean expression
    #[serde(alias = "自定义")]
    Custom,
    #[default]
    #[serde(alias = "量价-换手率")]
    Turnover,
    #[serde(alias = "估值-总市值")]
    TotalMarketCap,
    #[serde(alias = "估值-流通市值")]
    FloatMarketCap,
}

impl FactorChoice {
    pub const ALL: [FactorChoice; 4] = [
        FactorChoice::Custom,
        FactorChoice::Turnover,
        FactorChoice::TotalMarketCap,
        FactorChoice::FloatMarketCap,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FactorChoice::Custom => "custom",
            FactorChoice::Turnover => "turnover",
            FactorChoice::TotalMarketCap => "total_market_cap",
            FactorChoice::FloatMarketCap => "float_market_cap",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FactorChoice::Custom => "自定义",
            FactorChoice::Turnover => "量价-换手率",
            FactorChoice::TotalMarketCap => "估值-总市值",
            FactorChoice::FloatMarketCap => "估值-流通市值",
        }
    }

    /// Canonical `table.column` reference, `None` in custom mode
    pub fn column(self) -> Option<&'static str> {
        match self {
            FactorChoice::Custom => None,
            FactorChoice::Turnover => Some("cn_stock_bar1d.turn"),
            FactorChoice::TotalMarketCap => Some("cn_stock_valuation.total_market_cap"),
            FactorChoice::FloatMarketCap => Some("cn_stock_valuation.float_market_cap"),
        }
    }

    pub fn is_custom(self) -> bool {
        self.column().is_none()
    }
}

impl Display for FactorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for FactorChoice {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        FactorChoice::ALL
            .into_iter()
            .find(|c| c.key() == s || c.label() == s)
            .ok_or_else(|| ConfigurationError::UnknownFactor(s.to_string()))
    }
}

// ============ Value types ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// The raw value
    #[default]
    #[serde(alias = "值")]
    Value,
    /// Ascending rank: 1, 2, ..
    #[serde(alias = "排序值(从小到大, 1, 2, ..)")]
    Rank,
    /// Ascending percentile rank in [0, 1]
    #[serde(alias = "排序百分位值(从小到大, 0~1)")]
    PctRank,
}

impl ValueType {
    pub const ALL: [ValueType; 3] = [ValueType::Value, ValueType::Rank, ValueType::PctRank];

    pub fn key(self) -> &'static str {
        match self {
            ValueType::Value => "value",
            ValueType::Rank => "rank",
            ValueType::PctRank => "pct_rank",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ValueType::Value => "值",
            ValueType::Rank => "排序值(从小到大, 1, 2, ..)",
            ValueType::PctRank => "排序百分位值(从小到大, 0~1)",
        }
    }

    /// Wrap a value expression: `x`, `c_rank(x)` or `c_pct_rank(x)`
    pub fn apply(self, value: &str) -> String {
        match self {
            ValueType::Value => value.to_string(),
            ValueType::Rank => format!("c_rank({value})"),
            ValueType::PctRank => format!("c_pct_rank({value})"),
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ValueType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ValueType::ALL
            .into_iter()
            .find(|v| v.key() == s || v.label() == s)
            .ok_or_else(|| ConfigurationError::UnknownValueType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_from_key_or_label() {
        assert_eq!("turnover".parse::<FactorChoice>().unwrap(), FactorChoice::Turnover);
        assert_eq!("自定义".parse::<FactorChoice>().unwrap(), FactorChoice::Custom);
        assert!(matches!(
            "volume".parse::<FactorChoice>(),
            Err(ConfigurationError::UnknownFactor(ref s)) if s == "volume"
        ));
    }

    #[test]
    fn only_custom_has_no_column() {
        for factor in FactorChoice::ALL {
            assert_eq!(factor.is_custom(), factor == FactorChoice::Custom);
        }
        assert_eq!(
            FactorChoice::TotalMarketCap.column(),
            Some("cn_stock_valuation.total_market_cap")
        );
    }

    #[test]
    fn default_factor_is_second_entry() {
        assert_eq!(FactorChoice::default(), FactorChoice::ALL[1]);
        assert_eq!(ValueType::default(), ValueType::ALL[0]);
    }

    #[test]
    fn value_type_templates() {
        assert_eq!(ValueType::Value.apply("t.c"), "t.c");
        assert_eq!(ValueType::Rank.apply("t.c"), "c_rank(t.c)");
        assert_eq!(ValueType::PctRank.apply("t.c"), "c_pct_rank(t.c)");
    }

    #[test]
    fn serde_accepts_labels() {
        let v: ValueType = serde_json::from_str("\"排序百分位值(从小到大, 0~1)\"").unwrap();
        assert_eq!(v, ValueType::PctRank);
        let f: FactorChoice = serde_json::from_str("\"float_market_cap\"").unwrap();
        assert_eq!(f, FactorChoice::FloatMarketCap);
    }
}
