//! Range predicate synthesis

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;
use crate::catalog::{DEFAULT_USER_EXPR, FactorChoice, ValueType};
use crate::parse::{ParsedExpression, parse};

/// Inclusive bounds on a factor value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl RangeBounds {
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn at_least(lower: f64) -> Self {
        Self::new(Some(lower), None)
    }

    pub fn at_most(upper: f64) -> Self {
        Self::new(None, Some(upper))
    }

    pub fn between(lower: f64, upper: f64) -> Self {
        Self::new(Some(lower), Some(upper))
    }

    /// Render the comparison applied to `expr`
    pub fn condition(&self, expr: &str) -> Result<String, ConfigurationError> {
        for bound in [self.lower, self.upper].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(ConfigurationError::NonFiniteBound(bound));
            }
        }
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => Ok(format!("{expr} BETWEEN {lo} AND {hi}")),
            (Some(lo), None) => Ok(format!("{expr} >= {lo}")),
            (None, Some(hi)) => Ok(format!("{expr} <= {hi}")),
            (None, None) => Err(ConfigurationError::NoRange),
        }
    }
}

/// The text a selection is compiled from: the factor's column, or the user's
/// expression in custom mode.
pub fn effective_expr<'a>(factor: FactorChoice, user_expr: Option<&'a str>) -> &'a str {
    match factor.column() {
        Some(column) => column,
        None => user_expr.unwrap_or(DEFAULT_USER_EXPR),
    }
}

/// Build the boolean condition for a selection
///
/// A catalog factor is wrapped in the value-type template and compared against
/// `bounds`. In custom mode the normalized user expression is the whole
/// condition; `value_type` and `bounds` are ignored.
pub fn build_predicate(
    factor: FactorChoice,
    value_type: ValueType,
    bounds: RangeBounds,
    user_expr: Option<&str>,
) -> Result<String, ConfigurationError> {
    let parsed = parse(effective_expr(factor, user_expr));
    predicate_for(factor, value_type, bounds, &parsed)
}

pub(crate) fn predicate_for(
    factor: FactorChoice,
    value_type: ValueType,
    bounds: RangeBounds,
    parsed: &ParsedExpression,
) -> Result<String, ConfigurationError> {
    if factor.is_custom() {
        log::info!("building custom factor expression");
        return Ok(parsed.normalized_expr.clone());
    }
    bounds.condition(&value_type.apply(&parsed.normalized_expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_only() {
        let p = build_predicate(
            FactorChoice::Turnover,
            ValueType::Value,
            RangeBounds::at_least(5.0),
            None,
        )
        .unwrap();
        assert_eq!(p, "cn_stock_bar1d.turn >= 5");
    }

    #[test]
    fn upper_only() {
        let p = build_predicate(
            FactorChoice::FloatMarketCap,
            ValueType::Rank,
            RangeBounds::at_most(0.25),
            None,
        )
        .unwrap();
        assert_eq!(p, "c_rank(cn_stock_valuation.float_market_cap) <= 0.25");
    }

    #[test]
    fn both_bounds_pct_rank() {
        let p = build_predicate(
            FactorChoice::TotalMarketCap,
            ValueType::PctRank,
            RangeBounds::between(1.0, 100.0),
            None,
        )
        .unwrap();
        assert_eq!(
            p,
            "c_pct_rank(cn_stock_valuation.total_market_cap) BETWEEN 1 AND 100"
        );
    }

    #[test]
    fn no_range_is_rejected() {
        let err = build_predicate(
            FactorChoice::Turnover,
            ValueType::Value,
            RangeBounds::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::NoRange));
    }

    #[test]
    fn nan_bound_is_rejected() {
        let err = RangeBounds::at_least(f64::NAN).condition("x").unwrap_err();
        assert!(matches!(err, ConfigurationError::NonFiniteBound(_)));
    }

    #[test]
    fn custom_ignores_bounds_and_value_type() {
        let p = build_predicate(
            FactorChoice::Custom,
            ValueType::PctRank,
            RangeBounds::default(),
            Some("-- pick\nt.a > 1\nAND t.b < 2\n"),
        )
        .unwrap();
        assert_eq!(p, "t.a > 1 AND t.b < 2");
    }

    #[test]
    fn custom_without_text_uses_default_expression() {
        let p = build_predicate(
            FactorChoice::Custom,
            ValueType::Value,
            RangeBounds::default(),
            None,
        )
        .unwrap();
        assert!(p.starts_with("c_rank( c_normalize(cn_stock_bar1d.turn)"));
        assert!(p.ends_with("BETWEEN 1 AND 100"));
    }
}
