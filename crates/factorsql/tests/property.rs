use factorsql::advanced::{JoinPlan, materialize, parse, split_statements};
use factorsql::{DataSource, FactorChoice, SelectorConfig, ValueType, compile_sql};
use proptest::prelude::*;

fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}"
}

fn arb_ref() -> impl Strategy<Value = (String, String)> {
    (arb_ident(), arb_ident())
}

fn arb_value_type() -> impl Strategy<Value = ValueType> {
    prop_oneof![
        Just(ValueType::Value),
        Just(ValueType::Rank),
        Just(ValueType::PctRank),
    ]
}

proptest! {
    #[test]
    fn tables_are_the_qualifiers(refs in prop::collection::vec(arb_ref(), 1..6)) {
        let expr = refs
            .iter()
            .map(|(t, c)| format!("{t}.{c} > 0.5"))
            .collect::<Vec<_>>()
            .join("\n-- and\nAND ");
        let parsed = parse(&expr);
        let expected: Vec<String> = refs.iter().map(|(t, _)| t.clone()).collect();
        prop_assert_eq!(parsed.referenced_tables, expected);
        prop_assert!(!parsed.normalized_expr.contains('\n'));
        prop_assert!(!parsed.normalized_expr.contains("--"));
    }

    #[test]
    fn join_plan_is_sorted_and_unique(tables in prop::collection::vec(arb_ident(), 1..8)) {
        let plan = JoinPlan::new(tables.clone()).unwrap();
        let listed: Vec<&str> = plan.tables().collect();
        let mut expected = tables.clone();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(listed, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn bounded_factor_always_compiles(
        value_type in arb_value_type(),
        lower in prop::option::of(-1e6f64..1e6),
        upper in prop::option::of(-1e6f64..1e6),
    ) {
        prop_assume!(lower.is_some() || upper.is_some());
        let config = SelectorConfig::new()
            .with_factor(FactorChoice::TotalMarketCap)
            .with_value_type(value_type)
            .with_range(lower, upper);
        let sql = compile_sql(&config).unwrap();
        let expected_from = "FROM cn_stock_valuation\n";
        prop_assert!(sql.contains(expected_from));
        prop_assert!(sql.ends_with("ORDER BY date, instrument\n"));
    }

    #[test]
    fn only_last_statement_is_rewritten(stmts in prop::collection::vec("SELECT [a-z]{1,5}", 1..5)) {
        let script = stmts.join("; ");
        let m = materialize(&DataSource::sql(script)).unwrap();
        let parts = split_statements(&m.sql);
        prop_assert_eq!(parts.len(), stmts.len());
        for (part, stmt) in parts.iter().zip(&stmts).take(stmts.len() - 1) {
            prop_assert_eq!(part, stmt);
        }
        let expected_last = format!("CREATE TABLE {} AS {}", m.table_id, stmts[stmts.len() - 1]);
        prop_assert_eq!(parts.last().unwrap(), &expected_last);
    }
}
