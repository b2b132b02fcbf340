//! factorsql CLI
//!
//! A thin wrapper around the factorsql library.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use factorsql::{
    DataSource, Dialect, FactorChoice, SelectorConfig, SqlArtifact, ValueType, run,
};

#[derive(Parser)]
#[command(name = "factorsql")]
#[command(about = "Compile stock-selection factors into warehouse SQL")]
#[command(after_help = "\
EXAMPLES:
    # Top decile by turnover percentile
    factorsql --factor turnover --value-type pct_rank --lower 0.9

    # Custom expression from a file, intersected with an upstream query
    factorsql --expr-file small_caps.sql --base-file universe.json

    # Start from a JSON config, override one field
    factorsql --config selector.json --upper 100

    # Engines without QUALIFY
    factorsql --factor total_market_cap --upper 1e9 --dialect subquery
")]
struct Args {
    /// JSON config file; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Factor key or label (see --list)
    #[arg(short, long)]
    factor: Option<FactorChoice>,

    /// Value type key or label (see --list)
    #[arg(short = 't', long)]
    value_type: Option<ValueType>,

    /// Inclusive lower bound
    #[arg(long, allow_negative_numbers = true)]
    lower: Option<f64>,

    /// Inclusive upper bound
    #[arg(long, allow_negative_numbers = true)]
    upper: Option<f64>,

    /// Custom boolean expression (selects the custom factor unless --factor is given)
    #[arg(short, long, conflicts_with = "expr_file")]
    expr: Option<String>,

    /// File holding a custom boolean expression
    #[arg(long)]
    expr_file: Option<PathBuf>,

    /// Upstream query as SQL text
    #[arg(long, group = "base")]
    base_sql: Option<String>,

    /// Upstream query file (.json with a `sql` field, or SQL text)
    #[arg(long, group = "base")]
    base_file: Option<PathBuf>,

    /// Upstream table that already exists
    #[arg(long, group = "base")]
    base_table: Option<String>,

    /// qualify | subquery
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Write the artifact here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write only the SQL, not the JSON payload
    #[arg(long)]
    raw: bool,

    /// Print the factor and value-type catalogs and exit
    #[arg(long)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list {
        print_catalogs();
        return Ok(());
    }

    let config = build_config(&args)?;
    log::info!(
        "Compiling factor '{}' ({})",
        config.factor,
        config.factor.key()
    );
    let artifact = run(&config)?;
    if let Some(base) = &artifact.lineage {
        log::info!("Joined against base query ({base})");
    }

    let rendered = render(&artifact, args.raw)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<SelectorConfig> {
    let mut config = match &args.config {
        Some(path) => SelectorConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SelectorConfig::default(),
    };

    if let Some(factor) = args.factor {
        config.factor = factor;
    }
    if let Some(value_type) = args.value_type {
        config.value_type = value_type;
    }
    if args.lower.is_some() {
        config.range_lower = args.lower;
    }
    if args.upper.is_some() {
        config.range_upper = args.upper;
    }
    if let Some(dialect) = args.dialect {
        config.dialect = dialect;
    }

    let user_expr = match (&args.expr, &args.expr_file) {
        (Some(expr), _) => Some(expr.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading expression {}", path.display()))?,
        ),
        (None, None) => None,
    };
    if let Some(expr) = user_expr {
        // An explicit --factor wins; the expression only applies in custom mode.
        if args.factor.is_none() {
            config.factor = FactorChoice::Custom;
        }
        config.user_factor_expr = Some(expr);
    }

    if let Some(sql) = &args.base_sql {
        config.base_query = Some(DataSource::sql(sql.clone()));
    } else if let Some(path) = &args.base_file {
        let source = DataSource::from_path(path)
            .with_context(|| format!("reading base query {}", path.display()))?;
        config.base_query = Some(source);
    } else if let Some(id) = &args.base_table {
        config.base_query = Some(DataSource::table(id.clone()));
    }

    Ok(config)
}

fn render(artifact: &SqlArtifact, raw: bool) -> anyhow::Result<String> {
    if raw {
        return Ok(artifact.sql.clone());
    }
    let mut json = serde_json::to_string_pretty(&artifact.payload())?;
    json.push('\n');
    Ok(json)
}

fn print_catalogs() {
    println!("Factors:");
    for factor in FactorChoice::ALL {
        println!(
            "  {:<18} {:<12} {}",
            factor.key(),
            factor.label(),
            factor.column().unwrap_or("(custom expression)")
        );
    }
    println!("Value types:");
    for value_type in ValueType::ALL {
        println!(
            "  {:<18} {:<28} {}",
            value_type.key(),
            value_type.label(),
            value_type.apply("x")
        );
    }
}
