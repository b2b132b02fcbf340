//! Upstream data sources and their materialization into named tables

use std::fmt::{self, Display};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use winnow::combinator::{alt, repeat};
use winnow::prelude::*;
use winnow::token::{any, rest, take_till, take_until};

type PResult<T> = winnow::ModalResult<T>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Query contains no statements")]
    EmptyQuery,

    #[error("JSON data source has no string `sql` field")]
    MissingSqlField,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An upstream query result a new selection can be intersected with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSource {
    /// Raw SQL text
    Sql { sql: String },
    /// JSON payload carrying the query in its `sql` field
    Json { payload: serde_json::Value },
    /// Plain text payload holding SQL
    Text { text: String },
    /// A table that already exists in the warehouse
    Table { id: String },
}

impl DataSource {
    pub fn sql(sql: impl Into<String>) -> Self {
        DataSource::Sql { sql: sql.into() }
    }

    pub fn table(id: impl Into<String>) -> Self {
        DataSource::Table { id: id.into() }
    }

    /// Read a data source from disk: `.json` files as JSON payloads,
    /// anything else as SQL text.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(DataSource::Json {
                payload: serde_json::from_str(&contents)?,
            }),
            _ => Ok(DataSource::Text { text: contents }),
        }
    }
}

impl Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Sql { .. } => write!(f, "sql"),
            DataSource::Json { .. } => write!(f, "json"),
            DataSource::Text { .. } => write!(f, "text"),
            DataSource::Table { id } => write!(f, "table {id}"),
        }
    }
}

/// SQL that creates a table, and the name of that table
///
/// `sql` is empty when the source was already a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub sql: String,
    pub table_id: String,
}

/// Fresh, collision-resistant name for a temporary table
pub fn generate_table_id() -> String {
    format!("_t_{}", Uuid::new_v4().simple())
}

/// Turn a data source into a named table
///
/// SQL inputs have their final statement rewritten as
/// `CREATE TABLE <id> AS <statement>`; earlier statements are kept as-is.
pub fn materialize(source: &DataSource) -> Result<Materialized, SourceError> {
    let sql = match source {
        DataSource::Table { id } => {
            return Ok(Materialized {
                sql: String::new(),
                table_id: id.clone(),
            });
        }
        DataSource::Sql { sql } => sql.as_str(),
        DataSource::Text { text } => text.as_str(),
        DataSource::Json { payload } => payload
            .get("sql")
            .and_then(serde_json::Value::as_str)
            .ok_or(SourceError::MissingSqlField)?,
    };
    materialize_sql(sql)
}

fn materialize_sql(sql: &str) -> Result<Materialized, SourceError> {
    let mut statements = split_statements(sql);
    let last = statements.last_mut().ok_or(SourceError::EmptyQuery)?;
    let table_id = generate_table_id();
    *last = format!("CREATE TABLE {table_id} AS {last}");
    log::debug!("materializing {} statement(s) into {table_id}", statements.len());

    let mut sql = statements.join(";\n");
    sql.push_str(";\n");
    Ok(Materialized { sql, table_id })
}

// ============ Statement splitting ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Text(&'a str),
    Comment,
    Terminator,
}

fn quoted<'a>(quote: char) -> impl FnMut(&mut &'a str) -> PResult<&'a str> {
    move |input: &mut &'a str| (quote, take_till(0.., quote), quote).take().parse_next(input)
}

fn line_comment(input: &mut &str) -> PResult<()> {
    ("--", take_till(0.., '\n')).void().parse_next(input)
}

/// An unterminated block comment runs to the end of input
fn block_comment(input: &mut &str) -> PResult<()> {
    (
        "/*",
        alt(((take_until(0.., "*/"), "*/").void(), rest.void())),
    )
        .void()
        .parse_next(input)
}

fn piece<'a>(input: &mut &'a str) -> PResult<Piece<'a>> {
    alt((
        quoted('\'').map(Piece::Text),
        quoted('"').map(Piece::Text),
        line_comment.value(Piece::Comment),
        block_comment.value(Piece::Comment),
        ';'.value(Piece::Terminator),
        take_till(1.., ['\'', '"', ';', '-', '/']).map(Piece::Text),
        // lone `-`, `/` or an unterminated quote
        any.take().map(Piece::Text),
    ))
    .parse_next(input)
}

/// Split a script into trimmed statements
///
/// `;` only terminates a statement outside quotes and comments. Comments are
/// dropped and empty statements are skipped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut stream = sql;
    let pieces: Vec<Piece<'_>> = repeat(0.., piece)
        .parse_next(&mut stream)
        .unwrap_or_default();

    let mut statements = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => current.push_str(text),
            Piece::Comment => current.push(' '),
            Piece::Terminator => flush(&mut current, &mut statements),
        }
    }
    flush(&mut current, &mut statements);
    statements
}

fn flush(current: &mut String, statements: &mut Vec<String>) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}
