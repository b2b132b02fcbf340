//! Expression normalization and table-name extraction
//!
//! The expression text is never parsed as SQL. Comment and blank lines are
//! dropped, the rest is folded onto one line, and a word/dot lexer finds every
//! `table` in a `table.column` reference.

use winnow::combinator::{alt, repeat};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

type PResult<T> = winnow::ModalResult<T>;

/// An expression folded to a single line, plus the tables it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    pub normalized_expr: String,
    /// In order of appearance, duplicates kept
    pub referenced_tables: Vec<String>,
}

/// Normalize `raw` and collect the tables it references
pub fn parse(raw: &str) -> ParsedExpression {
    let normalized_expr = normalize(raw);
    let referenced_tables = table_names(&lex(&normalized_expr));
    ParsedExpression {
        normalized_expr,
        referenced_tables,
    }
}

/// Drop blank and comment lines, trim the rest and join them with one space
pub fn normalize(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment(line))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_comment(line: &str) -> bool {
    line.starts_with("--") || line.starts_with('#')
}

// ============ Lexer ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Dot,
    Other,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn token<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    alt((
        take_while(1.., is_word_char).map(Token::Word),
        '.'.value(Token::Dot),
        take_till(1.., |c: char| is_word_char(c) || c == '.').value(Token::Other),
    ))
    .parse_next(input)
}

fn lex(input: &str) -> Vec<Token<'_>> {
    let mut stream = input;
    // Every char is claimed by exactly one arm of `token`, so this never fails.
    repeat(0.., token)
        .parse_next(&mut stream)
        .unwrap_or_default()
}

/// A word is a table when it is not itself a member (`.word`) and is followed
/// by `.word`. In `a.b.c` only `a` qualifies.
fn table_names(tokens: &[Token<'_>]) -> Vec<String> {
    tokens
        .iter()
        .enumerate()
        .filter_map(|(i, tok)| {
            let Token::Word(word) = *tok else {
                return None;
            };
            let is_member = i > 0 && tokens[i - 1] == Token::Dot;
            let has_member = tokens.get(i + 1) == Some(&Token::Dot)
                && matches!(tokens.get(i + 2), Some(Token::Word(_)));
            // `0.5` is a number, not `0` qualifying `5`
            let is_numeric = word.starts_with(|c: char| c.is_ascii_digit());
            (!is_member && has_member && !is_numeric).then(|| word.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_blank_lines() {
        let parsed = parse("-- comment\n a.b > 1 \n\n c.d < 2");
        assert_eq!(parsed.normalized_expr, "a.b > 1 c.d < 2");
        assert_eq!(parsed.referenced_tables, vec!["a", "c"]);
    }

    #[test]
    fn hash_comments() {
        let parsed = parse("# note\nx.y = 1\n   # indented note");
        assert_eq!(parsed.normalized_expr, "x.y = 1");
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let parsed = parse("t2.a + t1.b + t2.c");
        assert_eq!(parsed.referenced_tables, vec!["t2", "t1", "t2"]);
    }

    #[test]
    fn deep_chain_captures_head_only() {
        let parsed = parse("schema.table.column > 0");
        assert_eq!(parsed.referenced_tables, vec!["schema"]);
    }

    #[test]
    fn numbers_are_not_tables() {
        let parsed = parse("c_pct_rank(t.x) BETWEEN 0.1 AND 0.9");
        assert_eq!(parsed.referenced_tables, vec!["t"]);
    }

    #[test]
    fn trailing_dot_is_not_a_reference() {
        assert!(parse("a. + b").referenced_tables.is_empty());
        assert!(parse("a.(b)").referenced_tables.is_empty());
    }

    #[test]
    fn unicode_words() {
        let parsed = parse("因子表.值 > 1");
        assert_eq!(parsed.referenced_tables, vec!["因子表"]);
    }

    #[test]
    fn empty_input() {
        let parsed = parse("\n-- only comments\n\n");
        assert_eq!(parsed.normalized_expr, "");
        assert!(parsed.referenced_tables.is_empty());
    }
}
