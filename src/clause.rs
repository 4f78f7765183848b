//! Typed filter clauses compiled to parameterized SQL.
//!
//! A [`Clause`] describes the same matches as the textual builders in
//! [`crate::clause_builder`], but [`compile`] emits `?` placeholders and a
//! parameter list instead of inlining values.
//!
//! ```text
//! Clause::or_like(["artists", "album_artists"], ["Metallica"], "¤")
//!   => (LOWER(artists) LIKE ? ESCAPE '\' OR LOWER(album_artists) LIKE ? ESCAPE '\')
//!      params: ["%¤metallica¤%", "%¤metallica¤%"]
//! ```

use crate::clause_builder::escape_quotes;

const ALWAYS_FALSE: &str = "0 = 1";
const ALWAYS_TRUE: &str = "1 = 1";
const LIKE_ESCAPE_CHAR: char = '\\';

/// Boolean filter expression over named columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `column = value`
    Equals { column: String, value: String },
    /// `column IN (values...)`; matches nothing when `values` is empty.
    In { column: String, values: Vec<String> },
    /// Any column contains any term (case-insensitive), with `delimiter`
    /// wrapped around the term on both sides.
    LikeAny {
        columns: Vec<String>,
        terms: Vec<String>,
        delimiter: String,
    },
    /// Every column is NULL or the empty string.
    NullOrEmpty { columns: Vec<String> },
    And(Vec<Clause>),
    Or(Vec<Clause>),
}

impl Clause {
    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn in_list<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Disjunction with one term per item across `columns`.
    ///
    /// Empty items become a [`Clause::NullOrEmpty`] test over all columns,
    /// the rest are grouped into one [`Clause::LikeAny`].
    pub fn or_like<C, I, S>(columns: C, items: I, delimiter: impl Into<String>) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut terms = Vec::new();
        let mut match_empty = false;
        for item in items {
            let item = item.into();
            if item.is_empty() {
                match_empty = true;
            } else {
                terms.push(item);
            }
        }

        let mut disjuncts = Vec::new();
        if match_empty {
            disjuncts.push(Self::NullOrEmpty {
                columns: columns.clone(),
            });
        }
        if !terms.is_empty() {
            disjuncts.push(Self::LikeAny {
                columns,
                terms,
                delimiter: delimiter.into(),
            });
        }

        match disjuncts.len() {
            1 => disjuncts.remove(0),
            _ => Self::Or(disjuncts),
        }
    }

    pub fn and(self, other: Clause) -> Self {
        match self {
            Self::And(mut clauses) => {
                clauses.push(other);
                Self::And(clauses)
            }
            clause => Self::And(vec![clause, other]),
        }
    }

    pub fn or(self, other: Clause) -> Self {
        match self {
            Self::Or(mut clauses) => {
                clauses.push(other);
                Self::Or(clauses)
            }
            clause => Self::Or(vec![clause, other]),
        }
    }
}

/// Error raised when a clause cannot be rendered safely.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClauseError {
    /// Column name is not a plain (optionally dotted) SQL identifier.
    #[error("invalid column name: {0:?}")]
    InvalidColumn(String),
    /// A `LikeAny` or `NullOrEmpty` clause names no columns.
    #[error("clause references no columns")]
    NoColumns,
}

/// SQL boolean expression with `?` placeholders and its bound values in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledClause {
    pub sql: String,
    pub params: Vec<String>,
}

impl CompiledClause {
    /// Substitutes escaped literals for the placeholders.
    ///
    /// For logs only; never execute the result.
    pub fn inline(&self) -> String {
        let mut rendered = String::with_capacity(self.sql.len());
        let mut params = self.params.iter();
        let mut in_literal = false;
        for c in self.sql.chars() {
            match c {
                '\'' => {
                    in_literal = !in_literal;
                    rendered.push(c);
                }
                '?' if !in_literal => match params.next() {
                    Some(param) => {
                        rendered.push('\'');
                        rendered.push_str(&escape_quotes(param));
                        rendered.push('\'');
                    }
                    None => rendered.push(c),
                },
                _ => rendered.push(c),
            }
        }
        rendered
    }
}

/// Compiles `clause` into parameterized SQL.
///
/// Empty `In`, `LikeAny` and `Or` clauses compile to an always-false test and
/// an empty `And` to an always-true one, so the output is always valid SQL.
pub fn compile(clause: &Clause) -> Result<CompiledClause, ClauseError> {
    let mut params = Vec::new();
    let sql = compile_node(clause, &mut params)?;
    Ok(CompiledClause { sql, params })
}

fn compile_node(clause: &Clause, params: &mut Vec<String>) -> Result<String, ClauseError> {
    match clause {
        Clause::Equals { column, value } => {
            let column = checked_column(column)?;
            params.push(value.clone());
            Ok(format!("{column} = ?"))
        }
        Clause::In { column, values } => {
            let column = checked_column(column)?;
            if values.is_empty() {
                return Ok(ALWAYS_FALSE.to_string());
            }
            params.extend(values.iter().cloned());
            let placeholders = vec!["?"; values.len()].join(", ");
            Ok(format!("{column} IN ({placeholders})"))
        }
        Clause::LikeAny {
            columns,
            terms,
            delimiter,
        } => {
            let columns = checked_columns(columns)?;
            if terms.is_empty() {
                return Ok(ALWAYS_FALSE.to_string());
            }
            let mut disjuncts = Vec::with_capacity(terms.len() * columns.len());
            for term in terms {
                let pattern = format!(
                    "%{delimiter}{}{delimiter}%",
                    escape_like(&term.to_lowercase()),
                    delimiter = escape_like(delimiter),
                );
                for column in &columns {
                    params.push(pattern.clone());
                    disjuncts.push(format!("LOWER({column}) LIKE ? ESCAPE '{LIKE_ESCAPE_CHAR}'"));
                }
            }
            Ok(group(disjuncts, " OR "))
        }
        Clause::NullOrEmpty { columns } => {
            let tests = checked_columns(columns)?
                .into_iter()
                .map(|column| format!("({column} IS NULL OR {column} = '')"))
                .collect::<Vec<_>>();
            Ok(group(tests, " AND "))
        }
        Clause::And(clauses) => {
            if clauses.is_empty() {
                return Ok(ALWAYS_TRUE.to_string());
            }
            let parts = clauses
                .iter()
                .map(|clause| compile_node(clause, params))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(group(parts, " AND "))
        }
        Clause::Or(clauses) => {
            if clauses.is_empty() {
                return Ok(ALWAYS_FALSE.to_string());
            }
            let parts = clauses
                .iter()
                .map(|clause| compile_node(clause, params))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(group(parts, " OR "))
        }
    }
}

fn group(mut parts: Vec<String>, separator: &str) -> String {
    if parts.len() == 1 {
        return parts.remove(0);
    }
    format!("({})", parts.join(separator))
}

fn checked_columns(columns: &[String]) -> Result<Vec<&str>, ClauseError> {
    if columns.is_empty() {
        return Err(ClauseError::NoColumns);
    }
    columns.iter().map(|column| checked_column(column)).collect()
}

fn checked_column(column: &str) -> Result<&str, ClauseError> {
    let valid = !column.is_empty()
        && column.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(column)
    } else {
        Err(ClauseError::InvalidColumn(column.to_string()))
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE_CHAR {
            escaped.push(LIKE_ESCAPE_CHAR);
        }
        escaped.push(c);
    }
    escaped
}
