//! Textual SQL filter fragments built from lists of untrusted strings.
//!
//! Values are escaped by doubling single quotes and inlined into the SQL
//! text. This keeps compatibility with filters persisted or logged in this
//! shape, but it is not a substitute for bound parameters; new call sites
//! should prefer [`crate::clause::Clause`]. Column names are inlined as-is
//! and must come from code, never from user input.

/// Doubles every single quote so the value can sit inside a SQL string literal.
pub fn escape_quotes(source: &str) -> String {
    source.replace('\'', "''")
}

/// Builds `<column> IN ('a','b',...)`.
///
/// An empty list yields `<column> IN ()`, which matches nothing; callers
/// should skip the query instead of embedding it.
pub fn create_in_clause<S: AsRef<str>>(column_name: &str, clause_items: &[S]) -> String {
    let comma_separated_items = clause_items
        .iter()
        .map(|item| format!("'{}'", escape_quotes(item.as_ref())))
        .collect::<Vec<_>>()
        .join(",");

    format!("{column_name} IN ({comma_separated_items})")
}

/// Builds a parenthesised disjunction of case-insensitive substring matches.
///
/// Each non-empty item matches when `LOWER(column)` contains
/// `delimiter + lower(item) + delimiter`. An empty item matches rows where the
/// column is NULL or empty. `column_name2` is ignored when empty; otherwise it
/// is OR-ed into substring matches and AND-ed into null-or-empty matches.
///
/// An empty item list produces an empty disjunction, see
/// [`is_vacuous_or_like_clause`].
pub fn create_or_like_clause<S: AsRef<str>>(
    column_name1: &str,
    column_name2: &str,
    clause_items: &[S],
    delimiter: &str,
) -> String {
    let or_clauses = clause_items
        .iter()
        .map(|item| or_like_disjunct(column_name1, column_name2, item.as_ref(), delimiter))
        .collect::<Vec<_>>();

    let mut clause = String::from("(\n");
    clause.push_str(&or_clauses.join(" OR "));
    clause.push_str("\n)\n");
    clause
}

/// True when `clause` is the empty disjunction produced for an empty item list.
pub fn is_vacuous_or_like_clause(clause: &str) -> bool {
    clause
        .chars()
        .filter(|c| !c.is_whitespace())
        .eq("()".chars())
}

fn or_like_disjunct(column_name1: &str, column_name2: &str, item: &str, delimiter: &str) -> String {
    if item.is_empty() {
        let column2_clause = if column_name2.is_empty() {
            String::new()
        } else {
            format!(" AND ({column_name2} IS NULL OR {column_name2}='')")
        };
        return format!("({column_name1} IS NULL OR {column_name1}=''){column2_clause}");
    }

    let term = escape_quotes(item).to_lowercase();
    let column2_clause = if column_name2.is_empty() {
        String::new()
    } else {
        format!(" OR (LOWER({column_name2}) LIKE '%{delimiter}{term}{delimiter}%')")
    };
    format!("(LOWER({column_name1}) LIKE '%{delimiter}{term}{delimiter}%'){column2_clause}")
}
