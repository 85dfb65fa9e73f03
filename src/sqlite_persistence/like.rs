/// Wraps `term` in `%` for a substring `LIKE` match, escaping `\`, `%` and `_`
/// so they only match themselves. Pair with `ESCAPE '\'` in the SQL.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
