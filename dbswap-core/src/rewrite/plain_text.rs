//! Placeholder substitution on raw template text.

/// Replaces every literal occurrence of `placeholder` with `database_name`.
///
/// Occurrences are matched left to right without overlap. Returns the new
/// text and the number of replacements; an empty placeholder matches nothing.
///
/// # Example
/// ```rust
/// use dbswap_core::rewrite::replace_placeholder;
///
/// let (text, count) =
///     replace_placeholder("db=template_database_name;x=1", "template_database_name", "prod");
/// assert_eq!(text, "db=prod;x=1");
/// assert_eq!(count, 1);
/// ```
pub fn replace_placeholder(text: &str, placeholder: &str, database_name: &str) -> (String, usize) {
    if placeholder.is_empty() {
        return (text.to_string(), 0);
    }

    let count = text.matches(placeholder).count();
    if count == 0 {
        return (text.to_string(), 0);
    }

    (text.replace(placeholder, database_name), count)
}
