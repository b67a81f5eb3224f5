use regex::Regex;
use std::sync::LazyLock;

/// Letters, digits, whitespace and `,.*_=<>@'"()-`, with at most one trailing `;`.
static ALLOWED_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[a-zA-Z0-9\s,.*_=<>@'"()-]+;?$"#).expect("allow-list pattern is valid")
});

pub const SANITIZATION_ERROR: &str =
    "Query contains potentially dangerous characters or is not sanitized.";

/// True when the trimmed statement only uses allow-listed characters.
pub fn is_sanitized(statement: &str) -> bool {
    ALLOWED_STATEMENT.is_match(statement.trim())
}
