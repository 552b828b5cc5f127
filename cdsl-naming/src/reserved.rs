//! Reserved-keyword lists consulted by the dialect-violation class of
//! errors (spec §7: "reserved keyword in parameter name").

use once_cell::sync::Lazy;
use std::collections::HashSet;

static SQL_RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "SELECT", "FROM", "WHERE", "TABLE", "INDEX", "VIEW", "GROUP", "ORDER", "BY", "JOIN", "PRIMARY", "KEY",
        "FOREIGN", "REFERENCES", "CONSTRAINT", "UNIQUE", "NOT", "NULL", "DEFAULT", "CREATE", "DROP", "ALTER",
        "UNION", "INTERSECT", "EXCEPT", "AS", "ON", "AND", "OR", "IN", "IS", "LIMIT", "OFFSET", "HAVING", "DISTINCT",
    ]
    .into_iter()
    .collect()
});

pub fn is_reserved(id: &str) -> bool {
    SQL_RESERVED.contains(id.to_uppercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_reserved_words_case_insensitively() {
        assert!(is_reserved("select"));
        assert!(is_reserved("TABLE"));
        assert!(!is_reserved("Books"));
    }
}
