//! Component **N**: per-target quoting, case, delimiter, and
//! spec-compliance checks (spec §2, §6 "Identifier policy", §9 design note:
//! "encapsulate as a trait/interface with three methods (`quote`, `flatten`,
//! `check`); inject into every renderer"). Grounded in the same shape the
//! corpus uses for a pluggable dialect (see
//! `other_examples/…zqlz-core-src-dialect_config.rs`'s declarative
//! `SyntaxConfig`), but expressed as a trait so the SQL/DDL/protocol
//! renderers can be generic over it rather than matching on an enum.

mod identifier;
mod reserved;

pub use identifier::{check_identifier, IdentifierError};
pub use reserved::is_reserved;

/// `sqlMapping`/`names` option (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingMode {
    Plain,
    Quoted,
    Hdbcds,
}

/// Injected into every renderer (spec §9). One implementation per
/// `NamingMode`.
pub trait NamingPolicy: Send + Sync {
    fn mode(&self) -> NamingMode;

    /// Quotes a single already-flattened identifier for emission.
    fn quote(&self, id: &str) -> String;

    /// Joins a fully-qualified dotted path into the single identifier this
    /// mode uses for persistence (`plain` flattens dots to underscores and
    /// uppercases; `quoted` preserves case; `hdbcds` inserts `::` between
    /// the namespace and the top-level name).
    fn flatten(&self, path: &[&str]) -> String;

    /// Runs the identifier spec check (pass 8) and reports violations.
    fn check(&self, id: &str) -> Result<(), IdentifierError> {
        check_identifier(id)
    }
}

pub struct PlainPolicy;

impl NamingPolicy for PlainPolicy {
    fn mode(&self) -> NamingMode {
        NamingMode::Plain
    }

    fn quote(&self, id: &str) -> String {
        id.to_uppercase()
    }

    fn flatten(&self, path: &[&str]) -> String {
        path.join("_").to_uppercase()
    }
}

pub struct QuotedPolicy {
    pub quote_char: char,
}

impl Default for QuotedPolicy {
    fn default() -> Self {
        Self { quote_char: '"' }
    }
}

impl NamingPolicy for QuotedPolicy {
    fn mode(&self) -> NamingMode {
        NamingMode::Quoted
    }

    fn quote(&self, id: &str) -> String {
        format!("{q}{id}{q}", q = self.quote_char)
    }

    fn flatten(&self, path: &[&str]) -> String {
        path.join("_")
    }
}

pub struct HdbcdsPolicy;

impl NamingPolicy for HdbcdsPolicy {
    fn mode(&self) -> NamingMode {
        NamingMode::Hdbcds
    }

    fn quote(&self, id: &str) -> String {
        format!("\"{id}\"")
    }

    /// Inserts `::` between the namespace (everything but the last segment)
    /// and the top-level name, per spec §6.
    fn flatten(&self, path: &[&str]) -> String {
        match path.len() {
            0 => String::new(),
            1 => path[0].to_string(),
            _ => {
                let (namespace, rest) = path.split_at(path.len() - 1);
                format!("{}::{}", namespace.join("."), rest[0])
            }
        }
    }
}

pub fn policy_for(mode: NamingMode) -> Box<dyn NamingPolicy> {
    match mode {
        NamingMode::Plain => Box::new(PlainPolicy),
        NamingMode::Quoted => Box::new(QuotedPolicy::default()),
        NamingMode::Hdbcds => Box::new(HdbcdsPolicy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_flattens_and_uppercases() {
        let p = PlainPolicy;
        assert_eq!(p.flatten(&["my.Service", "Books", "author_name"]), "MY.SERVICE_BOOKS_AUTHOR_NAME");
    }

    #[test]
    fn quoted_preserves_case() {
        let p = QuotedPolicy::default();
        assert_eq!(p.flatten(&["my.Service", "Books"]), "my.Service_Books");
        assert_eq!(p.quote("Books"), "\"Books\"");
    }

    #[test]
    fn hdbcds_inserts_double_colon_before_last_segment() {
        let p = HdbcdsPolicy;
        assert_eq!(p.flatten(&["my", "service", "Books"]), "my.service::Books");
        assert_eq!(p.flatten(&["Books"]), "Books");
    }

    #[test]
    fn naming_mode_round_trip_disjointness() {
        // Same fully-qualified path, three modes: none should collide with
        // each other by accident (spec §8 "naming-mode round-trip").
        let path = &["my.Service", "Books"];
        let plain = PlainPolicy.flatten(path);
        let quoted = QuotedPolicy::default().flatten(path);
        let hdbcds = HdbcdsPolicy.flatten(path);
        assert_ne!(plain, quoted);
        assert_ne!(quoted, hdbcds);
    }
}
