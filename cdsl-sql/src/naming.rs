//! Shared with `cdsl-ddl`'s helper of the same name, kept as its own small
//! copy here since `cdsl-sql` has no dependency on `cdsl-ddl` (the two
//! backends are siblings consuming the same `Model`, not layered on each
//! other).

pub fn local_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, last)) => last.to_string(),
        None => name.to_string(),
    }
}
