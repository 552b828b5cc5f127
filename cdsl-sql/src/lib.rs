//! Component **S**: the SQL renderer (spec §4.4), two dialects (HANA,
//! SQLite) plus a generic-ANSI/`plain` form, sharing `cdsl-ddl`'s skeleton:
//! flatten every structured/managed-association element into columns (SQL
//! has no structured-column notion, unlike the native object-DDL form this
//! backend's sibling renders), emit `CREATE TABLE`/`CREATE VIEW`, and
//! finalize referential constraints from the constraint engine (C) as
//! standalone `ALTER TABLE` statements.

mod artifact;
pub mod dialect;
mod flatten;
mod migration;
mod naming;
mod table;
mod view;

pub use artifact::render;
pub use dialect::{dialect_for, HanaDialect, PlainAnsiDialect, SqliteDialect};
pub use flatten::{flatten_entity, FlatColumn};
pub use migration::render_migration;
