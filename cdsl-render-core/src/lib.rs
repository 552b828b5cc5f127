//! Component **E**: the expression/query renderer shared by every text
//! backend, and the `Dialect` capability trait each backend implements once
//! (spec §4.3, §9 design note "Expression walker"). `cdsl-ddl`, `cdsl-sql`'s
//! two SQL dialects, and the object-DDL form of the native backend each hand
//! this crate a `Dialect` impl rather than duplicating expression/query
//! rendering; the pattern mirrors the way a single connector trait is
//! implemented once per database flavour elsewhere in the corpus.

mod dialect;
mod expr;
mod fold;
mod query;

pub use dialect::Dialect;
pub use expr::render_expr;
pub use fold::fits_on_line;
pub use query::{render_from, render_query, render_select};
