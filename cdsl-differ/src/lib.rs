//! Component **Δ**, the differential comparator (spec §2, §4.6): given two
//! successive fully-preprocessed model snapshots, produces a structured
//! add/drop/modify plan. Consumed by `cdsl_sql::render_migration`, which
//! turns the plan into dialect-specific `ALTER TABLE` statements.

mod diff;
mod plan;

pub use diff::compare;
pub use plan::{DiffPlan, ElementChange, EntityDiff};
