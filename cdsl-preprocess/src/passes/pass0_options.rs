//! Pass 0 — option validation. Most shape validation already happened at
//! `Options` deserialization time (`deny_unknown_fields`); this pass
//! computes the one derived flag spec §4.1 calls out explicitly:
//! `renderForeignKeys`.

use crate::options::Options;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::Model;

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    model.derived.renders_foreign_keys = options.render_foreign_keys();
    Ok(())
}
