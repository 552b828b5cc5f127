//! Pass 1 — service discovery.

use crate::options::Options;
use crate::services::discover_services;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::Model;

pub fn run(model: &mut Model, _options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    model.derived.service_order = discover_services(model);
    Ok(())
}
