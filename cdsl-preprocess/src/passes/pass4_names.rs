//! Pass 4 — name attachment.
//!
//! Every [`cdsl_model::Definition`] already carries its own `name` field, and
//! every parameter/bound-action name is already the key of its owning
//! `IndexMap`, so attaching a name property is structural in this model
//! rather than a pass-time step. What remains to install is `$mySchemaName`: the
//! owning service for every definition whose fully-qualified name the
//! longest-prefix lookup from pass 1 can place inside a service.

use crate::options::Options;
use crate::services::service_for;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::Model;

pub fn run(model: &mut Model, _options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    let services = model.derived.service_order.clone();
    if services.is_empty() {
        return Ok(());
    }

    let mut assignments = Vec::new();
    for id in model.ids() {
        let name = model.get(id).name.clone();
        if let Some(svc) = service_for(model, &services, &name) {
            assignments.push((id, model.get(svc).name.clone()));
        }
    }

    for (id, schema_name) in assignments {
        model.derived.my_schema_name.insert(id, schema_name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProtocolVersion;
    use crate::services::discover_services;
    use cdsl_model::builder::{service, EntityBuilder};
    use cdsl_model::ScalarBase;

    #[test]
    fn installs_my_schema_name_for_definitions_inside_a_service() {
        let mut model = Model::new();
        service(&mut model, "my.Service");
        let e = EntityBuilder::new("my.Service.Entity").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.service_order = discover_services(&model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert_eq!(model.derived.schema_of(e), Some("my.Service"));
    }
}
