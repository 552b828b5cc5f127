//! Pass 14 — entity-set decision.
//!
//! An entity gets an entity set unless it's a synthetic proxy (pass 13,
//! addressable only through the association that created it), was folded
//! into a cross-service reference (pass 12), or, in v4, is a pure containee
//! with no entity set of its own (it's only ever reached through its
//! container's navigation path).

use crate::options::{Options, ProtocolVersion};
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{DefinitionKind, Model};

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    let ids: Vec<_> = model.ids().collect();
    for id in ids {
        if !matches!(model.get(id).kind, DefinitionKind::Entity(_)) {
            continue;
        }
        if model.derived.is_proxy.contains(&id) || model.derived.superseded.contains(&id) {
            continue;
        }
        if matches!(options.version, ProtocolVersion::V4) && model.derived.is_containee.contains(&id) {
            continue;
        }
        model.derived.has_entity_set.insert(id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::ScalarBase;

    #[test]
    fn plain_entity_gets_an_entity_set() {
        let mut model = Model::new();
        let e = EntityBuilder::new("S.Book").key("ID", ScalarBase::Integer).build(&mut model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert!(model.derived.has_entity_set.contains(&e));
    }

    #[test]
    fn v4_containee_has_no_entity_set() {
        let mut model = Model::new();
        let e = EntityBuilder::new("S.Item").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.is_containee.insert(e);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert!(!model.derived.has_entity_set.contains(&e));
    }

    #[test]
    fn v2_containee_still_has_an_entity_set() {
        let mut model = Model::new();
        let e = EntityBuilder::new("S.Item").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.is_containee.insert(e);

        let options = Options::new(ProtocolVersion::V2);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert!(model.derived.has_entity_set.contains(&e));
    }
}
