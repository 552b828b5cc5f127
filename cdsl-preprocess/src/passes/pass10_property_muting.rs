//! Pass 10 — property muting (v4).
//!
//! A managed to-one association that only exists to walk back up a
//! containment tree (`_isToContainer`) duplicates information the nav path
//! already carries. So does any element an author tagged
//! `@odata.containment.ignore` directly. Both get hidden from the v4
//! protocol surface with `@cds.api.ignore`, unless `renderForeignKeys` is on,
//! in which case they stay visible but drop out of the entity's primary-key
//! set instead.

use crate::options::{Options, ProtocolVersion};
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{AnnotationValue, ElementId, Model};

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    if !matches!(options.version, ProtocolVersion::V4) {
        return Ok(());
    }

    let mut muted: Vec<ElementId> = Vec::new();
    for id in model.ids() {
        for (eid, el) in model.elements_of(id) {
            let tagged_ignore = el.annotations.get("odata.containment.ignore").and_then(AnnotationValue::as_bool).unwrap_or(false);
            if model.derived.is_to_container.contains(&eid) || tagged_ignore {
                muted.push(eid);
            }
        }
    }

    let render_fks = options.render_foreign_keys();
    for eid in muted {
        if render_fks {
            for keys in model.derived.keys.values_mut() {
                keys.retain(|k| *k != eid);
            }
        } else {
            model.element_mut(eid).annotations.insert("cds.api.ignore".to_string(), AnnotationValue::Bool(true));
        }
    }
    model.derived.keys.retain(|_, v| !v.is_empty());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::ScalarBase;

    #[test]
    fn hides_to_container_backlink_by_default() {
        let mut model = Model::new();
        let header = EntityBuilder::new("S.Header").key("id", ScalarBase::Integer).build(&mut model);
        let item = EntityBuilder::new("S.Item").key("pos", ScalarBase::Integer).to_one("up_", "S.Header").build(&mut model);
        let up_eid = model.elements_of(item)[1].0;
        model.element_mut(up_eid).ty.as_assoc_mut().unwrap().target = Some(header);
        model.derived.is_to_container.insert(up_eid);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert_eq!(model.element(up_eid).annotations.get("cds.api.ignore"), Some(&AnnotationValue::Bool(true)));
    }

    #[test]
    fn keeps_visible_and_drops_from_keys_when_render_foreign_keys_is_on() {
        let mut model = Model::new();
        let header = EntityBuilder::new("S.Header").key("id", ScalarBase::Integer).build(&mut model);
        let item = EntityBuilder::new("S.Item").key("pos", ScalarBase::Integer).to_one("up_", "S.Header").build(&mut model);
        let up_eid = model.elements_of(item)[1].0;
        model.element_mut(up_eid).ty.as_assoc_mut().unwrap().target = Some(header);
        model.derived.is_to_container.insert(up_eid);
        model.derived.keys.insert(item, vec![up_eid]);

        let mut options = Options::new(ProtocolVersion::V4);
        options.odata_foreign_keys = true;
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert_eq!(model.element(up_eid).annotations.get("cds.api.ignore"), None);
        assert!(model.derived.keys.get(&item).is_none());
    }
}
