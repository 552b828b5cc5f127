//! Pass 12 — cross-service reference conversion.
//!
//! When two services share a namespace suffix (e.g. `app1.Catalog` and
//! `app2.Catalog`), the later-declared one is redundant: its schema can be
//! represented as a `{Uri, Namespace}` reference to the earlier one instead
//! of re-emitted in full. The backing arena never deletes entries, so the
//! "removed" definitions are recorded in `_superseded` for renderers to
//! skip rather than actually dropped from the store.

use crate::options::Options;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::Model;

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    if !options.odata_x_service_refs {
        return Ok(());
    }

    let services = model.derived.service_order.clone();
    if services.len() < 2 {
        return Ok(());
    }

    // Walk in declaration order (service_order is longest-name-first; restore
    // original arena order so "earlier-declared" means the lower id).
    let mut ordered = services.clone();
    ordered.sort_by_key(|id| id.index());

    let mut refs: Vec<(cdsl_model::DefinitionId, cdsl_model::DefinitionId)> = Vec::new();
    for (bi, &b) in ordered.iter().enumerate() {
        for &a in ordered.iter().take(bi) {
            if suffix_matches(&model.get(a).name, &model.get(b).name) {
                refs.push((a, b));
                break;
            }
        }
    }

    for (a, b) in refs {
        model.derived.xservice_ref.insert(b, a);

        let prefix = format!("{}.", model.get(b).name);
        let own_name = model.get(b).name.clone();
        let superseded: Vec<_> =
            model.ids().filter(|id| { let n = &model.get(*id).name; *n == own_name || n.starts_with(&prefix) }).collect();
        model.derived.superseded.extend(superseded);
    }

    Ok(())
}

fn suffix_matches(a: &str, b: &str) -> bool {
    let last = |s: &str| s.rsplit('.').next().unwrap_or(s);
    a != b && last(a) == last(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProtocolVersion;
    use crate::services::discover_services;
    use cdsl_model::builder::{service, EntityBuilder};
    use cdsl_model::ScalarBase;

    #[test]
    fn later_service_becomes_reference_to_earlier_shared_suffix_service() {
        let mut model = Model::new();
        service(&mut model, "app1.Catalog");
        EntityBuilder::new("app1.Catalog.Book").key("ID", ScalarBase::Integer).build(&mut model);
        service(&mut model, "app2.Catalog");
        let dup = EntityBuilder::new("app2.Catalog.Book").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.service_order = discover_services(&model);

        let mut options = Options::new(ProtocolVersion::V4);
        options.odata_x_service_refs = true;
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let app2 = model.by_name("app2.Catalog").unwrap();
        let app1 = model.by_name("app1.Catalog").unwrap();
        assert_eq!(model.derived.xservice_ref.get(&app2), Some(&app1));
        assert!(model.derived.superseded.contains(&dup));
    }

    #[test]
    fn does_nothing_when_option_is_off() {
        let mut model = Model::new();
        service(&mut model, "app1.Catalog");
        service(&mut model, "app2.Catalog");
        model.derived.service_order = discover_services(&model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert!(model.derived.xservice_ref.is_empty());
    }
}
