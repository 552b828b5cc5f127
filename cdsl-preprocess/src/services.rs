//! Longest-prefix "what service does this name belong to" lookup, shared by
//! pass 4 (schema assignment), pass 12 (cross-service references), and
//! pass 13 (proxy exposure).

use cdsl_model::{DefinitionId, DefinitionKind, Model};

/// Pass 1: collect every `service` definition, sorted longest-name-first so
/// that longest-prefix matching finds the most specific enclosing service.
pub fn discover_services(model: &Model) -> Vec<DefinitionId> {
    let mut services: Vec<DefinitionId> =
        model.ids().filter(|id| matches!(model.get(*id).kind, DefinitionKind::Service(_))).collect();
    services.sort_by_key(|id| std::cmp::Reverse(model.get(*id).name.len()));
    services
}

/// Finds the service whose name is the longest prefix of `name`, i.e. the
/// service that "owns" a dotted name such as `my.Service.Entity`.
pub fn service_for<'a>(model: &'a Model, services: &[DefinitionId], name: &str) -> Option<DefinitionId> {
    services.iter().copied().find(|svc| {
        let svc_name = &model.get(*svc).name;
        name == svc_name.as_str() || name.starts_with(&format!("{svc_name}."))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::{service, EntityBuilder};
    use cdsl_model::ScalarBase;

    #[test]
    fn longest_prefix_wins_over_shorter_outer_service() {
        let mut model = Model::new();
        service(&mut model, "my");
        service(&mut model, "my.Sub");
        let e = EntityBuilder::new("my.Sub.Entity").key("ID", ScalarBase::Integer).build(&mut model);
        let services = discover_services(&model);
        let found = service_for(&model, &services, &model.get(e).name).unwrap();
        assert_eq!(model.get(found).name, "my.Sub");
    }
}
