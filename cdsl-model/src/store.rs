use crate::definition::Definition;
use crate::derived::Derived;
use crate::element::Element;
use crate::ids::{DefinitionId, ElementId};
use indexmap::IndexMap;

/// Top-level metadata the input model schema carries alongside
/// `definitions` (spec §6): `extensions`, `vocabularies`, `i18n`,
/// `requires`, `meta`, `$version`. None of these are interpreted by the
/// lowering engine; they are opaque cargo the embedder may inspect.
#[derive(Debug, Clone, Default)]
pub struct ModelMeta {
    pub extensions: serde_json::Value,
    pub vocabularies: serde_json::Value,
    pub i18n: serde_json::Value,
    pub requires: serde_json::Value,
    pub meta: serde_json::Value,
    pub version: Option<String>,
}

/// The central store: `definitions` keyed by fully-qualified name (spec
/// §3), backed by an id-indexed arena (spec §9) so that derived links never
/// need `Rc`/`RefCell`.
///
/// Lifecycle (spec §3 "Lifecycle"): created empty and populated by the
/// external parser, mutated once by [`cdsl_preprocess`] for a single chosen
/// target, then read-only during rendering.
#[derive(Debug, Default)]
pub struct Model {
    arena: Vec<Definition>,
    by_name: IndexMap<String, DefinitionId>,
    pub derived: Derived,
    pub meta: ModelMeta,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: Definition) -> DefinitionId {
        let id = DefinitionId(self.arena.len() as u32);
        let mut definition = definition;
        definition.id = id;
        self.by_name.insert(definition.name.clone(), id);
        self.arena.push(definition);
        id
    }

    pub fn get(&self, id: DefinitionId) -> &Definition {
        &self.arena[id.index()]
    }

    pub fn get_mut(&mut self, id: DefinitionId) -> &mut Definition {
        &mut self.arena[id.index()]
    }

    pub fn by_name(&self, name: &str) -> Option<DefinitionId> {
        self.by_name.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DefinitionId> + '_ {
        (0..self.arena.len()).map(|i| DefinitionId(i as u32))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.arena.iter()
    }

    /// Definitions sorted by fully-qualified name, for the deterministic
    /// walk order §5 requires "when the output is being diffed in tests".
    pub fn sorted_ids(&self) -> Vec<DefinitionId> {
        let mut ids: Vec<DefinitionId> = self.ids().collect();
        ids.sort_by(|a, b| self.get(*a).name.cmp(&self.get(*b).name));
        ids
    }

    /// Renames a definition in place, keeping `by_name` consistent. Used by
    /// pass 2 (dotted-name normalization) and pass 7 (the `<E>` ->
    /// `<E>Type` rename of a parameterized entity).
    pub fn rename(&mut self, id: DefinitionId, new_name: String) {
        let old_name = self.get(id).name.clone();
        self.by_name.shift_remove(&old_name);
        self.by_name.insert(new_name.clone(), id);
        self.get_mut(id).name = new_name;
    }

    pub fn element(&self, eid: ElementId) -> &Element {
        let def = self.get(eid.owner);
        let elements = def.kind.elements().expect("element owner must have elements");
        elements
            .get_index(eid.index as usize)
            .map(|(_, e)| e)
            .expect("element index out of range")
    }

    pub fn element_mut(&mut self, eid: ElementId) -> &mut Element {
        let def = self.get_mut(eid.owner);
        let elements = def.kind.elements_mut().expect("element owner must have elements");
        elements
            .get_index_mut(eid.index as usize)
            .map(|(_, e)| e)
            .expect("element index out of range")
    }

    pub fn element_name(&self, eid: ElementId) -> &str {
        let def = self.get(eid.owner);
        let elements = def.kind.elements().expect("element owner must have elements");
        elements.get_index(eid.index as usize).map(|(n, _)| n.as_str()).unwrap()
    }

    /// All `(ElementId, &Element)` pairs of a definition, in declaration order.
    pub fn elements_of(&self, id: DefinitionId) -> Vec<(ElementId, &Element)> {
        match self.get(id).kind.elements() {
            Some(els) => els
                .iter()
                .enumerate()
                .map(|(i, (_, e))| (ElementId::new(id, i as u32), e))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EntityBuilder;
    use crate::element::ScalarBase;

    #[test]
    fn insert_and_rename_keeps_name_index_consistent() {
        let mut model = Model::new();
        let id = EntityBuilder::new("S.E").key("id", ScalarBase::Integer).build(&mut model);
        assert_eq!(model.by_name("S.E"), Some(id));

        model.rename(id, "S.E_renamed".into());
        assert_eq!(model.by_name("S.E"), None);
        assert_eq!(model.by_name("S.E_renamed"), Some(id));
        assert_eq!(model.get(id).name, "S.E_renamed");
    }

    #[test]
    fn sorted_ids_orders_by_name() {
        let mut model = Model::new();
        EntityBuilder::new("S.Zebra").key("id", ScalarBase::Integer).build(&mut model);
        EntityBuilder::new("S.Apple").key("id", ScalarBase::Integer).build(&mut model);
        let names: Vec<_> = model.sorted_ids().into_iter().map(|id| model.get(id).name.clone()).collect();
        assert_eq!(names, vec!["S.Apple".to_string(), "S.Zebra".to_string()]);
    }

    #[test]
    fn elements_of_preserves_declaration_order() {
        let mut model = Model::new();
        let id = EntityBuilder::new("S.E")
            .key("id", ScalarBase::Integer)
            .scalar("name", ScalarBase::String)
            .build(&mut model);
        let names: Vec<_> = model
            .elements_of(id)
            .into_iter()
            .map(|(eid, _)| model.element_name(eid).to_string())
            .collect();
        assert_eq!(names, vec!["id".to_string(), "name".to_string()]);
    }
}
