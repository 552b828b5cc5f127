//! The auxiliary, non-serializable tables the preprocessor installs.
//!
//! Spec §9: "Derived dictionaries (`$sources`, `$cachedProxy`) become
//! auxiliary maps owned by the store" rather than fields bolted onto
//! [`crate::Definition`]/[`crate::Element`] — this is that map-of-maps,
//! keyed by the stable [`DefinitionId`]/[`ElementId`] rather than by name,
//! so renaming passes (pass 2, pass 7) never have to rewrite a derived key.

use crate::ids::{DefinitionId, ElementId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefConstraint {
    pub dependent_path: Vec<String>,
    pub principal_path: Vec<String>,
    pub on_update: RefAction,
    pub on_delete: RefAction,
    pub enforced: bool,
    pub validated: bool,
    /// A stable deterministic hash of `(dependent, principal, sorted key
    /// pairs)`, per §4.2.
    pub identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    pub partner: Option<ElementId>,
    pub constraints: Vec<RefConstraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPath {
    /// Dot-joined path of element names from the entity's own elements down
    /// to the scalar leaf (may cross managed associations and structured
    /// types, never unmanaged associations — pass 17's rule).
    pub path: Vec<String>,
    /// Cached Edm primitive type name when the leaf is a builtin scalar.
    pub edm_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavPropBinding {
    pub path: String,
    pub target: String,
}

#[derive(Debug, Default)]
pub struct Derived {
    pub my_schema_name: HashMap<DefinitionId, String>,
    /// `$sources`: target definition -> elements (in other definitions) whose
    /// association points at it, keyed by the *target*'s id (pass 5/7).
    pub sources: HashMap<DefinitionId, Vec<ElementId>>,
    pub container_entity: HashMap<DefinitionId, Vec<DefinitionId>>,
    pub is_to_container: HashSet<ElementId>,
    pub constraints: HashMap<ElementId, ConstraintSet>,
    pub self_references: HashMap<ElementId, Vec<ElementId>>,
    pub origins: HashMap<ElementId, ElementId>,
    pub partner: HashMap<ElementId, ElementId>,
    pub no_partner: HashSet<ElementId>,
    /// `_originalTarget`: the pre-redirection target of an association whose
    /// element was rerouted to a parameter companion (pass 7).
    pub original_target: HashMap<ElementId, DefinitionId>,
    pub keys: HashMap<DefinitionId, Vec<ElementId>>,
    pub edm_key_paths: HashMap<DefinitionId, Vec<KeyPath>>,
    pub edm_tgt_paths: HashMap<DefinitionId, Vec<Vec<String>>>,
    pub edm_npbs: HashMap<DefinitionId, Vec<NavPropBinding>>,
    pub has_entity_set: HashSet<DefinitionId>,
    pub is_proxy: HashSet<DefinitionId>,
    pub is_containee: HashSet<DefinitionId>,
    pub cached_proxy: HashMap<(DefinitionId, DefinitionId), DefinitionId>,
    /// `<E>` -> `<E>Parameters` (pass 7).
    pub parameters_companion: HashMap<DefinitionId, DefinitionId>,
    pub renders_foreign_keys: bool,
    /// Service definitions sorted longest-name-first (pass 1), so
    /// longest-prefix "what service does this name belong to" lookups don't
    /// need to re-sort on every call.
    pub service_order: Vec<DefinitionId>,
    /// Pass 12: a service schema whose contents are represented by a
    /// `{Uri, Namespace}` reference to another, earlier-declared service
    /// that shares its namespace suffix, rather than re-emitted in full.
    pub xservice_ref: HashMap<DefinitionId, DefinitionId>,
    /// Definitions folded into a cross-service reference (pass 12). The
    /// arena never deletes entries, so renderers skip anything in this set
    /// instead of finding it gone.
    pub superseded: HashSet<DefinitionId>,
    /// Pass 18: an `items: <inner>` array-of element, cached so renderers
    /// don't have to re-match `ElementType::ArrayOf` at emit time.
    pub is_collection: HashSet<ElementId>,
    /// Pass 18: the Edm primitive type name for a builtin scalar element
    /// (or a collection's builtin scalar item type).
    pub edm_type: HashMap<ElementId, String>,
}

impl Derived {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_of(&self, id: DefinitionId) -> Option<&str> {
        self.my_schema_name.get(&id).map(String::as_str)
    }
}
