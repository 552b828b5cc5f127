//! Stable integer ids. The arena-of-definitions design note (spec §9) asks
//! for ids rather than pointers so that cyclic links (`_target`, `_parent`,
//! `_partnerCsn`, `_selfReferences`) can exist without `Rc`/`RefCell`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionId(pub(crate) u32);

impl DefinitionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element within one definition, addressed by its owner plus a local
/// index into the definition's ordered element map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    pub owner: DefinitionId,
    pub index: u32,
}

impl ElementId {
    pub fn new(owner: DefinitionId, index: u32) -> Self {
        Self { owner, index }
    }
}
