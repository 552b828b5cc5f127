use cdsl_model::{DefinitionId, ElementId, ElementType, Model, PathHead, RefPath};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Resolves entirely within the starting definition's own elements.
    Local,
    /// The path's head is a bound parameter (`:p`).
    Param,
    /// `$self`.
    SelfRef,
    /// A magic variable: `$user.id`, `$user.locale`, `$now`, `$at.from`,
    /// `$at.to` (spec §4.3).
    Magic,
    /// Left the starting definition by following an association/composition.
    CrossEntity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Landed on a plain scalar/struct element.
    Element,
    /// Crossed an association/composition to its target.
    AssocFollow,
    /// Followed a `Named(type)` reference to a type definition's elements.
    TypeFollow,
    /// Transparently unwrapped an `items:` array-of wrapper.
    ItemsFollow,
}

#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub name: String,
    pub kind: LinkKind,
    pub element: Option<ElementId>,
    /// The definition whose elements the *next* step is looked up in: the
    /// association/type target after following this link, or the owner
    /// unchanged for a plain element step.
    pub lands_in: DefinitionId,
}

#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub scope: Scope,
    pub links: Vec<ResolvedLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    ElementNotFound { in_definition: String, name: String },
    SteppedIntoScalar { name: String },
    UnmanagedAssociationInKeyPath { name: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::ElementNotFound { in_definition, name } => {
                write!(f, "no element `{name}` in `{in_definition}`")
            }
            ResolveError::SteppedIntoScalar { name } => {
                write!(f, "path continues past scalar element `{name}`")
            }
            ResolveError::UnmanagedAssociationInKeyPath { name } => {
                write!(f, "path traverses unmanaged association `{name}`")
            }
        }
    }
}

/// Resolves `path` starting from `start`'s own elements, following named
/// types, `items:` wrappers, and associations/compositions as the path
/// walks deeper. Does not itself enforce the primary-key-path restriction
/// (no unmanaged associations) — that is `cdsl_preprocess`'s pass 17, which
/// calls [`resolve_path`] and then rejects outcomes containing an unmanaged
/// `AssocFollow` link.
pub fn resolve_path(model: &Model, start: DefinitionId, path: &RefPath) -> Result<ResolveOutcome, ResolveError> {
    let scope = match path.head {
        PathHead::SelfRef => Scope::SelfRef,
        PathHead::Magic(_) => Scope::Magic,
        PathHead::Plain if path.param => Scope::Param,
        PathHead::Plain => Scope::Local,
    };

    let mut current = start;
    let mut links = Vec::with_capacity(path.steps.len());
    let mut crossed = false;

    for step in &path.steps {
        let (eid, element) = find_element(model, current, &step.name).ok_or_else(|| ResolveError::ElementNotFound {
            in_definition: model.get(current).name.clone(),
            name: step.name.clone(),
        })?;

        let (kind, lands_in) = match &element.ty {
            ElementType::Assoc(assoc) => {
                crossed = true;
                let target = assoc.target.ok_or_else(|| ResolveError::ElementNotFound {
                    in_definition: model.get(current).name.clone(),
                    name: step.name.clone(),
                })?;
                (LinkKind::AssocFollow, target)
            }
            ElementType::Named(type_name) => {
                let target = model.by_name(type_name).ok_or_else(|| ResolveError::ElementNotFound {
                    in_definition: model.get(current).name.clone(),
                    name: type_name.clone(),
                })?;
                (LinkKind::TypeFollow, target)
            }
            ElementType::ArrayOf(_) => (LinkKind::ItemsFollow, current),
            ElementType::Struct(_) | ElementType::Scalar { .. } => (LinkKind::Element, current),
        };

        links.push(ResolvedLink { name: step.name.clone(), kind, element: Some(eid), lands_in });
        current = lands_in;
    }

    let scope = if crossed { Scope::CrossEntity } else { scope };
    Ok(ResolveOutcome { scope, links })
}

fn find_element<'a>(model: &'a Model, owner: DefinitionId, name: &str) -> Option<(ElementId, &'a cdsl_model::Element)> {
    model.elements_of(owner).into_iter().find(|(eid, _)| model.element_name(*eid) == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::{EntityBuilder, TypeBuilder};
    use cdsl_model::{PathHead, PathStep, RefPath, ScalarBase};

    fn fixture() -> (Model, DefinitionId, DefinitionId) {
        let mut model = Model::new();
        let author = EntityBuilder::new("S.Author").key("ID", ScalarBase::Integer).build(&mut model);
        let book = EntityBuilder::new("S.Book")
            .key("ID", ScalarBase::Integer)
            .to_one("author", "S.Author")
            .build(&mut model);
        // wire the association target manually, as pass 5 would.
        if let cdsl_model::DefinitionKind::Entity(e) = &mut model.get_mut(book).kind {
            let assoc = e.elements.get_mut("author").unwrap().ty.as_assoc_mut().unwrap();
            assoc.target = Some(author);
        }
        (model, author, book)
    }

    #[test]
    fn resolves_local_scalar() {
        let (model, _, book) = fixture();
        let path = RefPath { head: PathHead::Plain, steps: vec![PathStep::plain("ID")], param: false, global: false };
        let outcome = resolve_path(&model, book, &path).unwrap();
        assert_eq!(outcome.scope, Scope::Local);
        assert_eq!(outcome.links.len(), 1);
        assert_eq!(outcome.links[0].kind, LinkKind::Element);
    }

    #[test]
    fn follows_association_and_classifies_cross_entity() {
        let (model, author, book) = fixture();
        let path = RefPath {
            head: PathHead::Plain,
            steps: vec![PathStep::plain("author"), PathStep::plain("ID")],
            param: false,
            global: false,
        };
        let outcome = resolve_path(&model, book, &path).unwrap();
        assert_eq!(outcome.scope, Scope::CrossEntity);
        assert_eq!(outcome.links[0].kind, LinkKind::AssocFollow);
        assert_eq!(outcome.links[0].lands_in, author);
        assert_eq!(outcome.links[1].kind, LinkKind::Element);
    }

    #[test]
    fn reports_missing_element() {
        let (model, _, book) = fixture();
        let path = RefPath { head: PathHead::Plain, steps: vec![PathStep::plain("nope")], param: false, global: false };
        assert!(resolve_path(&model, book, &path).is_err());
    }

    #[test]
    fn follows_named_type() {
        let mut model = Model::new();
        TypeBuilder::new("S.Address").scalar("city", ScalarBase::String).build(&mut model);
        let entity = EntityBuilder::new("S.Office")
            .element(
                "addr",
                cdsl_model::Element::new(cdsl_model::ElementType::Named("S.Address".into())),
            )
            .build(&mut model);
        let path = RefPath {
            head: PathHead::Plain,
            steps: vec![PathStep::plain("addr"), PathStep::plain("city")],
            param: false,
            global: false,
        };
        let outcome = resolve_path(&model, entity, &path).unwrap();
        assert_eq!(outcome.links[0].kind, LinkKind::TypeFollow);
    }
}
