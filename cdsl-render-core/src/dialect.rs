use cdsl_model::{Cardinality, Literal, ScalarBase, TypeFacets};
use cdsl_naming::NamingPolicy;

/// The capability set a text backend provides to the shared expression/query
/// renderer (spec §4.3): quoting, type mapping, function-name mapping,
/// literal rendering, and magic-variable expansion. One implementation per
/// database flavour/protocol form, the same seam the teacher uses for a
/// connector trait implemented once per database (spec §9).
pub trait Dialect: Send + Sync {
    fn naming(&self) -> &dyn NamingPolicy;

    fn quote(&self, id: &str) -> String {
        self.naming().quote(id)
    }

    /// Maps a scalar base + facets to this dialect's type token, e.g.
    /// `NVARCHAR(42)` or `Edm.String`.
    fn map_type(&self, base: ScalarBase, facets: TypeFacets) -> String;

    /// Remaps a non-builtin type name used inside an explicit `cast`
    /// expression to this dialect's scalar equivalent (spec §4.4: "non-
    /// builtin types inside casts are remapped to their scalar SQL
    /// equivalents").
    fn map_cast_target(&self, named_type: &str) -> String;

    /// Maps a CDS function name to this dialect's name for the same
    /// function; `None` means the function isn't supported and the caller
    /// should report it rather than emit something unrenderable.
    fn map_func(&self, name: &str) -> Option<&str>;

    /// Renders a call to a (already dialect-mapped) function name against
    /// already-rendered argument tokens. A default comma-joined call;
    /// dialects with per-function argument syntax (e.g. `extract(year from
    /// x)`-style functions) override this.
    fn render_call(&self, mapped_name: &str, args: &[String]) -> String {
        format!("{mapped_name}({})", args.join(", "))
    }

    fn render_literal(&self, literal: &Literal) -> String;

    /// Expands a magic-variable path head (`$user.id`, `$user.locale`,
    /// `$now`, `$at.from`, `$at.to`) to this dialect's token for it. `None`
    /// means the dialect has no rendering for that magic variable.
    fn magic_variable(&self, name: &str) -> Option<String>;

    /// Renders a join-cardinality annotation as `[src,dst]` tokens, or
    /// `None` when this dialect doesn't surface cardinality in `FROM`
    /// clauses at all.
    fn render_join_cardinality(&self, cardinality: Option<Cardinality>) -> Option<String> {
        let _ = cardinality;
        None
    }
}
