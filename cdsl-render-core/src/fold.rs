/// Whether a rendered fragment is short enough to fold onto its owning line
/// instead of breaking out as a nested block (spec §4.3: "Short expressions
/// (<77 chars, no nested tag) are folded onto the owning line"). Shared by
/// every backend that has to decide between an inline attribute/column and a
/// nested element/clause.
pub fn fits_on_line(rendered: &str) -> bool {
    rendered.len() < 77 && !rendered.contains('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_single_line_fits() {
        assert!(fits_on_line("a = b"));
    }

    #[test]
    fn long_fragment_does_not_fit() {
        let long = "a".repeat(80);
        assert!(!fits_on_line(&long));
    }

    #[test]
    fn multiline_fragment_never_fits() {
        assert!(!fits_on_line("a\nb"));
    }
}
