use crate::options::Options;
use crate::passes;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::Model;

pub type PassFn = fn(&mut Model, &Options, &mut Sink) -> Result<(), CoreError>;

/// One entry of the fixed pass order (spec §4.1). `requires`/`installs` are
/// the debug-only ordering check from spec §9's "Ordering guarantees
/// between passes are the source of correctness": a pass that reads a field
/// before anything installs it is a bug we want a test to catch, not a
/// silent wrong answer.
pub struct Pass {
    pub name: &'static str,
    pub run: PassFn,
    pub requires: &'static [&'static str],
    pub installs: &'static [&'static str],
}

macro_rules! pass {
    ($name:literal, $run:path, requires: [$($req:literal),* $(,)?], installs: [$($ins:literal),* $(,)?]) => {
        Pass { name: $name, run: $run, requires: &[$($req),*], installs: &[$($ins),*] }
    };
}

fn table() -> Vec<Pass> {
    vec![
        pass!("0-option-validation", passes::pass0_options::run, requires: [], installs: ["renderForeignKeys"]),
        pass!("1-service-discovery", passes::pass1_services::run, requires: [], installs: ["$serviceOrder"]),
        pass!("2-dotted-name-normalization", passes::pass2_dotted_names::run, requires: ["$serviceOrder"], installs: []),
        pass!("3-base-type-expansion", passes::pass3_base_types::run, requires: [], installs: []),
        pass!("4-name-attachment", passes::pass4_names::run, requires: ["$serviceOrder"], installs: ["$mySchemaName"]),
        pass!("5-association-linking", passes::pass5_assoc_linking::run, requires: [], installs: ["_target", "$sources"]),
        pass!("6-containment", passes::pass6_containment::run, requires: ["_target"], installs: ["_containerEntity", "_isToContainer"]),
        pass!("7-parameterized-entity-split", passes::pass7_param_split::run, requires: ["$sources"], installs: ["$parametersCompanion", "_originalTarget"]),
        pass!("8-structure-initialization", passes::pass8_structure_init::run, requires: [], installs: ["$keys"]),
        pass!("9-on-condition-parsing", passes::pass9_on_condition::run, requires: ["_target"], installs: ["_selfReferences", "_origins", "$noPartner"]),
        pass!("10-property-muting", passes::pass10_property_muting::run, requires: ["renderForeignKeys", "_containerEntity"], installs: []),
        pass!("11-constraint-finalization", passes::pass11_constraints::run, requires: ["_target", "$keys"], installs: ["_constraints"]),
        pass!("12-cross-service-references", passes::pass12_xservice_refs::run, requires: ["$mySchemaName"], installs: []),
        pass!("13-proxy-exposure", passes::pass13_proxy::run, requires: ["$mySchemaName", "_target"], installs: ["$cachedProxy"]),
        pass!("14-entity-set-decision", passes::pass14_entity_set::run, requires: ["$cachedProxy"], installs: ["$hasEntitySet"]),
        pass!("15-navigation-target-paths", passes::pass15_nav_paths::run, requires: ["$hasEntitySet"], installs: ["$edmTgtPaths"]),
        pass!("16-navigation-property-bindings", passes::pass16_nav_bindings::run, requires: ["$hasEntitySet", "$edmTgtPaths"], installs: ["$edmNPBs"]),
        pass!("17-key-path-expansion", passes::pass17_keypaths::run, requires: ["$hasEntitySet", "$keys"], installs: ["$edmKeyPaths"]),
        pass!("18-descriptions-and-collections", passes::pass18_descriptions::run, requires: [], installs: []),
    ]
}

/// Runs the full preprocessor pipeline over `model` for `options`,
/// mutating it in place. Stops early only on [`CoreError`] (the "Internal"
/// diagnostic class, spec §7: "Always fatal; terminate compile"); every
/// other diagnostic is pushed to `sink` and the remaining passes still run,
/// per spec §5 "any error during a pass... does not halt the pass —
/// subsequent passes still run to surface as many diagnostics as possible".
pub fn preprocess(model: &mut Model, options: &Options) -> Result<Sink, CoreError> {
    let passes = table();
    let mut installed: std::collections::HashSet<&'static str> = std::collections::HashSet::new();
    let mut sink = Sink::new();

    for pass in &passes {
        #[cfg(debug_assertions)]
        for req in pass.requires {
            debug_assert!(
                installed.contains(req),
                "pass `{}` requires `{}` but no earlier pass installs it",
                pass.name,
                req
            );
        }

        let span = tracing::info_span!("pass", name = pass.name);
        let _enter = span.enter();
        (pass.run)(model, options, &mut sink)?;

        installed.extend(pass.installs.iter().copied());
    }

    Ok(sink)
}
