pub mod pass0_options;
pub mod pass1_services;
pub mod pass2_dotted_names;
pub mod pass3_base_types;
pub mod pass4_names;
pub mod pass5_assoc_linking;
pub mod pass6_containment;
pub mod pass7_param_split;
pub mod pass8_structure_init;
pub mod pass9_on_condition;
pub mod pass10_property_muting;
pub mod pass11_constraints;
pub mod pass12_xservice_refs;
pub mod pass13_proxy;
pub mod pass14_entity_set;
pub mod pass15_nav_paths;
pub mod pass16_nav_bindings;
pub mod pass17_keypaths;
pub mod pass18_descriptions;
