//! Component **P**, the enrichment pipeline of spec §4.1: a fixed sequence
//! of passes over `definitions` that install the derived facts every
//! renderer depends on. The constraint engine (**C**, spec §4.2), proxy /
//! reference exposure (**X**), and key-path / navigation synthesis (**K**)
//! are modeled as later passes of this same pipeline, exactly as spec §4.1
//! lists them (passes 11, 12/13, 15/16/17).

pub mod edm_types;
pub mod options;
pub mod passes;
mod pipeline;
pub mod services;

pub use cdsl_diagnostics::CoreError;
pub use edm_types::{allowed_as_v4_key, edm_type_name};
pub use options::{ODataFormat, Options, ProtocolVersion, SqlChangeMode, SqlDialect, SqlSrc};
pub use pipeline::{preprocess, Pass};
