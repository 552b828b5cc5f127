//! Option bundle (spec §6): "enumerate every recognized option as an enum
//! field; forbid unknown options at the boundary" (spec §9 design note).

use cdsl_naming::NamingMode;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V2,
    V4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ODataFormat {
    Flat,
    Structured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Hana,
    Sqlite,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlSrc {
    Sql,
    Hdi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlChangeMode {
    Alter,
    Drop,
}

fn default_string_length() -> u32 {
    5000
}

/// Recognized option keys from spec §6, one field per key; unknown keys are
/// rejected by serde at deserialize time (`deny_unknown_fields`) rather than
/// silently accepted, unlike unknown keys in the *model* which only produce
/// an info (spec §6: "The core never treats unknown keys as errors beyond
/// emitting an 'unknown property' info").
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    pub version: ProtocolVersion,
    #[serde(rename = "odataFormat", default = "default_format")]
    pub odata_format: ODataFormat,
    #[serde(rename = "odataContainment", default)]
    pub odata_containment: bool,
    #[serde(rename = "odataForeignKeys", default)]
    pub odata_foreign_keys: bool,
    #[serde(rename = "odataProxies", default)]
    pub odata_proxies: bool,
    #[serde(rename = "odataXServiceRefs", default)]
    pub odata_x_service_refs: bool,
    #[serde(rename = "odataV2PartialConstr", default)]
    pub odata_v2_partial_constr: bool,
    #[serde(rename = "sqlMapping", default = "default_naming_mode")]
    pub sql_mapping: NamingModeOpt,
    #[serde(default = "default_dialect")]
    pub dialect: SqlDialect,
    #[serde(default = "default_src")]
    pub src: SqlSrc,
    #[serde(rename = "sqlChangeMode", default = "default_change_mode")]
    pub sql_change_mode: SqlChangeMode,
    #[serde(rename = "defaultStringLength", default = "default_string_length")]
    pub default_string_length: u32,
    #[serde(rename = "testMode", default)]
    pub test_mode: bool,
    /// Pass 2 beta toggle: synthesize a sub-service per dotted prefix
    /// instead of collapsing dots to underscores.
    #[serde(rename = "betaDottedNameServices", default)]
    pub beta_dotted_name_services: bool,
    /// Legacy toggle: `@cds.valid.key` replaces the primary-key set outright
    /// instead of synthesizing an alternate key.
    #[serde(rename = "legacyValidKey", default)]
    pub legacy_valid_key: bool,
    /// Forces the v2 analytical-annotation remap even when compiling v4
    /// output, e.g. while comparing two successive versions for the differ.
    #[serde(rename = "odataV2Analytics", default)]
    pub odata_v2_analytics: bool,
    /// Deprecated-compatibility toggle: render virtual elements as
    /// `NULL as <alias>` in SQL/DDL views instead of omitting them.
    #[serde(rename = "deprecatedRenderVirtualElements", default)]
    pub deprecated_render_virtual_elements: bool,
}

/// `serde`-friendly mirror of [`NamingMode`] (which lives in `cdsl-naming`
/// and intentionally has no serde dependency of its own, since it is also
/// used by non-options call sites).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingModeOpt {
    Plain,
    Quoted,
    Hdbcds,
}

impl From<NamingModeOpt> for NamingMode {
    fn from(value: NamingModeOpt) -> Self {
        match value {
            NamingModeOpt::Plain => NamingMode::Plain,
            NamingModeOpt::Quoted => NamingMode::Quoted,
            NamingModeOpt::Hdbcds => NamingMode::Hdbcds,
        }
    }
}

fn default_format() -> ODataFormat {
    ODataFormat::Structured
}
fn default_naming_mode() -> NamingModeOpt {
    NamingModeOpt::Plain
}
fn default_dialect() -> SqlDialect {
    SqlDialect::Plain
}
fn default_src() -> SqlSrc {
    SqlSrc::Sql
}
fn default_change_mode() -> SqlChangeMode {
    SqlChangeMode::Alter
}

impl Options {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            odata_format: default_format(),
            odata_containment: false,
            odata_foreign_keys: false,
            odata_proxies: false,
            odata_x_service_refs: false,
            odata_v2_partial_constr: false,
            sql_mapping: default_naming_mode(),
            dialect: default_dialect(),
            src: default_src(),
            sql_change_mode: default_change_mode(),
            default_string_length: default_string_length(),
            test_mode: false,
            beta_dotted_name_services: false,
            legacy_valid_key: false,
            odata_v2_analytics: false,
            deprecated_render_virtual_elements: false,
        }
    }

    /// Pass 0: `renderForeignKeys` is `true` when the protocol format is
    /// flat, otherwise it takes the explicit option's value.
    pub fn render_foreign_keys(&self) -> bool {
        matches!(self.odata_format, ODataFormat::Flat) || self.odata_foreign_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_foreign_keys_is_forced_in_flat_format() {
        let mut opts = Options::new(ProtocolVersion::V4);
        opts.odata_format = ODataFormat::Flat;
        opts.odata_foreign_keys = false;
        assert!(opts.render_foreign_keys());
    }

    #[test]
    fn render_foreign_keys_follows_option_in_structured_format() {
        let mut opts = Options::new(ProtocolVersion::V4);
        opts.odata_format = ODataFormat::Structured;
        opts.odata_foreign_keys = true;
        assert!(opts.render_foreign_keys());
        opts.odata_foreign_keys = false;
        assert!(!opts.render_foreign_keys());
    }

    #[test]
    fn rejects_unknown_option_keys() {
        let json = serde_json::json!({ "version": "v4", "bogusOption": true });
        let result: Result<Options, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }
}
