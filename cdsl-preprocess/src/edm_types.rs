//! The scalar-to-Edm-primitive mapping shared by pass 17 (key paths) and
//! pass 18 (description/collection caching) so both passes agree on what a
//! "builtin" type's wire name is.

use cdsl_model::ScalarBase;

pub fn allowed_as_v4_key(base: ScalarBase) -> bool {
    !matches!(
        base,
        ScalarBase::Binary
            | ScalarBase::LargeBinary
            | ScalarBase::LargeString
            | ScalarBase::GeometryPoint
            | ScalarBase::GeometryLineString
            | ScalarBase::GeometryPolygon
    )
}

pub fn edm_type_name(base: ScalarBase) -> &'static str {
    match base {
        ScalarBase::String => "Edm.String",
        ScalarBase::Boolean => "Edm.Boolean",
        ScalarBase::Integer => "Edm.Int32",
        ScalarBase::Integer64 => "Edm.Int64",
        ScalarBase::Decimal => "Edm.Decimal",
        ScalarBase::Double => "Edm.Double",
        ScalarBase::Date => "Edm.Date",
        ScalarBase::Time => "Edm.TimeOfDay",
        ScalarBase::DateTime | ScalarBase::Timestamp => "Edm.DateTimeOffset",
        ScalarBase::Binary => "Edm.Binary",
        ScalarBase::LargeString => "Edm.String",
        ScalarBase::LargeBinary => "Edm.Binary",
        ScalarBase::Uuid => "Edm.Guid",
        ScalarBase::GeometryPoint => "Edm.GeometryPoint",
        ScalarBase::GeometryLineString => "Edm.GeometryLineString",
        ScalarBase::GeometryPolygon => "Edm.GeometryPolygon",
    }
}
