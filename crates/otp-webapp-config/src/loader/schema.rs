//! Schema validation for raw (parsed but untyped) web client config.
//!
//! Checks structure only: known keys, JSON types, enum values and numeric
//! ranges. Cross-field rules run on the typed config after decoding.

use crate::model::is_zoom_level_count;
use crate::{SchemaError, SchemaErrorKind};
use serde_json::{Map, Value};

use crate::SchemaErrorKind::{
    InvalidEnumValue, InvalidRange, InvalidType, MissingRequiredField, UnknownKey,
};

/// Validate a single config source against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), SchemaError> {
    let map = expect_object(value, layer, "")?;
    let allowed = [
        "$schema",
        "systemMap",
        "map",
        "logo",
        "useCustomIconsForAgencies",
        "plannerContextMenu",
        "metricsSystem",
        "mapContextMenu",
    ];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("systemMap") {
        validate_system_map(value, layer, "systemMap")?;
    }
    if let Some(value) = map.get("map") {
        validate_map(value, layer, "map")?;
    }
    if let Some(value) = map.get("logo") {
        if !value.is_null() {
            expect_string(value, layer, "logo")?;
        }
    }
    if let Some(value) = map.get("useCustomIconsForAgencies") {
        validate_string_array(value, layer, "useCustomIconsForAgencies")?;
    }
    if let Some(value) = map.get("plannerContextMenu") {
        expect_bool(value, layer, "plannerContextMenu")?;
    }
    if let Some(value) = map.get("metricsSystem") {
        expect_one_of(value, &["english", "international"], layer, "metricsSystem")?;
    }
    if let Some(value) = map.get("mapContextMenu") {
        expect_bool(value, layer, "mapContextMenu")?;
    }

    Ok(())
}

/// Validate the "systemMap" block.
fn validate_system_map(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    let map = expect_object(value, layer, path)?;
    let strings = [
        "layerUrlRoutes",
        "layerUrlStops",
        "layerNamesRoute",
        "layerNamesStop",
        "controlStopsUrl",
    ];
    let mut allowed = vec!["enabled"];
    allowed.extend(strings);
    ensure_allowed_keys(map, &allowed, layer, path)?;

    if let Some(value) = map.get("enabled") {
        expect_bool(value, layer, &join_path(path, "enabled"))?;
    }
    for key in strings {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "map" block.
fn validate_map(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["defaultExtent", "options", "baseLayerOptions"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("defaultExtent") {
        validate_default_extent(value, layer, &join_path(path, "defaultExtent"))?;
    }
    if let Some(value) = map.get("options") {
        validate_map_options(value, layer, &join_path(path, "options"))?;
    }
    if let Some(value) = map.get("baseLayerOptions") {
        validate_base_layer_options(value, layer, &join_path(path, "baseLayerOptions"))?;
    }
    Ok(())
}

/// Validate the default extent: the "automatic" keyword or a bounds object.
fn validate_default_extent(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    match value {
        Value::String(_) => expect_one_of(value, &["automatic"], layer, path),
        Value::Object(map) => {
            let corners = ["minX", "minY", "maxX", "maxY"];
            ensure_allowed_keys(map, &corners, layer, path)?;
            for key in corners {
                let corner_path = join_path(path, key);
                let corner = map.get(key).ok_or_else(|| {
                    invalid_field(
                        MissingRequiredField,
                        layer,
                        &corner_path,
                        "missing required field",
                    )
                })?;
                expect_f64(corner, layer, &corner_path)?;
            }
            Ok(())
        }
        _ => Err(invalid_field(
            InvalidType,
            layer,
            path,
            "expected \"automatic\" or bounds object",
        )),
    }
}

/// Validate the map constructor options.
fn validate_map_options(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["projection", "numZoomLevels"], layer, path)?;

    if let Some(value) = map.get("projection") {
        expect_string(value, layer, &join_path(path, "projection"))?;
    }
    if let Some(value) = map.get("numZoomLevels") {
        validate_zoom_levels(value, layer, &join_path(path, "numZoomLevels"))?;
    }
    Ok(())
}

/// Zoom level counts must be whole, positive and fit in a u32.
///
/// `17.0` is the same count as `17`; any other number that is not a
/// positive integer is out of range rather than mistyped.
fn validate_zoom_levels(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    let Some(levels) = value.as_f64() else {
        return Err(invalid_field(InvalidType, layer, path, "expected number"));
    };
    if is_zoom_level_count(levels) {
        Ok(())
    } else {
        Err(invalid_field(
            InvalidRange,
            layer,
            path,
            "expected a positive integer",
        ))
    }
}

/// Validate the base tile layer options.
fn validate_base_layer_options(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["url", "layers", "format", "transitionEffect"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("url") {
        expect_string(value, layer, &join_path(path, "url"))?;
    }
    if let Some(value) = map.get("layers") {
        validate_string_array(value, layer, &join_path(path, "layers"))?;
    }
    if let Some(value) = map.get("format") {
        expect_string(value, layer, &join_path(path, "format"))?;
    }
    if let Some(value) = map.get("transitionEffect") {
        expect_one_of(
            value,
            &["resize", "none"],
            layer,
            &join_path(path, "transitionEffect"),
        )?;
    }
    Ok(())
}

/// Expect a string from a closed set of values.
fn expect_one_of(
    value: &Value,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), SchemaError> {
    let Some(found) = value.as_str() else {
        return Err(invalid_field(InvalidType, layer, path, "expected string"));
    };
    if allowed.contains(&found) {
        Ok(())
    } else {
        let message = format!("expected one of {}, found `{found}`", allowed.join(", "));
        Err(invalid_field(InvalidEnumValue, layer, path, &message))
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, SchemaError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(InvalidType, layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(InvalidType, layer, path, "expected string"))
    }
}

/// Expect a JSON boolean or return a typed error.
fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    if matches!(value, Value::Bool(_)) {
        Ok(())
    } else {
        Err(invalid_field(InvalidType, layer, path, "expected bool"))
    }
}

/// Expect a JSON number or return a typed error.
fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(invalid_field(InvalidType, layer, path, "expected number"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), SchemaError> {
    let arr = match value {
        Value::Array(arr) => arr,
        _ => return Err(invalid_field(InvalidType, layer, path, "expected array")),
    };
    for (idx, entry) in arr.iter().enumerate() {
        if entry.as_str().is_none() {
            return Err(invalid_field(
                InvalidType,
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), SchemaError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(
                UnknownKey,
                layer,
                &join_path(path, key),
                "unknown key",
            ));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
pub(super) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid_field(kind: SchemaErrorKind, layer: &str, path: &str, message: &str) -> SchemaError {
    SchemaError::at(kind, layer, path, message)
}
