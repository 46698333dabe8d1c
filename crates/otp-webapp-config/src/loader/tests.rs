//! Tests for single-source and layered configuration loading.

use super::*;
use crate::{BoundingBox, DefaultExtent, MetricsSystem, TransitionEffect};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options that only consult the given cwd and explicit paths.
fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = None;
    options.user_config_path = None;
    options
}

#[test]
fn parse_minimal_config() {
    let config = WebappConfig::load_from_str("{}").expect("config");
    assert_eq!(config, WebappConfig::default());
    assert_eq!(config.map.options.projection, "EPSG:4326");
    assert_eq!(config.map.options.num_zoom_levels, 17);
    assert!(config.planner_context_menu);
}

/// The shipped client config, written in JSON5 as operators would.
#[test]
fn parse_original_client_config() {
    let json5 = r#"{
        systemMap: {
            enabled: false,
            layerUrlRoutes: 'http://routelayer.example.com/wms',
            layerUrlStops: 'http://stoplayer.example.com/wms',
            layerNamesRoute: 'routeLayerName',
            layerNamesStop: 'stopLayerName',
            controlStopsUrl: '/opentripplanner-api-extended/ws/wms',
        },
        map: {
            defaultExtent: "automatic",
            options: { projection: "EPSG:4326", numZoomLevels: 17 },
            baseLayerOptions: {
                url: 'http://maps.opengeo.org/geowebcache/service/wms',
                layers: ['openstreetmap'],
                format: 'image/png',
                transitionEffect: 'resize',
            },
        },
        logo: null,
        useCustomIconsForAgencies: [],
        plannerContextMenu: true,
        // metricsSystem: 'international',
        metricsSystem: 'english',
        mapContextMenu: false,
    }"#;
    let config = WebappConfig::load_from_str(json5).expect("config");
    assert_eq!(
        config.system_map.layer_names_stop.as_deref(),
        Some("stopLayerName")
    );
    assert_eq!(config.system_map.layers(), None);
    assert_eq!(config.map.base_layer_options.transition_effect, TransitionEffect::Resize);
    assert_eq!(config.metrics_system, MetricsSystem::English);
}

#[test]
fn enabled_system_map_requires_dependents() {
    let err = WebappConfig::from_value(json!({ "systemMap": { "enabled": true } })).unwrap_err();
    assert_eq!(
        err.schema_kind(),
        Some(SchemaErrorKind::MissingDependentField)
    );
    assert!(format!("{err}").contains("config:systemMap.layerUrlRoutes"));
}

#[test]
fn blank_dependent_counts_as_missing() {
    let value = json!({
        "systemMap": {
            "enabled": true,
            "layerUrlRoutes": "http://routes.example.com/wms",
            "layerUrlStops": "http://stops.example.com/wms",
            "layerNamesRoute": "routes",
            "layerNamesStop": "   ",
            "controlStopsUrl": "/ws/wms"
        }
    });
    let err = WebappConfig::from_value(value).unwrap_err();
    let ConfigError::Schema(schema) = err else {
        panic!("expected schema error");
    };
    assert_eq!(schema.kind, SchemaErrorKind::MissingDependentField);
    assert_eq!(schema.path, "config:systemMap.layerNamesStop");
}

#[test]
fn zero_zoom_levels_out_of_range() {
    let err = WebappConfig::from_value(json!({ "map": { "options": { "numZoomLevels": 0 } } }))
        .unwrap_err();
    assert_eq!(err.schema_kind(), Some(SchemaErrorKind::InvalidRange));
}

#[test]
fn unordered_extent_rejected() {
    let value = json!({
        "map": { "defaultExtent": { "minX": 10, "minY": 0, "maxX": 5, "maxY": 10 } }
    });
    let err = WebappConfig::from_value(value).unwrap_err();
    assert_eq!(err.schema_kind(), Some(SchemaErrorKind::InvalidBounds));
}

#[test]
fn ordered_extent_decodes_to_bounds() {
    let value = json!({
        "map": { "defaultExtent": { "minX": -122.7, "minY": 45.4, "maxX": -122.5, "maxY": 45.6 } }
    });
    let config = WebappConfig::from_value(value).expect("config");
    assert_eq!(
        config.map.default_extent,
        DefaultExtent::Bounds(BoundingBox::new(-122.7, 45.4, -122.5, 45.6))
    );
}

#[test]
fn empty_base_layers_rejected() {
    let err = WebappConfig::from_value(json!({ "map": { "baseLayerOptions": { "layers": [] } } }))
        .unwrap_err();
    assert_eq!(err.schema_kind(), Some(SchemaErrorKind::InvalidRange));
}

#[test]
fn blank_base_url_rejected() {
    let err = WebappConfig::from_value(json!({ "map": { "baseLayerOptions": { "url": "" } } }))
        .unwrap_err();
    assert_eq!(
        err.schema_kind(),
        Some(SchemaErrorKind::MissingRequiredField)
    );
}

#[test]
fn builder_output_is_validated() {
    let mut config = WebappConfig::builder().build();
    config.map.options.num_zoom_levels = 0;
    let err = config.validate().unwrap_err();
    assert_eq!(err.schema_kind(), Some(SchemaErrorKind::InvalidRange));
}

#[test]
fn invalid_json5_is_parse_error() {
    let err = WebappConfig::load_from_str("{ map: ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailed(_)));
}

#[test]
fn layered_config_precedence() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("site");
    fs::create_dir_all(&cwd).expect("cwd");

    let system_config = root.join("system.json5");
    write_json5(
        &system_config,
        "{ metricsSystem: 'international', map: { options: { numZoomLevels: 18 } } }",
    );

    let user_config = root.join("user.json5");
    write_json5(&user_config, "{ map: { options: { numZoomLevels: 19 } } }");

    write_json5(&cwd.join(CWD_CONFIG_FILE), "{ mapContextMenu: true }");

    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, "{ map: { options: { numZoomLevels: 20 } } }");

    let mut options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    options.system_config_path = Some(system_config);
    options.user_config_path = Some(user_config);

    let layered = WebappConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.map.options.num_zoom_levels, 20);
    assert_eq!(layered.config.metrics_system, MetricsSystem::International);
    assert!(layered.config.map_context_menu);
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::System,
            ConfigLayerSource::User,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Runtime,
        ]
    );
}

/// A dependent field may come from a different layer than the flag.
#[test]
fn system_map_completed_across_layers() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();

    let system_config = root.join("system.json5");
    write_json5(
        &system_config,
        r#"{ systemMap: {
            layerUrlRoutes: 'http://routes.example.com/wms',
            layerUrlStops: 'http://stops.example.com/wms',
            layerNamesRoute: 'routes',
            layerNamesStop: 'stops',
            controlStopsUrl: '/ws/wms',
        } }"#,
    );
    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, "{ systemMap: { enabled: true } }");

    let mut options = isolated_options(root).with_runtime_path(&runtime_config);
    options.system_config_path = Some(system_config);

    let layered = WebappConfig::load_layered_with_options(options).expect("layered");
    let layers = layered.config.system_map.layers().expect("system map layers");
    assert_eq!(layers.routes_url, "http://routes.example.com/wms");
}

#[test]
fn layered_dependents_checked_on_merged_value() {
    let temp = TempDir::new().expect("tmp");
    let runtime_config = temp.path().join("runtime.json5");
    write_json5(&runtime_config, "{ systemMap: { enabled: true } }");

    let options = isolated_options(temp.path()).with_runtime_path(&runtime_config);
    let err = WebappConfig::load_layered_with_options(options).unwrap_err();
    let ConfigError::Schema(schema) = err else {
        panic!("expected schema error");
    };
    assert!(schema.path.starts_with("effective:systemMap."));
}

#[test]
fn invalid_layer_reports_its_source() {
    let temp = TempDir::new().expect("tmp");
    let user_config = temp.path().join("user.json5");
    write_json5(&user_config, "{ metricsSystem: 'imperial' }");

    let mut options = isolated_options(temp.path());
    options.user_config_path = Some(user_config);

    let err = WebappConfig::load_layered_with_options(options).unwrap_err();
    let ConfigError::Schema(schema) = err else {
        panic!("expected schema error");
    };
    assert_eq!(schema.kind, SchemaErrorKind::InvalidEnumValue);
    assert!(schema.path.starts_with("user("));
    assert!(schema.path.ends_with(":metricsSystem"));
}

#[test]
fn missing_runtime_layer_fails() {
    let temp = TempDir::new().expect("tmp");
    let options =
        isolated_options(temp.path()).with_runtime_path(temp.path().join("absent.json5"));
    let err = WebappConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

#[test]
fn duplicate_layer_paths_load_once() {
    let temp = TempDir::new().expect("tmp");
    let shared = temp.path().join("shared.json5");
    write_json5(&shared, "{ plannerContextMenu: false }");

    let mut options = isolated_options(temp.path());
    options.system_config_path = Some(shared.clone());
    options.user_config_path = Some(shared);

    let layered = WebappConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert!(!layered.config.planner_context_menu);
}
