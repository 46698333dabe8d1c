//! JSON merge helpers for layered configuration.

use serde_json::Value;

/// Merge overlay values into the base, recursively overriding objects.
///
/// Arrays and scalars in the overlay replace the base value outright.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_arrays_replace() {
        let mut base = json!({
            "map": {
                "options": { "projection": "EPSG:4326", "numZoomLevels": 17 },
                "baseLayerOptions": { "layers": ["openstreetmap", "labels"] }
            },
            "mapContextMenu": false
        });
        let overlay = json!({
            "map": {
                "options": { "numZoomLevels": 19 },
                "baseLayerOptions": { "layers": ["aerial"] }
            },
            "mapContextMenu": true
        });
        merge_json_values(&mut base, &overlay);
        assert_eq!(
            base,
            json!({
                "map": {
                    "options": { "projection": "EPSG:4326", "numZoomLevels": 19 },
                    "baseLayerOptions": { "layers": ["aerial"] }
                },
                "mapContextMenu": true
            })
        );
    }

    #[test]
    fn object_overlay_replaces_scalar() {
        let mut base = json!({ "map": { "defaultExtent": "automatic" } });
        let overlay = json!({
            "map": { "defaultExtent": { "minX": 0, "minY": 0, "maxX": 1, "maxY": 1 } }
        });
        merge_json_values(&mut base, &overlay);
        assert_eq!(base, overlay);
    }
}
