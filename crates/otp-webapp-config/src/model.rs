//! Configuration schema for the trip planner web client.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Logo shown when no custom logo is configured.
pub const DEFAULT_LOGO_PATH: &str = "images/ui/logoSmall.png";
/// Directory holding per-agency custom icon sets.
pub const CUSTOM_ICON_ROOT: &str = "custom";

/// Root config consumed by the map, icon, context-menu and unit components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebappConfig {
    /// Editor schema hint, carried through unchanged.
    #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub system_map: SystemMapConfig,
    #[serde(default)]
    pub map: MapConfig,
    /// Custom logo path; `None` or blank selects [`DEFAULT_LOGO_PATH`].
    #[serde(default)]
    pub logo: Option<String>,
    /// GTFS agency ids that have a custom icon set under [`CUSTOM_ICON_ROOT`].
    #[serde(default)]
    pub use_custom_icons_for_agencies: BTreeSet<String>,
    /// Context menu with trip planning actions ("Start trip here").
    #[serde(default = "default_planner_context_menu")]
    pub planner_context_menu: bool,
    #[serde(default)]
    pub metrics_system: MetricsSystem,
    /// Context menu with general map actions ("Center map here").
    #[serde(default)]
    pub map_context_menu: bool,
}

impl Default for WebappConfig {
    fn default() -> Self {
        Self {
            schema: None,
            system_map: SystemMapConfig::default(),
            map: MapConfig::default(),
            logo: None,
            use_custom_icons_for_agencies: BTreeSet::new(),
            planner_context_menu: default_planner_context_menu(),
            metrics_system: MetricsSystem::default(),
            map_context_menu: false,
        }
    }
}

fn default_planner_context_menu() -> bool {
    true
}

impl WebappConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> WebappConfigBuilder {
        WebappConfigBuilder::new()
    }

    /// Logo to display, falling back to the built-in one.
    pub fn logo_path(&self) -> &str {
        self.logo
            .as_deref()
            .filter(|logo| !logo.trim().is_empty())
            .unwrap_or(DEFAULT_LOGO_PATH)
    }

    /// Whether the given agency has a custom icon set.
    pub fn uses_custom_icons(&self, agency_id: &str) -> bool {
        self.use_custom_icons_for_agencies.contains(agency_id)
    }

    /// Icon directory for an agency (`custom/<agencyId>`), if it uses custom icons.
    pub fn custom_icon_dir(&self, agency_id: &str) -> Option<String> {
        self.uses_custom_icons(agency_id)
            .then(|| format!("{CUSTOM_ICON_ROOT}/{agency_id}"))
    }
}

/// Builder for assembling a `WebappConfig` in code.
///
/// The built value is not validated; pass it through
/// [`crate::ConfigStore::load_config`] or [`WebappConfig::validate`].
#[derive(Debug, Default, Clone)]
pub struct WebappConfigBuilder {
    config: WebappConfig,
}

impl WebappConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: WebappConfig::default(),
        }
    }

    /// Replace the system map configuration.
    pub fn system_map(mut self, system_map: SystemMapConfig) -> Self {
        self.config.system_map = system_map;
        self
    }

    /// Replace the base map configuration.
    pub fn map(mut self, map: MapConfig) -> Self {
        self.config.map = map;
        self
    }

    /// Use a custom logo.
    pub fn logo(mut self, logo: impl Into<String>) -> Self {
        self.config.logo = Some(logo.into());
        self
    }

    /// Add agencies that use custom icon sets.
    pub fn custom_icons_for_agencies<I, S>(mut self, agencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .use_custom_icons_for_agencies
            .extend(agencies.into_iter().map(Into::into));
        self
    }

    pub fn planner_context_menu(mut self, enabled: bool) -> Self {
        self.config.planner_context_menu = enabled;
        self
    }

    pub fn metrics_system(mut self, metrics_system: MetricsSystem) -> Self {
        self.config.metrics_system = metrics_system;
        self
    }

    pub fn map_context_menu(mut self, enabled: bool) -> Self {
        self.config.map_context_menu = enabled;
        self
    }

    /// Finalize and return the built `WebappConfig`.
    pub fn build(self) -> WebappConfig {
        self.config
    }
}

/// WMS overlay showing the transit system's routes and stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SystemMapConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_url_routes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_url_stops: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_names_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_names_stop: Option<String>,
    /// Path of the extended API endpoint that proxies to the WMS server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_stops_url: Option<String>,
}

/// Resolved system map endpoints, available only when the overlay is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemMapLayers<'a> {
    pub routes_url: &'a str,
    pub stops_url: &'a str,
    pub route_layer_name: &'a str,
    pub stop_layer_name: &'a str,
    pub control_stops_url: &'a str,
}

impl SystemMapConfig {
    /// Borrow the overlay endpoints when enabled and fully specified.
    pub fn layers(&self) -> Option<SystemMapLayers<'_>> {
        if !self.enabled {
            return None;
        }
        Some(SystemMapLayers {
            routes_url: self.layer_url_routes.as_deref()?,
            stops_url: self.layer_url_stops.as_deref()?,
            route_layer_name: self.layer_names_route.as_deref()?,
            stop_layer_name: self.layer_names_stop.as_deref()?,
            control_stops_url: self.control_stops_url.as_deref()?,
        })
    }
}

/// Base map settings handed to the map renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    #[serde(default)]
    pub default_extent: DefaultExtent,
    #[serde(default)]
    pub options: MapOptions,
    #[serde(default)]
    pub base_layer_options: BaseLayerOptions,
}

/// Initial map extent: asked from the server, or a fixed box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawExtent", into = "RawExtent")]
pub enum DefaultExtent {
    #[default]
    Automatic,
    Bounds(BoundingBox),
}

impl DefaultExtent {
    pub fn is_automatic(&self) -> bool {
        matches!(self, DefaultExtent::Automatic)
    }

    pub fn bounds(&self) -> Option<&BoundingBox> {
        match self {
            DefaultExtent::Automatic => None,
            DefaultExtent::Bounds(bounds) => Some(bounds),
        }
    }
}

/// Keyword selecting a server-provided extent.
const AUTOMATIC_EXTENT: &str = "automatic";

/// Wire form of `DefaultExtent`: the keyword string or a bounds object.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawExtent {
    Keyword(String),
    Bounds(BoundingBox),
}

impl TryFrom<RawExtent> for DefaultExtent {
    type Error = String;

    fn try_from(raw: RawExtent) -> Result<Self, Self::Error> {
        match raw {
            RawExtent::Keyword(keyword) if keyword == AUTOMATIC_EXTENT => {
                Ok(DefaultExtent::Automatic)
            }
            RawExtent::Keyword(keyword) => Err(format!("unknown extent keyword `{keyword}`")),
            RawExtent::Bounds(bounds) => Ok(DefaultExtent::Bounds(bounds)),
        }
    }
}

impl From<DefaultExtent> for RawExtent {
    fn from(extent: DefaultExtent) -> Self {
        match extent {
            DefaultExtent::Automatic => RawExtent::Keyword(AUTOMATIC_EXTENT.to_string()),
            DefaultExtent::Bounds(bounds) => RawExtent::Bounds(bounds),
        }
    }
}

/// Rectangular extent in the map projection's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// True when both axes are finite and strictly ordered.
    pub fn is_ordered(&self) -> bool {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|coord| coord.is_finite());
        finite && self.min_x < self.max_x && self.min_y < self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether a point lies inside the box (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Options passed straight to the map constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    #[serde(default = "default_projection")]
    pub projection: String,
    #[serde(
        default = "default_num_zoom_levels",
        deserialize_with = "deserialize_zoom_levels"
    )]
    pub num_zoom_levels: u32,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            projection: default_projection(),
            num_zoom_levels: default_num_zoom_levels(),
        }
    }
}

/// Default map projection (WGS 84).
fn default_projection() -> String {
    "EPSG:4326".to_string()
}

fn default_num_zoom_levels() -> u32 {
    17
}

/// Whole, positive, and representable as a `u32`.
pub(crate) fn is_zoom_level_count(levels: f64) -> bool {
    levels.fract() == 0.0 && levels >= 1.0 && levels <= f64::from(u32::MAX)
}

/// Accept `17` and `17.0` alike.
fn deserialize_zoom_levels<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let levels = f64::deserialize(deserializer)?;
    if is_zoom_level_count(levels) {
        Ok(levels as u32)
    } else {
        Err(D::Error::custom(format!(
            "expected a positive integer zoom level count, found {levels}"
        )))
    }
}

/// Base tile layer served over WMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLayerOptions {
    #[serde(default = "default_base_layer_url")]
    pub url: String,
    #[serde(default = "default_base_layers")]
    pub layers: Vec<String>,
    #[serde(default = "default_base_layer_format")]
    pub format: String,
    #[serde(default)]
    pub transition_effect: TransitionEffect,
}

impl Default for BaseLayerOptions {
    fn default() -> Self {
        Self {
            url: default_base_layer_url(),
            layers: default_base_layers(),
            format: default_base_layer_format(),
            transition_effect: TransitionEffect::default(),
        }
    }
}

/// Default WMS endpoint for base tiles.
fn default_base_layer_url() -> String {
    "http://maps.opengeo.org/geowebcache/service/wms".to_string()
}

fn default_base_layers() -> Vec<String> {
    vec!["openstreetmap".to_string()]
}

/// Default tile image MIME type.
fn default_base_layer_format() -> String {
    "image/png".to_string()
}

/// Effect used while tiles reload after a zoom.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransitionEffect {
    #[default]
    Resize,
    None,
}

/// Unit system for distances shown to the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSystem {
    /// Feet and miles.
    #[default]
    English,
    /// Meters and kilometers.
    International,
}

impl MetricsSystem {
    /// Unit label for short distances.
    pub fn short_distance_unit(&self) -> &'static str {
        match self {
            MetricsSystem::English => "ft",
            MetricsSystem::International => "m",
        }
    }

    /// Unit label for long distances.
    pub fn long_distance_unit(&self) -> &'static str {
        match self {
            MetricsSystem::English => "mi",
            MetricsSystem::International => "km",
        }
    }
}
