//! Map surface abstraction
//!
//! The view drives any interactive map through [`MapSurface`]: create the
//! surface, add a tile layer, place and remove markers, move the viewport.
//! [`HeadlessMap`] is an in-memory surface that tracks what a real map would
//! show; the preview server and the tests render through it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::MapError;
use crate::models::{Bounds, Coordinate};
use crate::render::Markup;

/// Options used when constructing the map surface
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    /// Id of the element hosting the map
    pub container: String,
    pub center: Coordinate,
    pub zoom: u8,
}

/// Raster tile source drawn under the markers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub max_zoom: u8,
    pub attribution: String,
}

/// Handle to a marker placed on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

/// A pin with its popup content
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: Coordinate,
    pub popup: Markup,
}

pub trait MapSurface {
    fn create(&mut self, options: &MapOptions) -> Result<(), MapError>;
    fn add_tile_layer(&mut self, layer: &TileLayer) -> Result<(), MapError>;
    fn add_marker(&mut self, marker: MarkerSpec) -> Result<MarkerId, MapError>;
    fn remove_marker(&mut self, id: MarkerId) -> Result<(), MapError>;
    fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), MapError>;
    /// Move the viewport so `bounds`, grown by `padding` of its span, is visible
    fn fit_bounds(&mut self, bounds: Bounds, padding: f64) -> Result<(), MapError>;
}

const DEFAULT_MAX_ZOOM: u8 = 19;

/// In-memory map surface
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    containers: Vec<String>,
    created: bool,
    center: Coordinate,
    zoom: u8,
    viewport: Option<Bounds>,
    tile_layers: Vec<TileLayer>,
    markers: BTreeMap<MarkerId, MarkerSpec>,
    next_marker: u64,
}

impl HeadlessMap {
    /// A surface whose page has a `map` container
    #[must_use]
    pub fn new() -> Self {
        Self::with_containers(["map"])
    }

    /// A surface whose page has exactly the given container ids
    pub fn with_containers<I, S>(containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            containers: containers.into_iter().map(Into::into).collect(),
            created: false,
            center: Coordinate::new(0.0, 0.0),
            zoom: 0,
            viewport: None,
            tile_layers: Vec::new(),
            markers: BTreeMap::new(),
            next_marker: 0,
        }
    }

    #[must_use]
    pub fn is_created(&self) -> bool {
        self.created
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Area currently in view, `None` before the surface exists
    #[must_use]
    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    #[must_use]
    pub fn tile_layers(&self) -> &[TileLayer] {
        &self.tile_layers
    }

    /// Markers in placement order
    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &MarkerSpec)> {
        self.markers.iter().map(|(id, spec)| (*id, spec))
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    fn max_zoom(&self) -> u8 {
        self.tile_layers
            .iter()
            .map(|layer| layer.max_zoom)
            .max()
            .unwrap_or(DEFAULT_MAX_ZOOM)
    }

    fn ensure_created(&self) -> Result<(), MapError> {
        if self.created {
            Ok(())
        } else {
            Err(MapError::NotCreated)
        }
    }
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Degrees of longitude covered by one 256px tile at `zoom`
fn span_at_zoom(zoom: u8) -> f64 {
    360.0 / f64::from(1u32 << zoom.min(31))
}

fn view_around(center: Coordinate, zoom: u8) -> Bounds {
    Bounds {
        south_west: center,
        north_east: center,
    }
    .with_min_span(span_at_zoom(zoom))
}

/// Deepest zoom at which `bounds` still fits on one tile
fn zoom_to_fit(bounds: &Bounds, max_zoom: u8) -> u8 {
    let span = bounds.lon_span().max(bounds.lat_span());
    if span <= span_at_zoom(max_zoom) * (1.0 + 1e-9) {
        return max_zoom;
    }
    let zoom = (360.0 / span).log2().floor();
    if zoom <= 0.0 {
        0
    } else {
        (zoom as u8).min(max_zoom)
    }
}

impl MapSurface for HeadlessMap {
    fn create(&mut self, options: &MapOptions) -> Result<(), MapError> {
        if !self.containers.iter().any(|c| c == &options.container) {
            return Err(MapError::ContainerNotFound(options.container.clone()));
        }
        self.created = true;
        self.set_view(options.center, options.zoom)
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) -> Result<(), MapError> {
        self.ensure_created()?;
        self.tile_layers.push(layer.clone());
        Ok(())
    }

    fn add_marker(&mut self, marker: MarkerSpec) -> Result<MarkerId, MapError> {
        self.ensure_created()?;
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(id, marker);
        Ok(id)
    }

    fn remove_marker(&mut self, id: MarkerId) -> Result<(), MapError> {
        self.markers
            .remove(&id)
            .map(|_| ())
            .ok_or(MapError::UnknownMarker(id.0))
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), MapError> {
        self.ensure_created()?;
        self.center = center;
        self.zoom = zoom;
        self.viewport = Some(view_around(center, zoom));
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: f64) -> Result<(), MapError> {
        self.ensure_created()?;
        let max_zoom = self.max_zoom();
        let padded = bounds.pad(padding).with_min_span(span_at_zoom(max_zoom));
        self.center = padded.center();
        self.zoom = zoom_to_fit(&padded, max_zoom);
        self.viewport = Some(padded);
        Ok(())
    }
}
