//! The venue map view
//!
//! [`VenueMapView`] owns a map surface, a venue source and an optional
//! geolocator, together with the [`ViewState`] they act on: the placed
//! markers, the list panel and the location button. Every fetch replaces the
//! markers and the panel wholesale.
//!
//! Fetches are split into [`VenueMapView::begin_fetch`] and
//! [`VenueMapView::apply_fetch`]. Each begin bumps a generation counter and
//! only the newest ticket may write its result, so a slow response never
//! overwrites a newer one.

use tracing::{debug, error, info, instrument, warn};

use crate::config::VenueMapConfig;
use crate::error::{GeolocationError, VenueMapError};
use crate::geolocation::{self, Geolocator, PositionOptions};
use crate::map::{MapOptions, MapSurface, MarkerId, MarkerSpec, TileLayer};
use crate::models::{Bounds, Coordinate, Venue};
use crate::render::{self, Markup};
use crate::venues::VenueSource;

pub const LOCATE_LABEL: &str = "Use My Location";
pub const LOCATING_LABEL: &str = "Getting location...";

/// Content of the venue list panel
#[derive(Debug, Clone, PartialEq)]
pub enum ListPanel {
    Loading,
    Empty,
    /// One rendered row per venue, in response order
    Venues(Vec<Markup>),
    Error(String),
}

impl ListPanel {
    #[must_use]
    pub fn render(&self) -> Markup {
        match self {
            ListPanel::Loading => render::loading_panel(),
            ListPanel::Empty => render::empty_panel(),
            ListPanel::Venues(rows) => {
                let mut markup = Markup::new();
                for row in rows {
                    markup.push(row);
                }
                markup
            }
            ListPanel::Error(message) => render::error_panel(message),
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        match self {
            ListPanel::Venues(rows) => rows.len(),
            _ => 0,
        }
    }
}

/// Enabled flag and label of the location control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationButton {
    pub enabled: bool,
    pub label: String,
}

impl LocationButton {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            enabled: true,
            label: LOCATE_LABEL.to_string(),
        }
    }

    #[must_use]
    pub fn busy() -> Self {
        Self {
            enabled: false,
            label: LOCATING_LABEL.to_string(),
        }
    }

    #[must_use]
    pub fn render(&self) -> Markup {
        render::location_button(&self.label, self.enabled, !self.enabled)
    }
}

/// Mutable state of one view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    markers: Vec<(MarkerId, Coordinate)>,
    panel: ListPanel,
    button: LocationButton,
    generation: u64,
}

impl ViewState {
    fn new() -> Self {
        Self {
            markers: Vec::new(),
            panel: ListPanel::Empty,
            button: LocationButton::idle(),
            generation: 0,
        }
    }

    #[must_use]
    pub fn markers(&self) -> &[(MarkerId, Coordinate)] {
        &self.markers
    }

    #[must_use]
    pub fn panel(&self) -> &ListPanel {
        &self.panel
    }

    #[must_use]
    pub fn button(&self) -> &LocationButton {
        &self.button
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Settings the view reads on every operation
#[derive(Debug, Clone)]
struct ViewSettings {
    map_options: MapOptions,
    tile_layer: TileLayer,
    located_zoom: u8,
    fit_padding: f64,
    booking_prefix: String,
    position_options: PositionOptions,
}

impl From<&VenueMapConfig> for ViewSettings {
    fn from(config: &VenueMapConfig) -> Self {
        Self {
            map_options: config.map.map_options(),
            tile_layer: config.map.tile_layer(),
            located_zoom: config.map.located_zoom,
            fit_padding: config.map.fit_padding,
            booking_prefix: config.endpoint.booking_prefix.clone(),
            position_options: config.geolocation.position_options(),
        }
    }
}

/// Proof that a fetch was started; only the newest one may apply its result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTicket {
    generation: u64,
    near: Coordinate,
}

impl FetchTicket {
    #[must_use]
    pub fn near(&self) -> Coordinate {
        self.near
    }
}

/// What a fetch cycle did to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Markers and rows were rebuilt for this many venues
    Rendered { venues: usize },
    Empty,
    /// The error panel is showing; markers were left alone
    Failed,
    /// A newer fetch was started meanwhile; nothing changed
    Stale,
}

/// What a location request did to the view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocateOutcome {
    Located { fix: Coordinate, fetch: FetchOutcome },
    Failed(GeolocationError),
    Unsupported,
}

pub struct VenueMapView<M, S, G> {
    map: Option<M>,
    source: S,
    geolocator: Option<G>,
    settings: ViewSettings,
    state: ViewState,
}

impl<M, S, G> VenueMapView<M, S, G>
where
    M: MapSurface,
    S: VenueSource,
    G: Geolocator,
{
    /// Build the map surface and run the first fetch at the default center.
    ///
    /// A surface that cannot be built leaves the view without a map and with
    /// the error panel showing; the rest of the view keeps working.
    pub async fn init(
        mut surface: M,
        source: S,
        geolocator: Option<G>,
        config: &VenueMapConfig,
    ) -> Self {
        let settings = ViewSettings::from(config);
        let mut view = Self {
            map: None,
            source,
            geolocator,
            settings,
            state: ViewState::new(),
        };

        info!("Initializing map...");
        let built = surface
            .create(&view.settings.map_options)
            .and_then(|()| surface.add_tile_layer(&view.settings.tile_layer));

        match built {
            Ok(()) => {
                info!("Map initialized successfully");
                view.map = Some(surface);
                let center = view.settings.map_options.center;
                view.load_venues(center).await;
            }
            Err(e) => {
                error!("Error initializing map: {}", e);
                view.show_error(&VenueMapError::from(e).user_message());
            }
        }

        view
    }

    /// Ask for the user's position, recenter on it and refetch.
    #[instrument(skip(self))]
    pub async fn request_location(&mut self) -> LocateOutcome {
        self.state.button = LocationButton::busy();

        let fix = geolocation::locate(
            self.geolocator.as_ref(),
            &self.settings.position_options,
        )
        .await;

        match fix {
            Ok(fix) => {
                info!("Located user at {}", fix.format_coordinates());
                let zoom = self.settings.located_zoom;
                if let Some(map) = self.map.as_mut() {
                    if let Err(e) = map.set_view(fix, zoom) {
                        warn!("Failed to recenter map: {}", e);
                    }
                }
                let ticket = self.begin_fetch(fix);
                self.state.button = LocationButton::idle();
                let result = self.source.fetch_venues(fix).await;
                let fetch = self.apply_fetch(ticket, result);
                LocateOutcome::Located { fix, fetch }
            }
            Err(GeolocationError::Unsupported) => {
                self.show_error(&VenueMapError::from(GeolocationError::Unsupported).user_message());
                self.state.button = LocationButton::idle();
                LocateOutcome::Unsupported
            }
            Err(e) => {
                error!("Error getting location: {}", e);
                self.show_error(&VenueMapError::from(e).user_message());
                self.state.button = LocationButton::idle();
                LocateOutcome::Failed(e)
            }
        }
    }

    /// Fetch venues near `near` and render them.
    #[instrument(skip(self))]
    pub async fn load_venues(&mut self, near: Coordinate) -> FetchOutcome {
        let ticket = self.begin_fetch(near);
        let result = self.source.fetch_venues(near).await;
        self.apply_fetch(ticket, result)
    }
}

impl<M, S, G> VenueMapView<M, S, G>
where
    M: MapSurface,
{
    /// Start a fetch cycle: the panel shows the loading state.
    pub fn begin_fetch(&mut self, near: Coordinate) -> FetchTicket {
        self.state.generation += 1;
        debug!(
            "Fetching courts for location {} (generation {})",
            near.format_coordinates(),
            self.state.generation
        );
        self.state.panel = ListPanel::Loading;
        FetchTicket {
            generation: self.state.generation,
            near,
        }
    }

    /// Render the result of the fetch started with `ticket`.
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: crate::Result<Vec<Venue>>,
    ) -> FetchOutcome {
        if ticket.generation != self.state.generation {
            debug!(
                "Discarding stale courts response (generation {}, current {})",
                ticket.generation, self.state.generation
            );
            return FetchOutcome::Stale;
        }

        let venues = match result {
            Ok(venues) => venues,
            Err(e) => {
                error!("Error fetching courts: {}", e);
                self.show_error(&e.user_message());
                return FetchOutcome::Failed;
            }
        };

        self.clear_markers();

        if venues.is_empty() {
            self.state.panel = ListPanel::Empty;
            return FetchOutcome::Empty;
        }

        let mut rows = Vec::with_capacity(venues.len());
        for venue in &venues {
            self.place_marker(venue);
            rows.push(render::venue_row(venue, &self.settings.booking_prefix));
        }
        self.state.panel = ListPanel::Venues(rows);
        self.fit_to_markers();

        FetchOutcome::Rendered {
            venues: venues.len(),
        }
    }

    /// Replace the panel with `message`; map, markers and button are untouched.
    pub fn show_error(&mut self, message: &str) {
        self.state.panel = ListPanel::Error(message.to_string());
    }

    fn place_marker(&mut self, venue: &Venue) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        let spec = MarkerSpec {
            position: venue.coordinate(),
            popup: render::venue_popup(venue, &self.settings.booking_prefix),
        };
        match map.add_marker(spec) {
            Ok(id) => self.state.markers.push((id, venue.coordinate())),
            Err(e) => warn!("Failed to place marker for court {}: {}", venue.id, e),
        }
    }

    fn clear_markers(&mut self) {
        let markers = std::mem::take(&mut self.state.markers);
        let Some(map) = self.map.as_mut() else {
            return;
        };
        for (id, _) in markers {
            if let Err(e) = map.remove_marker(id) {
                warn!("Failed to remove marker: {}", e);
            }
        }
    }

    fn fit_to_markers(&mut self) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        let Some(bounds) = Bounds::from_coordinates(self.state.markers.iter().map(|(_, c)| *c))
        else {
            return;
        };
        if let Err(e) = map.fit_bounds(bounds, self.settings.fit_padding) {
            warn!("Failed to fit map to markers: {}", e);
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }

    #[must_use]
    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    #[must_use]
    pub fn tile_layer(&self) -> &TileLayer {
        &self.settings.tile_layer
    }

    #[must_use]
    pub fn render_panel(&self) -> Markup {
        self.state.panel.render()
    }

    #[must_use]
    pub fn render_button(&self) -> Markup {
        self.state.button.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geolocation::{FailingGeolocator, StaticGeolocator};
    use crate::map::HeadlessMap;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers fetches from a queue, then with an empty list
    struct ScriptedSource {
        responses: Mutex<VecDeque<crate::Result<Vec<Venue>>>>,
        calls: Mutex<Vec<Coordinate>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<crate::Result<Vec<Venue>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Coordinate> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl VenueSource for ScriptedSource {
        async fn fetch_venues(&self, near: Coordinate) -> crate::Result<Vec<Venue>> {
            self.calls.lock().unwrap().push(near);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn venue(id: u64, name: &str, lat: f64, lon: f64) -> Venue {
        Venue {
            id,
            name: name.to_string(),
            address: format!("{id} Main St"),
            price_per_hour: 20.0,
            latitude: lat,
            longitude: lon,
        }
    }

    type View<G> = VenueMapView<HeadlessMap, ScriptedSource, G>;

    async fn view_with<G: Geolocator>(
        responses: Vec<crate::Result<Vec<Venue>>>,
        geolocator: Option<G>,
    ) -> View<G> {
        VenueMapView::init(
            HeadlessMap::new(),
            ScriptedSource::new(responses),
            geolocator,
            &VenueMapConfig::default(),
        )
        .await
    }

    fn headless<G>(view: &View<G>) -> &HeadlessMap {
        view.map().unwrap()
    }

    #[tokio::test]
    async fn test_init_centers_on_default_and_fetches() {
        let view = view_with::<StaticGeolocator>(vec![Ok(Vec::new())], None).await;
        let map = headless(&view);
        assert_eq!(map.zoom(), 12);
        assert_eq!(map.center(), Coordinate::new(40.7128, -74.0060));
        assert_eq!(map.tile_layers().len(), 1);
        assert_eq!(map.tile_layers()[0].max_zoom, 19);
        assert_eq!(view.source.calls(), vec![Coordinate::new(40.7128, -74.0060)]);
    }

    #[tokio::test]
    async fn test_init_without_container_shows_error() {
        let view: View<StaticGeolocator> = VenueMapView::init(
            HeadlessMap::with_containers(["sidebar"]),
            ScriptedSource::new(Vec::new()),
            None,
            &VenueMapConfig::default(),
        )
        .await;

        assert!(!view.has_map());
        assert_eq!(
            view.state().panel(),
            &ListPanel::Error("Error initializing map. Please refresh the page.".to_string())
        );
        assert!(view.source.calls().is_empty());
        assert!(view.state().button().enabled);
    }

    #[tokio::test]
    async fn test_empty_list_shows_empty_state() {
        let view = view_with::<StaticGeolocator>(vec![Ok(Vec::new())], None).await;
        assert_eq!(view.state().panel(), &ListPanel::Empty);
        assert!(view.render_panel().as_str().contains("No courts found"));
        assert_eq!(headless(&view).marker_count(), 0);
    }

    #[tokio::test]
    async fn test_single_venue_renders_marker_and_row() {
        let venues = vec![Venue {
            id: 1,
            name: "A&B".to_string(),
            address: "1 Main St".to_string(),
            price_per_hour: 20.0,
            latitude: 1.0,
            longitude: 2.0,
        }];
        let view = view_with::<StaticGeolocator>(vec![Ok(venues)], None).await;
        let map = headless(&view);

        assert_eq!(map.marker_count(), 1);
        let (_, marker) = map.markers().next().unwrap();
        assert_eq!(marker.position, Coordinate::new(1.0, 2.0));
        assert!(marker.popup.as_str().contains("A&amp;B"));
        assert!(marker.popup.as_str().contains("$20/hour"));
        assert!(marker.popup.as_str().contains(r#"href="/book/1""#));

        let panel = view.render_panel().into_string();
        assert_eq!(view.state().panel().row_count(), 1);
        assert!(panel.contains("A&amp;B"));
        assert!(!panel.contains("A&B"));
        assert!(panel.contains("$20/hour"));
        assert!(panel.contains(r#"href="/book/1""#));
    }

    #[tokio::test]
    async fn test_rows_and_markers_follow_response_order() {
        let venues = vec![
            venue(3, "Charlie", 3.0, 3.0),
            venue(1, "Alpha", 1.0, 1.0),
            venue(2, "Bravo", 2.0, 2.0),
            venue(1, "Alpha", 1.0, 1.0),
        ];
        let view = view_with::<StaticGeolocator>(vec![Ok(venues.clone())], None).await;

        let placed: Vec<Coordinate> = headless(&view).markers().map(|(_, m)| m.position).collect();
        let expected: Vec<Coordinate> = venues.iter().map(Venue::coordinate).collect();
        assert_eq!(placed, expected);
        assert_eq!(view.state().panel().row_count(), venues.len());

        let panel = view.render_panel().into_string();
        let positions: Vec<usize> = ["Charlie", "Alpha", "Bravo"]
            .iter()
            .map(|name| panel.find(name).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_viewport_fits_markers_with_margin() {
        let venues = vec![venue(1, "A", 10.0, 10.0), venue(2, "B", 12.0, 16.0)];
        let view = view_with::<StaticGeolocator>(vec![Ok(venues.clone())], None).await;
        let viewport = headless(&view).viewport().unwrap();
        for venue in &venues {
            assert!(viewport.contains_with_margin(venue.coordinate(), 0.1));
        }
    }

    #[tokio::test]
    async fn test_refetch_replaces_markers_wholesale() {
        let first = vec![venue(1, "A", 1.0, 1.0), venue(2, "B", 2.0, 2.0)];
        let second = vec![venue(3, "C", 3.0, 3.0)];
        let mut view = view_with::<StaticGeolocator>(vec![Ok(first), Ok(second)], None).await;

        view.load_venues(Coordinate::new(0.0, 0.0)).await;

        let map = headless(&view);
        assert_eq!(map.marker_count(), 1);
        assert_eq!(view.state().markers().len(), 1);
        assert_eq!(view.state().markers()[0].1, Coordinate::new(3.0, 3.0));
    }

    #[tokio::test]
    async fn test_empty_refetch_still_clears_markers() {
        let first = vec![venue(1, "A", 1.0, 1.0)];
        let mut view = view_with::<StaticGeolocator>(vec![Ok(first), Ok(Vec::new())], None).await;

        let outcome = view.load_venues(Coordinate::new(0.0, 0.0)).await;

        assert_eq!(outcome, FetchOutcome::Empty);
        assert_eq!(headless(&view).marker_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_markers() {
        let first = vec![venue(1, "A", 1.0, 1.0), venue(2, "B", 2.0, 2.0)];
        let mut view = view_with::<StaticGeolocator>(
            vec![Ok(first), Err(VenueMapError::http_status(503))],
            None,
        )
        .await;
        let before = view.state().markers().to_vec();

        let outcome = view.load_venues(Coordinate::new(0.0, 0.0)).await;

        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(view.state().markers(), before.as_slice());
        assert_eq!(headless(&view).marker_count(), 2);
        assert_eq!(
            view.state().panel(),
            &ListPanel::Error("Error loading courts. Please try again.".to_string())
        );
    }

    #[tokio::test]
    async fn test_network_error_shows_generic_message() {
        let view = view_with::<StaticGeolocator>(
            vec![Err(VenueMapError::network("connection reset"))],
            None,
        )
        .await;
        let panel = view.render_panel().into_string();
        assert!(panel.contains("Error loading courts. Please try again."));
        assert!(panel.contains("fa-exclamation-circle"));
        assert_eq!(headless(&view).marker_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let mut view = view_with::<StaticGeolocator>(vec![Ok(Vec::new())], None).await;

        let older = view.begin_fetch(Coordinate::new(1.0, 1.0));
        let newer = view.begin_fetch(Coordinate::new(2.0, 2.0));

        let applied = view.apply_fetch(newer, Ok(vec![venue(2, "New", 2.0, 2.0)]));
        let stale = view.apply_fetch(older, Ok(vec![venue(1, "Old", 1.0, 1.0)]));

        assert_eq!(applied, FetchOutcome::Rendered { venues: 1 });
        assert_eq!(stale, FetchOutcome::Stale);
        let panel = view.render_panel().into_string();
        assert!(panel.contains("New"));
        assert!(!panel.contains("Old"));
        assert_eq!(headless(&view).marker_count(), 1);
    }

    #[tokio::test]
    async fn test_begin_fetch_shows_loading() {
        let mut view = view_with::<StaticGeolocator>(vec![Ok(Vec::new())], None).await;
        let ticket = view.begin_fetch(Coordinate::new(1.0, 1.0));
        assert_eq!(ticket.near(), Coordinate::new(1.0, 1.0));
        assert_eq!(view.state().panel(), &ListPanel::Loading);
        assert!(view.render_panel().as_str().contains("Loading courts..."));
    }

    #[tokio::test]
    async fn test_location_success_recenters_and_refetches() {
        let fix = Coordinate::new(5.0, 5.0);
        let mut view = view_with(
            vec![Ok(Vec::new()), Ok(Vec::new())],
            Some(StaticGeolocator(fix)),
        )
        .await;

        let outcome = view.request_location().await;

        assert_eq!(
            outcome,
            LocateOutcome::Located {
                fix,
                fetch: FetchOutcome::Empty
            }
        );
        assert_eq!(headless(&view).center(), fix);
        assert_eq!(headless(&view).zoom(), 13);
        assert_eq!(view.source.calls().last(), Some(&fix));
        assert_eq!(view.state().button(), &LocationButton::idle());
    }

    #[tokio::test]
    async fn test_location_failure_leaves_map_alone() {
        let first = vec![venue(1, "A", 1.0, 1.0)];
        let mut view = view_with(
            vec![Ok(first)],
            Some(FailingGeolocator(GeolocationError::PermissionDenied)),
        )
        .await;
        let center = headless(&view).center();

        let outcome = view.request_location().await;

        assert_eq!(outcome, LocateOutcome::Failed(GeolocationError::PermissionDenied));
        assert_eq!(headless(&view).center(), center);
        assert_eq!(headless(&view).marker_count(), 1);
        assert_eq!(view.source.calls().len(), 1);
        assert!(view.render_panel().as_str().contains("Unable to get your location"));
        assert_eq!(view.state().button(), &LocationButton::idle());
    }

    #[tokio::test]
    async fn test_location_unsupported_makes_no_request() {
        let mut view = view_with::<StaticGeolocator>(vec![Ok(Vec::new())], None).await;

        let outcome = view.request_location().await;

        assert_eq!(outcome, LocateOutcome::Unsupported);
        assert!(
            view.render_panel()
                .as_str()
                .contains("Geolocation is not supported by your browser.")
        );
        assert_eq!(view.source.calls().len(), 1);
        assert!(view.state().button().enabled);
        assert_eq!(view.state().button().label, LOCATE_LABEL);
    }

    #[test]
    fn test_button_rendering() {
        assert!(LocationButton::busy().render().as_str().contains(LOCATING_LABEL));
        assert!(LocationButton::idle().render().as_str().contains(LOCATE_LABEL));
    }
}
