//! Server-rendered preview of the venue map view

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
};
use chrono::Datelike;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::VenueMapConfig;
use crate::error::VenueMapError;
use crate::geolocation::StaticGeolocator;
use crate::map::HeadlessMap;
use crate::models::Coordinate;
use crate::render::{self, Markup};
use crate::venues::HttpVenueSource;
use crate::view::VenueMapView;

pub type PreviewView = VenueMapView<HeadlessMap, HttpVenueSource, StaticGeolocator>;

#[derive(Clone)]
pub struct AppState {
    config: Arc<VenueMapConfig>,
    source: HttpVenueSource,
}

impl AppState {
    pub fn new(config: VenueMapConfig) -> crate::Result<Self> {
        let source = HttpVenueSource::new(&config.endpoint)?;
        Ok(Self {
            config: Arc::new(config),
            source,
        })
    }
}

/// A position passed by the browser in place of a geolocation fix
#[derive(Debug, Default, Deserialize)]
pub struct LocateQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl LocateQuery {
    /// `None` when neither parameter is given
    fn fix(&self) -> crate::Result<Option<Coordinate>> {
        match (self.lat, self.lon) {
            (None, None) => Ok(None),
            (Some(lat), Some(lon)) => Coordinate::checked(lat, lon).map(Some),
            _ => Err(VenueMapError::validation("lat and lon must be given together")),
        }
    }
}

fn bad_request(err: VenueMapError) -> (StatusCode, String) {
    tracing::debug!("Rejected location query: {}", err);
    (StatusCode::BAD_REQUEST, err.user_message())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/panel", get(panel))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

pub async fn run(config: VenueMapConfig) -> anyhow::Result<()> {
    let port = config.server.port;
    let app = router(AppState::new(config)?);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://localhost:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run one page load over a headless map; a `fix` then acts as a
/// successful location request.
pub async fn build_view(
    config: &VenueMapConfig,
    source: HttpVenueSource,
    fix: Option<Coordinate>,
) -> PreviewView {
    let mut view = VenueMapView::init(
        HeadlessMap::with_containers([config.map.container.clone()]),
        source,
        fix.map(StaticGeolocator),
        config,
    )
    .await;
    if fix.is_some() {
        view.request_location().await;
    }
    view
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<LocateQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let fix = query.fix().map_err(bad_request)?;
    let view = build_view(&state.config, state.source.clone(), fix).await;
    Ok(Html(render_page(&state.config, &view).into_string()))
}

async fn panel(
    State(state): State<AppState>,
    Query(query): Query<LocateQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let fix = query.fix().map_err(bad_request)?;
    let view = build_view(&state.config, state.source.clone(), fix).await;
    Ok(Html(view.render_panel().into_string()))
}

async fn health() -> &'static str {
    "ok"
}

pub fn render_page(config: &VenueMapConfig, view: &PreviewView) -> Markup {
    let mut body = Markup::new();

    if let Some(map) = view.map() {
        let center = map.center();
        let (lat, lon, zoom) = (
            center.latitude.to_string(),
            center.longitude.to_string(),
            map.zoom().to_string(),
        );
        let layer = view.tile_layer();
        let max_zoom = layer.max_zoom.to_string();
        body.open(
            "div",
            &[
                ("id", config.map.container.as_str()),
                ("data-lat", lat.as_str()),
                ("data-lon", lon.as_str()),
                ("data-zoom", zoom.as_str()),
                ("data-tile-url", layer.url_template.as_str()),
                ("data-max-zoom", max_zoom.as_str()),
                ("data-attribution", layer.attribution.as_str()),
            ],
        );
        for (_, marker) in map.markers() {
            let (lat, lon) = (
                marker.position.latitude.to_string(),
                marker.position.longitude.to_string(),
            );
            body.open(
                "template",
                &[
                    ("class", "marker"),
                    ("data-lat", lat.as_str()),
                    ("data-lon", lon.as_str()),
                ],
            )
            .push(&marker.popup)
            .close("template");
        }
        body.close("div");
    }

    body.push(&view.render_button())
        .open("div", &[("id", "courts-container")])
        .push(&view.render_panel())
        .close("div")
        .element(
            "footer",
            &[],
            &format!("© {} venuemap", chrono::Utc::now().year()),
        );

    render::document("Nearby Courts", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use httpmock::prelude::*;
    use rstest::rstest;
    use serde_json::json;
    use tower::ServiceExt;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn app_for(server: &MockServer) -> Router {
        let mut config = VenueMapConfig::default();
        config.endpoint.base_url = server.base_url();
        router(AppState::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start_async().await;
        let (status, body) = get_body(app_for(&server), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_index_renders_map_markers_and_panel() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/courts");
                then.status(200).json_body(json!([
                    {"id": 1, "name": "A&B", "address": "1 Main St", "price_per_hour": 20, "latitude": 1.0, "longitude": 2.0}
                ]));
            })
            .await;

        let (status, body) = get_body(app_for(&server), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains(r#"<div id="map""#));
        assert!(body.contains(r#"data-attribution="© OpenStreetMap contributors""#));
        assert_eq!(body.matches(r#"<template class="marker""#).count(), 1);
        assert!(body.contains(r#"<div id="courts-container">"#));
        assert!(body.contains("A&amp;B"));
        assert!(body.contains("$20/hour"));
        assert!(body.contains("Use My Location"));
    }

    #[tokio::test]
    async fn test_panel_with_fix_refetches() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/courts");
                then.status(200).json_body(json!([]));
            })
            .await;

        let (status, body) = get_body(app_for(&server), "/panel?lat=5&lon=5").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No courts found in this area."));
        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_panel_shows_error_on_failed_endpoint() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/courts");
                then.status(500);
            })
            .await;

        let (_, body) = get_body(app_for(&server), "/panel").await;
        assert!(body.contains("Error loading courts. Please try again."));
    }

    #[rstest]
    #[case("/panel?lat=91&lon=0")]
    #[case("/panel?lat=0&lon=-181")]
    #[case("/panel?lat=NaN&lon=0")]
    #[case("/panel?lat=inf&lon=0")]
    #[case("/panel?lat=5")]
    #[case("/?lon=5")]
    #[tokio::test]
    async fn test_invalid_location_query_is_rejected(#[case] uri: &str) {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/courts");
                then.status(200).json_body(json!([]));
            })
            .await;

        let (status, body) = get_body(app_for(&server), uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Invalid input"));
        mock.assert_hits_async(0).await;
    }
}
