//! Tests for `SearchOrchestrator` against the scripted provider.

use std::collections::HashSet;
use std::time::Duration;

use geo::{Coord, Rect};
use kindred_core::test_support::{DetailsReply, StubPlaceProvider, cafe};
use kindred_core::{
    Amenities, AreaRef, Destination, GeoConstraint, Place, PlaceDetails, ProviderError,
    ScoredCandidate, SearchError, SearchRequest, SearchResultSet,
};
use kindred_search::{OrchestratorConfig, SearchOrchestrator, Suppression};
use rstest::{fixture, rstest};

const CENTER: Coord<f64> = Coord { x: -9.14, y: 38.72 };

fn at(dx: f64) -> Coord<f64> {
    Coord {
        x: CENTER.x + dx,
        y: CENTER.y,
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime")
        .block_on(future)
}

#[fixture]
fn request() -> SearchRequest {
    let liked = cafe("ref", "Liked Cafe", 4.5, Coord { x: 0.0, y: 0.0 }).with_price_level(2);
    SearchRequest::new("visitor", vec![liked], Destination::new("lisbon", CENTER))
}

fn run(
    provider: StubPlaceProvider,
    request: &SearchRequest,
    suppression: &Suppression,
) -> (
    Result<SearchResultSet, SearchError>,
    SearchOrchestrator<StubPlaceProvider>,
) {
    let orchestrator = SearchOrchestrator::new(provider).with_config(OrchestratorConfig {
        details_timeout: Duration::from_millis(50),
        ..OrchestratorConfig::default()
    });
    let result = block_on(orchestrator.run(request, suppression));
    (result, orchestrator)
}

fn ids(candidates: &[ScoredCandidate]) -> Vec<&str> {
    candidates.iter().map(ScoredCandidate::id).collect()
}

#[rstest]
fn drops_results_without_id_or_rating(request: SearchRequest) {
    let provider = StubPlaceProvider::with_places(vec![
        cafe("a", "A", 4.0, at(0.01)),
        cafe("", "No Id", 4.0, at(0.01)),
        Place::new("unrated", "Unrated", at(0.01)),
    ]);
    let (result, _) = run(provider, &request, &Suppression::default());
    let set = result.expect("search succeeds");
    assert_eq!(ids(&set.all), ["a"]);
}

#[rstest]
fn hard_filter_drops_excluded_ids(request: SearchRequest) {
    let provider = StubPlaceProvider::with_places(vec![
        cafe("a", "A", 4.0, at(0.01)),
        cafe("b", "B", 4.0, at(0.01)),
        cafe("c", "C", 4.0, at(0.01)),
    ]);
    let suppression = Suppression {
        exclude: HashSet::from(["a".to_owned()]),
        seen: HashSet::new(),
    };
    let request = request.with_excluded(["c"]);
    let (result, _) = run(provider, &request, &suppression);
    assert_eq!(ids(&result.expect("search succeeds").all), ["b"]);
}

#[rstest]
fn passes_page_size_and_continuation_through(request: SearchRequest) {
    let provider = StubPlaceProvider::default().with_page(
        Some("page-2"),
        vec![cafe("a", "A", 4.0, at(0.01))],
        Some("page-3"),
    );
    let request = request.with_continuation("page-2");
    let (result, orchestrator) = run(provider, &request, &Suppression::default());
    let set = result.expect("search succeeds");
    assert_eq!(set.continuation_token.as_deref(), Some("page-3"));
    assert!(set.has_more);

    let queries = orchestrator.provider().queries();
    let query = queries.first().expect("one query issued");
    assert_eq!(query.page_size, 20);
    assert_eq!(query.continuation.as_deref(), Some("page-2"));
    assert!(matches!(query.constraint, GeoConstraint::Circle { radius_km, .. } if radius_km == 5.0));
}

#[rstest]
fn provider_failure_is_fatal(request: SearchRequest) {
    let provider = StubPlaceProvider::with_places(vec![cafe("a", "A", 4.0, at(0.01))])
        .failing_search(ProviderError::ServiceError {
            code: "RESOURCE_EXHAUSTED".to_owned(),
            message: "quota".to_owned(),
        });
    let (result, _) = run(provider, &request, &Suppression::default());
    assert!(matches!(
        result,
        Err(SearchError::Provider(ProviderError::ServiceError { .. }))
    ));
}

#[rstest]
fn invalid_request_is_rejected_before_searching(mut request: SearchRequest) {
    request.references.clear();
    let (result, orchestrator) = run(StubPlaceProvider::default(), &request, &Suppression::default());
    assert!(matches!(result, Err(SearchError::InvalidRequest(_))));
    assert!(orchestrator.provider().queries().is_empty());
}

#[rstest]
fn details_are_merged_and_failures_degrade(request: SearchRequest) {
    let patio = PlaceDetails {
        amenities: Amenities {
            outdoor_seating: Some(true),
            ..Amenities::default()
        },
        ..PlaceDetails::default()
    };
    let provider = StubPlaceProvider::with_places(vec![
        cafe("plain", "Plain", 4.0, at(0.01)),
        cafe("patio", "Patio", 4.0, at(0.01)),
        cafe("broken", "Broken", 4.0, at(0.01)),
        cafe("slow", "Slow", 4.0, at(0.01)),
    ])
    .with_details("patio", DetailsReply::Found(patio))
    .with_details(
        "broken",
        DetailsReply::Fail(ProviderError::ParseError {
            message: "bad body".to_owned(),
        }),
    )
    .with_details("slow", DetailsReply::Hang);

    let (result, orchestrator) = run(provider, &request, &Suppression::default());
    let set = result.expect("search succeeds despite details failures");
    assert_eq!(ids(&set.all), ["patio", "plain", "broken", "slow"]);
    let top = set.all.first().expect("ranked candidate");
    assert!(top.matched_reasons.iter().any(|r| r == "Outdoor seating"));
    assert_eq!(orchestrator.provider().details_requests().len(), 4);
}

#[rstest]
fn seen_candidates_are_halved_and_reranked(request: SearchRequest) {
    let provider = StubPlaceProvider::with_places(vec![
        cafe("seen", "Seen", 4.5, at(0.01)),
        cafe("fresh", "Fresh", 4.0, at(0.01)),
    ]);
    let suppression = Suppression {
        exclude: HashSet::new(),
        seen: HashSet::from(["seen".to_owned()]),
    };
    let (result, _) = run(provider, &request, &suppression);
    let set = result.expect("search succeeds");
    assert_eq!(ids(&set.all), ["fresh", "seen"]);
    let seen = set.all.last().expect("seen candidate kept");
    assert!(seen.seen_before);
    assert!((seen.score - (9.0 + 10.0) / 2.0).abs() < 1e-9);
}

#[rstest]
fn displays_top_five_with_distances(request: SearchRequest) {
    let places: Vec<Place> = (0..8_u8)
        .map(|i| {
            let rating = 4.9 - f32::from(i) * 0.1;
            cafe(&format!("p{i}"), "Cafe", rating, at(0.01 * f64::from(i)))
        })
        .collect();
    let (result, _) = run(
        StubPlaceProvider::with_places(places),
        &request,
        &Suppression::default(),
    );
    let set = result.expect("search succeeds");
    assert_eq!(ids(&set.displayed), ["p0", "p1", "p2", "p3", "p4"]);
    assert_eq!(set.all.len(), 8);
    assert!(set.has_more);
    assert!(set.continuation_token.is_none());
    let first = set.displayed.first().and_then(|c| c.distance_km);
    assert_eq!(first, Some(0.0));
    assert!(set.all.windows(2).all(|w| w[0].score >= w[1].score));
}

fn area_request(request: SearchRequest) -> SearchRequest {
    let bounds = Rect::new(
        Coord { x: -9.23, y: 38.69 },
        Coord { x: -9.09, y: 38.80 },
    );
    SearchRequest {
        destination: Destination::new("lisbon", CENTER)
            .with_kinds(["locality"])
            .with_viewport(bounds)
            .with_area_id("area-lisbon"),
        ..request
    }
}

#[rstest]
fn area_verification_drops_leaked_candidates(request: SearchRequest) {
    let inside = at(0.01);
    let outside = at(0.02);
    let unknown = at(0.03);
    let provider = StubPlaceProvider::with_places(vec![
        cafe("inside", "Inside", 4.0, inside),
        cafe("outside", "Outside", 4.0, outside),
        cafe("unknown", "Unknown", 4.0, unknown),
    ])
    .with_areas(inside, Ok(vec![AreaRef::new("area-lisbon")]))
    .with_areas(outside, Ok(vec![AreaRef::new("area-almada")]))
    .with_areas(
        unknown,
        Err(ProviderError::NetworkError {
            url: "geocode".to_owned(),
            message: "reset".to_owned(),
        }),
    );
    let (result, orchestrator) = run(provider, &area_request(request), &Suppression::default());
    let set = result.expect("partial lookup failures are tolerated");
    assert_eq!(ids(&set.all), ["inside", "unknown"]);
    assert!(matches!(
        orchestrator.provider().queries().first().map(|q| &q.constraint),
        Some(GeoConstraint::Rectangle { .. })
    ));
}

#[rstest]
fn area_verification_failing_everywhere_is_fatal(request: SearchRequest) {
    let spot = at(0.01);
    let provider = StubPlaceProvider::with_places(vec![cafe("a", "A", 4.0, spot)]).with_areas(
        spot,
        Err(ProviderError::Timeout {
            url: "geocode".to_owned(),
            timeout_secs: 3,
        }),
    );
    let (result, _) = run(provider, &area_request(request), &Suppression::default());
    assert!(matches!(
        result,
        Err(SearchError::Provider(ProviderError::Timeout { .. }))
    ));
}
