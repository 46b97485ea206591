//! Behavioural tests for the HTTP collaborators against a mock server.

use std::cell::RefCell;

use geo::Coord;
use kindred_core::{
    ExplanationError, ExplanationGenerator, ExplanationInput, GeoConstraint, Place, PlaceDetails,
    PlaceSearchProvider, ProviderError, ProviderQuery, SearchPage,
};
use kindred_data::{
    HttpExplanationGenerator, HttpExplanationGeneratorConfig, HttpPlaceProvider,
    HttpPlaceProviderConfig,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

struct HttpWorld {
    server: RefCell<ServerGuard>,
    mocks: RefCell<Vec<Mock>>,
    search: RefCell<Option<Result<SearchPage, ProviderError>>>,
    details: RefCell<Option<Result<PlaceDetails, ProviderError>>>,
    explanations: RefCell<Option<Result<Vec<String>, ExplanationError>>>,
}

impl HttpWorld {
    fn mock(&self, mock: Mock) {
        self.mocks.borrow_mut().push(mock);
    }

    fn provider(&self) -> HttpPlaceProvider {
        HttpPlaceProvider::with_config(
            HttpPlaceProviderConfig::new(self.server.borrow().url()).with_api_key("test-key"),
        )
        .expect("provider should build")
    }

    fn generator(&self) -> HttpExplanationGenerator {
        HttpExplanationGenerator::with_config(
            HttpExplanationGeneratorConfig::new(self.server.borrow().url()).with_api_key("llm-key"),
        )
        .expect("generator should build")
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
fn world() -> HttpWorld {
    HttpWorld {
        server: RefCell::new(Server::new()),
        mocks: RefCell::new(Vec::new()),
        search: RefCell::new(None),
        details: RefCell::new(None),
        explanations: RefCell::new(None),
    }
}

#[given("a places API answering search with two cafes")]
fn search_ok(world: &HttpWorld) {
    let body = json!({
        "places": [
            {"id": "p1", "displayName": {"text": "Copper Cup"},
             "location": {"latitude": 38.71, "longitude": -9.13},
             "types": ["cafe"], "rating": 4.4},
            {"id": "p2", "displayName": {"text": "Rua Roasters"},
             "location": {"latitude": 38.72, "longitude": -9.15},
             "types": ["cafe", "bakery"], "rating": 4.7,
             "priceLevel": "PRICE_LEVEL_INEXPENSIVE"}
        ],
        "nextPageToken": "page-2"
    });
    let mock = world
        .server
        .borrow_mut()
        .mock("POST", "/v1/places:searchText")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({"textQuery": "cafe", "pageSize": 20})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create();
    world.mock(mock);
}

#[given("a places API rejecting search with RESOURCE_EXHAUSTED")]
fn search_quota(world: &HttpWorld) {
    let body = json!({
        "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
    });
    let mock = world
        .server
        .borrow_mut()
        .mock("POST", "/v1/places:searchText")
        .with_status(429)
        .with_body(body.to_string())
        .create();
    world.mock(mock);
}

#[given("a places API with details for {id}")]
fn details_ok(world: &HttpWorld, id: String) {
    let path = format!("/v1/places/{}", id.trim_matches('"'));
    let body = json!({
        "outdoorSeating": true,
        "editorialSummary": {"text": "Sunny terrace."}
    });
    let mock = world
        .server
        .borrow_mut()
        .mock("GET", path.as_str())
        .match_header("x-goog-fieldmask", Matcher::Regex("outdoorSeating".to_owned()))
        .with_status(200)
        .with_body(body.to_string())
        .create();
    world.mock(mock);
}

#[given("a chat API answering with two sentences")]
fn chat_ok(world: &HttpWorld) {
    let content = json!({"explanations": ["Cosy like home.", "Bright and airy."]}).to_string();
    let body = json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    });
    let mock = world
        .server
        .borrow_mut()
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer llm-key")
        .with_status(200)
        .with_body(body.to_string())
        .create();
    world.mock(mock);
}

#[given("a chat API failing with status {status}")]
fn chat_fails(world: &HttpWorld, status: usize) {
    let mock = world
        .server
        .borrow_mut()
        .mock("POST", "/v1/chat/completions")
        .with_status(status)
        .with_body("upstream overloaded")
        .create();
    world.mock(mock);
}

#[when("the provider searches for {text}")]
fn searches(world: &HttpWorld, text: String) {
    let query = ProviderQuery {
        text: text.trim_matches('"').to_owned(),
        constraint: GeoConstraint::Circle {
            center: Coord { x: -9.14, y: 38.72 },
            radius_km: 5.0,
        },
        page_size: 20,
        continuation: None,
    };
    let provider = world.provider();
    world.search.replace(Some(block_on(provider.search(&query))));
}

#[when("the provider fetches details for {id}")]
fn fetches_details(world: &HttpWorld, id: String) {
    let provider = world.provider();
    let outcome = block_on(provider.fetch_details(id.trim_matches('"')));
    world.details.replace(Some(outcome));
}

#[when("explanations are requested for two candidates")]
fn explains(world: &HttpWorld) {
    let source = Place::new("s", "Morning Roast", Coord { x: 0.0, y: 0.0 });
    let candidates: Vec<ExplanationInput> = ["Copper Cup", "Rua Roasters"]
        .into_iter()
        .map(|name| ExplanationInput {
            id: name.to_lowercase(),
            name: name.to_owned(),
            rating: Some(4.5),
            price_level: Some(2),
            matched_reasons: vec!["Similar price".to_owned()],
            category_overlap: None,
            editorial_summary: None,
        })
        .collect();
    let generator = world.generator();
    let outcome = block_on(generator.explain(&source, &candidates));
    world.explanations.replace(Some(outcome));
}

#[then("{count} places are returned")]
fn places_returned(world: &HttpWorld, count: usize) {
    let search = world.search.borrow();
    let page = search
        .as_ref()
        .expect("search ran")
        .as_ref()
        .expect("search succeeded");
    assert_eq!(page.places.len(), count);
    let second = page.places.get(1).expect("second place");
    assert_eq!(second.price_level, Some(1));
    assert!(second.categories.contains("bakery"));
}

#[then("the next page token is {token}")]
fn next_token(world: &HttpWorld, token: String) {
    let search = world.search.borrow();
    let page = search
        .as_ref()
        .expect("search ran")
        .as_ref()
        .expect("search succeeded");
    assert_eq!(page.next_page_token.as_deref(), Some(token.trim_matches('"')));
}

#[then("the search fails with service code {code}")]
fn service_code(world: &HttpWorld, code: String) {
    let search = world.search.borrow();
    match search.as_ref().expect("search ran") {
        Err(ProviderError::ServiceError { code: got, message }) => {
            assert_eq!(got, code.trim_matches('"'));
            assert_eq!(message, "Quota exceeded");
        }
        other => panic!("expected a service error, got {other:?}"),
    }
}

#[then("the details report outdoor seating")]
fn details_outdoor(world: &HttpWorld) {
    let details = world.details.borrow();
    let fetched = details
        .as_ref()
        .expect("details ran")
        .as_ref()
        .expect("details succeeded");
    assert_eq!(fetched.amenities.outdoor_seating, Some(true));
    assert_eq!(fetched.editorial_summary.as_deref(), Some("Sunny terrace."));
    assert!(fetched.photos.is_none());
}

#[then("the sentences are {first} then {second}")]
fn sentences(world: &HttpWorld, first: String, second: String) {
    let explanations = world.explanations.borrow();
    let got = explanations
        .as_ref()
        .expect("generator ran")
        .as_ref()
        .expect("generator succeeded");
    assert_eq!(got, &[first.trim_matches('"'), second.trim_matches('"')]);
}

#[then("the generator is reported unavailable")]
fn generator_unavailable(world: &HttpWorld) {
    let explanations = world.explanations.borrow();
    assert!(matches!(
        explanations.as_ref().expect("generator ran"),
        Err(ExplanationError::Unavailable { .. })
    ));
}

#[scenario(path = "tests/features/http_collaborators.feature", index = 0)]
fn text_search_decodes(world: HttpWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/http_collaborators.feature", index = 1)]
fn quota_rejection(world: HttpWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/http_collaborators.feature", index = 2)]
fn details_carry_amenities(world: HttpWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/http_collaborators.feature", index = 3)]
fn explanations_in_order(world: HttpWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/http_collaborators.feature", index = 4)]
fn chat_failure(world: HttpWorld) {
    let _ = world;
}
