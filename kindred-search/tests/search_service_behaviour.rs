//! Behavioural tests for `SearchService` using rstest-bdd.

use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::time::Duration;

use geo::Coord;
use kindred_core::test_support::{FailingSeenStore, StubExplanationGenerator, StubPlaceProvider, cafe};
use kindred_core::{
    Destination, MemorySearchStateCache, MemorySeenStore, Place, ScoredCandidate, SearchApi,
    SearchRequest, SearchResultSet, SeenStore,
};
use kindred_search::{SearchOrchestrator, SearchService};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;

const IDENTITY: &str = "visitor";
const DESTINATION: &str = "lisbon";
const CENTER: Coord<f64> = Coord { x: -9.14, y: 38.72 };

type Service = SearchService<StubPlaceProvider, StubExplanationGenerator>;

struct ServiceWorld {
    runtime: Runtime,
    memory: Arc<MemorySeenStore>,
    offline: Cell<bool>,
    places: RefCell<Vec<Place>>,
    service: RefCell<Option<Service>>,
    result: RefCell<Option<SearchResultSet>>,
    batch: RefCell<Option<Vec<ScoredCandidate>>>,
}

impl ServiceWorld {
    fn with_service<R>(&self, f: impl FnOnce(&Service) -> R) -> R {
        if self.service.borrow().is_none() {
            let provider = StubPlaceProvider::with_places(self.places.borrow().clone());
            let seen: Arc<dyn SeenStore> = if self.offline.get() {
                Arc::new(FailingSeenStore)
            } else {
                Arc::clone(&self.memory) as Arc<dyn SeenStore>
            };
            let built = SearchService::new(
                SearchOrchestrator::new(provider),
                StubExplanationGenerator::default(),
                seen,
                Arc::new(MemorySearchStateCache::default()),
            );
            self.service.replace(Some(built));
        }
        let borrowed = self.service.borrow();
        let service = borrowed.as_ref().expect("service built above");
        f(service)
    }

    fn search(&self, reference: &str) -> SearchResultSet {
        let liked = cafe(&format!("ref-{reference}"), reference, 4.5, Coord { x: 0.0, y: 0.0 });
        let request = SearchRequest::new(
            IDENTITY,
            vec![liked],
            Destination::new(DESTINATION, CENTER),
        );
        let result = self.with_service(|service| {
            self.runtime
                .block_on(service.search(&request))
                .expect("search succeeds")
        });
        self.result.replace(Some(result.clone()));
        result
    }

    /// Wait for the detached view writes of `count` candidates to land.
    fn wait_for_views(&self, count: usize) {
        for _ in 0..200 {
            let seen = self
                .memory
                .unsaved_seen_ids(IDENTITY, DESTINATION)
                .expect("memory store never fails");
            if seen.len() >= count {
                return;
            }
            self.runtime
                .block_on(async { tokio::time::sleep(Duration::from_millis(10)).await });
        }
        panic!("views were not recorded in time");
    }

    fn displayed(&self) -> Vec<ScoredCandidate> {
        self.result
            .borrow()
            .as_ref()
            .map(|result| result.displayed.clone())
            .expect("a search has run")
    }

    fn cache_key(&self) -> String {
        self.result
            .borrow()
            .as_ref()
            .and_then(|result| result.cache_key.clone())
            .expect("search results carry a cache key")
    }
}

#[fixture]
fn world() -> ServiceWorld {
    ServiceWorld {
        runtime: tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("build runtime"),
        memory: Arc::new(MemorySeenStore::default()),
        offline: Cell::new(false),
        places: RefCell::new(Vec::new()),
        service: RefCell::new(None),
        result: RefCell::new(None),
        batch: RefCell::new(None),
    }
}

#[given("a destination offering {count} cafes")]
fn offering(world: &ServiceWorld, count: u8) {
    let places = (0..count)
        .map(|i| {
            let rating = 4.9 - f32::from(i) * 0.1;
            let location = Coord {
                x: CENTER.x + 0.001 * f64::from(i),
                y: CENTER.y,
            };
            cafe(&format!("p{i}"), &format!("Cafe {i}"), rating, location)
        })
        .collect();
    world.places.replace(places);
}

#[given("the seen store is offline")]
fn offline(world: &ServiceWorld) {
    world.offline.set(true);
}

#[given("the visitor searched with reference {name}")]
fn searched(world: &ServiceWorld, name: String) {
    let displayed = world.search(name.trim_matches('"')).displayed.len();
    world.wait_for_views(displayed);
}

#[given("the visitor saved {id}")]
fn saved(world: &ServiceWorld, id: String) {
    world.with_service(|service| {
        service
            .set_saved(IDENTITY, DESTINATION, id.trim_matches('"'), true)
            .expect("save candidate");
    });
}

#[when("the visitor searches again with reference {name}")]
fn searches_again(world: &ServiceWorld, name: String) {
    world.search(name.trim_matches('"'));
}

#[when("the visitor searches with reference {name}")]
fn searches(world: &ServiceWorld, name: String) {
    world.search(name.trim_matches('"'));
}

#[when("the visitor asks for more")]
fn asks_for_more(world: &ServiceWorld) {
    let key = world.cache_key();
    let batch = world.with_service(|service| world.runtime.block_on(service.get_next_batch(&key)));
    world.batch.replace(batch);
}

#[then("the first displayed candidate is {id}")]
fn first_displayed(world: &ServiceWorld, id: String) {
    let displayed = world.displayed();
    let first = displayed.first().expect("something is displayed");
    assert_eq!(first.id(), id.trim_matches('"'));
}

#[then("candidate {id} carries the seen flag")]
fn carries_seen_flag(world: &ServiceWorld, id: String) {
    let wanted = id.trim_matches('"');
    let result = world.result.borrow();
    let candidate = result
        .as_ref()
        .and_then(|set| set.all.iter().find(|c| c.id() == wanted))
        .expect("candidate is ranked");
    assert!(candidate.seen_before);
}

#[then("candidate {id} is fresh")]
fn is_fresh(world: &ServiceWorld, id: String) {
    let wanted = id.trim_matches('"');
    let result = world.result.borrow();
    let candidate = result
        .as_ref()
        .and_then(|set| set.all.iter().find(|c| c.id() == wanted))
        .expect("candidate is ranked");
    assert!(!candidate.seen_before);
}

#[then("the batch holds {count} candidates")]
fn batch_holds(world: &ServiceWorld, count: usize) {
    let batch = world.batch.borrow();
    let ids: Vec<&str> = batch
        .as_deref()
        .expect("a batch was served")
        .iter()
        .map(ScoredCandidate::id)
        .collect();
    assert_eq!(ids.len(), count);
    assert_eq!(ids, ["p5", "p6", "p7"]);
}

#[then("every batch candidate has an explanation")]
fn batch_explained(world: &ServiceWorld) {
    let batch = world.batch.borrow();
    let candidates = batch.as_deref().expect("a batch was served");
    assert!(candidates.iter().all(|c| {
        c.explanation
            .as_deref()
            .is_some_and(|text| text.ends_with("feels like Morning Roast."))
    }));
}

#[then("asking for more again returns nothing")]
fn exhausted(world: &ServiceWorld) {
    let key = world.cache_key();
    let batch = world.with_service(|service| world.runtime.block_on(service.get_next_batch(&key)));
    assert!(batch.is_none());
}

#[then("{count} candidates are displayed")]
fn displayed_count(world: &ServiceWorld, count: usize) {
    assert_eq!(world.displayed().len(), count);
}

#[then("no displayed candidate carries the seen flag")]
fn nothing_seen(world: &ServiceWorld) {
    assert!(world.displayed().iter().all(|c| !c.seen_before));
}

#[scenario(path = "tests/features/search_service.feature", index = 0)]
fn seen_place_is_down_ranked(world: ServiceWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search_service.feature", index = 1)]
fn saved_place_keeps_score(world: ServiceWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search_service.feature", index = 2)]
fn asking_for_more(world: ServiceWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search_service.feature", index = 3)]
fn seen_store_outage(world: ServiceWorld) {
    let _ = world;
}
