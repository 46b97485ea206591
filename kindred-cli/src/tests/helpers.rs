//! Test helpers for writing fixtures and wiring a stubbed engine.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use kindred_core::test_support::{StubExplanationGenerator, StubPlaceProvider, cafe};
use kindred_core::{Destination, Place, SearchApi, SearchRequest};
use tempfile::TempDir;

use crate::CliError;
use crate::engine::{EngineBuilder, EngineConfig, assemble};

pub(super) const IDENTITY: &str = "visitor";
pub(super) const DESTINATION: &str = "lisbon";
pub(super) const CENTER: Coord<f64> = Coord { x: -9.14, y: 38.72 };

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write fixture");
}

pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 tempdir");
    (tmp, root)
}

/// Eight rated cafés around the destination, best first.
pub(super) fn nearby_places() -> Vec<Place> {
    (0_u8..8)
        .map(|index| {
            let offset = f64::from(index) * 0.001;
            cafe(
                &format!("p{index}"),
                &format!("Cafe {index}"),
                4.9 - f32::from(index) * 0.1,
                Coord {
                    x: CENTER.x + offset,
                    y: CENTER.y,
                },
            )
            .with_review_count(200)
        })
        .collect()
}

pub(super) fn valid_request() -> SearchRequest {
    let liked = cafe("ref", "Morning Roast", 4.6, Coord { x: 0.0, y: 0.0 });
    SearchRequest::new(IDENTITY, vec![liked], Destination::new(DESTINATION, CENTER))
}

/// Builds the real service over scripted collaborators and the configured
/// on-disk stores.
#[derive(Debug, Default)]
pub(super) struct StubEngineBuilder;

impl EngineBuilder for StubEngineBuilder {
    fn build(&self, config: &EngineConfig) -> Result<Box<dyn SearchApi>, CliError> {
        let provider = StubPlaceProvider::with_places(nearby_places());
        let service = assemble(provider, StubExplanationGenerator::default(), config)?;
        Ok(Box::new(service))
    }
}
