//! Platform catalogs, placement rules and the placed-platform records.

pub mod catalog;
pub mod placement;
pub mod types;

pub use catalog::{weighted_pick, CandidateCatalog, CatalogSlot, SpawnCandidate};
pub use placement::{PlacementEngine, PlacementOutcome, SkyLayerParams};
pub use types::{ArenaMarkers, LayerDescriptor, PlacedPlatform, PlatformLayer, SkyLayerReport, SpawnTrial};
