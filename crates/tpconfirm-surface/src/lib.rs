//! Confirmation surfaces: rendering from the configured template, the
//! registry of open surfaces, and asynchronous enrichment of remote data.

pub mod builder;
pub mod dimension;
pub mod enrichment;
pub mod identity;
pub mod placeholder;
pub mod poller;
pub mod registry;
pub mod services;
pub mod template;
pub mod testing;

pub use builder::{ConfirmationSurfaceBuilder, OpenedSurface};
pub use dimension::{DimensionKind, DimensionMaterials};
pub use enrichment::{EnrichmentState, TargetTemplate};
pub use identity::{IdentityApplier, ProfileIdentityApplier, UnsupportedIdentityApplier};
pub use placeholder::{is_placeholder_value, Placeholders};
pub use poller::{EnrichmentPoller, PollerContext, PollerState, PollerStats, PollerStatsSnapshot};
pub use registry::{LiveSurface, SurfaceRegistry};
pub use services::SurfaceServices;
pub use template::{RegionDescriptor, SurfaceTemplate};
