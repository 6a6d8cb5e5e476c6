pub mod arr;
pub mod error;
pub mod factory;
pub mod http;
pub mod overseerr;
pub mod payload;
pub mod radarr;
pub mod sonarr;
pub mod tautulli;
pub mod traits;

pub use error::SourceError;
pub use factory::{SourceFactory, SourceFactoryRegistry};
pub use overseerr::OverseerrClient;
pub use payload::{MediaRequest, PlayRecord, PlayTarget, RemoteEpisode, RemoteMovie, RemoteSeries, SourcePayload};
pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;
pub use tautulli::TautulliClient;
pub use traits::CatalogSource;
