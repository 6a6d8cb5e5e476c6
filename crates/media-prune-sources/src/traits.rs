use async_trait::async_trait;

use crate::error::SourceError;
use crate::payload::SourcePayload;

/// An external service the catalog is built from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Fetch everything this source knows about in one go
    async fn fetch(&self) -> Result<SourcePayload, SourceError>;

    /// One cheap authenticated request. Returns what the service reports
    /// about itself, e.g. its name and version.
    async fn test_connection(&self) -> Result<String, SourceError>;
}
