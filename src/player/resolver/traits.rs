// MediaResolver trait

use async_trait::async_trait;

use crate::player::errors::ParserError;
use crate::player::models::MediaInfo;

/// Trait for media resolvers
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Name of the resolver (for logging)
    fn name(&self) -> &'static str;

    /// Check if this resolver can run
    fn is_available(&self) -> bool;

    /// Resolve `url` into media info using youtube-dl style `options`
    async fn resolve(&self, url: &str, options: &str) -> Result<MediaInfo, ParserError>;
}
