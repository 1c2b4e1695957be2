// Resolver module - turns a page URL into media info with direct format URLs
//
// The parser talks to resolvers through the `MediaResolver` trait, so tests
// and alternative backends can stand in for the youtube-dl binary.

mod cli;
mod traits;

pub use cli::YoutubeDlResolver;
pub use traits::MediaResolver;
