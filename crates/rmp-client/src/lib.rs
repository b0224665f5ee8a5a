//! rmp-client: Professor lookups against the Rate My Professors graph API
//!
//! Builds escaped queries, sends them through a [`Transport`], recovers
//! caller order from batched responses and caches detail records so
//! repeated questions about the same professor cost no upstream call.
//!
//! ```text
//! Retriever ─► ProfessorCache ─(miss)─► query ─► UpstreamClient ─► reorder ─► cache insert
//! ```

pub mod cache;
pub mod query;
pub mod reorder;
pub mod retriever;
pub mod transport;

pub use cache::{DEFAULT_CACHE_CAPACITY, ProfessorCache};
pub use query::DEFAULT_RATING_LIMIT;
pub use retriever::{DEFAULT_SCHOOL, NotFound, Retriever, RetrieverConfig};
pub use transport::{
    DEFAULT_ENDPOINT, HttpTransport, Transport, TransportError, UpstreamClient, UpstreamError,
};
