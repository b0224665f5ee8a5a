use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use rmp_types::{BasicProfessorRecord, DecodeError, ProfessorRecord, ProfessorSearchHit};

use crate::cache::ProfessorCache;
use crate::query::{
    DEFAULT_RATING_LIMIT, build_multi_basic_query, build_multi_detail_query,
    build_multi_search_query, build_single_query,
};
use crate::reorder::reorder_exact;
use crate::transport::{Transport, UpstreamClient, UpstreamError};

/// Raw id of the school name searches are scoped to.
pub const DEFAULT_SCHOOL: &str = "School-1452";

/// The only failure exposed by [`Retriever`]: every upstream, parse and
/// validation failure collapses into it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("professor data not found")]
pub struct NotFound;

#[derive(Clone, Debug)]
pub struct RetrieverConfig {
    /// Ratings requested per professor
    pub rating_limit: u32,
    /// Base64-encoded school node id used by name search
    pub school_id: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            rating_limit: DEFAULT_RATING_LIMIT,
            school_id: rmp_types::encode_node_id(DEFAULT_SCHOOL),
        }
    }
}

/// Professor lookups: single with course fallback, batched basic info,
/// batched details with partial cache hits, and name search.
///
/// The cache is only written after a complete, decoded response, so a
/// dropped (cancelled) call never leaves partial state behind. Concurrent
/// misses for the same id may both fetch; the later insert overwrites with
/// an equivalent record.
#[derive(Debug)]
pub struct Retriever<T> {
    upstream: UpstreamClient<T>,
    cache: ProfessorCache,
    config: RetrieverConfig,
}

impl<T: Transport> Retriever<T> {
    pub fn new(transport: T, cache: ProfessorCache, config: RetrieverConfig) -> Self {
        Self {
            upstream: UpstreamClient::new(transport),
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &ProfessorCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        self.upstream.transport()
    }

    /// Detail record for one professor, preferring ratings for `course`.
    ///
    /// When the course-filtered query yields no ratings, one unfiltered
    /// query is issued instead.
    pub async fn get_professor(
        &self,
        id: &str,
        course: Option<&str>,
    ) -> Result<Arc<ProfessorRecord>, NotFound> {
        if let Some(hit) = self.cache.get(id) {
            return Ok(hit);
        }
        debug!(id, "no cache for professor");

        let record = self
            .fetch_professor(id, course)
            .await
            .map_err(|e| not_found("get_professor", e))?;

        let record = Arc::new(record);
        self.cache.insert(id.to_owned(), record.clone());
        Ok(record)
    }

    /// Names for several professors in input order; `None` where upstream
    /// knows no such id. Never cached.
    pub async fn get_multi_basic<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<Vec<Option<BasicProfessorRecord>>, NotFound> {
        if ids.is_empty() {
            return Err(NotFound);
        }

        self.fetch_basic(ids)
            .await
            .map_err(|e| not_found("get_multi_basic", e))
    }

    /// Detail records for several professors in input order.
    ///
    /// Cached ids are served locally; the rest go out in one batched query.
    /// If that query fails, the whole call fails, cached ids included.
    pub async fn get_multi_detail<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<Vec<Arc<ProfessorRecord>>, NotFound> {
        if ids.is_empty() {
            return Err(NotFound);
        }

        let mut found: HashMap<&str, Arc<ProfessorRecord>> = HashMap::new();
        let mut uncached: Vec<&str> = Vec::new();

        for id in ids {
            let id: &str = id.as_ref();
            if found.contains_key(id) || uncached.contains(&id) {
                continue;
            }
            match self.cache.get(id) {
                Some(hit) => {
                    found.insert(id, hit);
                }
                None => uncached.push(id),
            }
        }

        if !uncached.is_empty() {
            debug!(ids = %uncached.join(", "), "no cache for professors");

            let fetched = self
                .fetch_details(&uncached)
                .await
                .map_err(|e| not_found("get_multi_detail", e))?;

            for (id, record) in uncached.iter().zip(fetched) {
                let record = Arc::new(record);
                self.cache.insert((*id).to_owned(), record.clone());
                found.insert(*id, record);
            }
        }

        ids.iter()
            .map(|id| {
                let id: &str = id.as_ref();
                found.get(id).cloned().ok_or(NotFound)
            })
            .collect()
    }

    /// Best match per free-text name within the configured school, in
    /// input order; `None` where nothing matched. Never cached.
    pub async fn search_professors<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Option<ProfessorSearchHit>>, NotFound> {
        if names.is_empty() {
            return Err(NotFound);
        }

        self.fetch_search(names)
            .await
            .map_err(|e| not_found("search_professors", e))
    }

    async fn fetch_professor(
        &self,
        id: &str,
        course: Option<&str>,
    ) -> Result<ProfessorRecord, UpstreamError> {
        let record = self.fetch_single(id, course).await?;

        if course.is_some() && record.ratings.is_empty() {
            debug!(id, course, "no ratings for course, retrying unfiltered");
            return self.fetch_single(id, None).await;
        }

        Ok(record)
    }

    async fn fetch_single(
        &self,
        id: &str,
        course: Option<&str>,
    ) -> Result<ProfessorRecord, UpstreamError> {
        let query = build_single_query(id, course, self.config.rating_limit);
        let mut data = self.upstream.execute(&query).await?;

        match data.get_mut("node").map(Value::take) {
            Some(node) if !node.is_null() => Ok(decode("professor", node)?),
            _ => Err(UpstreamError::UnknownId(id.to_owned())),
        }
    }

    async fn fetch_basic<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<Vec<Option<BasicProfessorRecord>>, UpstreamError> {
        let data = self.upstream.execute(&build_multi_basic_query(ids)).await?;

        reorder_exact(data, ids.len())?
            .into_iter()
            .map(|value| -> Result<_, UpstreamError> {
                match value {
                    Value::Null => Ok(None),
                    value => Ok(Some(decode("basic professor", value)?)),
                }
            })
            .collect()
    }

    async fn fetch_details(&self, ids: &[&str]) -> Result<Vec<ProfessorRecord>, UpstreamError> {
        let query = build_multi_detail_query(ids, self.config.rating_limit);
        let data = self.upstream.execute(&query).await?;

        reorder_exact(data, ids.len())?
            .into_iter()
            .zip(ids)
            .map(|(value, id)| -> Result<_, UpstreamError> {
                match value {
                    Value::Null => Err(UpstreamError::UnknownId((*id).to_owned())),
                    value => Ok(decode("professor", value)?),
                }
            })
            .collect()
    }

    async fn fetch_search<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Option<ProfessorSearchHit>>, UpstreamError> {
        let query = build_multi_search_query(names, &self.config.school_id);
        let data = self.upstream.execute(&query).await?;

        reorder_exact(data, names.len())?
            .into_iter()
            .map(|mut value| -> Result<_, UpstreamError> {
                match value.pointer_mut("/teachers/edges/0/node").map(Value::take) {
                    Some(node) if !node.is_null() => Ok(Some(decode("search hit", node)?)),
                    _ => Ok(None),
                }
            })
            .collect()
    }
}

fn decode<R: DeserializeOwned>(record: &'static str, value: Value) -> Result<R, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::new(record, e))
}

fn not_found(operation: &'static str, error: UpstreamError) -> NotFound {
    warn!(operation, error = %error, "upstream lookup failed");
    NotFound
}
