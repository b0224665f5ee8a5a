//! rmp-types: Records returned by the Rate My Professors graph API
//!
//! Shared between rmp-client (decodes them from upstream JSON) and
//! prof-chat (formats them into prompts and API responses).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Base URL of human-facing professor pages.
pub const PROFILE_BASE_URL: &str = "https://www.ratemyprofessors.com/professor";

/// Length of the type prefix inside a decoded identifier ("Teacher-").
const ID_PREFIX_LEN: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier is not valid base64: {0}")]
    Base64(String),

    #[error("decoded identifier is not UTF-8")]
    Utf8,

    #[error("identifier '{0}' has no numeric suffix")]
    MissingSuffix(String),
}

/// A required field was absent (or mistyped) in an upstream record.
#[derive(Error, Debug)]
#[error("failed to decode {record}: {reason}")]
pub struct DecodeError {
    pub record: &'static str,
    pub reason: String,
}

impl DecodeError {
    pub fn new(record: &'static str, reason: impl ToString) -> Self {
        Self {
            record,
            reason: reason.to_string(),
        }
    }
}

/// One student review.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub helpful_rating: f64,
    pub difficulty_rating: f64,
    pub clarity_rating: f64,
    #[serde(default)]
    pub comment: String,
}

/// Aggregate profile of one professor plus their most relevant reviews.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub avg_rating: f64,
    pub avg_difficulty: f64,
    /// Older schema revisions omit this; upstream reports -1 when unknown.
    #[serde(default)]
    pub would_take_again_percent: Option<f64>,
    /// Upstream order is preserved.
    #[serde(deserialize_with = "from_edges")]
    pub ratings: Vec<RatingRecord>,
}

impl ProfessorRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// `None` when upstream has no data (absent or negative).
    pub fn would_take_again(&self) -> Option<f64> {
        self.would_take_again_percent.filter(|p| *p >= 0.0)
    }
}

/// Name-only projection used to resolve references before a detailed fetch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BasicProfessorRecord {
    pub first_name: String,
    pub last_name: String,
}

/// Best match for a free-text name search within one school.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorSearchHit {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub department: String,
}

#[derive(Deserialize)]
struct Edges<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Deserialize)]
struct Edge<T> {
    node: T,
}

/// Flattens the upstream `{ edges: [{ node }] }` connection shape.
fn from_edges<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let connection = Edges::<T>::deserialize(deserializer)?;
    Ok(connection.edges.into_iter().map(|e| e.node).collect())
}

/// Numeric profile id embedded in an upstream identifier.
///
/// Identifiers are base64 of `"<Type>-<number>"`; the type prefix is
/// always eight characters (`Teacher-`), so everything after it is the id.
/// The prefix is counted in characters, not bytes.
pub fn numeric_id(id: &str) -> Result<String, IdError> {
    let bytes = STANDARD
        .decode(id)
        .map_err(|e| IdError::Base64(e.to_string()))?;
    let decoded = String::from_utf8(bytes).map_err(|_| IdError::Utf8)?;

    let suffix: String = decoded.chars().skip(ID_PREFIX_LEN).collect();
    if suffix.is_empty() {
        return Err(IdError::MissingSuffix(decoded));
    }
    Ok(suffix)
}

/// Public profile page for an upstream identifier.
pub fn profile_url(id: &str) -> Result<String, IdError> {
    Ok(format!("{}/{}", PROFILE_BASE_URL, numeric_id(id)?))
}

/// Encode a raw node id such as `"School-1452"` the way upstream expects it.
pub fn encode_node_id(raw: &str) -> String {
    STANDARD.encode(raw.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upstream_professor() -> serde_json::Value {
        json!({
            "id": "VGVhY2hlci01MDEy",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "avgRating": 4.5,
            "avgDifficulty": 3.1,
            "wouldTakeAgainPercent": 87.5,
            "ratings": {
                "edges": [
                    { "node": { "comment": "Great", "helpfulRating": 5, "difficultyRating": 3, "clarityRating": 5 } },
                    { "node": { "comment": "", "helpfulRating": 2, "difficultyRating": 4, "clarityRating": 1 } }
                ]
            }
        })
    }

    #[test]
    fn test_numeric_id_from_teacher_id() {
        let id = encode_node_id("Teacher-5012");
        assert_eq!(numeric_id(&id).unwrap(), "5012");
    }

    #[test]
    fn test_profile_url() {
        let url = profile_url("VGVhY2hlci01MDEy").unwrap();
        assert_eq!(url, "https://www.ratemyprofessors.com/professor/5012");
    }

    #[test]
    fn test_numeric_id_rejects_invalid_base64() {
        assert!(matches!(numeric_id("not base64!"), Err(IdError::Base64(_))));
    }

    #[test]
    fn test_numeric_id_rejects_bare_prefix() {
        let id = encode_node_id("Teacher-");
        assert!(matches!(numeric_id(&id), Err(IdError::MissingSuffix(_))));
    }

    #[test]
    fn test_numeric_id_prefix_counts_characters() {
        // "Prüfer-X" is eight characters but nine bytes.
        let id = encode_node_id("Prüfer-X123");
        assert_eq!(numeric_id(&id).unwrap(), "123");
    }

    #[test]
    fn test_encode_school_id() {
        assert_eq!(encode_node_id("School-1452"), "U2Nob29sLTE0NTI=");
    }

    #[test]
    fn test_professor_flattens_rating_edges() {
        let record: ProfessorRecord = serde_json::from_value(upstream_professor()).unwrap();
        assert_eq!(record.full_name(), "Ada Lovelace");
        assert_eq!(record.ratings.len(), 2);
        assert_eq!(record.ratings[0].comment, "Great");
        assert_eq!(record.ratings[1].clarity_rating, 1.0);
    }

    #[test]
    fn test_professor_without_would_take_again() {
        let mut value = upstream_professor();
        value.as_object_mut().unwrap().remove("wouldTakeAgainPercent");

        let record: ProfessorRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.would_take_again(), None);
    }

    #[test]
    fn test_negative_would_take_again_means_unknown() {
        let mut value = upstream_professor();
        value["wouldTakeAgainPercent"] = json!(-1);

        let record: ProfessorRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.would_take_again(), None);
    }

    #[test]
    fn test_professor_missing_ratings_fails() {
        let mut value = upstream_professor();
        value.as_object_mut().unwrap().remove("ratings");

        assert!(serde_json::from_value::<ProfessorRecord>(value).is_err());
    }

    #[test]
    fn test_professor_serializes_flat_ratings() {
        let record: ProfessorRecord = serde_json::from_value(upstream_professor()).unwrap();
        let out = serde_json::to_value(&record).unwrap();

        assert_eq!(out["ratings"][0]["helpfulRating"], json!(5.0));
        assert_eq!(out["firstName"], json!("Ada"));
    }
}
