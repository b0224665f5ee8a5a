use std::sync::Arc;

use rmp_types::ProfessorRecord;
use serde::{Deserialize, Serialize};

/// GET / response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// POST /professors/basic and /professors/details request
#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<String>,
}

/// POST /professors/search request
#[derive(Debug, Deserialize)]
pub struct NamesRequest {
    pub names: Vec<String>,
}

/// Detail record as returned to clients, with a link to the public page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorDetail {
    #[serde(flatten)]
    pub record: Arc<ProfessorRecord>,
    /// `None` when the id does not follow the node id format
    pub profile_url: Option<String>,
}

impl From<Arc<ProfessorRecord>> for ProfessorDetail {
    fn from(record: Arc<ProfessorRecord>) -> Self {
        let profile_url = rmp_types::profile_url(&record.id).ok();
        Self {
            record,
            profile_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmp_types::RatingRecord;

    fn sample_record() -> ProfessorRecord {
        ProfessorRecord {
            id: "VGVhY2hlci01MDEy".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            avg_rating: 4.5,
            avg_difficulty: 3.0,
            would_take_again_percent: None,
            ratings: vec![RatingRecord {
                helpful_rating: 5.0,
                difficulty_rating: 2.0,
                clarity_rating: 4.0,
                comment: "Clear".into(),
            }],
        }
    }

    #[test]
    fn test_detail_is_flat_with_profile_url() {
        let detail = ProfessorDetail::from(Arc::new(sample_record()));
        let value = serde_json::to_value(&detail).unwrap();

        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["ratings"][0]["comment"], "Clear");
        assert_eq!(
            value["profileUrl"],
            "https://www.ratemyprofessors.com/professor/5012"
        );
    }

    #[test]
    fn test_detail_with_unusual_id() {
        let mut record = sample_record();
        record.id = "not-base64!".into();
        let detail = ProfessorDetail::from(Arc::new(record));

        assert!(detail.profile_url.is_none());
    }

    #[test]
    fn test_ids_request_parses() {
        let req: IdsRequest = serde_json::from_str(r#"{"ids": ["a", "b"]}"#).unwrap();
        assert_eq!(req.ids, vec!["a", "b"]);
    }
}
