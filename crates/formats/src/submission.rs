//! Crowd-sourced speed-test submissions and their point-feature projection.

use foundation::geo::LonLat;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::geojson::{Feature, FeatureCollection, Geometry};

/// Submission ids arrive as integers from the database and as strings from
/// some exports; both are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionId {
    Int(i64),
    Text(String),
}

impl SubmissionId {
    pub fn to_value(&self) -> Value {
        match self {
            SubmissionId::Int(n) => Value::from(*n),
            SubmissionId::Text(s) => Value::String(s.clone()),
        }
    }
}

/// One speed-test record. Never mutated after it is received.
///
/// The survey answers are accepted under both their dashboard names and the
/// raw survey column names used by the data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "survey_service_type")]
    pub isp_user: Option<String>,
    #[serde(default, alias = "survey_service_type_other")]
    pub other_isp: Option<String>,
    #[serde(default, alias = "survey_current_cost", deserialize_with = "lenient_number")]
    pub cost_of_service: Option<f64>,
    #[serde(default, alias = "survey_subscribe_download", deserialize_with = "lenient_number")]
    pub advertised_download: Option<f64>,
    #[serde(default, alias = "survey_subscribe_upload", deserialize_with = "lenient_number")]
    pub advertised_upload: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub actual_download: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub actual_upload: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub min_rtt: Option<f64>,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("failed to decode submissions: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Submission {
    /// Decodes one feed record. When a record carries both the dashboard name
    /// and the raw survey column for a field, the dashboard name wins.
    pub fn from_record(mut record: Value) -> Result<Self, serde_json::Error> {
        if let Some(fields) = record.as_object_mut() {
            for (name, column) in SURVEY_COLUMNS {
                if fields.contains_key(name) {
                    fields.remove(column);
                }
            }
        }
        serde_json::from_value(record)
    }

    pub fn new(id: SubmissionId, longitude: f64, latitude: f64) -> Self {
        Self {
            id,
            latitude,
            longitude,
            isp_user: None,
            other_isp: None,
            cost_of_service: None,
            advertised_download: None,
            advertised_upload: None,
            actual_download: None,
            actual_upload: None,
            min_rtt: None,
        }
    }

    pub fn position(&self) -> LonLat {
        LonLat::new(self.longitude, self.latitude)
    }

    /// Measurement fields as feature properties. Missing measurements are left
    /// out so that `has` expressions see them as absent.
    pub fn properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("id".to_string(), self.id.to_value());

        let text = [
            ("isp_user", &self.isp_user),
            ("other_isp", &self.other_isp),
        ];
        for (key, value) in text {
            if let Some(v) = value {
                props.insert(key.to_string(), Value::String(v.clone()));
            }
        }

        let numbers = [
            ("cost_of_service", self.cost_of_service),
            ("advertised_download", self.advertised_download),
            ("advertised_upload", self.advertised_upload),
            ("actual_download", self.actual_download),
            ("actual_upload", self.actual_upload),
            ("min_rtt", self.min_rtt),
        ];
        for (key, value) in numbers {
            // Non-finite values have no JSON representation.
            if let Some(n) = value.and_then(serde_json::Number::from_f64) {
                props.insert(key.to_string(), Value::Number(n));
            }
        }

        props
    }

    pub fn to_point_feature(&self) -> Feature {
        Feature::new(Geometry::Point(self.position()), self.properties())
    }
}

/// Dashboard field name and the raw survey column it may arrive as.
const SURVEY_COLUMNS: [(&str, &str); 5] = [
    ("isp_user", "survey_service_type"),
    ("other_isp", "survey_service_type_other"),
    ("cost_of_service", "survey_current_cost"),
    ("advertised_download", "survey_subscribe_download"),
    ("advertised_upload", "survey_subscribe_upload"),
];

/// Survey answers are free-form: numbers may arrive as strings, and answers
/// that are not numbers at all ("don't know") count as unanswered.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Answer {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Answer>::deserialize(deserializer)? {
        Some(Answer::Number(n)) => Some(n),
        Some(Answer::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Decodes a JSON array of submissions as delivered by the data feed.
///
/// `null` decodes to `None`: the feed has not delivered anything yet. Records
/// that cannot be decoded are logged and skipped; only a payload that is not
/// an array at all is an error.
pub fn submissions_from_json_str(payload: &str) -> Result<Option<Vec<Submission>>, SubmissionError> {
    let Some(records) = serde_json::from_str::<Option<Vec<Value>>>(payload)? else {
        return Ok(None);
    };
    let total = records.len();
    let submissions: Vec<Submission> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match Submission::from_record(record) {
            Ok(submission) => Some(submission),
            Err(e) => {
                warn!("skipping submission record {index}: {e}");
                None
            }
        })
        .collect();
    if submissions.len() < total {
        warn!("decoded {} of {total} submission records", submissions.len());
    }
    Ok(Some(submissions))
}

/// Builds the point collection for a submission sequence.
///
/// Absent submissions mean "no data yet" and produce no collection. Order is
/// preserved, one feature per submission.
pub fn to_point_collection(submissions: Option<&[Submission]>) -> Option<FeatureCollection> {
    let submissions = submissions?;
    Some(FeatureCollection::new(
        submissions.iter().map(Submission::to_point_feature).collect(),
    ))
}
