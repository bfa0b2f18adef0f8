use crate::store::{AnimalRecord, Snapshot, SubmitOutcome};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub inserted: bool,
    pub message: String,
}

impl SubmitResponse {
    pub fn from_outcome(outcome: SubmitOutcome, wipe_interval: Duration) -> Self {
        let message = if outcome.inserted {
            format!(
                "Data will be automatically deleted in {} seconds",
                wipe_interval.as_secs()
            )
        } else {
            "Duplicate animal ignored".to_string()
        };

        Self {
            success: true,
            inserted: outcome.inserted,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub animals: Vec<AnimalRecord>,
    pub total: usize,
}

impl From<Snapshot> for ListResponse {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            success: true,
            animals: snapshot.animals,
            total: snapshot.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_messages() {
        let inserted =
            SubmitResponse::from_outcome(SubmitOutcome { inserted: true }, Duration::from_secs(40));
        assert_eq!(inserted.message, "Data will be automatically deleted in 40 seconds");

        let duplicate =
            SubmitResponse::from_outcome(SubmitOutcome { inserted: false }, Duration::from_secs(40));
        assert!(duplicate.success);
        assert!(!duplicate.inserted);
        assert_eq!(duplicate.message, "Duplicate animal ignored");
    }

    #[test]
    fn test_list_serializes_camel_case() {
        let response = ListResponse::from(Snapshot {
            animals: vec![AnimalRecord {
                job_id: "j1".to_string(),
                name: "Rex".to_string(),
                generation: "g1".to_string(),
                received_at: 42,
            }],
            total: 1,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["animals"][0]["jobId"], "j1");
        assert_eq!(json["animals"][0]["receivedAt"], 42);
    }
}
