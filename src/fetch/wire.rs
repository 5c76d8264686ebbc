use crate::error::FetchError;
use crate::models::ActivityRecord;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

/// Top-level response body of the schedule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnvelope {
    pub records: Option<Vec<RawRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub fields: RawFields,
}

/// Field bag keyed by the table's column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFields {
    #[serde(rename = "Activity")]
    pub activity: String,
    #[serde(rename = "Start")]
    pub start: DateTime<Utc>,
    #[serde(rename = "End")]
    pub end: DateTime<Utc>,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Speaker(s)", default, skip_serializing_if = "Option::is_none")]
    pub speakers: Option<SpeakerField>,
    #[serde(rename = "Notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The speakers column is either a multi-select (list) or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeakerField {
    Many(Vec<String>),
    One(String),
}

impl SpeakerField {
    /// A list is taken as sent. Free text is treated as a comma-separated
    /// list of trimmed, non-empty names.
    pub fn into_names(self) -> Vec<String> {
        match self {
            Self::Many(names) => names,
            Self::One(text) => text
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }
}

impl From<RawRecord> for ActivityRecord {
    fn from(raw: RawRecord) -> Self {
        let RawRecord { id, fields } = raw;
        ActivityRecord {
            id,
            title: fields.activity,
            start_time: fields.start,
            end_time: fields.end,
            location: fields.location,
            speakers: fields.speakers.map(SpeakerField::into_names).unwrap_or_default(),
            notes: fields.notes.unwrap_or_default(),
        }
    }
}

impl From<&ActivityRecord> for RawRecord {
    fn from(record: &ActivityRecord) -> Self {
        RawRecord {
            id: record.id.clone(),
            fields: RawFields {
                activity: record.title.clone(),
                start: record.start_time,
                end: record.end_time,
                location: record.location.clone(),
                // Absent and empty decode alike, so both are written back
                speakers: Some(SpeakerField::Many(record.speakers.clone())),
                notes: Some(record.notes.clone()),
            },
        }
    }
}

/// Decode a response body into records.
///
/// Any structural mismatch rejects the whole body; a missing or null
/// `records` list is an error, not an empty schedule.
pub fn decode_envelope(body: &[u8]) -> Result<Vec<ActivityRecord>, FetchError> {
    let envelope: RawEnvelope = serde_json::from_slice(body)?;
    let raw_records = envelope
        .records
        .ok_or_else(|| FetchError::decode("response has no `records` list"))?;

    let records: Vec<ActivityRecord> = raw_records.into_iter().map(ActivityRecord::from).collect();

    for record in records.iter().filter(|r| !r.has_valid_time_range()) {
        warn!(
            "[Schedule] Activity '{}' ({}) ends before it starts: {} > {}",
            record.title,
            record.id,
            record.start_time.to_rfc3339(),
            record.end_time.to_rfc3339()
        );
    }

    Ok(records)
}

/// Inverse of `decode_envelope`, for fixtures and diagnostics.
pub fn encode_envelope(records: &[ActivityRecord]) -> RawEnvelope {
    RawEnvelope {
        records: Some(records.iter().map(RawRecord::from).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_decode_keynote() {
        let records = decode_envelope(&body(json!({
            "records": [{
                "id": "r1",
                "createdTime": "2024-01-20T12:00:00.000Z",
                "fields": {
                    "Activity": "Keynote",
                    "Start": "2024-02-08T09:00:00.000Z",
                    "End": "2024-02-08T10:00:00.000Z",
                    "Location": "Main Hall"
                }
            }]
        })))
        .unwrap();

        assert_eq!(
            records,
            vec![ActivityRecord {
                id: "r1".to_string(),
                title: "Keynote".to_string(),
                start_time: Utc.with_ymd_and_hms(2024, 2, 8, 9, 0, 0).unwrap(),
                end_time: Utc.with_ymd_and_hms(2024, 2, 8, 10, 0, 0).unwrap(),
                location: "Main Hall".to_string(),
                speakers: vec![],
                notes: String::new(),
            }]
        );
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        let records = decode_envelope(&body(json!({
            "records": [{
                "id": "r2",
                "fields": {
                    "Activity": "Security Trends",
                    "Start": "2024-02-08T11:30:00+01:00",
                    "End": "2024-02-08T12:30:00+01:00",
                    "Location": "Room A"
                }
            }]
        })))
        .unwrap();

        assert_eq!(records[0].start_time, Utc.with_ymd_and_hms(2024, 2, 8, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_speaker_variants() {
        let records = decode_envelope(&body(json!({
            "records": [
                {
                    "id": "list",
                    "fields": {
                        "Activity": "Panel",
                        "Start": "2024-02-08T13:00:00Z",
                        "End": "2024-02-08T14:00:00Z",
                        "Location": "Room B",
                        "Speaker(s)": ["Ada Lovelace", "Grace Hopper"],
                        "Notes": "Bring questions"
                    }
                },
                {
                    "id": "text",
                    "fields": {
                        "Activity": "Fireside chat",
                        "Start": "2024-02-08T15:00:00Z",
                        "End": "2024-02-08T16:00:00Z",
                        "Location": "Room B",
                        "Speaker(s)": "Alan Turing, Claude Shannon,",
                        "Notes": null
                    }
                }
            ]
        })))
        .unwrap();

        assert_eq!(records[0].speakers, vec!["Ada Lovelace", "Grace Hopper"]);
        assert_eq!(records[0].notes, "Bring questions");
        assert_eq!(records[1].speakers, vec!["Alan Turing", "Claude Shannon"]);
        assert_eq!(records[1].notes, "");
    }

    #[test]
    fn test_null_or_missing_records_is_decode_error() {
        assert!(matches!(
            decode_envelope(&body(json!({ "records": null }))),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(decode_envelope(&body(json!({}))), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_empty_records_is_success() {
        assert_eq!(decode_envelope(&body(json!({ "records": [] }))).unwrap(), vec![]);
    }

    #[test]
    fn test_malformed_record_rejects_whole_body() {
        let result = decode_envelope(&body(json!({
            "records": [
                {
                    "id": "ok",
                    "fields": {
                        "Activity": "Keynote",
                        "Start": "2024-02-08T09:00:00Z",
                        "End": "2024-02-08T10:00:00Z",
                        "Location": "Main Hall"
                    }
                },
                {
                    "id": "broken",
                    "fields": { "Activity": "No times", "Location": "Room A" }
                }
            ]
        })));
        assert!(matches!(result, Err(FetchError::Decode(msg)) if msg.contains("Start")));
    }

    #[test]
    fn test_not_json_is_decode_error() {
        assert!(matches!(
            decode_envelope(b"<html>maintenance</html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_inverted_time_range_is_kept() {
        let records = decode_envelope(&body(json!({
            "records": [{
                "id": "r9",
                "fields": {
                    "Activity": "Backwards",
                    "Start": "2024-02-08T10:00:00Z",
                    "End": "2024-02-08T09:00:00Z",
                    "Location": "Room C"
                }
            }]
        })))
        .unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].has_valid_time_range());
    }

    #[test]
    fn test_reencode_preserves_present_fields() {
        let original = json!({
            "records": [
                {
                    "id": "r3",
                    "fields": {
                        "Activity": "Advanced Encryption Techniques",
                        "Start": "2024-02-09T09:00:00Z",
                        "End": "2024-02-09T10:00:00Z",
                        "Location": "Main Hall",
                        "Speaker(s)": ["Whitfield Diffie", "Ada Lovelace ", ""],
                        "Notes": "Slides online"
                    }
                },
                {
                    "id": "r4",
                    "fields": {
                        "Activity": "Cybersecurity Panel",
                        "Start": "2024-02-09T10:30:00Z",
                        "End": "2024-02-09T11:30:00Z",
                        "Location": "Room A",
                        "Speaker(s)": [],
                        "Notes": ""
                    }
                }
            ]
        });
        let records = decode_envelope(&body(original.clone())).unwrap();
        assert_eq!(records[0].speakers, vec!["Whitfield Diffie", "Ada Lovelace ", ""]);

        let reencoded = serde_json::to_value(encode_envelope(&records)).unwrap();
        for (index, raw) in original["records"].as_array().unwrap().iter().enumerate() {
            let record = &reencoded["records"][index];
            assert_eq!(record["id"], raw["id"]);
            for key in ["Activity", "Location", "Speaker(s)", "Notes"] {
                assert_eq!(record["fields"][key], raw["fields"][key], "field {} of {}", key, raw["id"]);
            }
        }

        // Timestamps compare as instants; the textual offset form may differ
        let decoded_again = decode_envelope(&serde_json::to_vec(&reencoded).unwrap()).unwrap();
        assert_eq!(decoded_again, records);
    }
}
