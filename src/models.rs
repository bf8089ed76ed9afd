use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::fmt;

/// Credentials of the logged-in chapter administrator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub chapter_id: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("chapter_id", &self.chapter_id)
            .finish()
    }
}

/// One service record as stored by the hours API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "volunteer")]
    pub volunteer_name: String,
    #[serde(rename = "chapter")]
    pub chapter_id: String,
    #[serde(rename = "creator", default, deserialize_with = "null_as_empty")]
    pub registrar: String,
    #[serde(deserialize_with = "lenient_hours")]
    pub hours: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub unit: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub name: String,
    pub chapter: String,
}

impl GroupKey {
    pub fn new(name: impl Into<String>, chapter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chapter: chapter.into(),
        }
    }
}

/// All records of one volunteer within one chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolunteerGroup {
    pub representative_id: String,
    pub name: String,
    pub chapter: String,
    pub records: Vec<ServiceRecord>,
    pub total_hours: f64,
}

impl VolunteerGroup {
    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.name.clone(), self.chapter.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRecordRow {
    pub volunteer_name: String,
    pub chapter: String,
    pub unit: String,
    pub hours: f64,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRecordBatch {
    pub creator: String,
    pub year: i32,
    pub rows: Vec<NewRecordRow>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub chapter: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ListRecordsResponse {
    pub items: Vec<ServiceRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRecordItem {
    pub volunteer: String,
    pub chapter: String,
    pub unit: String,
    pub hours: f64,
    pub year: i32,
    pub remarks: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRecordsRequest {
    pub creator: String,
    pub records: Vec<CreateRecordItem>,
}

impl From<&NewRecordBatch> for CreateRecordsRequest {
    fn from(batch: &NewRecordBatch) -> Self {
        Self {
            creator: batch.creator.clone(),
            records: batch
                .rows
                .iter()
                .map(|row| CreateRecordItem {
                    volunteer: row.volunteer_name.clone(),
                    chapter: row.chapter.clone(),
                    unit: row.unit.clone(),
                    hours: row.hours,
                    year: batch.year,
                    remarks: row.remarks.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub logged_in: bool,
    pub chapter_id: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_hours<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(value) => value
            .as_f64()
            .ok_or_else(|| de::Error::custom("hours out of range")),
        Value::String(value) => value
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("hours is not numeric: {value:?}"))),
        other => Err(de::Error::custom(format!("expected numeric hours, got {other}"))),
    }
}

// RFC 3339 strings or unix seconds/milliseconds; anything else is treated as unknown.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let parsed = match Value::deserialize(deserializer)? {
        Value::String(value) => DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(value) => value.as_i64().and_then(|raw| {
            if raw.abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(raw)
            } else {
                DateTime::from_timestamp(raw, 0)
            }
        }),
        _ => None,
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_api_field_names() {
        let record: ServiceRecord = serde_json::from_value(serde_json::json!({
            "id": 101,
            "volunteer": "王小明",
            "chapter": "宜一",
            "creator": "知林法師",
            "hours": "20.5",
            "unit": "服務台 101",
            "created_at": "2025-03-01T08:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.id, "101");
        assert_eq!(record.volunteer_name, "王小明");
        assert_eq!(record.chapter_id, "宜一");
        assert_eq!(record.registrar, "知林法師");
        assert_eq!(record.hours, 20.5);
        assert_eq!(record.remarks, None);
        assert!(record.created_at.is_some());
    }

    #[test]
    fn unparsable_timestamp_is_unknown() {
        let record: ServiceRecord = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "volunteer": "李美華",
            "chapter": "宜一",
            "hours": 3,
            "created_at": "yesterday"
        }))
        .unwrap();
        assert_eq!(record.created_at, None);
    }

    #[test]
    fn null_creator_and_unit_read_as_empty() {
        let record: ServiceRecord = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "volunteer": "李美華",
            "chapter": "宜一",
            "creator": null,
            "unit": null,
            "hours": 3
        }))
        .unwrap();
        assert_eq!(record.registrar, "");
        assert_eq!(record.unit, "");
    }

    #[test]
    fn non_numeric_hours_fail_to_decode() {
        let result = serde_json::from_value::<ServiceRecord>(serde_json::json!({
            "id": "a1",
            "volunteer": "李美華",
            "chapter": "宜一",
            "hours": "many"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn batch_rows_carry_the_batch_year() {
        let batch = NewRecordBatch {
            creator: "知林法師".into(),
            year: 2026,
            rows: vec![NewRecordRow {
                volunteer_name: "A".into(),
                chapter: "X".into(),
                unit: "茶席".into(),
                hours: 5.0,
                remarks: String::new(),
            }],
        };
        let body = CreateRecordsRequest::from(&batch);
        assert_eq!(body.creator, "知林法師");
        assert_eq!(body.records[0].year, 2026);
        assert_eq!(body.records[0].volunteer, "A");
    }

    #[test]
    fn session_debug_hides_token() {
        let session = Session {
            token: "secret".into(),
            chapter_id: "宜一".into(),
        };
        assert!(!format!("{session:?}").contains("secret"));
    }
}
