//! Wire-format handling for the claim endpoint.
//!
//! `GET /claim/{id}` answers with a heterogeneous JSON array: the first row
//! is the claim itself, and the remaining rows are joined records: media
//! rows (recognized by a `media_id` key), vehicle rows, and whatever else
//! the view accretes. Identifiers arrive as numbers from some tables and
//! strings from others, booleans sometimes arrive as `0`/`1`, and timestamp
//! formats vary by column. Parsing is therefore duck-typed and lenient on
//! everything except what the reconciler actually needs.

use chrono::{DateTime, NaiveDateTime, Utc};
use claimstage_core::{Claim, ClaimFields, ClaimMedia, GatewayError};
use claimstage_types::{ClaimId, MediaId};
use serde_json::Value;

/// Splits the endpoint's row array into the claim and its visible media.
///
/// Soft-deleted media rows are filtered out here; rows that are neither the
/// claim nor media (vehicle joins and the like) are skipped.
pub(crate) fn parse_claim_response(
    rows: Vec<Value>,
) -> Result<(Claim, Vec<ClaimMedia>), GatewayError> {
    let mut rows = rows.into_iter();
    let first = rows
        .next()
        .ok_or_else(|| GatewayError::MalformedResponse("empty claim response".into()))?;
    let claim = claim_from_row(&first)?;

    let mut media = Vec::new();
    for row in rows {
        let has_media_id = row.get("media_id").map(|v| !v.is_null()).unwrap_or(false);
        if !has_media_id {
            continue;
        }
        if truthy(row.get("is_deleted").unwrap_or(&Value::Null)) {
            continue;
        }
        media.push(media_from_row(&row)?);
    }

    Ok((claim, media))
}

fn claim_from_row(row: &Value) -> Result<Claim, GatewayError> {
    let id = string_field(row, "claim_id")
        .ok_or_else(|| GatewayError::MalformedResponse("claim row missing claim_id".into()))?;
    let id = ClaimId::new(&id)
        .map_err(|err| GatewayError::MalformedResponse(format!("bad claim_id: {err}")))?;

    Ok(Claim {
        id,
        policy_id: string_field(row, "policy_id").unwrap_or_default(),
        customer_id: string_field(row, "customer_id").unwrap_or_default(),
        status: string_field(row, "status").unwrap_or_default(),
        fields: ClaimFields {
            date_of_incident: string_field(row, "date_of_incident").unwrap_or_default(),
            incident_time: string_field(row, "incident_time").unwrap_or_default(),
            incident_location: string_field(row, "incident_location").unwrap_or_default(),
            description: string_field(row, "description").unwrap_or_default(),
        },
        created_at: string_field(row, "created_at").and_then(|s| parse_timestamp(&s)),
    })
}

fn media_from_row(row: &Value) -> Result<ClaimMedia, GatewayError> {
    let id = string_field(row, "media_id")
        .ok_or_else(|| GatewayError::MalformedResponse("media row missing media_id".into()))?;
    let id = MediaId::new(&id)
        .map_err(|err| GatewayError::MalformedResponse(format!("bad media_id: {err}")))?;

    Ok(ClaimMedia {
        id,
        storage_path: string_field(row, "storage_path").unwrap_or_default(),
        description: string_field(row, "description").unwrap_or_default(),
        uploaded_at: string_field(row, "uploaded_at").and_then(|s| parse_timestamp(&s)),
        is_deleted: false,
    })
}

/// Reads a field as a string, accepting the numeric identifiers some tables
/// use. Null, absent, and structured values yield `None`.
fn string_field(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Truthiness in the backend's terms: SQL-ish views serialize booleans as
/// `true`/`false`, `0`/`1`, or occasionally `"0"`/`"1"`.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        _ => true,
    }
}

/// Parses the timestamp shapes observed in the wild: RFC 3339, and naive
/// `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` (taken as UTC).
/// Unparseable values become `None` rather than failing the row.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Suggested object name for an uploaded file: `{claim_id}/{uuid}.{ext}`,
/// with the extension derived from the MIME subtype. The server may ignore
/// the suggestion.
pub(crate) fn suggested_filename(claim_id: &ClaimId, content_type: &str) -> String {
    let ext: String = content_type
        .split('/')
        .nth(1)
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    let ext = if ext.is_empty() { "jpg".to_owned() } else { ext };
    format!("{}/{}.{}", claim_id, uuid::Uuid::new_v4().simple(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> Vec<Value> {
        vec![
            json!({
                "claim_id": 7,
                "policy_id": "POL-1",
                "customer_id": 42,
                "status": "Pending",
                "date_of_incident": "2024-03-01",
                "incident_time": "14:30:00",
                "incident_location": "M4 westbound",
                "description": "rear bumper",
                "created_at": "2024-03-02T08:00:00"
            }),
            json!({
                "media_id": 101,
                "storage_path": "claims/7/a.jpg",
                "description": "scratch",
                "uploaded_at": "2024-03-02 08:05:00",
                "is_deleted": 0
            }),
            json!({
                "media_id": 102,
                "storage_path": "claims/7/b.jpg",
                "description": "soft-deleted",
                "is_deleted": 1
            }),
            json!({
                "car_id": 9,
                "make": "Skoda",
                "model": "Octavia"
            }),
        ]
    }

    #[test]
    fn splits_claim_and_visible_media() {
        let (claim, media) = parse_claim_response(response()).unwrap();

        assert_eq!(claim.id.as_str(), "7");
        assert_eq!(claim.fields.incident_location, "M4 westbound");
        assert_eq!(claim.status, "Pending");
        assert!(claim.created_at.is_some());

        // Soft-deleted rows and non-media rows are dropped.
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].id.as_str(), "101");
        assert!(media[0].uploaded_at.is_some());
    }

    #[test]
    fn empty_response_is_malformed() {
        assert!(matches!(
            parse_claim_response(Vec::new()),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn claim_row_without_id_is_malformed() {
        let rows = vec![json!({ "status": "Pending" })];
        assert!(matches!(
            parse_claim_response(rows),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn absent_optional_fields_default_to_empty() {
        let rows = vec![json!({ "claim_id": "CLM-1" })];
        let (claim, media) = parse_claim_response(rows).unwrap();
        assert_eq!(claim.fields.date_of_incident, "");
        assert_eq!(claim.status, "");
        assert!(claim.created_at.is_none());
        assert!(media.is_empty());
    }

    #[test]
    fn truthy_covers_backend_boolean_shapes() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("1")));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("0")));
        assert!(!truthy(&json!("false")));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&Value::Null));
    }

    #[test]
    fn timestamp_parsing_accepts_observed_shapes() {
        assert!(parse_timestamp("2024-03-02T08:00:00Z").is_some());
        assert!(parse_timestamp("2024-03-02T08:00:00+01:00").is_some());
        assert!(parse_timestamp("2024-03-02T08:00:00").is_some());
        assert!(parse_timestamp("2024-03-02 08:00:00.123").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn suggested_filename_sanitizes_the_extension() {
        let claim_id = ClaimId::new("7").unwrap();

        let jpeg = suggested_filename(&claim_id, "image/jpeg");
        assert!(jpeg.starts_with("7/"));
        assert!(jpeg.ends_with(".jpeg"));

        let svg = suggested_filename(&claim_id, "image/svg+xml");
        assert!(svg.ends_with(".svgxml"));

        let unknown = suggested_filename(&claim_id, "weird");
        assert!(unknown.ends_with(".jpg"));
    }
}
