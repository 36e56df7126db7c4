//! Wire formats of the profile service and the parse step that turns them
//! into canonical [`UserRecord`]s.
//!
//! The service is loose about shapes: the roster may be a bare array or
//! wrapped in `{"data": [...]}`, single records may be wrapped the same way,
//! ids may be strings or numbers, and the blood group has been seen as
//! `blood_group`, `bloodGroup` and `Blood-group`. Nothing outside this module
//! has to know about any of that.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::models::{Address, PersonName, UserRecord};

use super::ApiError;

/// A profile exactly as the server sends it. Every field is optional and
/// scalar fields accept numbers as well as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProfile {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub name: Option<WireName>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub date_of_birth: Option<String>,
    #[serde(rename = "blood_group", default, deserialize_with = "string_or_number")]
    pub blood_group_snake: Option<String>,
    #[serde(rename = "bloodGroup", default, deserialize_with = "string_or_number")]
    pub blood_group_camel: Option<String>,
    #[serde(rename = "Blood-group", default, deserialize_with = "string_or_number")]
    pub blood_group_legacy: Option<String>,
    pub address: Option<WireAddress>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub account_created: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireName {
    #[serde(default, deserialize_with = "string_or_number")]
    pub first: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub last: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAddress {
    #[serde(default, deserialize_with = "string_or_number")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub country: Option<String>,
}

// Ids, phone numbers and postal codes arrive as JSON numbers from some
// backends
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScalar {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawScalar>::deserialize(deserializer)?.map(|value| match value {
        RawScalar::Text(s) => s,
        RawScalar::Number(n) => n.to_string(),
    }))
}

impl WireProfile {
    /// Resolve the blood group across its three spellings.
    /// Precedence: `blood_group`, `bloodGroup`, `Blood-group`. Empty strings
    /// count as absent.
    pub fn resolve_blood_group(&self) -> Option<String> {
        [
            &self.blood_group_snake,
            &self.blood_group_camel,
            &self.blood_group_legacy,
        ]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .cloned()
    }
}

impl From<WireProfile> for UserRecord {
    fn from(wire: WireProfile) -> Self {
        let blood_group = wire.resolve_blood_group();
        let name = wire.name.unwrap_or_default();
        let address = wire.address.unwrap_or_default();

        UserRecord {
            id: wire.id.unwrap_or_default(),
            name: PersonName {
                first: name.first.unwrap_or_default(),
                last: name.last.unwrap_or_default(),
            },
            email: wire.email.unwrap_or_default(),
            username: wire.username.unwrap_or_default(),
            password: wire.password.unwrap_or_default(),
            date_of_birth: wire.date_of_birth.unwrap_or_default(),
            blood_group,
            address: Address {
                street: address.street.unwrap_or_default(),
                city: address.city.unwrap_or_default(),
                state: address.state.unwrap_or_default(),
                postal_code: address.postal_code.unwrap_or_default(),
                country: address.country.unwrap_or_default(),
            },
            phone: wire.phone.unwrap_or_default(),
            account_created: wire.account_created.unwrap_or_default(),
            last_login: wire.last_login.unwrap_or_default(),
        }
    }
}

/// Recognized top-level shapes of a roster response
#[derive(Debug)]
enum RosterShape {
    Bare(Vec<Value>),
    Wrapped(Vec<Value>),
    Unrecognized,
}

impl RosterShape {
    fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => RosterShape::Bare(items),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => RosterShape::Wrapped(items),
                _ => RosterShape::Unrecognized,
            },
            _ => RosterShape::Unrecognized,
        }
    }
}

/// Parse a roster response body.
///
/// Unrecognized shapes produce an empty roster. Bodies that are not JSON, or
/// arrays holding something other than objects, are shape errors.
pub fn parse_roster(body: &str) -> Result<Vec<UserRecord>, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Shape(format!("roster is not valid JSON: {}", e)))?;

    let items = match RosterShape::classify(value) {
        RosterShape::Bare(items) | RosterShape::Wrapped(items) => items,
        RosterShape::Unrecognized => {
            warn!("Roster response is neither an array nor {{data: array}}; treating as empty");
            return Ok(Vec::new());
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(ApiError::Shape(format!("roster entry {} is not an object", i)));
            }
            parse_profile_value(item)
        })
        .collect()
}

/// Parse a single-profile response body into its raw wire form, unwrapping
/// a `{data: {...}}` envelope when present.
pub fn parse_profile(body: &str) -> Result<WireProfile, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Shape(format!("profile is not valid JSON: {}", e)))?;
    profile_object(value)
        .and_then(|v| {
            serde_json::from_value(v).map_err(|e| ApiError::Shape(format!("invalid profile: {}", e)))
        })
}

/// Same as [`parse_profile`] but keeps the JSON object, for shallow merges.
pub fn parse_profile_object(body: &str) -> Result<serde_json::Map<String, Value>, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Shape(format!("profile is not valid JSON: {}", e)))?;
    match profile_object(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::Shape("profile is not an object".to_string())),
    }
}

fn profile_object(value: Value) -> Result<Value, ApiError> {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner @ Value::Object(_)) => Ok(inner),
            Some(other) => {
                map.insert("data".to_string(), other);
                Ok(Value::Object(map))
            }
            None => Ok(Value::Object(map)),
        },
        _ => Err(ApiError::Shape("profile is not an object".to_string())),
    }
}

fn parse_profile_value(value: Value) -> Result<UserRecord, ApiError> {
    serde_json::from_value::<WireProfile>(value)
        .map(UserRecord::from)
        .map_err(|e| ApiError::Shape(format!("invalid profile: {}", e)))
}

/// Shallow-merge a server response over the submitted record, the way the
/// web client spread the response over its request. Server keys win, nested
/// objects are replaced whole. The blood group is re-resolved from the
/// server's spellings first and falls back to the submitted value.
pub fn merge_created(submitted: &UserRecord, server: serde_json::Map<String, Value>) -> Result<UserRecord, ApiError> {
    let server_wire: WireProfile = serde_json::from_value(Value::Object(server.clone()))
        .map_err(|e| ApiError::Shape(format!("invalid created profile: {}", e)))?;

    let mut merged = match serde_json::to_value(submitted) {
        Ok(Value::Object(map)) => map,
        Ok(_) => serde_json::Map::new(),
        Err(e) => return Err(ApiError::Shape(format!("cannot encode submitted profile: {}", e))),
    };
    for (key, value) in server {
        merged.insert(key, value);
    }

    let mut record = parse_profile_value(Value::Object(merged))?;
    record.blood_group = server_wire
        .resolve_blood_group()
        .or_else(|| submitted.blood_group.clone().filter(|v| !v.is_empty()));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_roster() {
        let body = r#"{"data": [{"id": "1", "name": {"first": "A", "last": "B"}, "blood_group": "O+"}]}"#;
        let roster = parse_roster(body).expect("wrapped roster parses");
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, "1");
        assert_eq!(roster[0].name.first, "A");
        assert_eq!(roster[0].blood_group.as_deref(), Some("O+"));
        assert_eq!(roster[0].address, Address::default());
    }

    #[test]
    fn test_parse_bare_roster() {
        let body = r#"[{"id": 42, "Blood-group": "a-ve", "address": null}, {"id": "7", "bloodGroup": "B+"}]"#;
        let roster = parse_roster(body).expect("bare roster parses");
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].id, "42");
        assert_eq!(roster[0].blood_group.as_deref(), Some("a-ve"));
        assert_eq!(roster[1].blood_group.as_deref(), Some("B+"));
    }

    #[test]
    fn test_parse_roster_accepts_numeric_scalars() {
        let body = r#"[
            {"id": "1", "name": {"first": "A", "last": "B"}, "phone": 5551234, "address": {"postalCode": 62704}},
            {"id": "2", "name": {"first": "C", "last": "D"}, "address": {"postalCode": "10001"}}
        ]"#;
        let roster = parse_roster(body).expect("numeric scalars are accepted");
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].phone, "5551234");
        assert_eq!(roster[0].address.postal_code, "62704");
        assert_eq!(roster[1].address.postal_code, "10001");
    }

    #[test]
    fn test_parse_unrecognized_shape_is_empty() {
        assert!(parse_roster(r#"{"users": []}"#).unwrap().is_empty());
        assert!(parse_roster(r#"{"data": {"id": "1"}}"#).unwrap().is_empty());
        assert!(parse_roster("42").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_roster_is_shape_error() {
        assert!(matches!(parse_roster("<html>"), Err(ApiError::Shape(_))));
        assert!(matches!(parse_roster(r#"[1, 2]"#), Err(ApiError::Shape(_))));
    }

    #[test]
    fn test_blood_group_precedence() {
        let wire = WireProfile {
            blood_group_snake: Some("snake".to_string()),
            blood_group_camel: Some("camel".to_string()),
            blood_group_legacy: Some("legacy".to_string()),
            ..Default::default()
        };
        assert_eq!(wire.resolve_blood_group().as_deref(), Some("snake"));

        let wire = WireProfile {
            blood_group_snake: Some(String::new()),
            blood_group_camel: None,
            blood_group_legacy: Some("legacy".to_string()),
            ..Default::default()
        };
        assert_eq!(wire.resolve_blood_group().as_deref(), Some("legacy"));

        assert_eq!(WireProfile::default().resolve_blood_group(), None);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let body = r#"[{"id": "1", "Blood-group": "AB+", "name": {"first": "A"}}]"#;
        let once = parse_roster(body).unwrap();
        let reencoded = serde_json::to_string(&once).unwrap();
        let twice = parse_roster(&reencoded).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_profile_unwraps_data() {
        let wire = parse_profile(r#"{"data": {"id": 99, "bloodGroup": "O-"}}"#).unwrap();
        assert_eq!(wire.id.as_deref(), Some("99"));
        assert_eq!(wire.resolve_blood_group().as_deref(), Some("O-"));

        let wire = parse_profile(r#"{"id": "5"}"#).unwrap();
        assert_eq!(wire.id.as_deref(), Some("5"));
    }

    #[test]
    fn test_merge_created_server_wins() {
        let mut submitted = UserRecord::blank_template();
        submitted.id = "123123".to_string();
        submitted.name.first = "X".to_string();
        submitted.name.last = "Y".to_string();
        submitted.email = "x@y.z".to_string();
        submitted.blood_group = Some("A+".to_string());

        let server = parse_profile_object(r#"{"data": {"id": 900, "email": "canon@y.z", "Blood-group": "A pos"}}"#).unwrap();
        let merged = merge_created(&submitted, server).unwrap();

        assert_eq!(merged.id, "900");
        assert_eq!(merged.email, "canon@y.z");
        assert_eq!(merged.name.first, "X");
        // Server spelling beats the submitted bloodGroup
        assert_eq!(merged.blood_group.as_deref(), Some("A pos"));
    }

    #[test]
    fn test_merge_created_accepts_numeric_phone() {
        let submitted = UserRecord::blank_template();
        let server = parse_profile_object(r#"{"id": "555", "phone": 5551234}"#).unwrap();

        let merged = merge_created(&submitted, server).expect("numeric phone merges");
        assert_eq!(merged.id, "555");
        assert_eq!(merged.phone, "5551234");
    }

    #[test]
    fn test_merge_created_keeps_submitted_blood_group() {
        let mut submitted = UserRecord::default();
        submitted.blood_group = Some("B-".to_string());

        let server = parse_profile_object(r#"{"id": "1"}"#).unwrap();
        let merged = merge_created(&submitted, server).unwrap();
        assert_eq!(merged.blood_group.as_deref(), Some("B-"));
    }
}
