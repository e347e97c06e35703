// gateway/mapper.rs - SharePoint list item -> Mission
//
// The upstream payload is decoded into typed records first; anything that does
// not fit (bad JSON, missing Commander, non-numeric ID) is a MappingError.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::models::Mission;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Malformed upstream payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid mission ID '{0}': expected a non-negative decimal integer")]
    InvalidId(String),
}

/// One item from the missions list as the REST API returns it
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMissionRecord {
    #[serde(rename = "ID", deserialize_with = "id_as_text")]
    pub id: String,
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Rocket", default)]
    pub rocket: Option<String>,
    #[serde(rename = "LaunchDate", default)]
    pub launch_date: Option<String>,
    #[serde(rename = "Commander")]
    pub commander: String,
    #[serde(rename = "SrPilotCmPilot", default)]
    pub sr_pilot_cm_pilot: Option<String>,
    #[serde(rename = "PilotLmPilot", default)]
    pub pilot_lm_pilot: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteCollection {
    value: Vec<RemoteMissionRecord>,
}

// ID is documented as a string but some list configurations emit a number
fn id_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

pub fn parse_id(raw: &str) -> Result<u64, MappingError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MappingError::InvalidId(raw.to_string()));
    }
    raw.parse::<u64>()
        .map_err(|_| MappingError::InvalidId(raw.to_string()))
}

pub fn map_record(remote: RemoteMissionRecord) -> Result<Mission, MappingError> {
    Ok(Mission {
        id: parse_id(&remote.id)?,
        title: remote.title.unwrap_or_default(),
        rocket: remote.rocket.unwrap_or_default(),
        launch_date: remote.launch_date.unwrap_or_default(),
        commander: remote.commander,
        senior_pilot_or_command_module_pilot: remote.sr_pilot_cm_pilot.unwrap_or_default(),
        pilot_or_lunar_module_pilot: remote.pilot_lm_pilot.unwrap_or_default(),
    })
}

/// Decode a `{ "value": [...] }` listing, keeping upstream order
pub fn decode_collection(body: &str) -> Result<Vec<Mission>, MappingError> {
    let collection: RemoteCollection = serde_json::from_str(body)?;
    collection.value.into_iter().map(map_record).collect()
}

/// Decode a single bare record
pub fn decode_single(body: &str) -> Result<Mission, MappingError> {
    let record: RemoteMissionRecord = serde_json::from_str(body)?;
    map_record(record)
}
