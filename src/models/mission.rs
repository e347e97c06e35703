use serde::Serialize;

/// A mission record as the portal presents it.
///
/// Built only by [`crate::gateway::mapper::map_record`]; the fields are read-only
/// once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: u64,
    pub title: String,
    pub rocket: String,
    pub launch_date: String,
    pub commander: String,
    pub senior_pilot_or_command_module_pilot: String,
    pub pilot_or_lunar_module_pilot: String,
}
