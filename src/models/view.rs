use serde::Serialize;

use crate::auth::Session;
use super::Mission;

/// Fields every page needs: who (if anyone) is signed in
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseViewModel {
    pub is_authenticated: bool,
    pub user_id: String,
    pub user_name: String,
}

impl BaseViewModel {
    pub fn new(session: Option<&Session>) -> Self {
        match session {
            Some(session) => Self {
                is_authenticated: true,
                user_id: session.user_id.clone(),
                user_name: session.user_name.clone(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeViewModel {
    #[serde(flatten)]
    pub base: BaseViewModel,
}

impl HomeViewModel {
    pub fn new(session: Option<&Session>) -> Self {
        Self {
            base: BaseViewModel::new(session),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionViewModel {
    #[serde(flatten)]
    pub base: BaseViewModel,
    pub missions: Vec<Mission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission: Option<Mission>,
}

impl MissionViewModel {
    pub fn new(session: Option<&Session>) -> Self {
        Self {
            base: BaseViewModel::new(session),
            missions: Vec::new(),
            mission: None,
        }
    }

    pub fn with_missions(mut self, missions: Vec<Mission>) -> Self {
        self.missions = missions;
        self
    }

    pub fn with_mission(mut self, mission: Mission) -> Self {
        self.mission = Some(mission);
        self
    }
}
