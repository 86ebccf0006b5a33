//! Capability policy: the single place that decides which roles may perform
//! which actions. Handlers and the pipeline engine consult `can_perform` instead
//! of comparing role names.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::user::{Actor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ChangeStage,
    Comment,
    EditNotes,
    ViewNotes,
    DeleteResume,
    Upload,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::ChangeStage,
        Action::Comment,
        Action::EditNotes,
        Action::ViewNotes,
        Action::DeleteResume,
        Action::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ChangeStage => "change_stage",
            Action::Comment => "comment",
            Action::EditNotes => "edit_notes",
            Action::ViewNotes => "view_notes",
            Action::DeleteResume => "delete_resume",
            Action::Upload => "upload",
        }
    }

    /// Environment variable overriding the roles granted this action.
    pub fn env_key(&self) -> String {
        format!("PERMIT_{}", self.as_str().to_uppercase())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role grants per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    grants: HashMap<Action, Vec<Role>>,
}

impl Default for Policy {
    /// Every role except `Viewer` may change stage; commenting, notes and
    /// deletion are reserved to `RH` and `Manager`; anyone may upload.
    fn default() -> Self {
        let all_but_viewer: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|role| *role != Role::Viewer)
            .collect();
        let hiring_team = vec![Role::Rh, Role::Manager];

        let grants = HashMap::from([
            (Action::ChangeStage, all_but_viewer),
            (Action::Comment, hiring_team.clone()),
            (Action::EditNotes, hiring_team.clone()),
            (Action::ViewNotes, hiring_team.clone()),
            (Action::DeleteResume, hiring_team),
            (Action::Upload, Role::ALL.to_vec()),
        ]);

        Self { grants }
    }
}

impl Policy {
    pub fn can_perform(&self, actor: &Actor, action: Action) -> bool {
        self.grants
            .get(&action)
            .is_some_and(|roles| roles.contains(&actor.role))
    }

    /// Replaces the roles granted `action`.
    pub fn with_grant(mut self, action: Action, roles: Vec<Role>) -> Self {
        self.grants.insert(action, roles);
        self
    }

    pub fn roles_for(&self, action: Action) -> &[Role] {
        self.grants.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }
}
