//! Pipeline Engine: role-gated, in-memory mutations of a Resume Record.
//!
//! Each operation checks the capability policy first, then applies the change
//! to the record in place and reports whether anything changed. Callers persist
//! the full record only when an operation returns `Outcome::Applied`.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::models::resume::{Comment, ResumeRecord, Stage};
use crate::models::user::{Actor, Role};
use crate::pipeline::policy::{Action, Policy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("role {role} is not permitted to {action}")]
    PermissionDenied { role: Role, action: Action },

    #[error("comment index {index} is out of range ({len} comments)")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Unchanged,
}

pub struct PipelineEngine<'a> {
    policy: &'a Policy,
}

impl<'a> PipelineEngine<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self { policy }
    }

    fn authorize(&self, actor: &Actor, action: Action) -> Result<(), PipelineError> {
        if self.policy.can_perform(actor, action) {
            Ok(())
        } else {
            Err(PipelineError::PermissionDenied {
                role: actor.role,
                action,
            })
        }
    }

    /// Moves the record to any stage. No transition ordering is enforced.
    pub fn set_stage(
        &self,
        record: &mut ResumeRecord,
        stage: Stage,
        actor: &Actor,
    ) -> Result<Outcome, PipelineError> {
        self.authorize(actor, Action::ChangeStage)?;

        if record.stage == stage {
            return Ok(Outcome::Unchanged);
        }

        info!(
            "Resume {} stage {} -> {} by {}",
            record.id, record.stage, stage, actor.id
        );
        record.stage = stage;
        Ok(Outcome::Applied)
    }

    /// Appends a trimmed comment. Empty or whitespace-only text is a no-op.
    pub fn add_comment(
        &self,
        record: &mut ResumeRecord,
        text: &str,
        actor: &Actor,
    ) -> Result<Outcome, PipelineError> {
        self.authorize(actor, Action::Comment)?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Unchanged);
        }

        record.comments.push(Comment {
            user_id: actor.id.clone(),
            username: actor.display_name.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        });
        info!(
            "Comment #{} added to resume {} by {}",
            record.comments.len() - 1,
            record.id,
            actor.id
        );
        Ok(Outcome::Applied)
    }

    /// Replaces the text of `comments[index]`. Whitespace-only text leaves the
    /// comment untouched.
    pub fn edit_comment(
        &self,
        record: &mut ResumeRecord,
        index: usize,
        new_text: &str,
        actor: &Actor,
    ) -> Result<Outcome, PipelineError> {
        self.authorize(actor, Action::Comment)?;

        let len = record.comments.len();
        let comment = record
            .comments
            .get_mut(index)
            .ok_or(PipelineError::IndexOutOfRange { index, len })?;

        let new_text = new_text.trim();
        if new_text.is_empty() || comment.text == new_text {
            return Ok(Outcome::Unchanged);
        }

        comment.text = new_text.to_string();
        info!("Comment #{index} on resume {} edited by {}", record.id, actor.id);
        Ok(Outcome::Applied)
    }

    /// Removes `comments[index]`. Confirmation happens before this is called.
    pub fn delete_comment(
        &self,
        record: &mut ResumeRecord,
        index: usize,
        actor: &Actor,
    ) -> Result<Outcome, PipelineError> {
        self.authorize(actor, Action::Comment)?;

        let len = record.comments.len();
        if index >= len {
            return Err(PipelineError::IndexOutOfRange { index, len });
        }

        record.comments.remove(index);
        info!("Comment #{index} on resume {} deleted by {}", record.id, actor.id);
        Ok(Outcome::Applied)
    }

    /// Overwrites the internal note.
    pub fn set_internal_note(
        &self,
        record: &mut ResumeRecord,
        text: &str,
        actor: &Actor,
    ) -> Result<Outcome, PipelineError> {
        self.authorize(actor, Action::EditNotes)?;

        if record.internal_notes.as_deref() == Some(text) {
            return Ok(Outcome::Unchanged);
        }

        record.internal_notes = Some(text.to_string());
        info!("Internal note on resume {} updated by {}", record.id, actor.id);
        Ok(Outcome::Applied)
    }
}
