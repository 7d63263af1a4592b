use crate::error::{PipelineError, Result};

/// The user a request is made on behalf of.
///
/// Every pipeline call that decorates output with per-user flags, or acts for
/// a user, receives the viewer explicitly. Anonymous viewers see every flag as
/// `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    user_id: Option<i32>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.user_id
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    /// Returns the user id or fails with [`PipelineError::Unauthenticated`].
    pub fn require(&self) -> Result<i32> {
        self.user_id.ok_or(PipelineError::Unauthenticated)
    }
}
