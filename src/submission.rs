// 💬 Comment Submission Handler
// token check → schema validation → persist → status message

use crate::entities::Comment;
use crate::error::{AdminError, Result};
use crate::schema::{FormRegistry, ValidData, ValidationError, COMMENT_FORM};
use crate::table::Table;
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{error, info};

pub const COMMENT_SAVED: &str = "Comment saved";

// ============================================================================
// ANTI-FORGERY TOKEN
// ============================================================================

/// Per-session anti-forgery token
pub struct SessionToken {
    token: String,
}

impl SessionToken {
    /// Derive the token from the configured secret and a session id
    pub fn new(secret: &str, session_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}", secret, session_id));
        SessionToken {
            token: format!("{:x}", hasher.finalize()),
        }
    }

    /// Token value a form must post back
    pub fn value(&self) -> &str {
        &self.token
    }

    pub fn verify(&self, submitted: Option<&str>) -> bool {
        match submitted {
            Some(candidate) => {
                candidate.len() == self.token.len()
                    && candidate
                        .bytes()
                        .zip(self.token.bytes())
                        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                        == 0
            }
            None => false,
        }
    }
}

// ============================================================================
// REQUEST & OUTCOME
// ============================================================================

/// Posted form data
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub token: Option<String>,
    /// "save", "apply", ...
    pub task: String,
    pub data: HashMap<String, String>,
}

/// Where the caller should send the user next
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub task: String,
    pub id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Saved {
        id: i64,
        message: String,
        redirect: Redirect,
    },
    /// Validation failed, nothing was persisted
    Rejected {
        errors: Vec<ValidationError>,
        redirect: Redirect,
    },
}

// ============================================================================
// MODEL
// ============================================================================

/// Persists validated comment data, returning the record id
pub trait CommentModel {
    fn save(&mut self, data: &ValidData) -> Result<i64>;
}

/// Stores comments in the `comments` table
pub struct SqliteCommentModel<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteCommentModel<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteCommentModel { conn }
    }
}

impl CommentModel for SqliteCommentModel<'_> {
    /// A posted id of 0 (or none) creates a comment; any other id must exist.
    fn save(&mut self, data: &ValidData) -> Result<i64> {
        let table = Table::<Comment>::new(self.conn);

        let text = data.text("comment").unwrap_or_default();
        let project_id = data.integer("project_id").unwrap_or_default();
        let user_id = data.integer("user_id").unwrap_or_default();

        let mut comment = match data.integer("id").filter(|id| *id > 0) {
            Some(id) => {
                let mut stored = table
                    .load(id)?
                    .ok_or(AdminError::Persistence(rusqlite::Error::QueryReturnedNoRows))?;
                stored.comment = text.to_string();
                stored.project_id = project_id;
                stored.user_id = user_id;
                stored
            }
            None => Comment::new(text, project_id, user_id),
        };

        if let Some(published) = data.flag("published") {
            comment.published = published;
        }

        table.store(&mut comment)
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Handles the comment edit form
pub struct CommentController<'a, M: CommentModel> {
    forms: &'a FormRegistry,
    session: &'a SessionToken,
    model: M,
}

impl<'a, M: CommentModel> CommentController<'a, M> {
    pub fn new(forms: &'a FormRegistry, session: &'a SessionToken, model: M) -> Self {
        CommentController {
            forms,
            session,
            model,
        }
    }

    /// Save a posted comment.
    ///
    /// Errors abort the request: `InvalidToken`, `FormLoad`, and `System` when
    /// the model fails (the cause is logged, never returned). Validation
    /// problems are a `Rejected` outcome instead.
    pub fn save(&mut self, submission: &Submission) -> Result<SubmissionOutcome> {
        if !self.session.verify(submission.token.as_deref()) {
            return Err(AdminError::InvalidToken);
        }

        let posted_id = submission
            .data
            .get("id")
            .and_then(|id| id.trim().parse::<i64>().ok())
            .filter(|id| *id > 0);

        let mut redirect = Redirect {
            task: submission.task.clone(),
            id: posted_id,
        };

        let form = self.forms.load(COMMENT_FORM)?;

        let valid = match form.validate(&submission.data) {
            Ok(valid) => valid,
            Err(errors) => {
                info!(errors = errors.len(), "comment rejected");
                return Ok(SubmissionOutcome::Rejected { errors, redirect });
            }
        };

        let id = match self.model.save(&valid) {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "failed to save comment");
                return Err(AdminError::System);
            }
        };

        redirect.id = Some(id);
        info!(id, "comment saved");

        Ok(SubmissionOutcome::Saved {
            id,
            message: COMMENT_SAVED.to_string(),
            redirect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_rows, setup_database, COMMENTS_TABLE};

    struct FailingModel;

    impl CommentModel for FailingModel {
        fn save(&mut self, _data: &ValidData) -> Result<i64> {
            Err(AdminError::Persistence(rusqlite::Error::InvalidQuery))
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn submission(token: &SessionToken, pairs: &[(&str, &str)]) -> Submission {
        Submission {
            token: Some(token.value().to_string()),
            task: "save".to_string(),
            data: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_session_token_verify() {
        let token = SessionToken::new("secret", "session-1");
        assert_eq!(token.value().len(), 64);
        assert!(token.verify(Some(token.value())));
        assert!(!token.verify(Some("forged")));
        assert!(!token.verify(None));
        assert!(!SessionToken::new("secret", "session-2").verify(Some(token.value())));
    }

    #[test]
    fn test_save_new_comment() {
        let conn = setup();
        let forms = FormRegistry::with_defaults(2000);
        let token = SessionToken::new("secret", "s");
        let mut controller = CommentController::new(&forms, &token, SqliteCommentModel::new(&conn));

        let outcome = controller
            .save(&submission(&token, &[("comment", "Nice!"), ("project_id", "3"), ("user_id", "8")]))
            .unwrap();

        match outcome {
            SubmissionOutcome::Saved { id, message, redirect } => {
                assert_eq!(message, COMMENT_SAVED);
                assert_eq!(redirect.id, Some(id));
                assert_eq!(redirect.task, "save");

                let stored = Table::<Comment>::new(&conn).load(id).unwrap().unwrap();
                assert_eq!(stored.comment, "Nice!");
                assert!(stored.published);
            }
            other => panic!("expected Saved, got {:?}", other),
        }
    }

    #[test]
    fn test_update_existing_comment() {
        let conn = setup();
        let forms = FormRegistry::with_defaults(2000);
        let token = SessionToken::new("secret", "s");

        let mut original = Comment::new("First", 3, 8);
        let id = Table::<Comment>::new(&conn).store(&mut original).unwrap();

        let mut controller = CommentController::new(&forms, &token, SqliteCommentModel::new(&conn));
        let id_text = id.to_string();
        let outcome = controller
            .save(&submission(
                &token,
                &[("id", id_text.as_str()), ("comment", "Edited"), ("project_id", "3"), ("user_id", "8"), ("published", "0")],
            ))
            .unwrap();

        assert!(matches!(outcome, SubmissionOutcome::Saved { id: saved, .. } if saved == id));
        assert_eq!(count_rows(&conn, COMMENTS_TABLE).unwrap(), 1);

        let stored = Table::<Comment>::new(&conn).load(id).unwrap().unwrap();
        assert_eq!(stored.comment, "Edited");
        assert!(!stored.published);
        assert_eq!(stored.record_date.timestamp(), original.record_date.timestamp());
    }

    #[test]
    fn test_invalid_token_aborts() {
        let conn = setup();
        let forms = FormRegistry::with_defaults(2000);
        let token = SessionToken::new("secret", "s");
        let mut controller = CommentController::new(&forms, &token, SqliteCommentModel::new(&conn));

        let mut request = submission(&token, &[("comment", "x"), ("project_id", "1"), ("user_id", "1")]);
        request.token = None;

        assert!(matches!(controller.save(&request), Err(AdminError::InvalidToken)));
        assert_eq!(count_rows(&conn, COMMENTS_TABLE).unwrap(), 0);
    }

    #[test]
    fn test_missing_form_is_fatal() {
        let conn = setup();
        let forms = FormRegistry::new();
        let token = SessionToken::new("secret", "s");
        let mut controller = CommentController::new(&forms, &token, SqliteCommentModel::new(&conn));

        let result = controller.save(&submission(&token, &[("comment", "x")]));
        assert!(matches!(result, Err(AdminError::FormLoad(_))));
    }

    #[test]
    fn test_validation_failure_is_reported_without_saving() {
        let conn = setup();
        let forms = FormRegistry::with_defaults(2000);
        let token = SessionToken::new("secret", "s");
        let mut controller = CommentController::new(&forms, &token, SqliteCommentModel::new(&conn));

        let outcome = controller
            .save(&submission(&token, &[("id", "12"), ("comment", ""), ("project_id", "1"), ("user_id", "1")]))
            .unwrap();

        match outcome {
            SubmissionOutcome::Rejected { errors, redirect } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "comment");
                assert_eq!(redirect.id, Some(12));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
        assert_eq!(count_rows(&conn, COMMENTS_TABLE).unwrap(), 0);
    }

    #[test]
    fn test_persistence_failure_surfaces_system_error() {
        let forms = FormRegistry::with_defaults(2000);
        let token = SessionToken::new("secret", "s");
        let mut controller = CommentController::new(&forms, &token, FailingModel);

        let result = controller.save(&submission(&token, &[("comment", "x"), ("project_id", "1"), ("user_id", "1")]));
        assert!(matches!(result, Err(AdminError::System)));
    }

    #[test]
    fn test_unknown_comment_id_is_system_error() {
        let conn = setup();
        let forms = FormRegistry::with_defaults(2000);
        let token = SessionToken::new("secret", "s");
        let mut controller = CommentController::new(&forms, &token, SqliteCommentModel::new(&conn));

        let result = controller
            .save(&submission(&token, &[("id", "99"), ("comment", "x"), ("project_id", "1"), ("user_id", "1")]));
        assert!(matches!(result, Err(AdminError::System)));
        assert_eq!(count_rows(&conn, COMMENTS_TABLE).unwrap(), 0);
    }
}
