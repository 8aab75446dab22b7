//! Query and command services. Each service holds cloned handles only; every
//! multi-row write runs in an explicit transaction.

pub mod activity;
pub mod communication;
pub mod contact;
pub mod discipline;
pub mod identity;
pub mod learner;
pub mod listing;
pub mod media;
pub mod parent;
pub mod school_event;
pub mod school_grade;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::notifications::{NotificationSender, NotificationTemplates};

pub use activity::ActivityService;
pub use communication::CommunicationService;
pub use discipline::DisciplineService;
pub use identity::IdentityService;
pub use learner::LearnerService;
pub use listing::ListingService;
pub use media::MediaStore;
pub use parent::ParentService;
pub use school_event::SchoolEventService;
pub use school_grade::SchoolGradeService;

/// Every service, wired once at startup and shared through an `Extension`.
#[derive(Clone)]
pub struct Services {
    pub school_grades: SchoolGradeService,
    pub activities: ActivityService,
    pub parents: ParentService,
    pub learners: LearnerService,
    pub discipline: DisciplineService,
    pub events: SchoolEventService,
    pub communication: CommunicationService,
    pub listings: ListingService,
    pub identity: IdentityService,
    pub shutdown: CancellationToken,
}

impl Services {
    pub fn new(
        db: DatabaseConnection,
        config: &AppConfig,
        sender: Arc<dyn NotificationSender>,
        media: Arc<dyn MediaStore>,
    ) -> Result<Self, handlebars::TemplateError> {
        let templates = Arc::new(NotificationTemplates::new()?);
        let max_page_size = config.max_page_size;
        Ok(Self {
            school_grades: SchoolGradeService::new(db.clone(), max_page_size),
            activities: ActivityService::new(db.clone(), max_page_size),
            parents: ParentService::new(db.clone(), max_page_size),
            learners: LearnerService::new(db.clone(), max_page_size),
            discipline: DisciplineService::new(db.clone(), max_page_size, sender, templates),
            events: SchoolEventService::new(db.clone(), max_page_size),
            communication: CommunicationService::new(db.clone(), max_page_size),
            listings: ListingService::new(db.clone(), max_page_size, media, config.media.clone()),
            identity: IdentityService::new(
                db,
                config.token_ttl_hours,
                config.bootstrap_admin_email.clone(),
            ),
            shutdown: CancellationToken::new(),
        })
    }
}

pub(crate) fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Keeps a caller-supplied id, or allocates a fresh one. Ids end up in media
/// object keys, so only `[A-Za-z0-9_-]` is accepted.
pub(crate) fn id_or_new(id: Option<String>) -> ServiceResult<String> {
    match id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty()) {
        None => Ok(new_id()),
        Some(id) if is_valid_id(&id) => Ok(id),
        Some(id) => Err(ServiceError::validation(format!("Invalid id {id}"))),
    }
}

fn is_valid_id(id: &str) -> bool {
    id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Collects field-level validation messages.
#[derive(Default)]
pub(crate) struct Checks {
    messages: Vec<String>,
}

impl Checks {
    /// A required text field: present and not blank.
    pub fn required<'a>(&mut self, label: &str, value: Option<&'a str>) -> &'a str {
        match value.map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => {
                self.messages.push(format!("{label} is required"));
                ""
            }
        }
    }

    pub fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.messages.push(message.into());
        }
    }

    pub fn finish(self) -> ServiceResult<()> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.messages))
        }
    }
}

/// Result of matching incoming child rows against the stored ones by id.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct IdDiff {
    /// Stored ids absent from the incoming set.
    pub removed: Vec<String>,
    /// Incoming ids that already exist and are updated in place.
    pub retained: HashSet<String>,
}

pub(crate) fn diff_ids<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    incoming: impl IntoIterator<Item = Option<&'a str>>,
) -> IdDiff {
    let incoming: HashSet<&str> = incoming.into_iter().flatten().collect();
    let mut diff = IdDiff::default();
    for id in existing {
        if incoming.contains(id) {
            diff.retained.insert(id.to_string());
        } else {
            diff.removed.push(id.to_string());
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_keeps_matching_ids_and_removes_the_rest() {
        let diff = diff_ids(["a", "b", "c"], [Some("b"), None, Some("c"), Some("z")]);
        assert_eq!(diff.removed, vec!["a".to_string()]);
        assert_eq!(
            diff.retained,
            HashSet::from(["b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn empty_incoming_removes_everything() {
        let diff = diff_ids(["a", "b"], std::iter::empty());
        assert_eq!(diff.removed, vec!["a".to_string(), "b".to_string()]);
        assert!(diff.retained.is_empty());
    }

    #[test]
    fn blank_ids_are_replaced() {
        assert_eq!(id_or_new(Some("g-1".into())).unwrap(), "g-1");
        assert_ne!(id_or_new(Some("  ".into())).unwrap(), "  ");
        assert_eq!(id_or_new(None).unwrap().len(), 36);
        assert_eq!(new_id().len(), 36);
    }

    #[test]
    fn ids_with_path_characters_are_rejected() {
        for id in ["../../etc", "a/b", "a.b", r"x\y", "%2e%2e"] {
            assert!(
                matches!(id_or_new(Some(id.into())), Err(ServiceError::Validation(_))),
                "{id}"
            );
        }
        assert_eq!(id_or_new(Some("Grade_1-a".into())).unwrap(), "Grade_1-a");
    }

    #[test]
    fn checks_collect_all_messages() {
        let mut checks = Checks::default();
        assert_eq!(checks.required("Name", Some(" Grade 1 ")), "Grade 1");
        checks.required("First name", Some("  "));
        checks.required("Last name", None);
        checks.check(false, "Ages are reversed");
        let err = checks.finish().unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["First name is required", "Last name is required", "Ages are reversed"]
        );
    }
}
