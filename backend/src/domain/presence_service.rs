use chrono::{Datelike, NaiveDate, Utc};
use tracing::{info, warn};

use crate::domain::errors::ServiceError;
use crate::domain::notification::{NotificationEvent, NotificationQueue};
use crate::domain::epoch_millis;
use crate::storage::{ChildRepository, GuestRepository, TransitionRepository};
use shared::{
    AddGuestRequest, Child, CreateChildRequest, Guest, PresenceStatus, UpdateChildRequest,
};

const MAX_NAME_LEN: usize = 100;

/// Service maintaining children, their guests, and each guest's presence
/// status. Every operation takes the caller's user id and verifies ownership
/// before touching anything below it.
#[derive(Clone)]
pub struct PresenceService {
    children: ChildRepository,
    guests: GuestRepository,
    transitions: TransitionRepository,
    notifications: NotificationQueue,
}

impl PresenceService {
    pub fn new(
        children: ChildRepository,
        guests: GuestRepository,
        transitions: TransitionRepository,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            children,
            guests,
            transitions,
            notifications,
        }
    }

    /// Create a new child under the calling user
    pub async fn create_child(
        &self,
        user_id: &str,
        request: CreateChildRequest,
    ) -> Result<Child, ServiceError> {
        Self::validate_name("Child name", &request.name)?;
        Self::validate_birthdate(&request.birthdate)?;

        let now = Utc::now().to_rfc3339();
        let child = Child {
            id: Child::generate_id(epoch_millis()?),
            user_id: user_id.to_string(),
            name: request.name.trim().to_string(),
            birthdate: request.birthdate,
            created_at: now.clone(),
            updated_at: now,
        };

        self.children.store_child(&child).await?;

        info!("Created child {} for user {}", child.id, user_id);

        Ok(child)
    }

    /// List all children owned by the user
    pub async fn list_children(&self, user_id: &str) -> Result<Vec<Child>, ServiceError> {
        let children = self.children.list_children(user_id).await?;
        Ok(children)
    }

    /// Get one child, verifying ownership
    pub async fn get_child(&self, user_id: &str, child_id: &str) -> Result<Child, ServiceError> {
        self.owned_child(user_id, child_id).await
    }

    /// Update a child's fields
    pub async fn update_child(
        &self,
        user_id: &str,
        child_id: &str,
        request: UpdateChildRequest,
    ) -> Result<Child, ServiceError> {
        let mut child = self.owned_child(user_id, child_id).await?;

        if let Some(name) = request.name {
            Self::validate_name("Child name", &name)?;
            child.name = name.trim().to_string();
        }
        if let Some(birthdate) = request.birthdate {
            Self::validate_birthdate(&birthdate)?;
            child.birthdate = birthdate;
        }
        child.updated_at = Utc::now().to_rfc3339();

        self.children.update_child(&child).await?;

        info!("Updated child {} for user {}", child.id, user_id);

        Ok(child)
    }

    /// Delete a child and, through the store's cascade, its guests and
    /// transition log
    pub async fn delete_child(&self, user_id: &str, child_id: &str) -> Result<(), ServiceError> {
        let child = self.owned_child(user_id, child_id).await?;

        self.children.delete_child(user_id, &child.id).await?;

        info!("Deleted child {} for user {}", child.id, user_id);

        Ok(())
    }

    /// List all guests registered under a child
    pub async fn list_guests(
        &self,
        user_id: &str,
        child_id: &str,
    ) -> Result<Vec<Guest>, ServiceError> {
        self.owned_child(user_id, child_id).await?;

        let guests = self.guests.list_guests(child_id).await?;
        Ok(guests)
    }

    /// Register a new guest under a child, initially checked out
    pub async fn add_guest(
        &self,
        user_id: &str,
        child_id: &str,
        request: AddGuestRequest,
    ) -> Result<Guest, ServiceError> {
        self.owned_child(user_id, child_id).await?;

        Self::validate_name("Guest name", &request.name)?;
        if request.contact.value().trim().is_empty() {
            return Err(ServiceError::Validation(
                "Guest contact cannot be empty".to_string(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let guest = Guest {
            id: Guest::generate_id(epoch_millis()?),
            child_id: child_id.to_string(),
            name: request.name.trim().to_string(),
            contact: request.contact,
            status: PresenceStatus::Out,
            timestamp: now.clone(),
            created_at: now,
        };

        self.guests.store_guest(&guest).await?;

        info!("Added guest {} under child {}", guest.id, child_id);

        Ok(guest)
    }

    /// Change a guest's presence status.
    ///
    /// `Some(target)` sets that status; re-applying the current status is a
    /// permitted no-op transition that still re-stamps the timestamp. `None`
    /// flips whatever the current status is. Each call appends one record to
    /// the transition log and enqueues a notification; delivery failure never
    /// rolls back the status change.
    pub async fn set_status(
        &self,
        user_id: &str,
        child_id: &str,
        guest_id: &str,
        target: Option<PresenceStatus>,
    ) -> Result<Guest, ServiceError> {
        let child = self.owned_child(user_id, child_id).await?;

        let mut guest = self
            .guests
            .get_guest(child_id, guest_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Guest not found: {}", guest_id)))?;

        let from_status = guest.status;
        let to_status = target.unwrap_or_else(|| from_status.toggled());

        guest.status = to_status;
        guest.timestamp = Utc::now().to_rfc3339();

        self.guests.update_status(&guest).await?;
        self.transitions
            .append_transition(child_id, guest_id, from_status, to_status, &guest.timestamp)
            .await?;

        if from_status == to_status {
            warn!(
                "Guest {} was already checked {}, re-stamped only",
                guest.id, to_status
            );
        } else {
            info!("Guest {} is now checked {}", guest.id, to_status);
        }

        self.notifications.enqueue(NotificationEvent {
            guest_id: guest.id.clone(),
            child_name: child.name,
            guest_name: guest.name.clone(),
            new_status: to_status,
            contact: guest.contact.clone(),
        });

        Ok(guest)
    }

    async fn owned_child(&self, user_id: &str, child_id: &str) -> Result<Child, ServiceError> {
        self.children
            .get_child(user_id, child_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Child not found: {}", child_id)))
    }

    fn validate_name(field: &str, name: &str) -> Result<(), ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation(format!("{} cannot be empty", field)));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ServiceError::Validation(format!(
                "{} cannot exceed 100 characters",
                field
            )));
        }
        Ok(())
    }

    fn validate_birthdate(birthdate: &str) -> Result<(), ServiceError> {
        let date = NaiveDate::parse_from_str(birthdate, "%Y-%m-%d").map_err(|_| {
            ServiceError::Validation("Birthdate must be in YYYY-MM-DD format".to_string())
        })?;

        if date.year() < 1900 || date.year() > 2100 {
            return Err(ServiceError::Validation(
                "Year must be between 1900 and 2100".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::LogNotifier;
    use crate::domain::notification::{DeliveryError, Notifier};
    use crate::storage::DbConnection;
    use crate::storage::UserRepository;
    use async_trait::async_trait;
    use shared::{GuestContact, Role, UserProfile};
    use std::sync::Arc;

    async fn seed_user(db: &DbConnection, user_id: &str, email: &str, username: &str) {
        UserRepository::new(db.clone())
            .store_user(&UserProfile {
                id: user_id.to_string(),
                email: email.to_string(),
                username: username.to_string(),
                role: Role::User,
                first_name: "".to_string(),
                last_name: "".to_string(),
                phone: "".to_string(),
                language: "sv".to_string(),
                notifications: true,
                created_at: "2025-01-01T00:00:00Z".to_string(),
            })
            .await
            .expect("Failed to seed user");
    }

    async fn setup_test() -> (PresenceService, DbConnection) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        seed_user(&db, "uid-1", "ann@example.com", "ann").await;
        seed_user(&db, "uid-2", "bob@example.com", "bob").await;

        let service = PresenceService::new(
            ChildRepository::new(db.clone()),
            GuestRepository::new(db.clone()),
            TransitionRepository::new(db.clone()),
            NotificationQueue::start(Arc::new(LogNotifier)),
        );
        (service, db)
    }

    fn child_request(name: &str) -> CreateChildRequest {
        CreateChildRequest {
            name: name.to_string(),
            birthdate: "2015-06-15".to_string(),
        }
    }

    fn guest_request(name: &str) -> AddGuestRequest {
        AddGuestRequest {
            name: name.to_string(),
            contact: GuestContact::Phone("+46701234567".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_children() {
        let (service, _db) = setup_test().await;

        let emma = service
            .create_child("uid-1", child_request("Emma"))
            .await
            .expect("Failed to create child");
        assert_eq!(emma.name, "Emma");
        assert_eq!(emma.user_id, "uid-1");

        tokio::time::sleep(tokio::time::Duration::from_millis(2)).await;
        service
            .create_child("uid-1", child_request("Lucas"))
            .await
            .unwrap();

        let children = service.list_children("uid-1").await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "Emma");
        assert_eq!(children[1].name, "Lucas");

        // Another user sees nothing
        let other = service.list_children("uid-2").await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_create_child_validation() {
        let (service, _db) = setup_test().await;

        let result = service
            .create_child(
                "uid-1",
                CreateChildRequest {
                    name: "  ".to_string(),
                    birthdate: "2015-06-15".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        for bad_date in ["2015/06/15", "2015-13-01", "2015-02-30", "1899-06-15"] {
            let result = service
                .create_child(
                    "uid-1",
                    CreateChildRequest {
                        name: "Emma".to_string(),
                        birthdate: bad_date.to_string(),
                    },
                )
                .await;
            assert!(
                matches!(result, Err(ServiceError::Validation(_))),
                "Birthdate '{}' should be rejected",
                bad_date
            );
        }
    }

    #[tokio::test]
    async fn test_update_and_delete_child() {
        let (service, _db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();

        let updated = service
            .update_child(
                "uid-1",
                &child.id,
                UpdateChildRequest {
                    name: Some("Emma Larsson".to_string()),
                    birthdate: None,
                },
            )
            .await
            .expect("Failed to update child");
        assert_eq!(updated.name, "Emma Larsson");
        assert_eq!(updated.birthdate, "2015-06-15");

        service.delete_child("uid-1", &child.id).await.expect("Failed to delete child");
        let result = service.get_child("uid-1", &child.id).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_foreign_child_is_not_found() {
        let (service, _db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();

        let result = service.list_guests("uid-2", &child.id).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));

        let result = service
            .update_child("uid-2", &child.id, UpdateChildRequest { name: None, birthdate: None })
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_guest_starts_checked_out() {
        let (service, _db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();
        let guest = service
            .add_guest("uid-1", &child.id, guest_request("Lucas"))
            .await
            .expect("Failed to add guest");

        assert_eq!(guest.status, PresenceStatus::Out);
        assert_eq!(guest.child_id, child.id);
        assert!(!guest.timestamp.is_empty());

        let guests = service.list_guests("uid-1", &child.id).await.unwrap();
        assert_eq!(guests.len(), 1);
        assert_eq!(guests[0].name, "Lucas");
    }

    #[tokio::test]
    async fn test_add_guest_validation() {
        let (service, _db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();

        let result = service
            .add_guest(
                "uid-1",
                &child.id,
                AddGuestRequest {
                    name: "".to_string(),
                    contact: GuestContact::Phone("+46701234567".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let result = service
            .add_guest(
                "uid-1",
                &child.id,
                AddGuestRequest {
                    name: "Lucas".to_string(),
                    contact: GuestContact::UserRef(" ".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_status_explicit_target() {
        let (service, _db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();
        let guest = service
            .add_guest("uid-1", &child.id, guest_request("Lucas"))
            .await
            .unwrap();

        let checked_in = service
            .set_status("uid-1", &child.id, &guest.id, Some(PresenceStatus::In))
            .await
            .expect("Failed to check in");
        assert_eq!(checked_in.status, PresenceStatus::In);
        assert_ne!(checked_in.timestamp, guest.timestamp);
    }

    #[tokio::test]
    async fn test_set_status_flip_without_target() {
        let (service, _db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();
        let guest = service
            .add_guest("uid-1", &child.id, guest_request("Lucas"))
            .await
            .unwrap();

        let flipped = service
            .set_status("uid-1", &child.id, &guest.id, None)
            .await
            .unwrap();
        assert_eq!(flipped.status, PresenceStatus::In);

        let flipped_back = service
            .set_status("uid-1", &child.id, &guest.id, None)
            .await
            .unwrap();
        assert_eq!(flipped_back.status, PresenceStatus::Out);
    }

    #[tokio::test]
    async fn test_toggle_pair_restores_status_and_restamps() {
        let (service, _db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();
        let guest = service
            .add_guest("uid-1", &child.id, guest_request("Lucas"))
            .await
            .unwrap();
        let original_status = guest.status;

        tokio::time::sleep(tokio::time::Duration::from_millis(2)).await;
        let first = service
            .set_status("uid-1", &child.id, &guest.id, None)
            .await
            .unwrap();
        assert_ne!(first.status, original_status);
        assert_ne!(first.timestamp, guest.timestamp);

        tokio::time::sleep(tokio::time::Duration::from_millis(2)).await;
        let second = service
            .set_status("uid-1", &child.id, &guest.id, None)
            .await
            .unwrap();
        assert_eq!(second.status, original_status);
        assert_ne!(second.timestamp, first.timestamp);
    }

    #[tokio::test]
    async fn test_reapplying_same_status_is_a_noop_transition() {
        let (service, db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();
        let guest = service
            .add_guest("uid-1", &child.id, guest_request("Lucas"))
            .await
            .unwrap();

        service
            .set_status("uid-1", &child.id, &guest.id, Some(PresenceStatus::In))
            .await
            .unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(2)).await;

        // Checking in an already checked-in guest must not error
        let again = service
            .set_status("uid-1", &child.id, &guest.id, Some(PresenceStatus::In))
            .await
            .expect("Re-applying the same status should succeed");
        assert_eq!(again.status, PresenceStatus::In);

        // Both calls are on the log, including the no-op transition
        let log = TransitionRepository::new(db)
            .list_for_guest(&guest.id)
            .await
            .unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].from_status, PresenceStatus::In);
        assert_eq!(log[0].to_status, PresenceStatus::In);
    }

    #[tokio::test]
    async fn test_set_status_unknown_guest() {
        let (service, _db) = setup_test().await;

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();

        let result = service
            .set_status("uid-1", &child.id, "guest::999", Some(PresenceStatus::In))
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    struct AlwaysFailingNotifier;

    #[async_trait]
    impl Notifier for AlwaysFailingNotifier {
        async fn notify(&self, _contact: &GuestContact, _message: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError("gateway down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_roll_back_status() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        seed_user(&db, "uid-1", "ann@example.com", "ann").await;

        let service = PresenceService::new(
            ChildRepository::new(db.clone()),
            GuestRepository::new(db.clone()),
            TransitionRepository::new(db.clone()),
            NotificationQueue::start(Arc::new(AlwaysFailingNotifier)),
        );

        let child = service.create_child("uid-1", child_request("Emma")).await.unwrap();
        let guest = service
            .add_guest("uid-1", &child.id, guest_request("Lucas"))
            .await
            .unwrap();

        let checked_in = service
            .set_status("uid-1", &child.id, &guest.id, Some(PresenceStatus::In))
            .await
            .expect("Status change must succeed even when delivery fails");
        assert_eq!(checked_in.status, PresenceStatus::In);

        // Give the worker time to fail; the persisted status must stand
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        let persisted = GuestRepository::new(db)
            .get_guest(&child.id, &guest.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted.status, PresenceStatus::In);
    }
}
