use serde::{Deserialize, Serialize};
use std::fmt;

/// Presence state of a guest: checked in or checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    In,
    Out,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::In => "in",
            PresenceStatus::Out => "out",
        }
    }

    /// The opposite status, used when a caller asks for a blind flip.
    pub fn toggled(self) -> Self {
        match self {
            PresenceStatus::In => PresenceStatus::Out,
            PresenceStatus::Out => PresenceStatus::In,
        }
    }

    pub fn parse(value: &str) -> Result<Self, PresenceStatusError> {
        match value {
            "in" => Ok(PresenceStatus::In),
            "out" => Ok(PresenceStatus::Out),
            _ => Err(PresenceStatusError::Unknown(value.to_string())),
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceStatusError {
    Unknown(String),
}

impl fmt::Display for PresenceStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceStatusError::Unknown(value) => {
                write!(f, "Unknown presence status: {}", value)
            }
        }
    }
}

impl std::error::Error for PresenceStatusError {}

/// How to reach the adult responsible for a guest.
///
/// The two historical call sites stored either a phone number or a reference
/// to another user account; both shapes are kept under one tagged union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GuestContact {
    Phone(String),
    UserRef(String),
}

impl GuestContact {
    pub fn kind(&self) -> &'static str {
        match self {
            GuestContact::Phone(_) => "phone",
            GuestContact::UserRef(_) => "user_ref",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            GuestContact::Phone(value) => value,
            GuestContact::UserRef(value) => value,
        }
    }

    pub fn from_parts(kind: &str, value: &str) -> Result<Self, GuestContactError> {
        match kind {
            "phone" => Ok(GuestContact::Phone(value.to_string())),
            "user_ref" => Ok(GuestContact::UserRef(value.to_string())),
            _ => Err(GuestContactError::UnknownKind(kind.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuestContactError {
    UnknownKind(String),
}

impl fmt::Display for GuestContactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuestContactError::UnknownKind(kind) => {
                write!(f, "Unknown contact kind: {}", kind)
            }
        }
    }
}

impl std::error::Error for GuestContactError {}

/// Account role assigned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Result<Self, RoleError> {
        match value {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(RoleError::Unknown(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoleError {
    Unknown(String),
}

impl fmt::Display for RoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleError::Unknown(value) => write!(f, "Unknown role: {}", value),
        }
    }
}

impl std::error::Error for RoleError {}

/// A registered account with its profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identifier assigned by the identity provider
    pub id: String,
    /// Immutable once registered
    pub email: String,
    pub username: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    /// Preferred UI language code
    pub language: String,
    /// Whether presence notifications are wanted
    pub notifications: bool,
    /// RFC 3339 timestamp
    pub created_at: String,
}

/// A child registered under a parent account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    /// Child ID in format: "child::<epoch_millis>"
    pub id: String,
    /// ID of the owning user
    pub user_id: String,
    pub name: String,
    /// ISO 8601 date format (YYYY-MM-DD)
    pub birthdate: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl Child {
    /// Generate a child ID based on timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("child::{}", epoch_millis)
    }

    /// Parse a child ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, EntityIdError> {
        parse_entity_id(id, "child")
    }
}

/// A guest (a.k.a. "friend") permitted to be with a child, tracked by
/// presence status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    /// Guest ID in format: "guest::<epoch_millis>"
    pub id: String,
    /// ID of the child this guest is registered under
    pub child_id: String,
    pub name: String,
    pub contact: GuestContact,
    pub status: PresenceStatus,
    /// RFC 3339 timestamp of the last presence transition
    pub timestamp: String,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl Guest {
    /// Generate a guest ID based on timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("guest::{}", epoch_millis)
    }

    /// Parse a guest ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, EntityIdError> {
        parse_entity_id(id, "guest")
    }
}

fn parse_entity_id(id: &str, prefix: &str) -> Result<u64, EntityIdError> {
    let parts: Vec<&str> = id.split("::").collect();
    if parts.len() != 2 || parts[0] != prefix {
        return Err(EntityIdError::InvalidFormat);
    }

    parts[1]
        .parse::<u64>()
        .map_err(|_| EntityIdError::InvalidTimestamp)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for EntityIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityIdError::InvalidFormat => write!(f, "Invalid entity ID format"),
            EntityIdError::InvalidTimestamp => write!(f, "Invalid timestamp in entity ID"),
        }
    }
}

impl std::error::Error for EntityIdError {}

/// One recorded presence transition. Rows are append-only; the log is the
/// source of truth for history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: i64,
    pub child_id: String,
    pub guest_id: String,
    pub from_status: PresenceStatus,
    pub to_status: PresenceStatus,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// A single row of the history view, tagged with display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub child_name: String,
    pub guest_name: String,
    pub status: PresenceStatus,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Auth / profile requests and responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Abbreviated account shape returned from register/login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUserSummary {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl From<UserProfile> for AuthUserSummary {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: AuthUserSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDataResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Partial profile update; email and username are immutable through this path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub language: Option<String>,
    pub notifications: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Children requests and responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    /// ISO 8601 date format (YYYY-MM-DD)
    pub birthdate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateChildRequest {
    pub name: Option<String>,
    /// ISO 8601 date format (YYYY-MM-DD)
    pub birthdate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
}

// ---------------------------------------------------------------------------
// Guest / presence requests and responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddGuestRequest {
    pub name: String,
    pub contact: GuestContact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestResponse {
    pub guest: Guest,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestListResponse {
    pub guests: Vec<Guest>,
}

/// Target status for a presence change. Omitting `status` flips whatever the
/// guest's current status is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPresenceRequest {
    pub status: Option<PresenceStatus>,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryListResponse {
    pub records: Vec<HistoryRecord>,
}
