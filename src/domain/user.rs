use serde::{de, Deserialize, Deserializer, Serialize};

/// Avatar used for records that never came from the remote service.
pub const PLACEHOLDER_AVATAR: &str = "https://reqres.in/img/faces/1-image.jpg";

/// Name shown when a record carries no usable first or last name.
pub const UNKNOWN_NAME: &str = "Unknown";

const EMAIL_DOMAIN: &str = "example.com";

/// A user as shown by the listing.
///
/// Identity is `id`: two records with the same id are the same user no matter
/// which source they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar: String,
}

impl UserRecord {
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            avatar: PLACEHOLDER_AVATAR.to_string(),
        }
    }

    /// "First Last", as used in notifications.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A locally created user persisted in the overlay store.
///
/// Derived fields are optional on read: entries written by older clients (or
/// edited by hand) may only carry `id` and `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

impl OverlayEntry {
    /// Builds the entry stored after the remote service confirmed a creation.
    pub fn confirmed(id: i64, name: &str, job: &str, created_at: String) -> Self {
        let derived = normalize(name);
        Self {
            id,
            name: Some(name.to_string()),
            job: Some(job.to_string()),
            first_name: Some(derived.first_name),
            last_name: Some(derived.last_name),
            email: Some(derived.email),
            avatar: Some(PLACEHOLDER_AVATAR.to_string()),
            created_at: Some(created_at),
        }
    }

    /// The entry as a `UserRecord`, fields taken as stored with no
    /// placeholders filled in.
    pub fn stored_record(&self) -> UserRecord {
        UserRecord {
            id: self.id,
            first_name: self.first_name.clone().unwrap_or_default(),
            last_name: self.last_name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            avatar: self
                .avatar
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
        }
    }
}

/// Fields derived from a free-form display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedName {
    pub first_name: String,
    /// Empty when the name is a single word.
    pub last_name: String,
    pub email: String,
}

/// Splits `name` on its first space and derives an `@example.com` address.
///
/// This is the only place the split heuristic lives; the reconciler and the
/// create path both go through it.
pub fn normalize(name: &str) -> DerivedName {
    let name = name.trim();
    let (first, last) = match name.split_once(' ') {
        Some((first, last)) => (first, last.trim()),
        None => (name, ""),
    };

    let first_name = if first.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        first.to_string()
    };

    let local_part = if name.is_empty() {
        UNKNOWN_NAME.to_lowercase()
    } else {
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(".")
            .to_lowercase()
    };

    DerivedName {
        first_name,
        last_name: last.to_string(),
        email: format!("{local_part}@{EMAIL_DOMAIN}"),
    }
}

/// Payload for creating a user on the remote service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCandidate {
    pub name: String,
    pub job: String,
}

impl CreateCandidate {
    pub fn new(name: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job: job.into(),
        }
    }
}

/// Remote response to a create request. `id` is `None` when the service
/// answered without a usable identity.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CreatedUser {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Remote response to a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatus {
    pub status: String,
}

impl DeleteStatus {
    pub const OK: &'static str = "OK";

    pub fn new(status: impl Into<String>) -> Self {
        Self { status: status.into() }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Self::OK
    }
}

// The remote service hands out ids as JSON strings on create and as numbers on
// list, and the overlay keeps whatever it was given.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_id(self) -> Option<i64> {
        match self {
            RawId::Number(n) => Some(n),
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer)?
        .into_id()
        .ok_or_else(|| de::Error::custom("id is not an integer"))
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.and_then(RawId::into_id))
}
