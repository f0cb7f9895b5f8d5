//! Event participants and the identifiers attached to them.
//!
//! Participants are invited by email, carry a single-use invite token, and
//! become bound to exactly one external identity when the invite is claimed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted length for identity subjects and emails.
pub const IDENTIFIER_MAX: usize = 254;

/// Validation errors raised by participant value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParticipantValidationError {
    /// The identity subject was empty once trimmed.
    #[error("identity subject must not be empty")]
    EmptyIdentity,
    /// The identity subject exceeded [`IDENTIFIER_MAX`] characters.
    #[error("identity subject must be at most {max} characters")]
    IdentityTooLong { max: usize },
    /// The email address is not of the form `local@domain`.
    #[error("email address is malformed")]
    InvalidEmail,
    /// The invite token is not a UUID.
    #[error("invite token is malformed")]
    InvalidInviteToken,
}

/// Stable event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random event identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Stable participant identifier.
///
/// Participant ids are totally ordered so draws depend only on the set of
/// participants, never on the order a store returns them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random participant identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Subject asserted by the upstream identity provider.
///
/// # Examples
/// ```
/// use santa_backend::domain::IdentityRef;
///
/// let identity = IdentityRef::new("auth0|abc123").expect("valid subject");
/// assert_eq!(identity.as_ref(), "auth0|abc123");
/// assert!(IdentityRef::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityRef(String);

impl IdentityRef {
    /// Validate and construct an identity reference.
    ///
    /// Surrounding whitespace is trimmed.
    pub fn new(subject: impl AsRef<str>) -> Result<Self, ParticipantValidationError> {
        let trimmed = subject.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ParticipantValidationError::EmptyIdentity);
        }
        if trimmed.chars().count() > IDENTIFIER_MAX {
            return Err(ParticipantValidationError::IdentityTooLong {
                max: IDENTIFIER_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for IdentityRef {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IdentityRef> for String {
    fn from(value: IdentityRef) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdentityRef {
    type Error = ParticipantValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Email address normalised to lower case.
///
/// Emails compare case-insensitively, so normalising on construction keeps
/// equality and uniqueness checks simple.
///
/// # Examples
/// ```
/// use santa_backend::domain::Email;
///
/// let email = Email::parse(" Ada@Example.COM ").expect("valid email");
/// assert_eq!(email.as_str(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate, trim and lower-case an email address.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ParticipantValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        let well_formed = normalised.chars().count() <= IDENTIFIER_MAX
            && !normalised.chars().any(char::is_whitespace)
            && normalised
                .split_once('@')
                .is_some_and(|(local, domain)| {
                    !local.is_empty() && !domain.is_empty() && !domain.contains('@')
                });
        if well_formed {
            Ok(Self(normalised))
        } else {
            Err(ParticipantValidationError::InvalidEmail)
        }
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = ParticipantValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Single-use invite token addressing one participant slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteToken(Uuid);

impl InviteToken {
    /// Wrap an existing UUID.
    pub const fn from_uuid(token: Uuid) -> Self {
        Self(token)
    }

    /// Generate a fresh token.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for InviteToken {
    type Err = ParticipantValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ParticipantValidationError::InvalidInviteToken)
    }
}

impl fmt::Display for InviteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Input for constructing a [`Participant`].
#[derive(Debug, Clone)]
pub struct ParticipantDraft {
    pub id: ParticipantId,
    pub event_id: EventId,
    pub display_name: Option<String>,
    pub email: Email,
    pub is_admin: bool,
    pub invite_token: InviteToken,
}

/// A person invited to an event.
///
/// ## Invariants
/// - `joined` is true exactly when an identity is bound.
/// - Once bound, the identity never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    id: ParticipantId,
    event_id: EventId,
    display_name: Option<String>,
    email: Email,
    is_admin: bool,
    bound_identity: Option<IdentityRef>,
    invite_token: InviteToken,
}

impl Participant {
    /// Create an unbound participant.
    pub fn new(draft: ParticipantDraft) -> Self {
        let ParticipantDraft {
            id,
            event_id,
            display_name,
            email,
            is_admin,
            invite_token,
        } = draft;
        Self {
            id,
            event_id,
            display_name: display_name
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
            email,
            is_admin,
            bound_identity: None,
            invite_token,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Whether the participant has claimed their invite.
    pub fn joined(&self) -> bool {
        self.bound_identity.is_some()
    }

    pub fn bound_identity(&self) -> Option<&IdentityRef> {
        self.bound_identity.as_ref()
    }

    pub fn invite_token(&self) -> InviteToken {
        self.invite_token
    }

    /// Bind `identity` to this participant if it is still unbound.
    ///
    /// Returns `false` without changing anything when an identity is already
    /// bound.
    pub fn bind(&mut self, identity: IdentityRef) -> bool {
        if self.bound_identity.is_some() {
            return false;
        }
        self.bound_identity = Some(identity);
        true
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn participant() -> Participant {
        Participant::new(ParticipantDraft {
            id: ParticipantId::random(),
            event_id: EventId::random(),
            display_name: Some("  Ada  ".to_owned()),
            email: Email::parse("ada@example.com").expect("valid email"),
            is_admin: false,
            invite_token: InviteToken::random(),
        })
    }

    #[rstest]
    #[case("ada@example.com")]
    #[case("ADA@EXAMPLE.COM")]
    #[case("  Ada@Example.com\n")]
    fn emails_normalise_to_lower_case(#[case] raw: &str) {
        assert_eq!(
            Email::parse(raw).expect("valid email").as_str(),
            "ada@example.com"
        );
    }

    #[rstest]
    #[case("")]
    #[case("ada")]
    #[case("@example.com")]
    #[case("ada@")]
    #[case("a@b@c")]
    #[case("ada lovelace@example.com")]
    fn malformed_emails_are_rejected(#[case] raw: &str) {
        assert_eq!(Email::parse(raw), Err(ParticipantValidationError::InvalidEmail));
    }

    #[rstest]
    fn identity_rejects_overlong_subjects() {
        let subject = "x".repeat(IDENTIFIER_MAX + 1);
        assert_eq!(
            IdentityRef::new(subject),
            Err(ParticipantValidationError::IdentityTooLong {
                max: IDENTIFIER_MAX
            })
        );
    }

    #[rstest]
    fn invite_tokens_parse_from_uuid_text() {
        let token = InviteToken::random();
        assert_eq!(token.to_string().parse::<InviteToken>(), Ok(token));
        assert_eq!(
            "not-a-token".parse::<InviteToken>(),
            Err(ParticipantValidationError::InvalidInviteToken)
        );
    }

    #[rstest]
    fn display_name_is_trimmed(participant: Participant) {
        assert_eq!(participant.display_name(), Some("Ada"));
    }

    #[rstest]
    fn binding_happens_once(mut participant: Participant) {
        let first = IdentityRef::new("auth0|first").expect("identity");
        let second = IdentityRef::new("auth0|second").expect("identity");

        assert!(!participant.joined());
        assert!(participant.bind(first.clone()));
        assert!(!participant.bind(second));
        assert!(participant.joined());
        assert_eq!(participant.bound_identity(), Some(&first));
    }
}
