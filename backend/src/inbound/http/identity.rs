//! Caller identity asserted by the authentication proxy.
//!
//! The proxy in front of the service verifies credentials and forwards the
//! subject and email as headers. Handlers take [`CallerIdentity`] as an
//! extractor so they never touch raw headers.

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use tracing::warn;

use crate::domain::{Email, Error, IdentityRef};

/// Header carrying the authenticated subject.
pub const IDENTITY_SUBJECT_HEADER: &str = "x-identity-subject";
/// Header carrying the subject's verified email, when the provider has one.
pub const IDENTITY_EMAIL_HEADER: &str = "x-identity-email";

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub subject: IdentityRef,
    pub email: Option<Email>,
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl CallerIdentity {
    fn from_headers(req: &HttpRequest) -> Result<Self, Error> {
        let subject = header(req, IDENTITY_SUBJECT_HEADER)
            .ok_or_else(|| Error::unauthorized("identity required"))?;
        let subject = IdentityRef::new(subject)
            .map_err(|err| Error::unauthorized(format!("invalid identity: {err}")))?;

        // An unusable email never blocks the request; the claim policy decides
        // whether a missing email matters.
        let email = header(req, IDENTITY_EMAIL_HEADER).and_then(|raw| match Email::parse(raw) {
            Ok(email) => Some(email),
            Err(err) => {
                warn!(error = %err, "ignoring malformed identity email header");
                None
            }
        });

        Ok(Self { subject, email })
    }
}

impl FromRequest for CallerIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}
