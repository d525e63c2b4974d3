//! Maps a share token back to an assignment.
//!
//! Strategies run in a fixed order and the first one that reaches a verdict
//! wins. Decoding the token is a single keyed lookup; the scans exist for
//! rows written by older issuers and read the whole link projection once per
//! resolution.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::assignment::AssignmentLink;
use crate::utils::share_token::{self, DecodedToken};
use crate::utils::time;

/// Read side of the assignment table used for link resolution.
pub trait LinkStore {
    fn find_link(
        &self,
        assignment_id: &str,
    ) -> impl Future<Output = Result<Option<AssignmentLink>>> + Send;

    fn list_links(&self) -> impl Future<Output = Result<Vec<AssignmentLink>>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(AssignmentLink),
    NotFound,
    ExpiredLink,
    MalformedToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DecodedId,
    ExactStoredToken,
    PartialStoredToken,
}

pub const STRATEGY_CHAIN: [Strategy; 3] = [
    Strategy::DecodedId,
    Strategy::ExactStoredToken,
    Strategy::PartialStoredToken,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Resolved(AssignmentLink),
    Expired,
    Continue,
}

/// Per-call state shared between strategies.
pub struct Attempt<'a> {
    token: &'a str,
    now: DateTime<Utc>,
    decoded: Option<DecodedToken>,
    snapshot: Option<Vec<AssignmentLink>>,
}

impl<'a> Attempt<'a> {
    pub fn new(token: &'a str, now: DateTime<Utc>) -> Self {
        Self {
            token,
            now,
            decoded: share_token::decode_at(token, now),
            snapshot: None,
        }
    }

    pub fn decoded(&self) -> Option<&DecodedToken> {
        self.decoded.as_ref()
    }

    async fn snapshot<S: LinkStore + Sync>(&mut self, store: &S) -> Result<&[AssignmentLink]> {
        if self.snapshot.is_none() {
            self.snapshot = Some(store.list_links().await?);
        }
        Ok(self.snapshot.as_deref().unwrap_or_default())
    }

    fn check_stored_expiry(&self, link: AssignmentLink) -> Step {
        match link.shareable_link_expires_at {
            Some(expires_at) if expires_at < self.now => {
                tracing::debug!(assignment_id = %link.id, %expires_at, "stored share link expired");
                Step::Expired
            }
            _ => Step::Resolved(link),
        }
    }
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::DecodedId => "decoded_id",
            Strategy::ExactStoredToken => "exact_stored_token",
            Strategy::PartialStoredToken => "partial_stored_token",
        }
    }

    pub async fn apply<S: LinkStore + Sync>(
        &self,
        attempt: &mut Attempt<'_>,
        store: &S,
    ) -> Result<Step> {
        match self {
            Strategy::DecodedId => {
                let Some(decoded) = attempt.decoded.as_ref() else {
                    return Ok(Step::Continue);
                };
                // A well-formed expired token is final; weaker matches must not revive it.
                if decoded.expired {
                    tracing::debug!(
                        assignment_id = %decoded.assignment_id,
                        expires_at = ?decoded.expires_at(),
                        "token payload expired"
                    );
                    return Ok(Step::Expired);
                }
                Ok(match store.find_link(&decoded.assignment_id).await? {
                    Some(link) => Step::Resolved(link),
                    None => Step::Continue,
                })
            }
            Strategy::ExactStoredToken => {
                let token = attempt.token;
                let matched = attempt
                    .snapshot(store)
                    .await?
                    .iter()
                    .find(|link| link.shareable_link.as_deref() == Some(token))
                    .cloned();
                Ok(match matched {
                    Some(link) => attempt.check_stored_expiry(link),
                    None => Step::Continue,
                })
            }
            Strategy::PartialStoredToken => {
                let token = attempt.token;
                let matched = attempt
                    .snapshot(store)
                    .await?
                    .iter()
                    .find(|link| {
                        link.shareable_link
                            .as_deref()
                            .is_some_and(|stored| same_link(stored, token))
                    })
                    .cloned();
                Ok(match matched {
                    Some(link) => attempt.check_stored_expiry(link),
                    None => Step::Continue,
                })
            }
        }
    }
}

/// Whether a stored link value and a bare token name the same link. Only
/// whole units compare: the stored value's last path segment, or the payload
/// before the separator on either side. Fragments of a token never match.
fn same_link(stored: &str, token: &str) -> bool {
    let stored = share_token::normalize(stored);
    if stored.is_empty() {
        return false;
    }
    let stored_payload = share_token::payload_part(&stored);
    let token_payload = share_token::payload_part(token);

    stored == token
        || stored_payload == Some(token)
        || token_payload.is_some_and(|p| p == stored || stored_payload == Some(p))
}

pub struct LinkResolver<'s, S> {
    store: &'s S,
}

impl<'s, S: LinkStore + Sync> LinkResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, token: &str) -> Result<Resolution> {
        self.resolve_at(token, time::now()).await
    }

    pub async fn resolve_at(&self, raw_token: &str, now: DateTime<Utc>) -> Result<Resolution> {
        let token = share_token::normalize(raw_token);
        if token.is_empty() {
            return Ok(Resolution::MalformedToken);
        }

        let mut attempt = Attempt::new(&token, now);
        for strategy in STRATEGY_CHAIN {
            match strategy.apply(&mut attempt, self.store).await? {
                Step::Resolved(link) => {
                    tracing::info!(
                        assignment_id = %link.id,
                        strategy = strategy.name(),
                        "share link resolved"
                    );
                    return Ok(Resolution::Found(link));
                }
                Step::Expired => {
                    tracing::info!(strategy = strategy.name(), "share link expired");
                    return Ok(Resolution::ExpiredLink);
                }
                Step::Continue => {}
            }
        }

        if attempt.decoded().is_some() {
            tracing::info!("share link decoded but no assignment matched");
            Ok(Resolution::NotFound)
        } else {
            tracing::info!("share link could not be decoded or matched");
            Ok(Resolution::MalformedToken)
        }
    }
}
