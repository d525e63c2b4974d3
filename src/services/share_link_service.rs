use std::future::Future;

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};
use crate::models::assignment::AssignmentDetail;
use crate::services::link_resolver::{LinkResolver, LinkStore, Resolution};
use crate::utils::{share_token, time};

pub const PLAY_PATH: &str = "/assignments/play";
pub const MAX_TTL_DAYS: i64 = 3650;

/// Write side of the assignment table plus the hydration query used once a
/// link has been resolved.
pub trait ShareLinkStore: LinkStore {
    /// Returns `false` when no assignment has this id.
    fn save_link(
        &self,
        assignment_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn load_detail(
        &self,
        assignment_id: &str,
    ) -> impl Future<Output = Result<Option<AssignmentDetail>>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IssuedLink {
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ShareLinkService<S> {
    store: S,
    origin: String,
    default_ttl_days: i64,
}

impl<S: ShareLinkStore + Sync> ShareLinkService<S> {
    pub fn new(store: S, origin: impl Into<String>, default_ttl_days: i64) -> Self {
        Self {
            store,
            origin: origin.into().trim_end_matches('/').to_string(),
            default_ttl_days,
        }
    }

    pub fn share_url(&self, token: &str) -> String {
        format!("{}{}/{}", self.origin, PLAY_PATH, token)
    }

    pub async fn issue(&self, assignment_id: &str, expires_in_days: Option<i64>) -> Result<IssuedLink> {
        let days = expires_in_days.unwrap_or(self.default_ttl_days);
        if !(1..=MAX_TTL_DAYS).contains(&days) {
            return Err(Error::BadRequest(format!(
                "expires_in_days must be between 1 and {}",
                MAX_TTL_DAYS
            )));
        }
        let expires_at = Duration::try_days(days)
            .and_then(|ttl| time::now().checked_add_signed(ttl))
            .ok_or_else(|| Error::BadRequest(format!("{} days is out of range", days)))?;
        self.issue_until(assignment_id, expires_at).await
    }

    /// Issues a token for an explicit expiry instant, replacing any earlier link.
    pub async fn issue_until(
        &self,
        assignment_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<IssuedLink> {
        let token = share_token::encode(assignment_id, expires_at);
        if !self.store.save_link(assignment_id, &token, expires_at).await? {
            return Err(Error::NotFound(format!(
                "Assignment {} not found",
                assignment_id
            )));
        }
        tracing::info!(assignment_id, %expires_at, "issued share link");

        Ok(IssuedLink {
            url: self.share_url(&token),
            token,
            expires_at,
        })
    }

    pub async fn resolve(&self, token: &str) -> Result<Resolution> {
        LinkResolver::new(&self.store).resolve(token).await
    }

    /// Resolves a token and loads the full assignment behind it.
    pub async fn open(&self, token: &str) -> Result<AssignmentDetail> {
        match self.resolve(token).await? {
            Resolution::Found(link) => self
                .store
                .load_detail(&link.id)
                .await?
                .ok_or(Error::LinkUnavailable),
            Resolution::ExpiredLink => Err(Error::LinkExpired),
            Resolution::NotFound | Resolution::MalformedToken => Err(Error::LinkUnavailable),
        }
    }
}
