//! Fetch decisions from local registry state and remote version knowledge.
//!
//! | existing entry | remote known | remote > local | action          |
//! |----------------|--------------|----------------|-----------------|
//! | none           | any          | any            | `FetchNew`      |
//! | present        | no           |                | `Skip`          |
//! | present        | yes          | yes            | `FetchUpdate`   |
//! | present        | yes          | no / equal     | `AlreadyCurrent`|
//!
//! [`decide`] is the table itself and does no I/O. [`Reconciler`] adds the
//! registry lookup and the storage layout for fetch actions. An unknown
//! remote version always degrades to `Skip` for known papers; no remote
//! version is ever guessed.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::identifier::Identity;
use crate::layout::PaperLayout;
use crate::registry::{PaperRepository, Result};

/// What the caller should do about one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// No local entry: fetch it.
    FetchNew,
    /// Local entry exists and the remote version is unknown.
    Skip,
    /// Remote has a newer version than the local entry.
    FetchUpdate,
    /// Local entry is at or above the remote version.
    AlreadyCurrent,
}

impl Action {
    /// Returns the display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchNew => "fetch_new",
            Self::Skip => "skip",
            Self::FetchUpdate => "fetch_update",
            Self::AlreadyCurrent => "already_current",
        }
    }

    /// Returns true when the action requires downloading artifacts.
    #[must_use]
    pub fn requires_fetch(self) -> bool {
        matches!(self, Self::FetchNew | Self::FetchUpdate)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies the decision table to a stored version and a remote version.
#[must_use]
pub fn decide(local_version: Option<u32>, remote_latest: Option<u32>) -> Action {
    match (local_version, remote_latest) {
        (None, _) => Action::FetchNew,
        (Some(_), None) => Action::Skip,
        (Some(local), Some(remote)) if remote > local => Action::FetchUpdate,
        (Some(_), Some(_)) => Action::AlreadyCurrent,
    }
}

/// A decision plus what to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchPlan {
    /// Decided action.
    pub action: Action,
    /// Identity to fetch; for fetch actions the version is raised to the
    /// remote version when that is higher.
    pub target: Identity,
    /// Version currently stored, if any.
    pub stored_version: Option<u32>,
    /// Storage paths, present only when `action` requires a fetch.
    pub layout: Option<PaperLayout>,
}

/// Reconciles identities against a registry.
#[derive(Debug, Clone)]
pub struct Reconciler<R> {
    repository: R,
    library_root: PathBuf,
}

impl<R: PaperRepository> Reconciler<R> {
    /// Creates a reconciler over `repository`, laying out fetches under `library_root`.
    pub fn new(repository: R, library_root: impl Into<PathBuf>) -> Self {
        Self {
            repository,
            library_root: library_root.into(),
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns the library root used for layouts.
    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Looks up `identity`'s key and decides what to do.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the lookup fails.
    pub async fn reconcile(&self, identity: &Identity, remote_latest: Option<u32>) -> Result<Action> {
        Ok(self.plan(identity, remote_latest).await?.action)
    }

    /// Like [`Self::reconcile`], with the target identity and layout.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the lookup fails.
    #[instrument(skip(self), fields(paper = %identity))]
    pub async fn plan(&self, identity: &Identity, remote_latest: Option<u32>) -> Result<FetchPlan> {
        let stored_version = self
            .repository
            .lookup(&identity.key())
            .await?
            .map(|entry| entry.version);
        let action = decide(stored_version, remote_latest);

        let (target, layout) = if action.requires_fetch() {
            let version = remote_latest.map_or(identity.version, |remote| remote.max(identity.version));
            let target = identity.with_version(version);
            let layout = PaperLayout::new(&self.library_root, &target);
            (target, Some(layout))
        } else {
            (identity.clone(), None)
        };

        debug!(action = %action, ?stored_version, ?remote_latest, target = %target, "reconciled");
        Ok(FetchPlan {
            action,
            target,
            stored_version,
            layout,
        })
    }
}
