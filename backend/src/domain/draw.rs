//! Draw state: exclusions, assignments, run status and snapshots.
//!
//! A draw reads a snapshot of an event's participants and exclusions, solves
//! it, and commits the resulting assignments. The snapshot fingerprint lets
//! the orchestrator detect participant or exclusion edits that landed between
//! reading the snapshot and committing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use draw_engine::Strategy;
use sha2::{Digest, Sha256};

use crate::domain::{Email, EventId, ParticipantId};

/// Directed exclusion: `giver` must not be assigned `receiver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Exclusion {
    pub giver: ParticipantId,
    pub receiver: ParticipantId,
}

impl Exclusion {
    pub const fn new(giver: ParticipantId, receiver: ParticipantId) -> Self {
        Self { giver, receiver }
    }
}

/// One committed giver-to-receiver pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Assignment {
    pub giver: ParticipantId,
    pub receiver: ParticipantId,
}

impl Assignment {
    pub const fn new(giver: ParticipantId, receiver: ParticipantId) -> Self {
        Self { giver, receiver }
    }
}

/// The receiver a giver was drawn to buy for, as revealed to that giver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedReceiver {
    pub participant_id: ParticipantId,
    pub display_name: Option<String>,
    pub email: Email,
}

/// Lifecycle of an event's draw.
///
/// ```text
/// pending -> computed -> committed
///               \-----> failed
/// committed | failed -> pending   (reset)
/// failed -> computed              (retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawRunStatus {
    /// No assignments exist; a draw may run.
    Pending,
    /// Assignments were computed but not yet written.
    Computed,
    /// Assignments are stored and immutable until reset.
    Committed,
    /// The last attempt found no valid assignment.
    Failed,
}

/// Rejected draw status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("draw cannot move from {from} to {to}")]
pub struct DrawTransitionError {
    pub from: DrawRunStatus,
    pub to: DrawRunStatus,
}

impl DrawRunStatus {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Computed => "computed",
            Self::Committed => "committed",
            Self::Failed => "failed",
        }
    }

    /// Move to `next`, enforcing the lifecycle.
    ///
    /// # Examples
    /// ```
    /// use santa_backend::domain::DrawRunStatus;
    ///
    /// let computed = DrawRunStatus::Pending
    ///     .transition(DrawRunStatus::Computed)
    ///     .expect("pending draws can be computed");
    /// assert!(computed.transition(DrawRunStatus::Pending).is_err());
    /// ```
    pub fn transition(self, next: Self) -> Result<Self, DrawTransitionError> {
        let allowed = matches!(
            (self, next),
            (Self::Pending | Self::Failed, Self::Computed)
                | (Self::Computed, Self::Committed | Self::Failed)
                | (Self::Committed | Self::Failed, Self::Pending)
        );
        if allowed {
            Ok(next)
        } else {
            Err(DrawTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for DrawRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown stored draw status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown draw status: {0}")]
pub struct UnknownDrawStatus(pub String);

impl FromStr for DrawRunStatus {
    type Err = UnknownDrawStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "computed" => Ok(Self::Computed),
            "committed" => Ok(Self::Committed),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownDrawStatus(other.to_owned())),
        }
    }
}

/// Stable label for a solver strategy, used in storage and responses.
pub const fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Direct => "direct",
        Strategy::Sampled { .. } => "sampled",
        Strategy::Constructive => "constructive",
    }
}

/// SHA-256 digest of an event's participant and exclusion sets.
///
/// The digest is order-independent and ignores duplicate exclusions, so two
/// snapshots fingerprint equal exactly when they describe the same draw
/// input.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotFingerprint([u8; 32]);

impl SnapshotFingerprint {
    /// Fingerprint a participant set and its exclusions.
    ///
    /// # Examples
    /// ```
    /// use santa_backend::domain::{Exclusion, ParticipantId, SnapshotFingerprint};
    ///
    /// let a = ParticipantId::random();
    /// let b = ParticipantId::random();
    /// let forward = SnapshotFingerprint::compute(&[a, b], &[Exclusion::new(a, b)]);
    /// let reversed = SnapshotFingerprint::compute(&[b, a], &[Exclusion::new(a, b); 2]);
    /// assert_eq!(forward, reversed);
    /// ```
    pub fn compute(participants: &[ParticipantId], exclusions: &[Exclusion]) -> Self {
        let mut ids = participants.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let mut pairs = exclusions.to_vec();
        pairs.sort_unstable();
        pairs.dedup();

        let mut hasher = Sha256::new();
        hasher.update(b"participants");
        for id in &ids {
            hasher.update(id.as_uuid().as_bytes());
        }
        hasher.update(b"exclusions");
        for pair in &pairs {
            hasher.update(pair.giver.as_uuid().as_bytes());
            hasher.update(pair.receiver.as_uuid().as_bytes());
        }
        Self(hasher.finalize().into())
    }

    /// Lower-case hexadecimal rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SnapshotFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotFingerprint({})", self.to_hex())
    }
}

impl fmt::Display for SnapshotFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Input to a draw, read under the event lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawSnapshot {
    pub event_id: EventId,
    pub participants: Vec<ParticipantId>,
    pub exclusions: Vec<Exclusion>,
    pub status: DrawRunStatus,
    pub assignment_count: usize,
}

impl DrawSnapshot {
    /// Whether a draw already produced stored assignments.
    pub fn is_committed(&self) -> bool {
        self.status == DrawRunStatus::Committed || self.assignment_count > 0
    }

    pub fn fingerprint(&self) -> SnapshotFingerprint {
        SnapshotFingerprint::compute(&self.participants, &self.exclusions)
    }
}

/// Everything written when a draw commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommit {
    pub event_id: EventId,
    /// Status recorded for the draw run; always reached through
    /// [`DrawRunStatus::transition`].
    pub status: DrawRunStatus,
    pub assignments: Vec<Assignment>,
    pub seed: u64,
    pub strategy: Strategy,
    pub committed_at: DateTime<Utc>,
}
