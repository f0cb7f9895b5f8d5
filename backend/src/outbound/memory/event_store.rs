//! In-process event store implementing the draw, invite and assignment
//! ports.
//!
//! Used by tests and by database-less runs. Draw sessions hold a per-event
//! `tokio` mutex guard so two sessions for one event never coexist; every
//! read and write of event data happens under one short-lived state mutex,
//! which makes each port call atomic.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use draw_engine::Strategy;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::ports::{
    AssignmentRepository, AssignmentRepositoryError, ConditionalWrite, DrawRepository, DrawRepositoryError, DrawSession, InviteClaim,
    InviteRepository, InviteRepositoryError, ResetResult,
};
use crate::domain::{
    AssignedReceiver, Assignment, DrawCommit, DrawRunStatus, DrawSnapshot, Email, EventId, Exclusion, IdentityRef,
    InviteToken, Participant, ParticipantDraft, ParticipantId, SnapshotFingerprint,
};

/// Errors raised while seeding the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    #[error("event {0} does not exist")]
    UnknownEvent(EventId),
    #[error("participant {0} does not belong to the event")]
    UnknownParticipant(ParticipantId),
    #[error("email {0} is already invited to the event")]
    DuplicateEmail(Email),
    #[error("participant {0} cannot be excluded from drawing themself")]
    SelfExclusion(ParticipantId),
}

/// Audit record of an event's draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRunRecord {
    pub status: DrawRunStatus,
    pub seed: Option<u64>,
    pub strategy: Option<Strategy>,
    pub committed_at: Option<DateTime<Utc>>,
}

impl Default for DrawRunRecord {
    fn default() -> Self {
        Self {
            status: DrawRunStatus::Pending,
            seed: None,
            strategy: None,
            committed_at: None,
        }
    }
}

#[derive(Debug)]
struct EventRecord {
    organiser: IdentityRef,
}

#[derive(Debug, Default)]
struct StoreState {
    events: HashMap<EventId, EventRecord>,
    participants: HashMap<ParticipantId, Participant>,
    exclusions: HashMap<EventId, BTreeSet<Exclusion>>,
    assignments: HashMap<EventId, Vec<Assignment>>,
    runs: HashMap<EventId, DrawRunRecord>,
}

impl StoreState {
    fn event_participants(&self, event_id: EventId) -> impl Iterator<Item = &Participant> {
        self.participants
            .values()
            .filter(move |participant| participant.event_id() == event_id)
    }

    fn draw_inputs(&self, event_id: EventId) -> (Vec<ParticipantId>, Vec<Exclusion>) {
        let mut participants: Vec<_> = self
            .event_participants(event_id)
            .map(Participant::id)
            .collect();
        participants.sort_unstable();
        let exclusions = self
            .exclusions
            .get(&event_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        (participants, exclusions)
    }

    fn authorise(&self, event_id: EventId, actor: &IdentityRef) -> Result<(), DrawRepositoryError> {
        let event = self.events.get(&event_id).ok_or_else(|| {
            DrawRepositoryError::event_not_found(format!("event {event_id} does not exist"))
        })?;
        let admin = event.organiser == *actor
            || self.event_participants(event_id).any(|participant| {
                participant.is_admin() && participant.bound_identity() == Some(actor)
            });
        if admin {
            Ok(())
        } else {
            Err(DrawRepositoryError::forbidden(format!(
                "only admins of event {event_id} may change its draw"
            )))
        }
    }
}

/// Shared in-memory store; clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    state: Arc<Mutex<StoreState>>,
    locks: Arc<Mutex<HashMap<EventId, Arc<AsyncMutex<()>>>>>,
}

impl InMemoryEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn event_lock(&self, event_id: EventId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(event_id).or_default())
    }

    fn try_lock_event(&self, event_id: EventId) -> Result<OwnedMutexGuard<()>, DrawRepositoryError> {
        self.event_lock(event_id).try_lock_owned().map_err(|_| {
            DrawRepositoryError::contention(format!("event {event_id} is locked by another draw"))
        })
    }

    /// Create an event organised by `organiser`.
    pub fn create_event(&self, organiser: IdentityRef) -> EventId {
        let event_id = EventId::random();
        let mut state = self.lock_state();
        state.events.insert(event_id, EventRecord { organiser });
        state.runs.insert(event_id, DrawRunRecord::default());
        event_id
    }

    /// Invite `email` to an event and return the new participant.
    ///
    /// # Errors
    ///
    /// Fails when the event is unknown or the email is already invited.
    pub fn add_participant(
        &self,
        event_id: EventId,
        email: Email,
        display_name: Option<&str>,
        is_admin: bool,
    ) -> Result<Participant, SeedError> {
        let mut state = self.lock_state();
        if !state.events.contains_key(&event_id) {
            return Err(SeedError::UnknownEvent(event_id));
        }
        if state
            .event_participants(event_id)
            .any(|participant| *participant.email() == email)
        {
            return Err(SeedError::DuplicateEmail(email));
        }
        let participant = Participant::new(ParticipantDraft {
            id: ParticipantId::random(),
            event_id,
            display_name: display_name.map(str::to_owned),
            email,
            is_admin,
            invite_token: InviteToken::random(),
        });
        state
            .participants
            .insert(participant.id(), participant.clone());
        Ok(participant)
    }

    /// Forbid `giver` from drawing `receiver`. Duplicates are no-ops.
    ///
    /// # Errors
    ///
    /// Fails when either participant is not part of the event or both are
    /// the same participant.
    pub fn add_exclusion(
        &self,
        event_id: EventId,
        giver: ParticipantId,
        receiver: ParticipantId,
    ) -> Result<(), SeedError> {
        if giver == receiver {
            return Err(SeedError::SelfExclusion(giver));
        }
        let mut state = self.lock_state();
        for id in [giver, receiver] {
            let belongs = state
                .participants
                .get(&id)
                .is_some_and(|participant| participant.event_id() == event_id);
            if !belongs {
                return Err(SeedError::UnknownParticipant(id));
            }
        }
        state
            .exclusions
            .entry(event_id)
            .or_default()
            .insert(Exclusion::new(giver, receiver));
        Ok(())
    }

    /// Stored assignments ordered by giver.
    pub fn assignments(&self, event_id: EventId) -> Vec<Assignment> {
        self.lock_state()
            .assignments
            .get(&event_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Current state of a participant.
    pub fn participant(&self, id: ParticipantId) -> Option<Participant> {
        self.lock_state().participants.get(&id).cloned()
    }

    /// Draw audit record for an event.
    pub fn draw_run(&self, event_id: EventId) -> Option<DrawRunRecord> {
        self.lock_state().runs.get(&event_id).cloned()
    }
}

struct MemoryDrawSession {
    store: InMemoryEventStore,
    event_id: EventId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl MemoryDrawSession {
    fn ensure_open(&self) -> Result<(), DrawRepositoryError> {
        if self.guard.is_some() {
            Ok(())
        } else {
            Err(DrawRepositoryError::query("draw session already closed"))
        }
    }
}

#[async_trait]
impl DrawSession for MemoryDrawSession {
    async fn load_snapshot(&mut self) -> Result<DrawSnapshot, DrawRepositoryError> {
        self.ensure_open()?;
        let state = self.store.lock_state();
        let (participants, exclusions) = state.draw_inputs(self.event_id);
        let status = state
            .runs
            .get(&self.event_id)
            .map(|run| run.status)
            .unwrap_or(DrawRunStatus::Pending);
        let assignment_count = state.assignments.get(&self.event_id).map_or(0, Vec::len);
        Ok(DrawSnapshot {
            event_id: self.event_id,
            participants,
            exclusions,
            status,
            assignment_count,
        })
    }

    async fn current_fingerprint(&mut self) -> Result<SnapshotFingerprint, DrawRepositoryError> {
        self.ensure_open()?;
        let (participants, exclusions) = self.store.lock_state().draw_inputs(self.event_id);
        Ok(SnapshotFingerprint::compute(&participants, &exclusions))
    }

    async fn commit(&mut self, commit: DrawCommit) -> Result<(), DrawRepositoryError> {
        self.ensure_open()?;
        {
            let mut state = self.store.lock_state();
            if state
                .assignments
                .get(&commit.event_id)
                .is_some_and(|existing| !existing.is_empty())
            {
                return Err(DrawRepositoryError::query("assignments already exist for event"));
            }
            let mut assignments = commit.assignments;
            assignments.sort_unstable();
            state.assignments.insert(commit.event_id, assignments);
            state.runs.insert(
                commit.event_id,
                DrawRunRecord {
                    status: commit.status,
                    seed: Some(commit.seed),
                    strategy: Some(commit.strategy),
                    committed_at: Some(commit.committed_at),
                },
            );
        }
        self.guard = None;
        Ok(())
    }

    async fn release(&mut self) -> Result<(), DrawRepositoryError> {
        self.ensure_open()?;
        self.guard = None;
        Ok(())
    }
}

#[async_trait]
impl DrawRepository for InMemoryEventStore {
    async fn lock_event(
        &self,
        event_id: EventId,
        actor: &IdentityRef,
    ) -> Result<Box<dyn DrawSession>, DrawRepositoryError> {
        self.lock_state().authorise(event_id, actor)?;
        let guard = self.try_lock_event(event_id)?;
        Ok(Box::new(MemoryDrawSession {
            store: self.clone(),
            event_id,
            guard: Some(guard),
        }))
    }

    async fn reset(
        &self,
        event_id: EventId,
        actor: &IdentityRef,
    ) -> Result<ResetResult, DrawRepositoryError> {
        self.lock_state().authorise(event_id, actor)?;
        let _guard = self.try_lock_event(event_id)?;
        let mut state = self.lock_state();
        let discarded = state
            .assignments
            .remove(&event_id)
            .map_or(0, |assignments| assignments.len());
        state.runs.insert(event_id, DrawRunRecord::default());
        Ok(ResetResult {
            discarded_assignments: discarded,
        })
    }
}

#[async_trait]
impl InviteRepository for InMemoryEventStore {
    async fn claim_unbound(
        &self,
        claim: InviteClaim,
    ) -> Result<ConditionalWrite, InviteRepositoryError> {
        let mut state = self.lock_state();
        let Some(target) = state
            .participants
            .values()
            .find(|participant| participant.invite_token() == claim.token)
        else {
            return Ok(ConditionalWrite::unapplied());
        };
        let target_id = target.id();
        let event_id = target.event_id();
        let email_matches = claim
            .required_email
            .as_ref()
            .is_none_or(|email| target.email() == email);
        let identity_taken = state
            .event_participants(event_id)
            .any(|participant| participant.bound_identity() == Some(&claim.identity));
        if target.joined() || !email_matches || identity_taken {
            return Ok(ConditionalWrite::unapplied());
        }

        let bound = state
            .participants
            .get_mut(&target_id)
            .is_some_and(|participant| participant.bind(claim.identity));
        Ok(if bound {
            ConditionalWrite::applied(event_id)
        } else {
            ConditionalWrite::unapplied()
        })
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryEventStore {
    async fn receiver_for(
        &self,
        event_id: EventId,
        viewer: &IdentityRef,
    ) -> Result<Option<AssignedReceiver>, AssignmentRepositoryError> {
        let state = self.lock_state();
        if !state.events.contains_key(&event_id) {
            return Err(AssignmentRepositoryError::event_not_found(format!(
                "event {event_id} does not exist"
            )));
        }
        let giver = state
            .event_participants(event_id)
            .find(|participant| participant.bound_identity() == Some(viewer))
            .map(Participant::id)
            .ok_or_else(|| {
                AssignmentRepositoryError::not_participant(format!(
                    "caller has not joined event {event_id}"
                ))
            })?;

        let Some(assignment) = state
            .assignments
            .get(&event_id)
            .and_then(|assignments| assignments.iter().find(|a| a.giver == giver))
        else {
            return Ok(None);
        };
        let receiver = state.participants.get(&assignment.receiver).ok_or_else(|| {
            AssignmentRepositoryError::query(format!(
                "assigned receiver {} is missing",
                assignment.receiver
            ))
        })?;
        Ok(Some(AssignedReceiver {
            participant_id: receiver.id(),
            display_name: receiver.display_name().map(str::to_owned),
            email: receiver.email().clone(),
        }))
    }
}

#[cfg(test)]
#[path = "event_store_tests.rs"]
mod tests;
