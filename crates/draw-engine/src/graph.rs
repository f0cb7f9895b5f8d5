//! Constraint graph construction.
//!
//! The graph records, for every giver, the receivers it must not be paired
//! with. Self-pairing is forbidden by construction; explicit exclusions add
//! further forbidden edges. Building the graph performs no randomness and no
//! I/O, so it can be tested independently of the solver.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::GraphError;
use crate::solver::Pairing;

/// Smallest participant count for which a draw is defined.
pub const MIN_PARTICIPANTS: usize = 2;

/// Identifier types usable as graph nodes.
///
/// Identifiers are ordered so the graph layout depends only on the
/// participant set, not on the order callers list participants in.
pub trait ParticipantKey: Copy + Ord + Hash + Debug {}

impl<T: Copy + Ord + Hash + Debug> ParticipantKey for T {}

/// Directed exclusion: `giver` must not give to `receiver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExclusionPair<Id> {
    /// Participant that must not draw `receiver`.
    pub giver: Id,
    /// Participant that `giver` must not draw.
    pub receiver: Id,
}

impl<Id> ExclusionPair<Id> {
    /// Construct an exclusion pair.
    #[must_use]
    pub const fn new(giver: Id, receiver: Id) -> Self {
        Self { giver, receiver }
    }
}

/// Forbidden-receiver sets for every participant of one draw.
///
/// ## Invariants
/// - At least [`MIN_PARTICIPANTS`] distinct participants, sorted by id.
/// - Every participant forbids itself.
/// - Forbidden sets only reference participants of the graph.
///
/// # Examples
/// ```
/// use draw_engine::{ConstraintGraph, ExclusionPair};
///
/// let graph = ConstraintGraph::build(["ada", "bob", "cy"], [ExclusionPair::new("ada", "bob")])
///     .expect("valid graph");
/// assert!(!graph.is_allowed("ada", "bob"));
/// assert!(graph.is_allowed("bob", "ada"));
/// assert!(!graph.is_allowed("cy", "cy"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintGraph<Id> {
    ids: Vec<Id>,
    index: BTreeMap<Id, usize>,
    forbidden: Vec<BTreeSet<usize>>,
    explicit_exclusions: usize,
}

impl<Id: ParticipantKey> ConstraintGraph<Id> {
    /// Build the graph from participant identifiers and exclusion pairs.
    ///
    /// Duplicate exclusions are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when a participant is listed twice, when fewer
    /// than [`MIN_PARTICIPANTS`] participants are supplied, when an exclusion
    /// references an unknown participant, or when an exclusion names the same
    /// participant on both sides.
    pub fn build<P, E>(participants: P, exclusions: E) -> Result<Self, GraphError<Id>>
    where
        P: IntoIterator<Item = Id>,
        E: IntoIterator<Item = ExclusionPair<Id>>,
    {
        let mut ids: Vec<Id> = participants.into_iter().collect();
        ids.sort_unstable();

        let duplicate = ids.windows(2).find_map(|window| match window {
            [left, right] if left == right => Some(*left),
            _ => None,
        });
        if let Some(id) = duplicate {
            return Err(GraphError::DuplicateParticipant { id });
        }
        if ids.len() < MIN_PARTICIPANTS {
            return Err(GraphError::TooFewParticipants {
                minimum: MIN_PARTICIPANTS,
                found: ids.len(),
            });
        }

        let index: BTreeMap<Id, usize> = ids
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();
        let mut forbidden: Vec<BTreeSet<usize>> = (0..ids.len())
            .map(|position| BTreeSet::from([position]))
            .collect();
        let mut explicit = BTreeSet::new();

        for pair in exclusions {
            let giver = resolve(&index, pair.giver)?;
            let receiver = resolve(&index, pair.receiver)?;
            if giver == receiver {
                return Err(GraphError::SelfExclusion { id: pair.giver });
            }
            if let Some(set) = forbidden.get_mut(giver) {
                set.insert(receiver);
            }
            explicit.insert((giver, receiver));
        }

        Ok(Self {
            ids,
            index,
            forbidden,
            explicit_exclusions: explicit.len(),
        })
    }

    /// Participants in graph order (ascending id).
    #[must_use]
    pub fn participants(&self) -> &[Id] {
        self.ids.as_slice()
    }

    /// Number of participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always `false`: a built graph holds at least two participants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct explicit exclusions (self-pairings not counted).
    #[must_use]
    pub const fn explicit_exclusion_count(&self) -> usize {
        self.explicit_exclusions
    }

    /// Whether `giver` may be assigned to give to `receiver`.
    ///
    /// Unknown identifiers are never allowed.
    #[must_use]
    pub fn is_allowed(&self, giver: Id, receiver: Id) -> bool {
        match (self.index.get(&giver), self.index.get(&receiver)) {
            (Some(&giver), Some(&receiver)) => self.allows(giver, receiver),
            _ => false,
        }
    }

    /// Receivers `giver` must not be assigned, in ascending order.
    ///
    /// Returns `None` when `giver` is not part of the graph.
    #[must_use]
    pub fn forbidden_receivers(&self, giver: Id) -> Option<Vec<Id>> {
        let position = *self.index.get(&giver)?;
        let set = self.forbidden.get(position)?;
        Some(set.iter().filter_map(|r| self.ids.get(*r).copied()).collect())
    }

    /// Check that `pairings` form a complete draw over this graph.
    ///
    /// A complete draw names every participant exactly once as giver and
    /// exactly once as receiver, and never uses a forbidden pair.
    #[must_use]
    pub fn admits(&self, pairings: &[Pairing<Id>]) -> bool {
        if pairings.len() != self.len() {
            return false;
        }
        let mut givers = BTreeSet::new();
        let mut receivers = BTreeSet::new();
        pairings.iter().all(|pairing| {
            self.is_allowed(pairing.giver, pairing.receiver)
                && givers.insert(pairing.giver)
                && receivers.insert(pairing.receiver)
        })
    }

    pub(crate) fn allows(&self, giver: usize, receiver: usize) -> bool {
        receiver < self.ids.len()
            && self
                .forbidden
                .get(giver)
                .is_some_and(|set| !set.contains(&receiver))
    }

    /// Allowed receivers for every giver, indexed by graph position.
    pub(crate) fn adjacency(&self) -> Vec<Vec<usize>> {
        (0..self.len())
            .map(|giver| {
                (0..self.len())
                    .filter(|receiver| self.allows(giver, *receiver))
                    .collect()
            })
            .collect()
    }

    pub(crate) fn id_at(&self, position: usize) -> Option<Id> {
        self.ids.get(position).copied()
    }
}

fn resolve<Id: ParticipantKey>(index: &BTreeMap<Id, usize>, id: Id) -> Result<usize, GraphError<Id>> {
    index
        .get(&id)
        .copied()
        .ok_or(GraphError::UnknownParticipant { id })
}
