//! Seeded derangement solver.
//!
//! The solver first proves feasibility with a maximum matching, then samples
//! uniformly random permutations until one satisfies every constraint.
//! Rejection sampling over uniform permutations yields a uniform choice among
//! valid assignments. A bounded attempt budget guards against pathological
//! constraint density; when it runs out, a constructive matching with random
//! tie-breaks produces a valid assignment instead.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::SolveError;
use crate::graph::{ConstraintGraph, MIN_PARTICIPANTS, ParticipantKey};
use crate::matching::maximum_matching;

/// Default lower bound on sampling attempts.
pub const DEFAULT_BASE_ATTEMPTS: usize = 4_096;

/// Default sampling attempts granted per participant.
pub const DEFAULT_ATTEMPTS_PER_PARTICIPANT: usize = 256;

/// One giver-to-receiver pairing produced by a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pairing<Id> {
    /// Participant who gives.
    pub giver: Id,
    /// Participant who receives from `giver`.
    pub receiver: Id,
}

impl<Id> Pairing<Id> {
    /// Construct a pairing.
    #[must_use]
    pub const fn new(giver: Id, receiver: Id) -> Self {
        Self { giver, receiver }
    }
}

/// How a [`Solution`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Two participants: the single swap is the only candidate.
    Direct,
    /// Uniform rejection sampling accepted a permutation.
    Sampled {
        /// Attempt number that produced the accepted permutation.
        attempts: usize,
    },
    /// The attempt budget ran out; a randomised constructive matching was
    /// used instead.
    Constructive,
}

/// Sampling budget for the [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    /// Minimum number of sampling attempts regardless of draw size.
    pub base_attempts: usize,
    /// Attempts granted per participant; the larger of the two bounds wins.
    pub attempts_per_participant: usize,
}

impl SolverConfig {
    /// Attempt cap for a draw of `participants` people.
    ///
    /// # Examples
    /// ```
    /// use draw_engine::SolverConfig;
    ///
    /// let config = SolverConfig {
    ///     base_attempts: 100,
    ///     attempts_per_participant: 10,
    /// };
    /// assert_eq!(config.attempt_cap(5), 100);
    /// assert_eq!(config.attempt_cap(50), 500);
    /// ```
    #[must_use]
    pub const fn attempt_cap(&self, participants: usize) -> usize {
        let scaled = self.attempts_per_participant.saturating_mul(participants);
        if scaled > self.base_attempts {
            scaled
        } else {
            self.base_attempts
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            base_attempts: DEFAULT_BASE_ATTEMPTS,
            attempts_per_participant: DEFAULT_ATTEMPTS_PER_PARTICIPANT,
        }
    }
}

/// A complete, valid draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution<Id> {
    pairings: Vec<Pairing<Id>>,
    seed: u64,
    strategy: Strategy,
}

impl<Id: ParticipantKey> Solution<Id> {
    /// Pairings ordered by giver id.
    #[must_use]
    pub fn pairings(&self) -> &[Pairing<Id>] {
        self.pairings.as_slice()
    }

    /// Consume the solution, returning its pairings.
    #[must_use]
    pub fn into_pairings(self) -> Vec<Pairing<Id>> {
        self.pairings
    }

    /// Receiver assigned to `giver`, if `giver` took part.
    #[must_use]
    pub fn receiver_of(&self, giver: Id) -> Option<Id> {
        self.pairings
            .iter()
            .find(|pairing| pairing.giver == giver)
            .map(|pairing| pairing.receiver)
    }

    /// Seed the solution was drawn with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Strategy that produced the solution.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }
}

/// Draw solver with a configurable sampling budget.
///
/// # Examples
/// ```
/// use draw_engine::{ConstraintGraph, Solver};
///
/// let graph = ConstraintGraph::build([1_u32, 2, 3, 4], []).expect("valid graph");
/// let solution = Solver::default().solve(&graph, 42).expect("feasible");
/// assert!(graph.admits(solution.pairings()));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    /// Create a solver with the given sampling budget.
    #[must_use]
    pub const fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Sampling budget in use.
    #[must_use]
    pub const fn config(&self) -> SolverConfig {
        self.config
    }

    /// Draw an assignment for `graph` using `seed`.
    ///
    /// The same graph, seed and configuration always produce the same
    /// solution.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::Infeasible`] when no assignment satisfies the
    /// constraints. Infeasibility is detected before any sampling happens.
    pub fn solve<Id: ParticipantKey>(
        &self,
        graph: &ConstraintGraph<Id>,
        seed: u64,
    ) -> Result<Solution<Id>, SolveError<Id>> {
        let adjacency = graph.adjacency();
        let matching = maximum_matching(&adjacency, graph.len());
        let unmatched = matching.unmatched();
        let Some(witness) = matching.into_perfect() else {
            return Err(infeasible(graph, &adjacency, unmatched));
        };

        if graph.len() == MIN_PARTICIPANTS {
            return Ok(assemble(graph, &witness, seed, Strategy::Direct));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cap = self.config.attempt_cap(graph.len());
        for attempt in 1..=cap {
            if let Some(receivers) = sample_permutation(graph, &mut rng) {
                return Ok(assemble(
                    graph,
                    &receivers,
                    seed,
                    Strategy::Sampled { attempts: attempt },
                ));
            }
        }

        let receivers = construct_matching(&adjacency, &mut rng)
            .ok_or_else(|| infeasible(graph, &adjacency, unmatched))?;
        Ok(assemble(graph, &receivers, seed, Strategy::Constructive))
    }
}

/// Solve with the default sampling budget.
///
/// # Errors
///
/// See [`Solver::solve`].
pub fn solve<Id: ParticipantKey>(
    graph: &ConstraintGraph<Id>,
    seed: u64,
) -> Result<Solution<Id>, SolveError<Id>> {
    Solver::default().solve(graph, seed)
}

/// Forward Fisher–Yates shuffle that abandons the permutation as soon as a
/// fixed position holds a forbidden receiver.
fn sample_permutation<Id: ParticipantKey>(
    graph: &ConstraintGraph<Id>,
    rng: &mut ChaCha8Rng,
) -> Option<Vec<usize>> {
    let count = graph.len();
    let mut receivers: Vec<usize> = (0..count).collect();
    for giver in 0..count {
        let pick = rng.random_range(giver..count);
        receivers.swap(giver, pick);
        let receiver = receivers.get(giver).copied()?;
        if !graph.allows(giver, receiver) {
            return None;
        }
    }
    Some(receivers)
}

/// Maximum matching over shuffled givers and shuffled adjacency lists.
fn construct_matching(adjacency: &[Vec<usize>], rng: &mut ChaCha8Rng) -> Option<Vec<usize>> {
    let mut order: Vec<usize> = (0..adjacency.len()).collect();
    order.shuffle(rng);

    let shuffled: Vec<Vec<usize>> = order
        .iter()
        .map(|giver| {
            let mut receivers = adjacency.get(*giver).cloned().unwrap_or_default();
            receivers.shuffle(rng);
            receivers
        })
        .collect();

    let by_slot = maximum_matching(&shuffled, adjacency.len()).into_perfect()?;
    let mut receivers = vec![0; adjacency.len()];
    for (slot, receiver) in by_slot.into_iter().enumerate() {
        let giver = *order.get(slot)?;
        *receivers.get_mut(giver)? = receiver;
    }
    Some(receivers)
}

fn assemble<Id: ParticipantKey>(
    graph: &ConstraintGraph<Id>,
    receivers: &[usize],
    seed: u64,
    strategy: Strategy,
) -> Solution<Id> {
    let pairings = receivers
        .iter()
        .enumerate()
        .filter_map(|(giver, receiver)| {
            Some(Pairing::new(graph.id_at(giver)?, graph.id_at(*receiver)?))
        })
        .collect();
    Solution {
        pairings,
        seed,
        strategy,
    }
}

fn infeasible<Id: ParticipantKey>(
    graph: &ConstraintGraph<Id>,
    adjacency: &[Vec<usize>],
    unmatched: usize,
) -> SolveError<Id> {
    let blocked_givers = adjacency
        .iter()
        .enumerate()
        .filter(|(_, receivers)| receivers.is_empty())
        .filter_map(|(giver, _)| graph.id_at(giver))
        .collect();
    SolveError::Infeasible {
        unmatched: unmatched.max(1),
        blocked_givers,
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for the solver's strategies and edge cases.

    use std::collections::BTreeMap;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::ExclusionPair;

    const EXHAUSTED: SolverConfig = SolverConfig {
        base_attempts: 0,
        attempts_per_participant: 0,
    };

    #[fixture]
    fn four_people() -> ConstraintGraph<u32> {
        ConstraintGraph::build([1_u32, 2, 3, 4], []).expect("valid graph")
    }

    /// Exclusions leaving only the cycle 1 -> 2 -> 3 -> 4 -> 5 -> 1.
    fn single_cycle() -> ConstraintGraph<u32> {
        let successors = [(1_u32, 2_u32), (2, 3), (3, 4), (4, 5), (5, 1)];
        let exclusions = successors.iter().flat_map(|&(giver, next)| {
            (1_u32..=5)
                .filter(move |receiver| *receiver != giver && *receiver != next)
                .map(move |receiver| ExclusionPair::new(giver, receiver))
        });
        ConstraintGraph::build(1_u32..=5, exclusions).expect("valid graph")
    }

    #[rstest]
    fn two_participants_swap_directly() {
        let graph = ConstraintGraph::build(["a", "b"], []).expect("valid graph");
        let solution = solve(&graph, 7).expect("feasible");
        assert_eq!(solution.strategy(), Strategy::Direct);
        assert_eq!(
            solution.pairings(),
            &[Pairing::new("a", "b"), Pairing::new("b", "a")]
        );
    }

    #[rstest]
    fn two_participants_with_an_exclusion_are_infeasible() {
        let graph =
            ConstraintGraph::build(["a", "b"], [ExclusionPair::new("a", "b")]).expect("graph");
        let err = solve(&graph, 7).expect_err("infeasible");
        assert_eq!(
            err,
            SolveError::Infeasible {
                unmatched: 1,
                blocked_givers: vec!["a"],
            }
        );
    }

    #[rstest]
    fn sampling_reports_attempt_number(four_people: ConstraintGraph<u32>) {
        let solution = solve(&four_people, 42).expect("feasible");
        assert!(matches!(solution.strategy(), Strategy::Sampled { attempts } if attempts >= 1));
        assert!(four_people.admits(solution.pairings()));
        assert_eq!(solution.seed(), 42);
    }

    #[rstest]
    fn same_seed_same_solution(four_people: ConstraintGraph<u32>) {
        let first = solve(&four_people, 99).expect("feasible");
        let second = solve(&four_people, 99).expect("feasible");
        assert_eq!(first, second);
    }

    #[rstest]
    fn participant_order_does_not_change_the_draw() {
        let forward = ConstraintGraph::build([1_u32, 2, 3, 4, 5], [ExclusionPair::new(1, 2)])
            .expect("valid graph");
        let reversed = ConstraintGraph::build([5_u32, 4, 3, 2, 1], [ExclusionPair::new(1, 2)])
            .expect("valid graph");
        assert_eq!(
            solve(&forward, 5).expect("feasible"),
            solve(&reversed, 5).expect("feasible")
        );
    }

    #[rstest]
    fn exhausted_budget_falls_back_to_construction() {
        let graph = single_cycle();
        let solution = Solver::with_config(EXHAUSTED).solve(&graph, 3).expect("feasible");
        assert_eq!(solution.strategy(), Strategy::Constructive);
        assert!(graph.admits(solution.pairings()));
        assert_eq!(solution.receiver_of(5), Some(1));
    }

    #[rstest]
    fn forced_cycle_is_found_by_sampling() {
        let graph = single_cycle();
        let solution = solve(&graph, 8).expect("feasible");
        assert!(graph.admits(solution.pairings()));
        assert_eq!(solution.receiver_of(1), Some(2));
    }

    #[rstest]
    fn constructive_fallback_is_seed_deterministic() {
        let graph = ConstraintGraph::build(
            [1_u32, 2, 3, 4, 5, 6],
            [ExclusionPair::new(1, 2), ExclusionPair::new(3, 4)],
        )
        .expect("valid graph");
        let solver = Solver::with_config(EXHAUSTED);

        let first = solver.solve(&graph, 11).expect("feasible");
        let second = solver.solve(&graph, 11).expect("feasible");
        assert_eq!(first, second);
        assert!(graph.admits(first.pairings()));
    }

    #[rstest]
    fn saturated_graph_is_infeasible() {
        let exclusions = (1_u32..=3).flat_map(|giver| {
            (1_u32..=3)
                .filter(move |receiver| *receiver != giver)
                .map(move |receiver| ExclusionPair::new(giver, receiver))
        });
        let graph = ConstraintGraph::build(1_u32..=3, exclusions).expect("valid graph");
        let err = solve(&graph, 1).expect_err("infeasible");
        assert_eq!(err.conflicting_constraints(), 3);
        assert_eq!(
            err,
            SolveError::Infeasible {
                unmatched: 3,
                blocked_givers: vec![1, 2, 3],
            }
        );
    }

    #[rstest]
    fn hall_violation_without_blocked_givers_is_infeasible() {
        // Givers 1 and 2 may only give to 3.
        let graph = ConstraintGraph::build(
            [1_u32, 2, 3],
            [ExclusionPair::new(1, 2), ExclusionPair::new(2, 1)],
        )
        .expect("valid graph");
        let err = solve(&graph, 1).expect_err("infeasible");
        assert_eq!(
            err,
            SolveError::Infeasible {
                unmatched: 1,
                blocked_givers: vec![],
            }
        );
    }

    #[rstest]
    #[case(1, 4_096)]
    #[case(16, 4_096)]
    #[case(17, 4_352)]
    #[case(100, 25_600)]
    fn default_attempt_cap_scales_with_size(#[case] participants: usize, #[case] cap: usize) {
        assert_eq!(SolverConfig::default().attempt_cap(participants), cap);
    }

    #[rstest]
    fn every_derangement_is_drawn_evenly(four_people: ConstraintGraph<u32>) {
        // Four people admit nine derangements; 3600 seeds give 400 each on
        // average.
        let mut counts: BTreeMap<Vec<u32>, usize> = BTreeMap::new();
        for seed in 0..3_600_u64 {
            let solution = solve(&four_people, seed).expect("feasible");
            let receivers = solution
                .pairings()
                .iter()
                .map(|pairing| pairing.receiver)
                .collect();
            *counts.entry(receivers).or_default() += 1;
        }
        assert_eq!(counts.len(), 9);
        for (receivers, count) in counts {
            assert!(
                (300..=500).contains(&count),
                "derangement {receivers:?} drawn {count} times"
            );
        }
    }
}
