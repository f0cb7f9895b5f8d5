//! Constraint-respecting Secret Santa draw engine.
//!
//! The crate turns a participant list and a set of directed exclusions into a
//! complete assignment where every participant gives exactly once, receives
//! exactly once, never draws themself and never draws someone they are
//! excluded from. It performs no I/O; persistence and concurrency control live
//! with the caller.
//!
//! # Overview
//!
//! - [`ConstraintGraph`] validates the input and records forbidden pairings.
//! - [`Solver`] proves feasibility with a maximum matching, then draws a
//!   uniformly random valid assignment from a caller-supplied seed.
//! - Identical graphs and seeds always produce identical [`Solution`]s.
//!
//! # Example
//!
//! ```
//! use draw_engine::{ConstraintGraph, ExclusionPair, solve};
//!
//! let graph = ConstraintGraph::build(
//!     ["ada", "bob", "cy", "dee"],
//!     [ExclusionPair::new("ada", "bob"), ExclusionPair::new("bob", "ada")],
//! )
//! .expect("valid graph");
//!
//! let solution = solve(&graph, 2024).expect("feasible draw");
//! assert_eq!(solution.pairings().len(), 4);
//! assert_ne!(solution.receiver_of("ada"), Some("bob"));
//! assert!(graph.admits(solution.pairings()));
//! ```

mod error;
mod graph;
mod matching;
mod solver;

pub use error::{GraphError, SolveError};
pub use graph::{ConstraintGraph, ExclusionPair, MIN_PARTICIPANTS, ParticipantKey};
pub use solver::{
    DEFAULT_ATTEMPTS_PER_PARTICIPANT, DEFAULT_BASE_ATTEMPTS, Pairing, Solution, Solver,
    SolverConfig, Strategy, solve,
};
