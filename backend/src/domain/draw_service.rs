//! Draw orchestration service.
//!
//! Runs one draw per request under the event's exclusive lock:
//! - load the snapshot and refuse to redraw committed events;
//! - build the constraint graph and solve it synchronously;
//! - confirm the snapshot is unchanged, then commit every assignment at once.
//!
//! Each attempt walks the draw lifecycle: a pending or failed run becomes
//! `computed` while the solver works, then `committed` on commit or `failed`
//! when no plan can be drawn. Only the committed status reaches the store.
//!
//! A snapshot that changed between load and commit aborts the attempt; the
//! service retries from a fresh snapshot a bounded number of times.

use std::sync::Arc;

use async_trait::async_trait;
use draw_engine::{
    ConstraintGraph, ExclusionPair, GraphError, SolveError, Solver, SolverConfig, Strategy,
};
use mockable::Clock;
use tracing::{Instrument, info, info_span, warn};

use crate::domain::ports::{
    DrawCommand, DrawFailure, DrawOutcome, DrawRepository, DrawRepositoryError, DrawSeedSource,
    DrawSession, RequestDrawRequest, ResetDrawRequest, ResetDrawResponse,
};
use crate::domain::{
    Assignment, DrawCommit, DrawRunStatus, DrawSnapshot, DrawTransitionError, Error, EventId,
    ParticipantId, strategy_label,
};

/// Retries granted after the first attempt when the snapshot goes stale.
pub const DEFAULT_MAX_STALE_RETRIES: u32 = 3;

fn map_repository_error(error: DrawRepositoryError) -> Error {
    match error {
        DrawRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("draw repository unavailable: {message}"))
        }
        DrawRepositoryError::Query { message } => {
            Error::internal(format!("draw repository error: {message}"))
        }
        DrawRepositoryError::Contention { message } => {
            Error::conflict(format!("another draw is in progress: {message}"))
        }
        DrawRepositoryError::Forbidden { message } => Error::forbidden(message),
        DrawRepositoryError::EventNotFound { message } => Error::not_found(message),
    }
}

fn lifecycle_error(event_id: EventId, error: DrawTransitionError) -> Error {
    Error::internal(format!("draw for event {event_id} is in an invalid state: {error}"))
}

/// Release `session` and report `error`.
async fn abandon(session: &mut dyn DrawSession, error: Error) -> Result<Attempt, Error> {
    session.release().await.map_err(map_repository_error)?;
    Err(error)
}

fn describe_graph_error(error: GraphError<ParticipantId>) -> String {
    match error {
        GraphError::TooFewParticipants { minimum, found } => {
            format!("a draw needs at least {minimum} participants, found {found}")
        }
        GraphError::DuplicateParticipant { id } => {
            format!("participant {id} appears more than once")
        }
        GraphError::UnknownParticipant { id } => {
            format!("exclusion references unknown participant {id}")
        }
        GraphError::SelfExclusion { id } => {
            format!("participant {id} cannot be excluded from drawing themself")
        }
    }
}

/// Assignments chosen for a snapshot, ready to commit.
struct DrawPlan {
    assignments: Vec<Assignment>,
    strategy: Strategy,
}

/// Build the graph for `snapshot` and solve it with `seed`.
///
/// Pure and synchronous; never touches the store.
fn plan_draw(solver: &Solver, snapshot: &DrawSnapshot, seed: u64) -> Result<DrawPlan, DrawFailure> {
    let graph = ConstraintGraph::build(
        snapshot.participants.iter().copied(),
        snapshot
            .exclusions
            .iter()
            .map(|exclusion| ExclusionPair::new(exclusion.giver, exclusion.receiver)),
    )
    .map_err(|error| DrawFailure::InvalidInput {
        message: describe_graph_error(error),
    })?;

    let solution = solver.solve(&graph, seed).map_err(|error| {
        let conflicting_constraints = error.conflicting_constraints();
        let SolveError::Infeasible { blocked_givers, .. } = error;
        DrawFailure::Infeasible {
            conflicting_constraints,
            blocked_givers,
        }
    })?;

    let strategy = solution.strategy();
    let assignments = solution
        .into_pairings()
        .into_iter()
        .map(|pairing| Assignment::new(pairing.giver, pairing.receiver))
        .collect();
    Ok(DrawPlan {
        assignments,
        strategy,
    })
}

enum Attempt {
    Finished(DrawOutcome),
    Stale,
}

/// Domain service implementing [`DrawCommand`].
#[derive(Clone)]
pub struct DrawService<R, S> {
    draw_repo: Arc<R>,
    seeds: Arc<S>,
    clock: Arc<dyn Clock>,
    solver: Solver,
    max_stale_retries: u32,
}

impl<R, S> DrawService<R, S> {
    /// Create a draw service with the default solver budget and retry limit.
    pub fn new(draw_repo: Arc<R>, seeds: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            draw_repo,
            seeds,
            clock,
            solver: Solver::default(),
            max_stale_retries: DEFAULT_MAX_STALE_RETRIES,
        }
    }

    /// Replace the solver's sampling budget.
    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.solver = Solver::with_config(config);
        self
    }

    /// Replace the number of retries after a stale snapshot.
    pub fn with_max_stale_retries(mut self, retries: u32) -> Self {
        self.max_stale_retries = retries;
        self
    }
}

impl<R, S> DrawService<R, S>
where
    R: DrawRepository,
    S: DrawSeedSource,
{
    async fn attempt(
        &self,
        session: &mut dyn DrawSession,
        event_id: EventId,
    ) -> Result<Attempt, Error> {
        let snapshot = session.load_snapshot().await.map_err(map_repository_error)?;
        if snapshot.is_committed() {
            session.release().await.map_err(map_repository_error)?;
            info!(
                event_id = %event_id,
                assignment_count = snapshot.assignment_count,
                "draw already committed"
            );
            return Ok(Attempt::Finished(DrawOutcome::Failed(
                DrawFailure::AlreadyCommitted {
                    assignment_count: snapshot.assignment_count,
                },
            )));
        }

        let computed = match snapshot.status.transition(DrawRunStatus::Computed) {
            Ok(status) => status,
            Err(error) => return abandon(session, lifecycle_error(event_id, error)).await,
        };

        let seed = self.seeds.next_seed();
        let plan = match plan_draw(&self.solver, &snapshot, seed) {
            Ok(plan) => plan,
            Err(failure) => {
                let failed = computed
                    .transition(DrawRunStatus::Failed)
                    .map_err(|error| lifecycle_error(event_id, error));
                session.release().await.map_err(map_repository_error)?;
                let failed = failed?;
                info!(
                    event_id = %event_id,
                    status = %failed,
                    reason = failure.reason(),
                    "draw failed"
                );
                return Ok(Attempt::Finished(DrawOutcome::Failed(failure)));
            }
        };
        if plan.strategy == Strategy::Constructive {
            warn!(
                event_id = %event_id,
                participants = snapshot.participants.len(),
                "sampling budget exhausted; used constructive matching"
            );
        }

        let current = session
            .current_fingerprint()
            .await
            .map_err(map_repository_error)?;
        if current != snapshot.fingerprint() {
            session.release().await.map_err(map_repository_error)?;
            return Ok(Attempt::Stale);
        }

        let status = match computed.transition(DrawRunStatus::Committed) {
            Ok(status) => status,
            Err(error) => return abandon(session, lifecycle_error(event_id, error)).await,
        };
        let assignment_count = plan.assignments.len();
        session
            .commit(DrawCommit {
                event_id,
                status,
                assignments: plan.assignments,
                seed,
                strategy: plan.strategy,
                committed_at: self.clock.utc(),
            })
            .await
            .map_err(map_repository_error)?;
        info!(
            event_id = %event_id,
            assignment_count,
            strategy = strategy_label(plan.strategy),
            "draw committed"
        );
        Ok(Attempt::Finished(DrawOutcome::Committed {
            assignment_count,
            seed,
            strategy: plan.strategy,
        }))
    }
}

#[async_trait]
impl<R, S> DrawCommand for DrawService<R, S>
where
    R: DrawRepository,
    S: DrawSeedSource,
{
    async fn request_draw(&self, request: RequestDrawRequest) -> Result<DrawOutcome, Error> {
        let RequestDrawRequest { event_id, actor } = request;
        let span = info_span!("request_draw", event_id = %event_id);
        async move {
            for attempt in 0..=self.max_stale_retries {
                let mut session = self
                    .draw_repo
                    .lock_event(event_id, &actor)
                    .await
                    .map_err(map_repository_error)?;
                match self.attempt(session.as_mut(), event_id).await? {
                    Attempt::Finished(outcome) => return Ok(outcome),
                    Attempt::Stale => {
                        warn!(event_id = %event_id, attempt, "snapshot changed before commit");
                    }
                }
            }
            Err(Error::conflict(
                "participants or exclusions kept changing during the draw; retry later",
            ))
        }
        .instrument(span)
        .await
    }

    async fn reset_draw(&self, request: ResetDrawRequest) -> Result<ResetDrawResponse, Error> {
        let result = self
            .draw_repo
            .reset(request.event_id, &request.actor)
            .await
            .map_err(map_repository_error)?;
        info!(
            event_id = %request.event_id,
            discarded_assignments = result.discarded_assignments,
            "draw reset"
        );
        Ok(ResetDrawResponse {
            discarded_assignments: result.discarded_assignments,
        })
    }
}

#[cfg(test)]
#[path = "draw_service_tests.rs"]
mod tests;
