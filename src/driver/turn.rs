//! Step-by-step execution of one turn against the live world.
//!
//! `TurnExecution` is an explicit state machine instead of a callback chain:
//! the host calls `advance` once per step and can animate, log, or pause
//! between steps.
//!
//! ```text
//! Selected(u, a) ─► Executed { u, a, reward } ─► Selected … ─► Complete(summary)
//! ```
//!
//! A chosen plan plays in order; records whose unit no longer exists are
//! skipped. An empty plan switches to the fallback policy: every owned unit,
//! ranked by importance, greedily takes each action the catalog offers
//! against the current live state.

use std::collections::VecDeque;

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::actions::{Action, ActionKind, ActionRecord, Plan};
use crate::core::{PlayerId, UnitId};
use crate::plan::unit_importance;

use super::agent::MinimaxAgent;
use super::world::{LiveWorld, ResourceLedger};

/// One observable step of a turn.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnStep {
    /// `unit` is about to perform `action`.
    Selected(UnitId, Action),
    /// The action ran; `reward` is its shaped reward (0 if the world refused it).
    Executed { unit: UnitId, action: Action, reward: f32 },
    /// Nothing left to do this turn.
    Complete(TurnSummary),
}

/// What happened during a turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurnSummary {
    pub player: Option<PlayerId>,
    /// Records in the searched plan.
    pub planned: usize,
    pub executed: usize,
    /// Records dropped because their unit vanished.
    pub skipped: usize,
    /// Records the live world refused.
    pub failed: usize,
    /// The searched plan was empty and the fallback policy played.
    pub fallback: bool,
    pub reward: f32,
}

enum Phase {
    Plan(VecDeque<ActionRecord>),
    Fallback(Fallback),
    Done,
}

/// Greedy per-unit play.
struct Fallback {
    /// Units are ranked once, on the first step.
    ranked: bool,
    units: VecDeque<UnitId>,
    current: Option<UnitId>,
    /// Action kinds the current unit already took.
    taken: SmallVec<[ActionKind; 4]>,
}

/// Plays one turn step by step.
pub struct TurnExecution {
    phase: Phase,
    pending: Option<ActionRecord>,
    encoded: Vec<f32>,
    summary: TurnSummary,
    reported: bool,
}

impl TurnExecution {
    /// Execution of `plan`; `encoded` is the network input at turn start.
    pub fn new(player: PlayerId, plan: Plan, encoded: Vec<f32>) -> Self {
        let summary = TurnSummary {
            player: Some(player),
            planned: plan.len(),
            fallback: plan.is_empty(),
            ..TurnSummary::default()
        };
        let phase = if plan.is_empty() {
            Phase::Fallback(Fallback {
                ranked: false,
                units: VecDeque::new(),
                current: None,
                taken: SmallVec::new(),
            })
        } else {
            Phase::Plan(plan.records().iter().copied().collect())
        };
        Self {
            phase,
            pending: None,
            encoded,
            summary,
            reported: false,
        }
    }

    #[must_use]
    pub fn summary(&self) -> &TurnSummary {
        &self.summary
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Done) && self.pending.is_none()
    }

    /// Perform the next step.
    pub fn advance<W: LiveWorld + ResourceLedger>(
        &mut self,
        agent: &mut MinimaxAgent<'_>,
        world: &mut W,
    ) -> TurnStep {
        if let Some(record) = self.pending.take() {
            let reward = match agent.execute(world, &record, &mut self.encoded) {
                Ok(reward) => {
                    self.summary.executed += 1;
                    self.summary.reward += reward;
                    reward
                }
                Err(err) => {
                    warn!(%err, "live world refused planned action");
                    self.summary.failed += 1;
                    0.0
                }
            };
            if world.is_game_finished() {
                self.phase = Phase::Done;
            }
            return TurnStep::Executed {
                unit: record.unit,
                action: record.action,
                reward,
            };
        }

        let next = match &mut self.phase {
            Phase::Plan(queue) => next_planned(queue, world, &mut self.summary),
            Phase::Fallback(fallback) => fallback.next(agent, world),
            Phase::Done => None,
        };

        match next {
            Some(record) => {
                self.pending = Some(record);
                TurnStep::Selected(record.unit, record.action)
            }
            None => {
                self.phase = Phase::Done;
                if !self.reported {
                    self.reported = true;
                    agent.record_turn(self.summary.reward);
                    debug!(
                        executed = self.summary.executed,
                        skipped = self.summary.skipped,
                        failed = self.summary.failed,
                        reward = self.summary.reward,
                        "turn complete"
                    );
                }
                TurnStep::Complete(self.summary.clone())
            }
        }
    }

    /// Advance until the turn completes.
    pub fn run<W: LiveWorld + ResourceLedger>(
        &mut self,
        agent: &mut MinimaxAgent<'_>,
        world: &mut W,
    ) -> TurnSummary {
        loop {
            if let TurnStep::Complete(summary) = self.advance(agent, world) {
                return summary;
            }
        }
    }
}

fn next_planned<W: LiveWorld>(
    queue: &mut VecDeque<ActionRecord>,
    world: &W,
    summary: &mut TurnSummary,
) -> Option<ActionRecord> {
    let alive: Vec<UnitId> = world
        .units()
        .into_iter()
        .filter(|u| u.hp > 0)
        .map(|u| u.id)
        .collect();
    while let Some(record) = queue.pop_front() {
        if alive.contains(&record.unit) {
            return Some(record);
        }
        debug!(unit = record.unit.0, "skipping action of vanished unit");
        summary.skipped += 1;
    }
    None
}

impl Fallback {
    fn next<W: LiveWorld + ResourceLedger>(
        &mut self,
        agent: &mut MinimaxAgent<'_>,
        world: &W,
    ) -> Option<ActionRecord> {
        let player = agent.player();
        if !self.ranked {
            self.ranked = true;
            self.units = ranked_units(agent, world);
        }

        loop {
            let unit = match self.current {
                Some(unit) => unit,
                None => {
                    let unit = self.units.pop_front()?;
                    self.current = Some(unit);
                    self.taken.clear();
                    unit
                }
            };

            let (state, catalog) = agent.live_catalog(world);
            let choice = state
                .unit(unit)
                .filter(|u| u.is_alive() && u.owner == player)
                .and_then(|_| {
                    catalog
                        .legal_actions(&state, unit)
                        .into_iter()
                        .find(|a| !self.taken.contains(&a.kind()))
                });

            match choice {
                Some(action) => {
                    self.taken.push(action.kind());
                    return Some(ActionRecord::new(unit, action));
                }
                None => self.current = None,
            }
        }
    }
}

/// Owned units in descending importance; ties keep world order.
fn ranked_units<W: LiveWorld + ResourceLedger>(
    agent: &mut MinimaxAgent<'_>,
    world: &W,
) -> VecDeque<UnitId> {
    let player = agent.player();
    let (state, catalog) = agent.live_catalog(world);
    let objective = state.objective_position();

    let mut scored: Vec<(f64, UnitId)> = state
        .units_of(player)
        .map(|u| {
            let has_action = !catalog.legal_actions(&state, u.id).is_empty();
            (unit_importance(u, objective, has_action), u.id)
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, id)| id).collect()
}
