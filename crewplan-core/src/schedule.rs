//! Schedule simulator: per-developer, event-driven placement of work onto
//! working hours.
//!
//! Each developer is simulated independently, in five steps:
//! 1) detect deferred tasks (more than one in-progress task with an open session)
//! 2) materialize fixed blocks from recorded sessions (plus a synthesized
//!    block for done tasks with no session history)
//! 3) compute remaining effort per task
//! 4) chain the tails of already-started tasks, FIFO by pick-up time
//! 5) sweep forward day by day, placing the rest by priority
//!
//! Nothing here reads the wall clock; `start_date` and `now` come from the caller.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, instrument, warn};

use crate::block::{sort_blocks, BlockStatus, Schedule, TimeBlock};
use crate::company::{CompanyConfig, Employee};
use crate::task::{Task, TaskStatus};
use crate::time::{hours_between, local_date, local_hour_of_day, local_instant};

/// Float tolerance for hour arithmetic.
pub const EPSILON_HOURS: f64 = 0.01;
/// Non-done tasks never drop below this much pending work.
pub const MIN_VISIBLE_REMAINDER: f64 = 0.1;
/// Remaining effort below this is zeroed at the end of each simulated day.
pub const CLEANUP_THRESHOLD: f64 = 0.02;
/// Hard cap on simulated days.
pub const MAX_SIMULATION_DAYS: usize = 60;
/// Effort assumed for a done task with neither `time_spent` nor `duration`.
pub const DEFAULT_TASK_HOURS: f64 = 1.0;
/// Longest block synthesized for a done task without sessions.
pub const MAX_SYNTHESIZED_HOURS: f64 = MAX_SIMULATION_DAYS as f64 * 24.0;

/// An interval already taken by a fixed block or a tail.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    start: f64,
    end: f64,
}

/// A position on the local timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cursor {
    date: NaiveDate,
    hour: f64,
}

impl Cursor {
    fn later(self, other: Cursor) -> Cursor {
        match self.date.cmp(&other.date) {
            Ordering::Less => other,
            Ordering::Greater => self,
            Ordering::Equal if other.hour > self.hour => other,
            Ordering::Equal => self,
        }
    }
}

fn later_of(a: Option<Cursor>, b: Option<Cursor>) -> Option<Cursor> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.later(b)),
        (a, b) => a.or(b),
    }
}

/// Oldest pick-up first; tasks without any availability instant sort last.
fn by_pickup(a: &Task, b: &Task) -> Ordering {
    match (a.available_at(), b.available_at()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Per-developer accumulators. Lives for exactly one developer's run.
struct SimulationContext<'a> {
    config: &'a CompanyConfig,
    occupied: BTreeMap<NaiveDate, Vec<Slot>>,
    blocks: Vec<TimeBlock>,
}

impl<'a> SimulationContext<'a> {
    fn new(config: &'a CompanyConfig) -> Self {
        Self {
            config,
            occupied: BTreeMap::new(),
            blocks: Vec::new(),
        }
    }

    fn occupy(&mut self, date: NaiveDate, start: f64, end: f64) {
        self.occupied
            .entry(date)
            .or_default()
            .push(Slot { start, end });
    }

    /// The occupied slot covering `t`, if any.
    fn slot_at(&self, date: NaiveDate, t: f64) -> Option<Slot> {
        self.occupied.get(&date).and_then(|slots| {
            slots
                .iter()
                .copied()
                .filter(|s| s.start - EPSILON_HOURS <= t && t < s.end - EPSILON_HOURS)
                .max_by(|a, b| a.end.total_cmp(&b.end))
        })
    }

    /// Start of the next occupied slot strictly after `t`.
    fn next_slot_start(&self, date: NaiveDate, t: f64) -> Option<f64> {
        self.occupied.get(&date).and_then(|slots| {
            slots
                .iter()
                .map(|s| s.start)
                .filter(|&start| start - EPSILON_HOURS > t)
                .min_by(f64::total_cmp)
        })
    }

    /// Where free time starting at `t` must stop: the next slot or day end.
    fn free_until(&self, date: NaiveDate, t: f64) -> f64 {
        let day_end = self.config.day_end();
        self.next_slot_start(date, t)
            .map_or(day_end, |start| start.min(day_end))
    }

    /// Record `[start, end)` as a fixed block, split at local midnights.
    /// Returns where the last piece ends.
    fn place_fixed(
        &mut self,
        task_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: BlockStatus,
    ) -> Option<Cursor> {
        let tz = self.config.timezone;
        let mut last = None;
        let mut cursor = start;

        // A span of MAX_SYNTHESIZED_HOURS touches one more date than it has days.
        for _ in 0..=MAX_SIMULATION_DAYS {
            if cursor >= end {
                break;
            }
            let date = local_date(cursor, tz);
            let Some(next_day) = date.succ_opt() else {
                break;
            };
            let midnight = local_instant(next_day, 0.0, tz);
            let start_hour = local_hour_of_day(cursor, tz);
            let (end_hour, next) = if end < midnight {
                (local_hour_of_day(end, tz), end)
            } else {
                (24.0, midnight)
            };

            if end_hour > start_hour {
                self.blocks.push(TimeBlock {
                    task_id: task_id.to_string(),
                    date,
                    start_time: start_hour,
                    end_time: end_hour,
                    status,
                    is_session: true,
                });
                self.occupy(date, start_hour, end_hour);
                last = Some(Cursor {
                    date,
                    hour: end_hour,
                });
            }

            if next <= cursor {
                break;
            }
            cursor = next;
        }

        last
    }

    /// Commit one piece of a tail. Extends the task's block that ends where
    /// this piece starts, otherwise appends a planned block.
    fn commit_tail(&mut self, task_id: &str, date: NaiveDate, start: f64, end: f64) {
        self.occupy(date, start, end);

        let adjacent = self.blocks.iter_mut().find(|b| {
            b.task_id == task_id && b.date == date && (b.end_time - start).abs() < EPSILON_HOURS
        });
        if let Some(block) = adjacent {
            block.end_time = block.end_time.max(end);
            return;
        }

        self.blocks.push(TimeBlock {
            task_id: task_id.to_string(),
            date,
            start_time: start,
            end_time: end,
            status: BlockStatus::Planned,
            is_session: false,
        });
    }

    /// Lay `hours` of work for `task_id` onto free working time from `from`.
    fn place_tail(&mut self, task_id: &str, from: Cursor, hours: f64) -> Cursor {
        let day_start = self.config.day_start();
        let day_end = self.config.day_end();

        let mut date = from.date;
        let mut t = from.hour.max(day_start);
        let mut left = hours;

        for _ in 0..MAX_SIMULATION_DAYS {
            while left > EPSILON_HOURS && t < day_end - EPSILON_HOURS {
                if let Some(slot) = self.slot_at(date, t) {
                    t = slot.end;
                    continue;
                }
                let take = left.min(self.free_until(date, t) - t);
                self.commit_tail(task_id, date, t, t + take);
                left -= take;
                t += take;
            }

            if left <= EPSILON_HOURS {
                return Cursor { date, hour: t };
            }

            let Some(next) = date.succ_opt() else {
                break;
            };
            date = next;
            t = day_start;
        }

        warn!(task_id, left, "tail placement hit the day cap");
        Cursor { date, hour: t }
    }

    fn commit_planned(&mut self, task_id: &str, date: NaiveDate, start: f64, end: f64) {
        if end > start {
            self.blocks.push(TimeBlock {
                task_id: task_id.to_string(),
                date,
                start_time: start,
                end_time: end,
                status: BlockStatus::Planned,
                is_session: false,
            });
        }
    }
}

/// Runs the simulation for a fixed pair of reference dates.
#[derive(Debug, Clone)]
pub struct ScheduleSimulator {
    config: CompanyConfig,
    start_date: NaiveDate,
    now: DateTime<Utc>,
}

impl ScheduleSimulator {
    pub fn new(config: CompanyConfig, start_date: NaiveDate, now: DateTime<Utc>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            start_date,
            now,
        })
    }

    /// Simulate every developer. Tasks assigned to anyone else are ignored.
    pub fn run(&self, tasks: &[Task], developers: &[Employee]) -> Schedule {
        developers
            .iter()
            .map(|dev| {
                let own: Vec<&Task> = tasks.iter().filter(|t| t.is_assigned_to(&dev.id)).collect();
                (dev.id.clone(), self.simulate(&dev.id, &own))
            })
            .collect()
    }

    /// One developer's timeline, sorted by `(date, start_time)`.
    #[instrument(skip(self, tasks), fields(tasks = tasks.len()))]
    pub fn simulate(&self, developer_id: &str, tasks: &[&Task]) -> Vec<TimeBlock> {
        if tasks.is_empty() {
            return Vec::new();
        }
        let mut ctx = SimulationContext::new(&self.config);

        let deferred = self.deferred_tasks(tasks);
        let last_fixed = self.materialize_fixed(&mut ctx, tasks, &deferred);
        sort_blocks(&mut ctx.blocks);

        let mut remaining = self.remaining_effort(tasks, &deferred);
        self.chain_tails(&mut ctx, tasks, &deferred, &last_fixed, &mut remaining);
        self.simulate_forward(&mut ctx, tasks, &mut remaining);

        sort_blocks(&mut ctx.blocks);
        debug!(
            developer_id,
            blocks = ctx.blocks.len(),
            deferred = deferred.iter().filter(|d| **d).count(),
            "simulated timeline"
        );
        ctx.blocks
    }

    /// Single focus: of several in-progress tasks with open sessions, only the
    /// earliest picked-up one keeps its session on the timeline.
    fn deferred_tasks(&self, tasks: &[&Task]) -> Vec<bool> {
        let mut active: Vec<usize> = (0..tasks.len())
            .filter(|&i| tasks[i].status == TaskStatus::InProgress && tasks[i].has_open_session())
            .collect();

        let mut deferred = vec![false; tasks.len()];
        if active.len() > 1 {
            active.sort_by(|&a, &b| by_pickup(tasks[a], tasks[b]));
            for &i in &active[1..] {
                deferred[i] = true;
            }
        }
        deferred
    }

    /// Fixed blocks from sessions. Returns, per task, where its latest
    /// session block ends.
    fn materialize_fixed(
        &self,
        ctx: &mut SimulationContext<'_>,
        tasks: &[&Task],
        deferred: &[bool],
    ) -> Vec<Option<Cursor>> {
        let mut last_fixed = vec![None; tasks.len()];

        for (i, task) in tasks.iter().enumerate() {
            let first_block = ctx.blocks.len();
            for session in &task.sessions {
                if session.is_open() && deferred[i] {
                    continue;
                }

                let end = session
                    .end
                    .or_else(|| {
                        (task.status == TaskStatus::Done)
                            .then_some(task.completed_at)
                            .flatten()
                    })
                    .unwrap_or(self.now);
                if end <= session.start {
                    debug!(task_id = %task.id, "skipping session that ends before it starts");
                    continue;
                }

                let status = BlockStatus::for_session(session, task.status);
                let placed = ctx.place_fixed(&task.id, session.start, end, status);
                last_fixed[i] = later_of(last_fixed[i], placed);
            }

            if task.status == TaskStatus::Done {
                if last_fixed[i].is_none() {
                    self.synthesize_done(ctx, task);
                } else {
                    // Stale session hints do not hide finished work.
                    let own = &mut ctx.blocks[first_block..];
                    if !own.iter().any(|b| b.status == BlockStatus::Completed) {
                        for block in own {
                            block.status = BlockStatus::Completed;
                        }
                    }
                }
            }
        }

        last_fixed
    }

    /// Completed work always occupies visible time, even with no sessions.
    fn synthesize_done(&self, ctx: &mut SimulationContext<'_>, task: &Task) {
        let end = task.completed_at.or(task.updated_at).unwrap_or(self.now);
        let hours = [task.time_spent.unwrap_or(0.0), task.duration]
            .into_iter()
            .find(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(DEFAULT_TASK_HOURS)
            .clamp(MIN_VISIBLE_REMAINDER, MAX_SYNTHESIZED_HOURS);
        let start_for = |h: f64| {
            chrono::Duration::try_seconds((h * 3600.0).round() as i64)
                .and_then(|span| end.checked_sub_signed(span))
        };
        let Some(start) = start_for(hours).or_else(|| start_for(DEFAULT_TASK_HOURS)) else {
            debug!(task_id = %task.id, "no room before completion for a synthesized block");
            return;
        };
        ctx.place_fixed(&task.id, start, end, BlockStatus::Completed);
    }

    fn remaining_effort(&self, tasks: &[&Task], deferred: &[bool]) -> Vec<f64> {
        tasks
            .iter()
            .enumerate()
            .map(|(i, task)| {
                if matches!(task.status, TaskStatus::Done | TaskStatus::OnHold) {
                    return 0.0;
                }
                let spent: f64 = task
                    .sessions
                    .iter()
                    .filter(|s| !(s.is_open() && deferred[i]))
                    .map(|s| hours_between(s.start, s.end.unwrap_or(self.now)).max(0.0))
                    .sum();
                let left = (task.duration - spent).max(0.0);
                if left <= EPSILON_HOURS {
                    MIN_VISIBLE_REMAINDER
                } else {
                    left
                }
            })
            .collect()
    }

    /// Started tasks (and deferred ones) run strictly one after another,
    /// oldest pick-up first, each continuing right after its last session.
    fn chain_tails(
        &self,
        ctx: &mut SimulationContext<'_>,
        tasks: &[&Task],
        deferred: &[bool],
        last_fixed: &[Option<Cursor>],
        remaining: &mut [f64],
    ) {
        let mut chain: Vec<usize> = (0..tasks.len())
            .filter(|&i| remaining[i] > 0.0 && (last_fixed[i].is_some() || deferred[i]))
            .collect();
        chain.sort_by(|&a, &b| by_pickup(tasks[a], tasks[b]));

        let simulation_start = Cursor {
            date: self.start_date,
            hour: self.config.day_start(),
        };
        let mut cursor: Option<Cursor> = None;
        for i in chain {
            let from = later_of(last_fixed[i], cursor).unwrap_or(simulation_start);
            cursor = Some(ctx.place_tail(&tasks[i].id, from, remaining[i]));
            remaining[i] = 0.0;
        }
    }

    /// Where a task becomes eligible on `date`: `None` if not yet available.
    fn eligible_from(&self, available: Option<Cursor>, date: NaiveDate) -> Option<f64> {
        let day_start = self.config.day_start();
        match available {
            None => Some(day_start),
            Some(c) => match c.date.cmp(&date) {
                Ordering::Greater => None,
                Ordering::Less => Some(day_start),
                Ordering::Equal => Some(c.hour),
            },
        }
    }

    /// Event-driven sweep over working hours, highest priority first and,
    /// within a priority, the most recently picked-up task first.
    fn simulate_forward(
        &self,
        ctx: &mut SimulationContext<'_>,
        tasks: &[&Task],
        remaining: &mut [f64],
    ) {
        let pool: Vec<usize> = (0..tasks.len())
            .filter(|&i| remaining[i] > EPSILON_HOURS)
            .collect();
        if pool.is_empty() {
            return;
        }

        let tz = self.config.timezone;
        let available: Vec<Option<Cursor>> = tasks
            .iter()
            .map(|t| {
                t.available_at().map(|at| Cursor {
                    date: local_date(at, tz),
                    hour: local_hour_of_day(at, tz),
                })
            })
            .collect();

        let day_start = self.config.day_start();
        let day_end = self.config.day_end();

        // Tasks without any availability instant count as available from
        // the simulation start.
        let simulation_start = local_instant(self.start_date, day_start, tz);
        let effective = |i: usize| tasks[i].available_at().unwrap_or(simulation_start);
        let pick_order = |a: usize, b: usize| {
            tasks[a]
                .priority
                .cmp(&tasks[b].priority)
                .then_with(|| effective(b).cmp(&effective(a)))
                .then_with(|| a.cmp(&b))
        };
        let mut date = self.start_date;
        let mut exhausted = false;

        for _ in 0..MAX_SIMULATION_DAYS {
            let mut t = day_start;
            let mut open: Option<(usize, f64)> = None;

            while t < day_end - EPSILON_HOURS {
                if let Some(slot) = ctx.slot_at(date, t) {
                    if let Some((i, start)) = open.take() {
                        ctx.commit_planned(&tasks[i].id, date, start, t);
                    }
                    t = slot.end;
                    continue;
                }

                let best = pool
                    .iter()
                    .copied()
                    .filter(|&i| remaining[i] > EPSILON_HOURS)
                    .filter(|&i| self.eligible_from(available[i], date).is_some_and(|h| h <= t))
                    .min_by(|&a, &b| pick_order(a, b));

                let Some(i) = best else {
                    if let Some((open_i, start)) = open.take() {
                        ctx.commit_planned(&tasks[open_i].id, date, start, t);
                    }
                    let next_available = pool
                        .iter()
                        .filter(|&&i| remaining[i] > EPSILON_HOURS)
                        .filter_map(|&i| self.eligible_from(available[i], date))
                        .filter(|&h| h > t)
                        .min_by(f64::total_cmp);
                    t = [next_available, ctx.next_slot_start(date, t)]
                        .into_iter()
                        .flatten()
                        .fold(day_end, f64::min);
                    continue;
                };

                match open {
                    Some((open_i, _)) if open_i == i => {}
                    Some((open_i, start)) => {
                        ctx.commit_planned(&tasks[open_i].id, date, start, t);
                        open = Some((i, t));
                    }
                    None => open = Some((i, t)),
                }

                let take = remaining[i].min(ctx.free_until(date, t) - t);
                remaining[i] -= take;
                t += take;
            }

            if let Some((i, start)) = open.take() {
                ctx.commit_planned(&tasks[i].id, date, start, t.min(day_end));
            }

            for &i in &pool {
                if remaining[i] < CLEANUP_THRESHOLD {
                    remaining[i] = 0.0;
                }
            }
            if pool.iter().all(|&i| remaining[i] <= 0.0) {
                exhausted = true;
                break;
            }

            let Some(next) = date.succ_opt() else {
                break;
            };
            date = next;
        }

        if !exhausted {
            let left: f64 = pool.iter().map(|&i| remaining[i]).sum();
            warn!(left, "forward simulation hit the day cap");
        }
    }
}

/// Compute every developer's timeline.
///
/// Fails only when `config` is not a valid working window; malformed task
/// data is absorbed.
pub fn calculate_schedule(
    tasks: &[Task],
    developers: &[Employee],
    config: &CompanyConfig,
    start_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Schedule> {
    let simulator = ScheduleSimulator::new(*config, start_date, now)?;
    Ok(simulator.run(tasks, developers))
}
