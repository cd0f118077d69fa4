// SPDX-License-Identifier: GPL-2.0

//! The seven pluggable policies and the picker that dispatches to them.
//!
//! Each policy function takes the run queue's task slice and the index of
//! the current task rather than walking an intrusive list; the array index
//! plays the role of the source's `run_list` position, and the "circular
//! walk starting after `curr`" of §4.2.1 becomes [`rotation`].

use crate::types::{Ticks, Tid};

use super::{weight_of, NoopProfilingTimer, ProfilingTimer, RunQueue, Task, TaskState, NICE_0_LOAD};

/// The scheduling policy selected for a build (§6.3) or, for testing, passed
/// explicitly so every policy can be exercised from one binary (per the
/// design note preferring a runtime strategy value over `#ifdef` dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedPolicy {
	RoundRobin,
	Priority,
	Cfs,
	Edf,
	Rm,
	Aedf,
	Llf,
}

/// Indices in circular order starting just after `curr`, wrapping around and
/// ending at `curr` itself (§4.2.1's "starting at `curr.run_list.next`,
/// walk circularly"). Always yields `len` indices.
fn rotation(len: usize, curr: usize) -> impl Iterator<Item = usize> {
	(1..=len).map(move |offset| (curr + offset) % len)
}

fn is_running(task: &Task) -> bool {
	task.state == TaskState::Running
}

/// §4.2.1: round-robin. `curr` itself is never reconsidered unless it is the
/// only task in the queue.
fn round_robin(tasks: &[Task], curr: usize, skip_periodic: bool) -> Option<usize> {
	if tasks.len() <= 1 {
		return Some(curr);
	}
	rotation(tasks.len(), curr)
		.filter(|&i| i != curr)
		.find(|&i| {
			let t = &tasks[i];
			is_running(t) && !(skip_periodic && t.se.is_realtime())
		})
}

/// §4.2.2: static priority, ties won by the last-visited candidate in list
/// order (curr's position plays no part in the comparison, unlike RR).
fn priority(tasks: &[Task], curr: usize, skip_periodic: bool) -> Option<usize> {
	if tasks.len() <= 1 {
		return Some(curr);
	}
	let mut best: Option<(usize, i32)> = None;
	for (i, t) in tasks.iter().enumerate() {
		if !is_running(t) || (skip_periodic && t.se.is_realtime()) {
			continue;
		}
		let prio = t.se.prio;
		if best.map_or(true, |(_, min)| prio <= min) {
			best = Some((i, prio));
		}
	}
	best.map(|(i, _)| i)
}

/// §4.2.3: CFS, ties won by the first-visited candidate in list order.
fn cfs(tasks: &[Task], curr: usize, skip_periodic: bool) -> Option<usize> {
	if tasks.len() <= 1 {
		return Some(curr);
	}
	let mut best: Option<(usize, u64)> = None;
	for (i, t) in tasks.iter().enumerate() {
		if !is_running(t) || (skip_periodic && t.se.is_realtime()) {
			continue;
		}
		let vruntime = t.se.vruntime;
		if best.map_or(true, |(_, min)| vruntime < min) {
			best = Some((i, vruntime));
		}
	}
	best.map(|(i, _)| i)
}

/// Rolls a periodic entity's period forward if it has finished its current
/// one and the next period has already started (shared by EDF/RM/LLF,
/// §4.2.4). Mirrors the source's single-step advance rather than a loop
/// that could catch up an arbitrarily overslept task — see DESIGN.md.
fn roll_period_if_due(task: &mut Task, now: Ticks) {
	let se = &mut task.se;
	if se.executed && se.next_period <= now.as_u64() {
		se.executed = false;
		se.deadline += se.period;
		se.next_period += se.period;
	}
}

/// §4.2.4: earliest deadline first among periodic, non-analysis tasks.
fn edf(tasks: &mut [Task], now: Ticks) -> Option<usize> {
	let mut best: Option<(usize, u64)> = None;
	for i in 0..tasks.len() {
		if !tasks[i].se.is_realtime() {
			continue;
		}
		roll_period_if_due(&mut tasks[i], now);
		let se = &tasks[i].se;
		if !se.executed && best.map_or(true, |(_, min)| se.deadline < min) {
			best = Some((i, se.deadline));
		}
	}
	best.map(|(i, _)| i)
}

/// §4.2.5: rate-monotonic, identical to EDF but keyed on `next_period`.
fn rm(tasks: &mut [Task], now: Ticks) -> Option<usize> {
	let mut best: Option<(usize, u64)> = None;
	for i in 0..tasks.len() {
		if !tasks[i].se.is_realtime() {
			continue;
		}
		roll_period_if_due(&mut tasks[i], now);
		let se = &tasks[i].se;
		if !se.executed && best.map_or(true, |(_, min)| se.next_period < min) {
			best = Some((i, se.next_period));
		}
	}
	best.map(|(i, _)| i)
}

/// §4.2.6: arrival-EDF. No period rollover; ties won by the last-visited
/// candidate (non-strict `<=`), unlike plain EDF.
fn aedf(tasks: &[Task]) -> Option<usize> {
	let mut best: Option<(usize, u64)> = None;
	for (i, t) in tasks.iter().enumerate() {
		if t.se.deadline == 0 {
			continue;
		}
		if best.map_or(true, |(_, min)| t.se.deadline <= min) {
			best = Some((i, t.se.deadline));
		}
	}
	best.map(|(i, _)| i)
}

/// §4.2.7: least laxity first. Laxity is signed: a task already past its
/// deadline has negative laxity and must still compare correctly, hence the
/// wide signed accumulator.
fn llf(tasks: &mut [Task], now: Ticks) -> Option<usize> {
	let mut best: Option<(usize, i64)> = None;
	for i in 0..tasks.len() {
		if !tasks[i].se.is_realtime() {
			continue;
		}
		roll_period_if_due(&mut tasks[i], now);
		let se = &tasks[i].se;
		if se.executed {
			continue;
		}
		let laxity = (se.deadline as i64 - now.as_u64() as i64) - se.sum_exec_runtime as i64;
		if best.map_or(true, |(_, min)| laxity < min) {
			best = Some((i, laxity));
		}
	}
	best.map(|(i, _)| i)
}

/// §4.2.8: refreshes `curr`'s execution statistics before a non-RR pick.
fn update_statistics(task: &mut Task, now: Ticks, profiling: &mut dyn ProfilingTimer) {
	let se = &mut task.se;
	se.exec_runtime = now.as_u64() - se.exec_start.as_u64();

	profiling.update(task);
	let se = &mut task.se;
	se.sum_exec_runtime += se.exec_runtime;

	if !se.is_periodic {
		let weight = weight_of(se.prio);
		if weight != NICE_0_LOAD {
			se.exec_runtime = se.exec_runtime * NICE_0_LOAD / weight;
		}
		se.vruntime += se.exec_runtime;
	}
}

/// Dispatches to the given policy, falling back to CFS with periodic tasks
/// excluded (§4.2.4-§4.2.7) when a real-time family finds no candidate.
///
/// Panics if the selection is empty (§6.2): the idle task is the caller's
/// responsibility to keep runnable, so an empty result means the run queue
/// itself is malformed.
pub fn pick_next(
	policy: SchedPolicy,
	runqueue: &mut RunQueue,
	now: Ticks,
	profiling: &mut dyn ProfilingTimer,
) -> Tid {
	if policy != SchedPolicy::RoundRobin {
		let curr = runqueue.curr_index();
		update_statistics(&mut runqueue.tasks_mut()[curr], now, profiling);
	}

	let curr = runqueue.curr_index();
	let tasks = runqueue.tasks_mut();
	let chosen = match policy {
		SchedPolicy::RoundRobin => round_robin(tasks, curr, false),
		SchedPolicy::Priority => priority(tasks, curr, false),
		SchedPolicy::Cfs => cfs(tasks, curr, false),
		SchedPolicy::Edf => edf(tasks, now).or_else(|| cfs(tasks, curr, true)),
		SchedPolicy::Rm => rm(tasks, now).or_else(|| cfs(tasks, curr, true)),
		SchedPolicy::Aedf => aedf(tasks).or_else(|| cfs(tasks, curr, true)),
		SchedPolicy::Llf => llf(tasks, now).or_else(|| cfs(tasks, curr, true)),
	};

	let chosen = chosen.expect("no valid task selected by the scheduling algorithm");
	tasks[chosen].se.exec_start = now;
	let tid = tasks[chosen].tid;
	runqueue.set_curr(chosen);
	tid
}

/// Convenience wrapper for callers with no profiling subsystem.
pub fn pick_next_simple(policy: SchedPolicy, runqueue: &mut RunQueue, now: Ticks) -> Tid {
	pick_next(policy, runqueue, now, &mut NoopProfilingTimer)
}

#[cfg(all(test, feature = "std"))]
mod tests {
	use super::*;
	use crate::sched::SchedEntity;
	use std::vec;
	use std::vec::Vec;

	fn running(tid: u32, se: SchedEntity) -> Task {
		Task::new(Tid(tid), TaskState::Running, se)
	}

	/// S3 — RR rotation with tasks [A,B,C] all RUNNING, curr=A.
	#[test]
	fn rr_rotates_through_running_tasks() {
		let tasks = vec![
			running(1, SchedEntity::aperiodic(0)),
			running(2, SchedEntity::aperiodic(0)),
			running(3, SchedEntity::aperiodic(0)),
		];
		let mut rq = RunQueue::new(tasks);
		let mut prof = NoopProfilingTimer;

		let next = pick_next(SchedPolicy::RoundRobin, &mut rq, Ticks(0), &mut prof);
		assert_eq!(next, Tid(2));
		rq.set_curr_tid(Tid(2));

		let next = pick_next(SchedPolicy::RoundRobin, &mut rq, Ticks(0), &mut prof);
		assert_eq!(next, Tid(3));
		rq.set_curr_tid(Tid(3));

		let next = pick_next(SchedPolicy::RoundRobin, &mut rq, Ticks(0), &mut prof);
		assert_eq!(next, Tid(1));
	}

	/// S4 — EDF rollover.
	#[test]
	fn edf_rolls_period_forward_and_picks_rolled_task() {
		let mut se = SchedEntity::periodic(0, 100, 150, 100);
		se.executed = true;
		let tasks = vec![running(1, se)];
		let mut rq = RunQueue::new(tasks);

		let next = pick_next_simple(SchedPolicy::Edf, &mut rq, Ticks(105));
		assert_eq!(next, Tid(1));
		assert_eq!(rq.curr().se.deadline, 250);
		assert_eq!(rq.curr().se.next_period, 200);
		assert!(!rq.curr().se.executed);
	}

	/// S5 — LLF tie-break: T1 (deadline=200, sum=30), T2 (deadline=210, sum=50), now=100.
	/// Laxities 70 vs 60 => T2 picked. `curr` (T1) is given `exec_start = now`
	/// so the pre-pick statistics update leaves its `sum_exec_runtime` as set up.
	#[test]
	fn llf_picks_minimum_laxity() {
		let mut se1 = SchedEntity::periodic(0, 1000, 200, 1000);
		se1.sum_exec_runtime = 30;
		se1.exec_start = Ticks(100);
		let mut se2 = SchedEntity::periodic(0, 1000, 210, 1000);
		se2.sum_exec_runtime = 50;

		let tasks = vec![running(1, se1), running(2, se2)];
		let mut rq = RunQueue::new(tasks);

		let next = pick_next_simple(SchedPolicy::Llf, &mut rq, Ticks(100));
		assert_eq!(next, Tid(2));
	}

	/// Priority ties: last visited wins.
	#[test]
	fn priority_tie_break_picks_last_visited() {
		let tasks = vec![
			running(1, SchedEntity::aperiodic(5)),
			running(2, SchedEntity::aperiodic(5)),
			running(3, SchedEntity::aperiodic(9)),
		];
		let mut rq = RunQueue::new(tasks);
		let next = pick_next_simple(SchedPolicy::Priority, &mut rq, Ticks(0));
		assert_eq!(next, Tid(2));
	}

	/// CFS ties: first visited wins.
	#[test]
	fn cfs_tie_break_picks_first_visited() {
		let tasks = vec![
			running(1, SchedEntity::aperiodic(0)),
			running(2, SchedEntity::aperiodic(0)),
		];
		let mut rq = RunQueue::new(tasks);
		rq.set_curr_tid(Tid(2));
		let next = pick_next_simple(SchedPolicy::Cfs, &mut rq, Ticks(0));
		assert_eq!(next, Tid(1));
	}

	/// Property 11: real-time fallback when every periodic task is executed
	/// and its next period hasn't arrived.
	#[test]
	fn edf_falls_back_to_cfs_when_all_periodic_quiescent() {
		let mut periodic = SchedEntity::periodic(0, 100, 100, 1000);
		periodic.executed = true;
		let mut aperiodic = SchedEntity::aperiodic(0);
		aperiodic.vruntime = 42;

		let tasks = vec![running(1, periodic), running(2, aperiodic)];
		let mut rq = RunQueue::new(tasks);

		let next = pick_next_simple(SchedPolicy::Edf, &mut rq, Ticks(0));
		assert_eq!(next, Tid(2));
	}

	#[test]
	fn picker_panics_when_nothing_runnable() {
		let tasks = vec![
			Task::new(Tid(1), TaskState::Blocked, SchedEntity::aperiodic(0)),
			Task::new(Tid(2), TaskState::Blocked, SchedEntity::aperiodic(0)),
		];
		let mut rq = RunQueue::new(tasks);
		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
			pick_next_simple(SchedPolicy::RoundRobin, &mut rq, Ticks(0))
		}));
		assert!(result.is_err());
	}
}
