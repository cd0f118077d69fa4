// SPDX-License-Identifier: GPL-2.0

//! Task scheduler: a pluggable picker over a shared run queue.
//!
//! The run queue is the source's intrusive circular list of `task_struct`,
//! re-expressed as an arena (`Vec<Task>`) addressed by index, per the design
//! note on intrusive lists in an ownership-based language: `siblings`
//! membership becomes "is at this index in `tasks`", traversal order is the
//! vector order, and `curr` is an index rather than a pointer.

pub mod policy;

use alloc::vec::Vec;

use crate::types::{Ticks, Tid};

/// Linux-style nice-to-weight default, used when a priority's weight is not
/// being specially scaled (§4.2.8).
pub const NICE_0_LOAD: u64 = 1024;

/// Converts a static priority into a CFS-style load weight.
///
/// Grounded on the reference kernel crate's `nice_to_weight` table
/// (Linux's sched/core.c `prio_to_weight`), reused unchanged: `prio` here
/// plays the role of a nice value in `[-20, 19]`; priorities outside that
/// range fall back to the default weight.
pub fn weight_of(prio: i32) -> u64 {
	match prio {
		-20 => 88761,
		-19 => 71755,
		-18 => 56483,
		-17 => 46273,
		-16 => 36291,
		-15 => 29154,
		-14 => 23254,
		-13 => 18705,
		-12 => 14949,
		-11 => 11916,
		-10 => 9548,
		-9 => 7620,
		-8 => 6100,
		-7 => 4904,
		-6 => 3906,
		-5 => 3121,
		-4 => 2501,
		-3 => 1991,
		-2 => 1586,
		-1 => 1277,
		0 => NICE_0_LOAD,
		1 => 820,
		2 => 655,
		3 => 526,
		4 => 423,
		5 => 335,
		6 => 272,
		7 => 215,
		8 => 172,
		9 => 137,
		10 => 110,
		11 => 87,
		12 => 70,
		13 => 56,
		14 => 45,
		15 => 36,
		16 => 29,
		17 => 23,
		18 => 18,
		19 => 15,
		_ => NICE_0_LOAD,
	}
}

/// A task's scheduling state. Only `Running` is eligible for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
	Running,
	Blocked,
}

/// Per-task scheduling statistics, embedded in [`Task`].
#[derive(Debug, Clone, Copy)]
pub struct SchedEntity {
	/// Static priority; lower value is higher priority.
	pub prio: i32,
	/// CFS priority-weighted accumulated execution time.
	pub vruntime: u64,
	/// Tick at which the task was last dispatched.
	pub exec_start: Ticks,
	/// Ticks spent running since `exec_start`, recomputed on each stats update.
	pub exec_runtime: u64,
	/// Total ticks the task has ever run.
	pub sum_exec_runtime: u64,
	/// Whether this is a periodic real-time task.
	pub is_periodic: bool,
	/// While true, a periodic task is scheduled as if aperiodic, to measure its WCET.
	pub is_under_analysis: bool,
	/// Period length in ticks (periodic tasks only).
	pub period: u64,
	/// Absolute deadline, in ticks (periodic tasks only).
	pub deadline: u64,
	/// Absolute tick at which the next period begins (periodic tasks only).
	pub next_period: u64,
	/// True once the task has finished this period's work.
	pub executed: bool,
}

impl SchedEntity {
	/// A plain aperiodic entity at the given static priority.
	pub fn aperiodic(prio: i32) -> Self {
		Self {
			prio,
			vruntime: 0,
			exec_start: Ticks(0),
			exec_runtime: 0,
			sum_exec_runtime: 0,
			is_periodic: false,
			is_under_analysis: false,
			period: 0,
			deadline: 0,
			next_period: 0,
			executed: false,
		}
	}

	/// A periodic real-time entity with the given period, first deadline and
	/// first period boundary.
	pub fn periodic(prio: i32, period: u64, deadline: u64, next_period: u64) -> Self {
		Self {
			is_periodic: true,
			period,
			deadline,
			next_period,
			..Self::aperiodic(prio)
		}
	}

	/// True if this entity is to be treated as periodic by the real-time
	/// policies: a periodic task still under WCET analysis is scheduled as
	/// if it were aperiodic.
	fn is_realtime(&self) -> bool {
		self.is_periodic && !self.is_under_analysis
	}
}

/// A schedulable task.
#[derive(Debug, Clone, Copy)]
pub struct Task {
	pub tid: Tid,
	pub state: TaskState,
	pub se: SchedEntity,
}

impl Task {
	pub fn new(tid: Tid, state: TaskState, se: SchedEntity) -> Self {
		Self { tid, state, se }
	}
}

/// The shared run queue: a circular list of tasks plus the index of the
/// currently running one.
///
/// Invariant (I-S): `curr` always indexes a task in `tasks`; `tasks` is
/// never empty once a queue has been constructed with at least one task.
pub struct RunQueue {
	tasks: Vec<Task>,
	curr: usize,
}

impl RunQueue {
	/// Builds a run queue from an initial task list. `curr` starts at index 0.
	pub fn new(tasks: Vec<Task>) -> Self {
		assert!(!tasks.is_empty(), "a run queue must have at least one task");
		Self { tasks, curr: 0 }
	}

	pub fn tasks(&self) -> &[Task] {
		&self.tasks
	}

	pub fn tasks_mut(&mut self) -> &mut [Task] {
		&mut self.tasks
	}

	pub fn curr(&self) -> &Task {
		&self.tasks[self.curr]
	}

	pub fn curr_mut(&mut self) -> &mut Task {
		&mut self.tasks[self.curr]
	}

	pub fn curr_index(&self) -> usize {
		self.curr
	}

	/// Makes the task at `index` current. Panics if out of range.
	pub fn set_curr(&mut self, index: usize) {
		assert!(index < self.tasks.len());
		self.curr = index;
	}

	/// Points `curr` at the task with the given tid. Panics if not found.
	pub fn set_curr_tid(&mut self, tid: Tid) {
		let index = self
			.tasks
			.iter()
			.position(|t| t.tid == tid)
			.expect("tid not present in run queue");
		self.curr = index;
	}

}

/// Invokes the real-time family's process profiling timer hook (§4.2.8).
/// The profiling subsystem itself (process lifecycle, CPU-time accounting
/// across preemptions) is out of scope here; production code supplies its
/// own implementation.
pub trait ProfilingTimer {
	fn update(&mut self, task: &Task);
}

/// A profiling timer that does nothing, for callers with no profiling subsystem.
pub struct NoopProfilingTimer;

impl ProfilingTimer for NoopProfilingTimer {
	fn update(&mut self, _task: &Task) {}
}

/// Selects the next task to run, using the policy fixed for this build
/// (§6.2, §6.3). Panics if the active policy's dispatch selects nothing —
/// the idle task must always be kept runnable by the caller.
pub fn pick_next_configured(runqueue: &mut RunQueue, now: Ticks, profiling: &mut dyn ProfilingTimer) -> Tid {
	policy::pick_next(crate::config::ACTIVE_POLICY, runqueue, now, profiling)
}
