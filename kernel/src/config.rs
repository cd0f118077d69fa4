// SPDX-License-Identifier: GPL-2.0

//! Build-time configuration.
//!
//! Mirrors the source's `#if defined(SCHEDULER_*) ... #error` chain: exactly
//! one `sched-*` Cargo feature must be enabled, or the build fails here
//! before anything else is compiled.

#[cfg(not(any(
	feature = "sched-rr",
	feature = "sched-priority",
	feature = "sched-cfs",
	feature = "sched-edf",
	feature = "sched-rm",
	feature = "sched-aedf",
	feature = "sched-llf",
)))]
compile_error!(
	"you should enable a scheduling algorithm: one of the `sched-rr`, `sched-priority`, \
	 `sched-cfs`, `sched-edf`, `sched-rm`, `sched-aedf`, `sched-llf` features"
);

#[cfg(any(
	all(feature = "sched-rr", feature = "sched-priority"),
	all(feature = "sched-rr", feature = "sched-cfs"),
	all(feature = "sched-rr", feature = "sched-edf"),
	all(feature = "sched-rr", feature = "sched-rm"),
	all(feature = "sched-rr", feature = "sched-aedf"),
	all(feature = "sched-rr", feature = "sched-llf"),
	all(feature = "sched-priority", feature = "sched-cfs"),
	all(feature = "sched-priority", feature = "sched-edf"),
	all(feature = "sched-priority", feature = "sched-rm"),
	all(feature = "sched-priority", feature = "sched-aedf"),
	all(feature = "sched-priority", feature = "sched-llf"),
	all(feature = "sched-cfs", feature = "sched-edf"),
	all(feature = "sched-cfs", feature = "sched-rm"),
	all(feature = "sched-cfs", feature = "sched-aedf"),
	all(feature = "sched-cfs", feature = "sched-llf"),
	all(feature = "sched-edf", feature = "sched-rm"),
	all(feature = "sched-edf", feature = "sched-aedf"),
	all(feature = "sched-edf", feature = "sched-llf"),
	all(feature = "sched-rm", feature = "sched-aedf"),
	all(feature = "sched-rm", feature = "sched-llf"),
	all(feature = "sched-aedf", feature = "sched-llf"),
))]
compile_error!("exactly one `sched-*` feature must be enabled, not several");

/// Page size in bytes.
pub const PAGE_SIZE: usize = crate::types::PAGE_SIZE;

/// Number of distinct block orders; the largest block is `2^(MAX_ORDER-1)` pages.
pub const MAX_ORDER: usize = 14;

/// Single-page cache watermarks, as absolute page counts (§4.1.4).
pub const CACHE_LOW_WATERMARK: usize = 10;
pub const CACHE_HIGH_WATERMARK: usize = 70;
pub const CACHE_MID_WATERMARK: usize = (CACHE_LOW_WATERMARK + CACHE_HIGH_WATERMARK) / 2;

use crate::sched::policy::SchedPolicy;

/// The policy active in this build, derived from the `sched-*` feature set.
pub const ACTIVE_POLICY: SchedPolicy = {
	#[cfg(feature = "sched-rr")]
	{
		SchedPolicy::RoundRobin
	}
	#[cfg(feature = "sched-priority")]
	{
		SchedPolicy::Priority
	}
	#[cfg(feature = "sched-cfs")]
	{
		SchedPolicy::Cfs
	}
	#[cfg(feature = "sched-edf")]
	{
		SchedPolicy::Edf
	}
	#[cfg(feature = "sched-rm")]
	{
		SchedPolicy::Rm
	}
	#[cfg(feature = "sched-aedf")]
	{
		SchedPolicy::Aedf
	}
	#[cfg(feature = "sched-llf")]
	{
		SchedPolicy::Llf
	}
};
