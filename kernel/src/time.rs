// SPDX-License-Identifier: GPL-2.0

//! Monotonic tick counter.
//!
//! The tick timer source itself (the hardware counter that drives this) is
//! out of scope; this module only exposes the counter the rest of the crate
//! reads. The timer interrupt handler calls [`tick`] once per period.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::types::Ticks;

static TICKS: AtomicU64 = AtomicU64::new(0);

/// Returns the current monotonic tick count.
pub fn now() -> Ticks {
	Ticks(TICKS.load(Ordering::Relaxed))
}

/// Advances the tick counter by one. Called from the timer interrupt path.
pub fn tick() {
	TICKS.fetch_add(1, Ordering::Relaxed);
}

#[cfg(all(test, feature = "std"))]
mod tests {
	use super::*;

	#[test]
	fn tick_is_monotonic() {
		let start = now();
		tick();
		tick();
		assert_eq!(now(), Ticks(start.0 + 2));
	}
}
