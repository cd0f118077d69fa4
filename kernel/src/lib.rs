// SPDX-License-Identifier: GPL-2.0

//! Core kernel primitives: the buddy-system physical page allocator and the
//! pluggable task-scheduler picker.
//!
//! Built `no_std` by default; the `std` feature is enabled for the host test
//! suite only, so `#[cfg(all(test, feature = "std"))]` modules can use
//! `std::panic::catch_unwind` and the rest of the standard library.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
pub mod error;
pub mod logging;
pub mod mm;
pub mod sched;
pub mod sync;
pub mod time;
pub mod types;

/// Kernel version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Rust Kernel";
