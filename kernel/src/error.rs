// SPDX-License-Identifier: GPL-2.0

//! Error handling types and utilities.
//!
//! Both cores favour the source design's own failure model over a generic
//! `Result` everywhere: allocation exhaustion returns `None`, and metadata
//! corruption is a deliberate panic (see `mm::buddy`). `Error` exists for the
//! boundary checks that remain: rejecting a caller argument before it would
//! otherwise be misread as exhaustion.

use core::fmt;

/// Kernel error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// A caller-supplied argument violates a documented precondition.
	InvalidArgument,
	/// The requested resource does not exist.
	NotFound,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::InvalidArgument => write!(f, "invalid argument"),
			Error::NotFound => write!(f, "not found"),
		}
	}
}

/// Kernel result type.
pub type Result<T> = core::result::Result<T, Error>;
