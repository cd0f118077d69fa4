// SPDX-License-Identifier: GPL-2.0

//! Kernel logging and debugging system.
//!
//! Both cores route their diagnostics through here instead of printing
//! directly: the buddy allocator's `dump()` logs at `Debug`, and fatal
//! invariant violations log at `Critical` immediately before the panic that
//! follows them, so the last buffered line explains why the kernel died.

use alloc::{format, string::String, vec::Vec};

use once_cell::sync::OnceCell;

use crate::sync::Spinlock;
use crate::time;

/// Log levels (compatible with Linux kernel conventions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
	Emergency = 0,
	Alert = 1,
	Critical = 2,
	Error = 3,
	Warning = 4,
	Notice = 5,
	Info = 6,
	Debug = 7,
}

impl LogLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Emergency => "EMERG",
			LogLevel::Alert => "ALERT",
			LogLevel::Critical => "CRIT",
			LogLevel::Error => "ERROR",
			LogLevel::Warning => "WARN",
			LogLevel::Notice => "NOTICE",
			LogLevel::Info => "INFO",
			LogLevel::Debug => "DEBUG",
		}
	}
}

/// A single log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
	pub level: LogLevel,
	pub timestamp: u64,
	pub module: String,
	pub message: String,
}

impl LogEntry {
	fn new(level: LogLevel, module: String, message: String) -> Self {
		Self {
			level,
			timestamp: time::now().as_u64(),
			module,
			message,
		}
	}

	pub fn format(&self) -> String {
		format!(
			"[{:>5}] [{:>10}] {}: {}\n",
			self.level.as_str(),
			self.timestamp,
			self.module,
			self.message
		)
	}
}

/// Logger configuration.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
	pub min_level: LogLevel,
	pub max_entries: usize,
}

impl LoggerConfig {
	pub fn new() -> Self {
		Self {
			min_level: LogLevel::Info,
			max_entries: 1000,
		}
	}

	pub fn with_level(mut self, level: LogLevel) -> Self {
		self.min_level = level;
		self
	}
}

impl Default for LoggerConfig {
	fn default() -> Self {
		Self::new()
	}
}

/// Logging statistics.
#[derive(Debug, Default, Clone)]
pub struct LogStats {
	pub total_entries: u64,
	pub entries_by_level: [u64; 8],
	pub dropped_entries: u64,
}

/// Kernel logger: a bounded in-memory ring buffer plus per-level counters.
pub struct KernelLogger {
	config: LoggerConfig,
	entries: Vec<LogEntry>,
	stats: LogStats,
}

impl KernelLogger {
	const fn new() -> Self {
		Self {
			config: LoggerConfig {
				min_level: LogLevel::Info,
				max_entries: 1000,
			},
			entries: Vec::new(),
			stats: LogStats {
				total_entries: 0,
				entries_by_level: [0; 8],
				dropped_entries: 0,
			},
		}
	}

	fn log(&mut self, level: LogLevel, module: &str, message: &str) {
		if level > self.config.min_level {
			return;
		}

		self.stats.total_entries += 1;
		self.stats.entries_by_level[level as usize] += 1;

		if self.entries.len() >= self.config.max_entries {
			self.entries.remove(0);
			self.stats.dropped_entries += 1;
		}
		self.entries
			.push(LogEntry::new(level, module.into(), message.into()));
	}

	pub fn entries(&self) -> &[LogEntry] {
		&self.entries
	}

	pub fn stats(&self) -> &LogStats {
		&self.stats
	}
}

/// Global kernel logger.
static KERNEL_LOGGER: Spinlock<KernelLogger> = Spinlock::new(KernelLogger::new());
static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialise the logging system. Idempotent: later calls are no-ops.
pub fn init_logging(config: LoggerConfig) {
	if LOGGER_INIT.set(()).is_ok() {
		KERNEL_LOGGER.lock().config = config;
		log_info("logging", "kernel logging system initialised");
	}
}

pub fn log(level: LogLevel, module: &str, message: &str) {
	KERNEL_LOGGER.lock().log(level, module, message);
}

pub fn log_emergency(module: &str, message: &str) {
	log(LogLevel::Emergency, module, message);
}

pub fn log_critical(module: &str, message: &str) {
	log(LogLevel::Critical, module, message);
}

pub fn log_warning(module: &str, message: &str) {
	log(LogLevel::Warning, module, message);
}

pub fn log_info(module: &str, message: &str) {
	log(LogLevel::Info, module, message);
}

pub fn log_debug(module: &str, message: &str) {
	log(LogLevel::Debug, module, message);
}

pub fn get_log_stats() -> LogStats {
	KERNEL_LOGGER.lock().stats().clone()
}

#[cfg(all(test, feature = "std"))]
mod tests {
	use super::*;

	#[test]
	fn respects_min_level() {
		let logger_stats_before = get_log_stats().total_entries;
		log_debug("test", "should be filtered at default Info level");
		assert_eq!(get_log_stats().total_entries, logger_stats_before);

		log_info("test", "should be recorded");
		assert_eq!(get_log_stats().total_entries, logger_stats_before + 1);
	}
}
