// SPDX-License-Identifier: GPL-2.0

//! Buddy-system physical page allocator with a single-page cache.
//!
//! The source keeps per-page `FREE_PAGE`/`ROOT_PAGE` bits and a doubly linked
//! free list per order, threaded through the page descriptors themselves.
//! Here the descriptors live in one arena (`Vec<PageMeta>`, one entry per
//! page frame) and the free lists are plain `Vec<usize>` of page indices —
//! the index-arena translation of an intrusive list, same as [`crate::sched`].

use alloc::vec;
use alloc::vec::Vec;

use crate::config::{CACHE_HIGH_WATERMARK, CACHE_LOW_WATERMARK, CACHE_MID_WATERMARK, MAX_ORDER};
use crate::error::{Error, Result};
use crate::logging::{log_critical, log_debug};
use crate::types::{PhysAddr, PAGE_SIZE};

bitflags::bitflags! {
	/// Per-page state bits, matching the source's `FREE_PAGE`/`ROOT_PAGE`.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	struct PageFlags: u8 {
		/// Page is on a free list rather than allocated.
		const FREE = 1 << 0;
		/// Page is the base of a block currently tracked at `order`, rather
		/// than an interior page of a larger allocated/free block.
		const ROOT = 1 << 1;
	}
}

/// Metadata for one page frame (one arena slot).
///
/// Only the slot at the base of a block carries meaningful state; `ROOT`
/// distinguishes "base of a currently tracked block" from "interior page of
/// a larger allocated/free block".
#[derive(Debug, Clone, Copy)]
struct PageMeta {
	flags: PageFlags,
	order: usize,
}

impl PageMeta {
	const fn empty() -> Self {
		Self {
			flags: PageFlags::empty(),
			order: 0,
		}
	}

	fn is_free(&self) -> bool {
		self.flags.contains(PageFlags::FREE)
	}

	fn is_root(&self) -> bool {
		self.flags.contains(PageFlags::ROOT)
	}
}

/// A buddy-system allocator over one contiguous range of physical pages.
pub struct BuddyAllocator {
	base: PhysAddr,
	pages: Vec<PageMeta>,
	free_lists: Vec<Vec<usize>>,
	cache: Vec<usize>,
}

/// Snapshot of allocator occupancy, for introspection (`dump`, §4.1.5).
#[derive(Debug, Clone)]
pub struct BuddyStats {
	pub total_pages: usize,
	pub free_pages: usize,
	pub cached_pages: usize,
	pub free_blocks_by_order: Vec<usize>,
}

impl BuddyAllocator {
	/// Builds an allocator over `total_pages` frames starting at `base`.
	///
	/// `total_pages` must be a multiple of the largest block size
	/// (`2^(MAX_ORDER-1)`), mirroring the source's init-time assertion.
	pub fn new(base: PhysAddr, total_pages: usize) -> Self {
		let max_block = 1usize << (MAX_ORDER - 1);
		assert!(
			total_pages % max_block == 0,
			"memory size is not aligned to MAX_ORDER size"
		);

		let mut pages = vec![PageMeta::empty(); total_pages];
		let mut free_lists: Vec<Vec<usize>> = (0..MAX_ORDER).map(|_| Vec::new()).collect();

		let mut idx = 0;
		while idx < total_pages {
			pages[idx] = PageMeta {
				flags: PageFlags::FREE | PageFlags::ROOT,
				order: MAX_ORDER - 1,
			};
			free_lists[MAX_ORDER - 1].push(idx);
			idx += max_block;
		}

		Self {
			base,
			pages,
			free_lists,
			cache: Vec::with_capacity(CACHE_HIGH_WATERMARK),
		}
	}

	fn index_of(&self, addr: PhysAddr) -> Result<usize> {
		let offset = addr.as_usize().checked_sub(self.base.as_usize()).ok_or(Error::InvalidArgument)?;
		if offset % PAGE_SIZE != 0 {
			return Err(Error::InvalidArgument);
		}
		let idx = offset / PAGE_SIZE;
		if idx >= self.pages.len() {
			return Err(Error::InvalidArgument);
		}
		Ok(idx)
	}

	fn addr_of(&self, idx: usize) -> PhysAddr {
		self.base + idx * PAGE_SIZE
	}

	/// Allocates a block of `2^order` contiguous pages (§4.1.1).
	///
	/// Scans upward from `order` for the first non-empty free list, then
	/// splits that block down to the requested order. Returns `None` if no
	/// block of a suitable order is free.
	pub fn alloc_pages(&mut self, order: usize) -> Result<Option<PhysAddr>> {
		if order >= MAX_ORDER {
			return Err(Error::InvalidArgument);
		}

		let mut cur = order;
		while cur < MAX_ORDER && self.free_lists[cur].is_empty() {
			cur += 1;
		}
		if cur == MAX_ORDER {
			return Ok(None);
		}

		let idx = self.free_lists[cur].pop().expect("scanned order has a free block");
		self.pages[idx].flags.remove(PageFlags::FREE);

		while cur > order {
			cur -= 1;
			let buddy = idx + (1 << cur);
			self.pages[buddy] = PageMeta {
				flags: PageFlags::FREE | PageFlags::ROOT,
				order: cur,
			};
			self.free_lists[cur].push(buddy);
		}
		self.pages[idx].order = order;
		self.pages[idx].flags.insert(PageFlags::ROOT);

		Ok(Some(self.addr_of(idx)))
	}

	/// Releases a block of `2^order` pages previously returned by
	/// [`Self::alloc_pages`], merging with its buddy wherever possible.
	///
	/// Panics on a metadata inconsistency that only a double free or a
	/// corrupted address can produce (§4.1.1 edge cases): the block is
	/// already marked free, or it is not the root of a tracked block.
	pub fn free_pages(&mut self, addr: PhysAddr, order: usize) -> Result<()> {
		if order >= MAX_ORDER {
			return Err(Error::InvalidArgument);
		}
		let mut idx = self.index_of(addr)?;

		if self.pages[idx].is_free() || !self.pages[idx].is_root() {
			log_critical("mm::buddy", "Double deallocation");
			panic!("Double deallocation");
		}

		self.pages[idx].flags.insert(PageFlags::FREE);
		let mut cur_order = order;

		while cur_order < MAX_ORDER - 1 {
			let buddy = idx ^ (1 << cur_order);
			if buddy >= self.pages.len() {
				break;
			}
			let b = self.pages[buddy];
			if !(b.is_free() && b.is_root() && b.order == cur_order) {
				break;
			}
			self.free_lists[cur_order].retain(|&i| i != buddy);
			self.pages[buddy].flags.remove(PageFlags::ROOT);
			idx = idx.min(buddy);
			cur_order += 1;
			self.pages[idx].order = cur_order;
			self.pages[idx].flags.insert(PageFlags::ROOT);
		}

		self.pages[idx].order = cur_order;
		self.free_lists[cur_order].push(idx);
		Ok(())
	}

	/// Tops the cache up from the buddy allocator until it reaches the mid
	/// watermark (§4.1.4).
	///
	/// The source treats this refill as infallible; rather than silently
	/// stopping short when the zone is under pressure, a failed refill
	/// propagates as a panic instead of leaving callers with a cache quietly
	/// below where they expect it.
	fn cache_extend(&mut self) {
		let target = CACHE_MID_WATERMARK;
		while self.cache.len() < target {
			let addr = self
				.alloc_pages(0)
				.expect("order 0 is always valid")
				.expect("buddy allocator exhausted while refilling the single-page cache");
			let idx = self.index_of(addr).expect("just-allocated address is in range");
			self.cache.push(idx);
		}
	}

	/// Drains the cache back to the buddy allocator down to the mid
	/// watermark (§4.1.4).
	fn cache_shrink(&mut self) {
		let target = CACHE_MID_WATERMARK;
		while self.cache.len() > target {
			let idx = self.cache.pop().expect("cache is non-empty above target");
			self.free_pages(self.addr_of(idx), 0).expect("cached page is a valid order-0 block");
		}
	}

	/// Allocates a single page, preferring the cache (§4.1.4). Refills the
	/// cache first if it has dropped below the low watermark.
	pub fn cached_alloc(&mut self) -> PhysAddr {
		if self.cache.len() < CACHE_LOW_WATERMARK {
			self.cache_extend();
		}
		let idx = self.cache.pop().expect("cache_extend guarantees a non-empty cache");
		self.addr_of(idx)
	}

	/// Returns a single page to the cache rather than straight to the buddy
	/// allocator (§4.1.4), shrinking the cache if it has grown too large.
	pub fn cached_free(&mut self, addr: PhysAddr) -> Result<()> {
		let idx = self.index_of(addr)?;
		self.cache.push(idx);
		if self.cache.len() > CACHE_HIGH_WATERMARK {
			self.cache_shrink();
		}
		Ok(())
	}

	/// A snapshot of current occupancy (§4.1.5), logged at `Debug`.
	pub fn dump(&self) -> BuddyStats {
		let free_blocks_by_order: Vec<usize> = self.free_lists.iter().map(Vec::len).collect();
		let free_pages = free_blocks_by_order
			.iter()
			.enumerate()
			.map(|(order, count)| count * (1 << order))
			.sum();
		let stats = BuddyStats {
			total_pages: self.pages.len(),
			free_pages,
			cached_pages: self.cache.len(),
			free_blocks_by_order,
		};
		log_debug(
			"mm::buddy",
			"dumped allocator stats",
		);
		stats
	}

	/// Total managed memory, in bytes (§4.1.5).
	pub fn total_space(&self) -> usize {
		self.pages.len() * PAGE_SIZE
	}

	/// Free memory across all orders, in bytes (§4.1.5).
	pub fn free_space(&self) -> usize {
		self.free_lists
			.iter()
			.enumerate()
			.map(|(order, list)| list.len() * (1 << order) * PAGE_SIZE)
			.sum()
	}

	/// Memory currently held in the single-page cache, in bytes (§4.1.5).
	pub fn cached_space(&self) -> usize {
		self.cache.len() * PAGE_SIZE
	}
}

#[cfg(all(test, feature = "std"))]
mod tests {
	use super::*;

	fn small_allocator() -> BuddyAllocator {
		// MAX_ORDER = 14 in config.rs, so the minimum aligned size is 2^13 = 8192 pages.
		BuddyAllocator::new(PhysAddr::new(0), 1 << 13)
	}

	/// S1 — split then merge returns the allocator to its initial state.
	#[test]
	fn split_and_merge_round_trips() {
		let mut a = small_allocator();
		let before = a.dump();

		let p0 = a.alloc_pages(0).unwrap().unwrap();
		let p1 = a.alloc_pages(0).unwrap().unwrap();
		assert_ne!(p0, p1);

		a.free_pages(p0, 0).unwrap();
		a.free_pages(p1, 0).unwrap();

		let after = a.dump();
		assert_eq!(before.free_pages, after.free_pages);
		assert_eq!(before.free_blocks_by_order, after.free_blocks_by_order);
	}

	#[test]
	fn alloc_exhausts_to_none() {
		let mut a = BuddyAllocator::new(PhysAddr::new(0), 1 << 13);
		let top = a.alloc_pages(13).unwrap();
		assert!(top.is_some());
		assert_eq!(a.alloc_pages(0).unwrap(), None);
	}

	/// S6 — freeing the same block twice panics.
	#[test]
	fn double_free_panics() {
		let mut a = small_allocator();
		let p = a.alloc_pages(0).unwrap().unwrap();
		a.free_pages(p, 0).unwrap();

		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
			a.free_pages(p, 0).unwrap();
		}));
		assert!(result.is_err());
	}

	/// S2 — the first `cached_alloc` from an empty cache refills to the mid
	/// watermark and returns one of those pages, leaving `MID - 1` cached.
	#[test]
	fn cache_refills_below_low_watermark() {
		let mut a = small_allocator();
		assert!(a.cache.is_empty());

		let p = a.cached_alloc();
		assert_eq!(a.cache.len(), CACHE_MID_WATERMARK - 1);

		a.free_pages(p, 0).unwrap();
	}

	/// Draining past the low watermark triggers another refill to the mid
	/// watermark.
	#[test]
	fn cache_refills_when_drained_past_low_watermark() {
		let mut a = small_allocator();
		a.cache_extend();

		while a.cache.len() >= CACHE_LOW_WATERMARK {
			let p = a.cached_alloc();
			a.free_pages(p, 0).unwrap();
		}

		let p = a.cached_alloc();
		assert_eq!(a.cache.len(), CACHE_MID_WATERMARK - 1);
		a.free_pages(p, 0).unwrap();
	}

	/// Freeing past the high watermark shrinks the cache back to mid.
	#[test]
	fn cache_shrinks_above_high_watermark() {
		let mut a = small_allocator();
		let pages: Vec<PhysAddr> = (0..CACHE_HIGH_WATERMARK + 1).map(|_| a.alloc_pages(0).unwrap().unwrap()).collect();

		for p in pages {
			a.cached_free(p).unwrap();
		}

		assert_eq!(a.cache.len(), CACHE_MID_WATERMARK);
	}

	#[test]
	fn invalid_order_is_rejected() {
		let mut a = small_allocator();
		assert_eq!(a.alloc_pages(MAX_ORDER), Err(Error::InvalidArgument));
	}

	#[test]
	fn misaligned_address_is_rejected() {
		let mut a = small_allocator();
		assert_eq!(a.free_pages(PhysAddr::new(1), 0), Err(Error::InvalidArgument));
	}
}
