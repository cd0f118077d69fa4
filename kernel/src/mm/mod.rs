// SPDX-License-Identifier: GPL-2.0

//! Physical memory management: the buddy-system page allocator (§4.1).

pub mod buddy;

pub use buddy::BuddyAllocator;
