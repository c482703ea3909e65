/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::{Move, Score, ZobristKey};

/// How a stored score relates to the true value of its node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Bound {
    /// The score is exact (a PV node).
    Exact = 0,

    /// The score is at most this value (every move failed low).
    Upper = 1,

    /// The score is at least this value (a move failed high).
    Lower = 2,
}

impl Bound {
    #[inline(always)]
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Exact,
            1 => Self::Upper,
            _ => Self::Lower,
        }
    }
}

/// An unpacked view of one transposition table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TTEntry {
    pub key: ZobristKey,
    pub best_move: Move,
    pub score: Score,
    pub depth: i8,
    pub bound: Bound,
    pub generation: u8,
}

/// One 16-byte slot: the full 64-bit key and a packed data word.
///
/// Both words are written with independent relaxed stores; the 16-byte
/// alignment keeps a slot inside one write boundary, and a reader that sees
/// a torn pair fails the key comparison and ignores the slot.
#[repr(align(16))]
struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

#[inline(always)]
fn pack(entry: &TTEntry) -> u64 {
    let mv = entry.best_move.inner() as u64;
    let score = entry.score.inner() as u16 as u64;
    let depth = entry.depth as u8 as u64;
    let bound = entry.bound as u64;
    let generation = entry.generation as u64;

    mv | score << 16 | depth << 32 | bound << 40 | generation << 48
}

#[inline(always)]
fn unpack(key: u64, data: u64) -> TTEntry {
    TTEntry {
        key: ZobristKey::from_raw(key),
        best_move: Move::from_raw(data as u16),
        score: Score::new((data >> 16) as u16 as i16),
        depth: (data >> 32) as u8 as i8,
        bound: Bound::from_bits((data >> 40) as u8),
        generation: (data >> 48) as u8,
    }
}

/// A fixed-size, direct-mapped transposition table shared by every search
/// thread without locks.
///
/// The table never returns an entry whose key does not exactly match the
/// probed key, so unsynchronized writes from other threads are harmless.
pub struct TTable {
    slots: NonNull<Slot>,
    /// Entry count minus one; the entry count is always a power of two.
    mask: usize,
    layout: Layout,
    generation: AtomicU8,
}

// The raw pointer only ever targets atomics.
unsafe impl Send for TTable {}
unsafe impl Sync for TTable {}

impl TTable {
    /// Default size of the table, in megabytes.
    pub const DEFAULT_SIZE: usize = 16;

    /// Minimum size of the table, in megabytes.
    pub const MIN_SIZE: usize = 1;

    /// Maximum size of the table, in megabytes.
    pub const MAX_SIZE: usize = 8_192;

    /// Preferred allocation alignment: a 2 MiB boundary, so the allocation
    /// can be backed by a huge page where the kernel offers one.
    const HUGE_ALIGN: usize = 2 * 1024 * 1024;

    /// Creates a table of `size_mb` megabytes (clamped to the legal range),
    /// rounded down to a power-of-two entry count.
    pub fn new(size_mb: usize) -> Self {
        let size_mb = size_mb.clamp(Self::MIN_SIZE, Self::MAX_SIZE);
        let bytes = size_mb * 1024 * 1024;
        // Round the entry count down to a power of two so indexing is a mask
        let entries = 1 << (bytes / size_of::<Slot>()).ilog2();

        // Try a huge-page-friendly alignment first; the table is load-bearing,
        // so if even the fallback allocation fails we abort via the global
        // allocation error hook.
        let bytes = entries * size_of::<Slot>();
        let layout = Layout::from_size_align(bytes, Self::HUGE_ALIGN.min(bytes)).unwrap();
        let mut ptr = unsafe { alloc::alloc_zeroed(layout) };

        let layout = if ptr.is_null() {
            let fallback = Layout::from_size_align(bytes, 64).unwrap();
            ptr = unsafe { alloc::alloc_zeroed(fallback) };
            if ptr.is_null() {
                alloc::handle_alloc_error(fallback);
            }
            fallback
        } else {
            layout
        };

        Self {
            slots: NonNull::new(ptr.cast()).unwrap(),
            mask: entries - 1,
            layout,
            generation: AtomicU8::new(0),
        }
    }

    /// Number of entries the table holds.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Size of the table in megabytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.capacity() * size_of::<Slot>() / (1024 * 1024)
    }

    #[inline(always)]
    fn slot(&self, key: ZobristKey) -> &Slot {
        let index = key.inner() as usize & self.mask;
        // Index is masked into range and the allocation lives as long as self
        unsafe { &*self.slots.as_ptr().add(index) }
    }

    /// Zeroes every entry and resets the generation counter.
    pub fn clear(&self) {
        for index in 0..self.capacity() {
            let slot = unsafe { &*self.slots.as_ptr().add(index) };
            slot.key.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Advances the entry age; called once at the start of every search,
    /// not every iteration.
    #[inline(always)]
    pub fn new_search(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the entry stored for `key`, if its stored key matches exactly.
    ///
    /// Mate scores are adjusted to be relative to the probing node at `ply`.
    #[inline(always)]
    pub fn probe(&self, key: ZobristKey, ply: i16) -> Option<TTEntry> {
        let slot = self.slot(key);
        let stored_key = slot.key.load(Ordering::Relaxed);
        if stored_key != key.inner() {
            return None;
        }

        let mut entry = unpack(stored_key, slot.data.load(Ordering::Relaxed));
        entry.score = entry.score.from_tt(ply);
        Some(entry)
    }

    /// Stores a result for `key`, found at `depth` from a node `ply` plies
    /// below the root.
    ///
    /// Replacement: always overwrite a different key; otherwise require the
    /// new entry to be at least as deep, or the old entry to be from an
    /// earlier search. A valid stored move is preserved when the new move
    /// is none.
    pub fn store(
        &self,
        key: ZobristKey,
        mut best_move: Move,
        score: Score,
        depth: i8,
        bound: Bound,
        ply: i16,
    ) {
        let slot = self.slot(key);
        let stored_key = slot.key.load(Ordering::Relaxed);
        let stored = unpack(stored_key, slot.data.load(Ordering::Relaxed));
        let generation = self.generation.load(Ordering::Relaxed);

        let replace = stored_key != key.inner()
            || depth >= stored.depth
            || stored.generation != generation;
        if !replace {
            return;
        }

        if best_move.is_none() && stored_key == key.inner() {
            best_move = stored.best_move;
        }

        let entry = TTEntry {
            key,
            best_move,
            score: score.to_tt(ply),
            depth,
            bound,
            generation,
        };

        slot.key.store(key.inner(), Ordering::Relaxed);
        slot.data.store(pack(&entry), Ordering::Relaxed);
    }

    /// The stored best move for `key`, if any.
    #[inline(always)]
    pub fn best_move(&self, key: ZobristKey) -> Move {
        self.probe(key, 0)
            .map_or(Move::NONE, |entry| entry.best_move)
    }
}

impl Drop for TTable {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.slots.as_ptr().cast(), self.layout) };
    }
}

impl Default for TTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}
