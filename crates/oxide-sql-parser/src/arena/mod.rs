//! Region allocation for AST storage.
//!
//! The [`Arena`] hands out byte ranges from large blocks using a bump
//! offset and reclaims everything at once. [`TypedArena`] builds typed,
//! in-place construction on the same growth policy and is what the AST uses
//! for its nodes.
//!
//! Blocks are fixed-length buffers that are never grown after creation, so
//! an allocation keeps its address for as long as the arena holds the block.
//! Allocations are addressed through handles ([`ArenaSlice`], [`Idx`])
//! carrying the arena generation; a handle obtained before a
//! [`reset`](Arena::reset) or [`clear`](Arena::clear) no longer resolves.

mod local;
mod typed;

pub use local::with_thread_arena;
pub use typed::{Idx, TypedArena};

use tracing::{trace, warn};

/// Capacity of the first block (32 KiB).
pub const BASE_BLOCK_SIZE: usize = 32 * 1024;

/// Upper bound for geometrically grown blocks (1 MiB).
///
/// Requests larger than this get a dedicated block sized to the request.
pub const MAX_BLOCK_SIZE: usize = 1024 * 1024;

/// Errors raised by the arena allocators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// The system allocator could not provide a new block.
    #[error("arena exhausted: could not reserve {requested} bytes")]
    Exhausted {
        /// Number of bytes the failed block reservation asked for.
        requested: usize,
    },

    /// The thread-local arena is already borrowed on this thread.
    #[error("thread-local arena is already in use on this thread")]
    Busy,
}

/// Handle to a byte range inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaSlice {
    block: u32,
    offset: u32,
    len: u32,
    generation: u32,
}

impl ArenaSlice {
    /// Length of the allocation in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns true for zero-size allocations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the block holding the allocation.
    #[must_use]
    pub const fn block(&self) -> usize {
        self.block as usize
    }

    /// Byte offset of the allocation inside its block.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset as usize
    }
}

/// Block sizing shared by [`Arena`] and [`TypedArena`].
///
/// Block `n` gets `base << n` units, capped at `max`. A request larger than
/// that step moves to the next step that covers it; only requests above
/// `max` get a block sized to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GrowthPolicy {
    base: usize,
    max: usize,
}

impl GrowthPolicy {
    pub(crate) const fn new(base: usize, max: usize) -> Self {
        Self { base, max }
    }

    /// Capacity for the block appended after `existing` blocks, large enough
    /// for `required` units.
    pub(crate) fn block_size(&self, existing: usize, required: usize) -> usize {
        if required > self.max {
            return required;
        }
        let shift = u32::try_from(existing).unwrap_or(u32::MAX);
        let mut size = self
            .base
            .checked_shl(shift)
            .filter(|size| *size <= self.max && *size >= self.base)
            .unwrap_or(self.max)
            .max(1);
        while size < required {
            size = size.saturating_mul(2).min(self.max);
        }
        size
    }
}

#[derive(Debug)]
struct Block {
    data: Vec<u8>,
    used: usize,
}

impl Block {
    fn try_new(capacity: usize) -> Result<Self, ArenaError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ArenaError::Exhausted {
                requested: capacity,
            })?;
        data.resize(capacity, 0);
        Ok(Self { data, used: 0 })
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn base_addr(&self) -> usize {
        self.data.as_ptr() as usize
    }

    /// Offset at which `size` bytes aligned to `align` would start, if they
    /// fit in the remaining space.
    fn fit(&self, size: usize, align: usize) -> Option<usize> {
        let base = self.base_addr();
        let cursor = base.checked_add(self.used)?;
        let aligned = cursor.checked_add(align - 1)? & !(align - 1);
        let start = aligned - base;
        let end = start.checked_add(size)?;
        (end <= self.capacity()).then_some(start)
    }
}

/// A bump-pointer arena made of geometrically growing blocks.
#[derive(Debug)]
pub struct Arena {
    blocks: Vec<Block>,
    current: usize,
    generation: u32,
    growth: GrowthPolicy,
}

impl Default for Arena {
    /// An arena without any block; the first allocation creates one.
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            current: 0,
            generation: 0,
            growth: GrowthPolicy::new(BASE_BLOCK_SIZE, MAX_BLOCK_SIZE),
        }
    }
}

impl Arena {
    /// Creates an arena holding one base-size block.
    #[must_use]
    pub fn new() -> Self {
        let mut arena = Self::default();
        match Block::try_new(BASE_BLOCK_SIZE) {
            Ok(block) => arena.blocks.push(block),
            Err(err) => warn!(%err, "arena created without a base block"),
        }
        arena
    }

    /// Reserves `size` bytes aligned to `align` and returns a handle to them.
    ///
    /// `align` must be a power of two. Zero-size requests return a distinct
    /// empty handle.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::Exhausted`] when a new block is needed and the
    /// system allocator refuses it, or when the request size or its position
    /// does not fit a handle.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<ArenaSlice, ArenaError> {
        debug_assert!(align.is_power_of_two(), "alignment {align} is not a power of two");
        let align = align.max(1).next_power_of_two();
        // Zero-size requests still consume a byte so every handle is distinct.
        let reserve = size.max(1);

        let (block, offset) = self.find_space(reserve, align)?;
        let handle = ArenaSlice {
            block: to_u32(block)?,
            offset: to_u32(offset)?,
            len: to_u32(size)?,
            generation: self.generation,
        };
        self.blocks[block].used = offset + reserve;
        Ok(handle)
    }

    fn find_space(&mut self, size: usize, align: usize) -> Result<(usize, usize), ArenaError> {
        if let Some(offset) = self.blocks.get(self.current).and_then(|b| b.fit(size, align)) {
            return Ok((self.current, offset));
        }

        // Blocks retained across a reset are reused before appending.
        for index in self.current + 1..self.blocks.len() {
            if let Some(offset) = self.blocks[index].fit(size, align) {
                self.current = index;
                return Ok((index, offset));
            }
        }

        let required = size
            .checked_add(align - 1)
            .ok_or(ArenaError::Exhausted { requested: size })?;
        let capacity = self.growth.block_size(self.blocks.len(), required);
        let block = Block::try_new(capacity)?;
        trace!(
            capacity,
            blocks = self.blocks.len() + 1,
            jumbo = required > MAX_BLOCK_SIZE,
            "arena block appended"
        );
        let offset = block
            .fit(size, align)
            .ok_or(ArenaError::Exhausted { requested: required })?;
        self.blocks.push(block);
        self.current = self.blocks.len() - 1;
        Ok((self.current, offset))
    }

    /// Copies `text` into arena storage.
    ///
    /// # Errors
    ///
    /// Propagates allocation failures from [`allocate`](Self::allocate).
    pub fn alloc_str(&mut self, text: &str) -> Result<ArenaSlice, ArenaError> {
        let slice = self.allocate(text.len(), 1)?;
        if let Some(bytes) = self.bytes_mut(slice) {
            bytes.copy_from_slice(text.as_bytes());
        }
        Ok(slice)
    }

    /// Resolves a handle produced by [`alloc_str`](Self::alloc_str).
    #[must_use]
    pub fn str(&self, slice: ArenaSlice) -> Option<&str> {
        self.bytes(slice)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Returns the bytes behind a handle, or `None` if the handle is stale.
    #[must_use]
    pub fn bytes(&self, slice: ArenaSlice) -> Option<&[u8]> {
        if slice.generation != self.generation {
            return None;
        }
        let block = self.blocks.get(slice.block())?;
        block.data.get(slice.offset()..slice.offset() + slice.len())
    }

    /// Mutable access to the bytes behind a handle.
    #[must_use]
    pub fn bytes_mut(&mut self, slice: ArenaSlice) -> Option<&mut [u8]> {
        if slice.generation != self.generation {
            return None;
        }
        let block = self.blocks.get_mut(slice.block())?;
        block.data.get_mut(slice.offset()..slice.offset() + slice.len())
    }

    /// Real address of an allocation; used to observe alignment.
    #[must_use]
    pub fn address_of(&self, slice: ArenaSlice) -> Option<usize> {
        if slice.generation != self.generation {
            return None;
        }
        self.blocks
            .get(slice.block())
            .map(|block| block.base_addr() + slice.offset())
    }

    /// Sum of all block capacities in bytes.
    #[must_use]
    pub fn total_allocated(&self) -> usize {
        self.blocks.iter().map(Block::capacity).sum()
    }

    /// Sum of all block `used` offsets in bytes.
    #[must_use]
    pub fn total_used(&self) -> usize {
        self.blocks.iter().map(|b| b.used).sum()
    }

    /// Ratio of used to allocated bytes; 0.0 for an empty arena.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn utilization(&self) -> f64 {
        let allocated = self.total_allocated();
        if allocated == 0 {
            0.0
        } else {
            self.total_used() as f64 / allocated as f64
        }
    }

    /// Number of blocks currently owned.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Rewinds every block without releasing storage.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.used = 0;
        }
        self.current = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Releases every block back to the system allocator.
    pub fn clear(&mut self) {
        self.blocks = Vec::new();
        self.current = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Moves all blocks into a new arena, leaving `self` empty but usable.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let taken = Self {
            blocks: std::mem::take(&mut self.blocks),
            current: self.current,
            generation: self.generation,
            growth: self.growth,
        };
        self.current = 0;
        // Handles issued before the move belong to the new owner.
        self.generation = self.generation.wrapping_add(1);
        taken
    }
}

/// Converts arena offsets to handle fields. Handles address at most
/// `u32::MAX` bytes per block.
pub(super) fn to_u32(value: usize) -> Result<u32, ArenaError> {
    u32::try_from(value).map_err(|_| ArenaError::Exhausted { requested: value })
}
