//! Typed in-place construction on top of the block growth policy.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use tracing::trace;

use super::{to_u32, ArenaError, GrowthPolicy, BASE_BLOCK_SIZE, MAX_BLOCK_SIZE};

/// Handle to a value stored in a [`TypedArena`].
pub struct Idx<T> {
    chunk: u32,
    slot: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    const fn new(chunk: u32, slot: u32, generation: u32) -> Self {
        Self {
            chunk,
            slot,
            generation,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.chunk == other.chunk && self.slot == other.slot && self.generation == other.generation
    }
}

impl<T> Eq for Idx<T> {}

impl<T> Hash for Idx<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chunk.hash(state);
        self.slot.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({}:{}@{})", self.chunk, self.slot, self.generation)
    }
}

/// Arena of `T` values addressed by [`Idx`].
///
/// `T: Copy` means values never need dropping, so [`reset`](Self::reset) and
/// [`clear`](Self::clear) release storage without running destructors.
/// Chunks are reserved once with a fixed capacity and never reallocated.
pub struct TypedArena<T: Copy> {
    chunks: Vec<Vec<T>>,
    current: usize,
    generation: u32,
    growth: GrowthPolicy,
}

impl<T: Copy> fmt::Debug for TypedArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedArena")
            .field("chunks", &self.chunks.len())
            .field("len", &self.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T: Copy> Default for TypedArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> TypedArena<T> {
    /// Creates an empty typed arena; the first chunk is reserved lazily.
    #[must_use]
    pub fn new() -> Self {
        let unit = core::mem::size_of::<T>().max(1);
        let base = (BASE_BLOCK_SIZE / unit).max(1);
        let max = (MAX_BLOCK_SIZE / unit).max(base);
        Self {
            chunks: Vec::new(),
            current: 0,
            generation: 0,
            growth: GrowthPolicy::new(base, max),
        }
    }

    /// Moves `value` into the arena.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::Exhausted`] if a new chunk cannot be reserved.
    pub fn alloc(&mut self, value: T) -> Result<Idx<T>, ArenaError> {
        let chunk = self.chunk_with_room()?;
        let storage = &mut self.chunks[chunk];
        let idx = Idx::new(to_u32(chunk)?, to_u32(storage.len())?, self.generation);
        storage.push(value);
        Ok(idx)
    }

    fn chunk_with_room(&mut self) -> Result<usize, ArenaError> {
        while let Some(chunk) = self.chunks.get(self.current) {
            if chunk.len() < chunk.capacity() {
                return Ok(self.current);
            }
            if self.current + 1 >= self.chunks.len() {
                break;
            }
            self.current += 1;
        }

        let capacity = self.growth.block_size(self.chunks.len(), 1);
        let mut chunk = Vec::new();
        chunk
            .try_reserve_exact(capacity)
            .map_err(|_| ArenaError::Exhausted {
                requested: capacity.saturating_mul(core::mem::size_of::<T>()),
            })?;
        trace!(capacity, chunks = self.chunks.len() + 1, "typed arena chunk appended");
        self.chunks.push(chunk);
        self.current = self.chunks.len() - 1;
        Ok(self.current)
    }

    /// Returns the value behind `idx`, or `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, idx: Idx<T>) -> Option<&T> {
        if idx.generation != self.generation {
            return None;
        }
        self.chunks.get(idx.chunk as usize)?.get(idx.slot as usize)
    }

    /// Mutable access to the value behind `idx`.
    #[must_use]
    pub fn get_mut(&mut self, idx: Idx<T>) -> Option<&mut T> {
        if idx.generation != self.generation {
            return None;
        }
        self.chunks
            .get_mut(idx.chunk as usize)?
            .get_mut(idx.slot as usize)
    }

    /// Number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Returns true if no value is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of reserved chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Bytes reserved across all chunks.
    #[must_use]
    pub fn total_allocated(&self) -> usize {
        self.chunks.iter().map(Vec::capacity).sum::<usize>() * core::mem::size_of::<T>()
    }

    /// Bytes occupied by live values.
    #[must_use]
    pub fn total_used(&self) -> usize {
        self.len() * core::mem::size_of::<T>()
    }

    /// Forgets every value but keeps chunk storage.
    pub fn reset(&mut self) {
        for chunk in &mut self.chunks {
            chunk.clear();
        }
        self.current = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Releases every chunk.
    pub fn clear(&mut self) {
        self.chunks = Vec::new();
        self.current = 0;
        self.generation = self.generation.wrapping_add(1);
    }
}
