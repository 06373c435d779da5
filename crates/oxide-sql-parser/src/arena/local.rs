//! Per-thread arena acquisition.
//!
//! Each thread lazily builds its own [`Arena`] on first use; it lives until
//! the thread exits. No arena is ever visible to two threads, so no locking
//! is involved.

use std::cell::RefCell;

use super::{Arena, ArenaError};

thread_local! {
    static THREAD_ARENA: RefCell<Option<Arena>> = const { RefCell::new(None) };
}

/// Runs `f` with exclusive access to this thread's arena.
///
/// The arena is created on the first call from a thread and reused by later
/// calls; its contents persist between calls until `f` resets or clears it.
///
/// # Errors
///
/// Returns [`ArenaError::Busy`] when called from inside another
/// `with_thread_arena` closure on the same thread.
pub fn with_thread_arena<R>(f: impl FnOnce(&mut Arena) -> R) -> Result<R, ArenaError> {
    THREAD_ARENA.with(|cell| {
        let mut slot = cell.try_borrow_mut().map_err(|_| ArenaError::Busy)?;
        let arena = slot.get_or_insert_with(Arena::new);
        Ok(f(arena))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_arena_is_reused() {
        let first = with_thread_arena(|arena| {
            arena.reset();
            arena.allocate(128, 8).unwrap();
            arena.total_used()
        })
        .unwrap();
        let second = with_thread_arena(|arena| arena.total_used()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reentrant_use_is_rejected() {
        let nested = with_thread_arena(|_| with_thread_arena(|_| ())).unwrap();
        assert_eq!(nested, Err(ArenaError::Busy));
    }

    #[test]
    fn test_threads_get_separate_arenas() {
        with_thread_arena(|arena| {
            arena.reset();
            arena.allocate(1024, 1).unwrap();
        })
        .unwrap();
        let other = std::thread::spawn(|| with_thread_arena(|arena| arena.total_used()).unwrap())
            .join()
            .unwrap();
        assert_eq!(other, 0);
    }
}
