//! Recursion-depth accounting and the parse-context stack.

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::ParseContext;

/// Why a nesting level could not be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overflow {
    /// The counted level limit was reached.
    Depth,
    /// The parse has used more stack than its budget allows.
    Stack,
}

/// Shared depth counter handed out as [`DepthGuard`]s.
///
/// Besides counting levels, the tracker remembers where the stack was when
/// it was created and refuses new levels once the parse has moved more than
/// `stack_budget` bytes away from that point. A budget of zero turns the
/// stack check off.
#[derive(Debug, Clone)]
pub(crate) struct DepthTracker {
    depth: Rc<Cell<usize>>,
    deepest: Rc<Cell<usize>>,
    limit: usize,
    stack_base: usize,
    stack_budget: usize,
}

impl DepthTracker {
    pub(crate) fn new(limit: usize, stack_budget: usize) -> Self {
        Self {
            depth: Rc::new(Cell::new(0)),
            deepest: Rc::new(Cell::new(0)),
            limit,
            stack_base: stack_position(),
            stack_budget,
        }
    }

    /// Enters one nesting level.
    pub(crate) fn enter(&self) -> Result<DepthGuard, Overflow> {
        let depth = self.depth.get();
        if depth >= self.limit {
            return Err(Overflow::Depth);
        }
        if self.stack_budget > 0 && self.stack_used() > self.stack_budget {
            return Err(Overflow::Stack);
        }
        self.depth.set(depth + 1);
        self.deepest.set(self.deepest.get().max(depth + 1));
        Ok(DepthGuard {
            depth: Rc::clone(&self.depth),
        })
    }

    pub(crate) fn current(&self) -> usize {
        self.depth.get()
    }

    /// Highest depth entered so far.
    pub(crate) fn deepest(&self) -> usize {
        self.deepest.get()
    }

    pub(crate) const fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) const fn stack_budget(&self) -> usize {
        self.stack_budget
    }

    /// Bytes of stack between the tracker's creation and the caller.
    pub(crate) fn stack_used(&self) -> usize {
        stack_position().abs_diff(self.stack_base)
    }
}

/// Address of a slot in the current stack frame. Only differences between
/// two calls on the same thread are meaningful.
#[inline(never)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(core::ptr::addr_of!(marker)) as usize
}

/// Leaves its nesting level when dropped.
#[derive(Debug)]
pub(crate) struct DepthGuard {
    depth: Rc<Cell<usize>>,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Stack of the productions currently being parsed.
#[derive(Debug, Default)]
pub(crate) struct ContextStack {
    stack: Vec<ParseContext>,
}

impl ContextStack {
    pub(crate) fn push(&mut self, context: ParseContext) {
        self.stack.push(context);
    }

    pub(crate) fn pop(&mut self) -> Option<ParseContext> {
        self.stack.pop()
    }

    pub(crate) fn top(&self) -> Option<ParseContext> {
        self.stack.last().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.stack.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_release_on_drop() {
        let tracker = DepthTracker::new(2, 0);
        {
            let _a = tracker.enter().unwrap();
            let _b = tracker.enter().unwrap();
            assert_eq!(tracker.current(), 2);
            assert_eq!(tracker.enter().unwrap_err(), Overflow::Depth);
        }
        assert_eq!(tracker.current(), 0);
        assert_eq!(tracker.deepest(), 2);
        assert!(tracker.enter().is_ok());
    }

    #[test]
    fn test_guards_release_on_early_return() {
        fn nested(tracker: &DepthTracker, remaining: usize) -> Result<(), ()> {
            let _guard = tracker.enter().map_err(|_| ())?;
            if remaining == 0 {
                return Err(());
            }
            nested(tracker, remaining - 1)
        }

        let tracker = DepthTracker::new(10, 0);
        assert!(nested(&tracker, 5).is_err());
        assert_eq!(tracker.current(), 0);
        assert!(nested(&tracker, 20).is_err());
        assert_eq!(tracker.current(), 0);
        assert_eq!(tracker.deepest(), 10);
    }

    #[test]
    fn test_stack_budget_stops_recursion() {
        fn nested(tracker: &DepthTracker) -> Result<usize, Overflow> {
            let _guard = tracker.enter()?;
            let padding = std::hint::black_box([0u8; 512]);
            nested(tracker).map(|n| n + usize::from(padding[0]) + 1)
        }

        let tracker = DepthTracker::new(usize::MAX, 64 * 1024);
        assert_eq!(nested(&tracker), Err(Overflow::Stack));
        assert_eq!(tracker.current(), 0);
        assert!(tracker.deepest() > 1);
        assert!(tracker.deepest() < 64 * 1024 / 512 + 1);
    }

    #[test]
    fn test_context_stack() {
        let mut contexts = ContextStack::default();
        assert_eq!(contexts.top(), None);
        contexts.push(ParseContext::SelectList);
        contexts.push(ParseContext::FunctionArg);
        assert_eq!(contexts.top(), Some(ParseContext::FunctionArg));
        assert_eq!(contexts.pop(), Some(ParseContext::FunctionArg));
        contexts.push(ParseContext::Subquery);
        contexts.truncate(1);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts.top(), Some(ParseContext::SelectList));
    }
}
