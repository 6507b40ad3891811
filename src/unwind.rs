// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! A LIFO stack of cleanup closures, the Rust expression of the original
//! non-local "error context" exit mechanism: no `catch_unwind`, no
//! `panic!` -- ordinary `?`-propagated errors just unwind this stack by
//! hand on the way out, back down to a mark taken before the failed step.

/// One deferred cleanup action, run at most once.
type Cleanup = Box<dyn FnOnce() + Send>;

/// A LIFO stack of registered cleanups. Callers take a mark with [len],
/// push cleanups as they perform reversible steps, and on failure call
/// [unwind_to] with the mark to roll back only what was done since; on
/// success they call [pop_discard] (or simply let the mark go) instead.
///
/// [len]: UnwindStack::len
/// [unwind_to]: UnwindStack::unwind_to
/// [pop_discard]: UnwindStack::pop_discard
#[derive(Default)]
pub struct UnwindStack {
    cleanups: Vec<Cleanup>,
}

impl UnwindStack {
    /// Construct an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cleanup to run if the current operation aborts before
    /// it is popped.
    pub fn push_cleanup<F>(&mut self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cleanups.push(Box::new(cleanup));
    }

    /// Number of cleanups currently registered.
    pub fn len(&self) -> usize {
        self.cleanups.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.cleanups.is_empty()
    }

    /// Discard (without running) the most recently pushed cleanup -- used
    /// once an operation commits and no longer needs to be unwound.
    pub fn pop_discard(&mut self) -> bool {
        self.cleanups.pop().is_some()
    }

    /// Drain and run every registered cleanup, most recently pushed
    /// first.
    pub fn unwind_all(&mut self) {
        while let Some(cleanup) = self.cleanups.pop() {
            cleanup();
        }
    }

    /// Run cleanups back down to `mark` (as returned by a prior call to
    /// [UnwindStack::len]), most recently pushed first. Used to unwind
    /// only the cleanups registered during one nested operation.
    pub fn unwind_to(&mut self, mark: usize) {
        while self.cleanups.len() > mark {
            if let Some(cleanup) = self.cleanups.pop() {
                cleanup();
            }
        }
    }
}


// vim: foldmethod=marker
