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

//! The seam to the maintainer-script executor, which lives outside this
//! crate. The engine only ever calls through [ScriptRunner]; it never
//! spawns a subprocess itself.

/// What running a hook produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The script ran and exited zero.
    Success,
    /// The script ran and exited nonzero.
    Failed,
    /// No script of this name exists for the package; treated as an
    /// immediate success by the state machine.
    NotPresent,
}

impl Outcome {
    /// Whether the state machine should treat this as a successful hook
    /// invocation.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::NotPresent)
    }
}

/// Context passed to every hook, naming which package and operation
/// triggered it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookContext {
    /// Package the hook belongs to.
    pub package: String,
    /// Version being installed or removed, when known.
    pub version: Option<String>,
}

/// The four hook points named in the state machine (§4.8). An embedding
/// application implements this to actually run `preinst`/`postinst`/
/// `prerm`/`postrm` scripts; [NoScripts] is provided for embeddings (such
/// as tests) with nothing to run.
pub trait ScriptRunner {
    /// Run `preinst install` (or `preinst upgrade` when upgrading).
    fn preinst(&mut self, ctx: &HookContext) -> Outcome;

    /// Run `postinst configure <old-version>`.
    fn postinst(&mut self, ctx: &HookContext) -> Outcome;

    /// Run `prerm remove`.
    fn prerm(&mut self, ctx: &HookContext) -> Outcome;

    /// Run `postrm remove` or `postrm purge`, depending on the operation.
    fn postrm(&mut self, ctx: &HookContext) -> Outcome;
}

/// A [ScriptRunner] that treats every hook as [Outcome::NotPresent]. Used
/// by tests and by any embedding with no maintainer scripts to run.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoScripts;

impl ScriptRunner for NoScripts {
    fn preinst(&mut self, _ctx: &HookContext) -> Outcome {
        Outcome::NotPresent
    }

    fn postinst(&mut self, _ctx: &HookContext) -> Outcome {
        Outcome::NotPresent
    }

    fn prerm(&mut self, _ctx: &HookContext) -> Outcome {
        Outcome::NotPresent
    }

    fn postrm(&mut self, _ctx: &HookContext) -> Outcome {
        Outcome::NotPresent
    }
}


// vim: foldmethod=marker
