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

//! Interned canonical-path nodes, the diversion table, and the query that
//! redirects a write destined for a diverted path.

use std::collections::HashMap;

/// Per-path flags set by the unpack engine as it materializes an entry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// This path was newly created by the archive currently being
    /// unpacked (as opposed to merely being touched).
    pub new_in_archive: bool,
    /// This path is a conffile not yet committed -- configure-time logic
    /// still needs to install it.
    pub new_conffile: bool,
    /// The owning-package list for this path is stale and will be
    /// rewritten once the current operation completes.
    pub elide_other_lists: bool,
    /// The live object could not be replaced atomically (it, or its
    /// replacement, is a directory).
    pub no_atomic_overwrite: bool,
}

/// A persistent redirect: a write destined for `came_from` lands on
/// `use_instead` instead, unless the writer is `owner`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diversion {
    /// Canonical path the diversion intercepts.
    pub came_from: String,
    /// Canonical path the diversion redirects to.
    pub use_instead: String,
    /// Package that owns this diversion, if any (an unowned diversion is
    /// typically a local administrator divert).
    pub owner: Option<String>,
}

/// One interned path. Shared by every package that claims it; owned by
/// the [FileNamespace].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileNode {
    /// Canonical path this node represents.
    pub path: String,
    /// Flags set by the unpack engine.
    pub flags: NodeFlags,
    /// Packages currently claiming this path.
    pub packages: Vec<String>,
}

impl FileNode {
    fn new(path: impl Into<String>) -> Self {
        FileNode {
            path: path.into(),
            flags: NodeFlags::default(),
            packages: Vec::new(),
        }
    }
}

/// Interned path nodes plus the diversion table that redirects writes to
/// some of them.
#[derive(Clone, Debug, Default)]
pub struct FileNamespace {
    nodes: HashMap<String, FileNode>,
    diversions: HashMap<String, Diversion>,
}

impl FileNamespace {
    /// Construct an empty [FileNamespace].
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up, or lazily create, the node for `path`'s canonical form.
    pub fn find_or_create(&mut self, path: &str) -> &mut FileNode {
        self.nodes
            .entry(path.to_owned())
            .or_insert_with(|| FileNode::new(path))
    }

    /// Look up an existing node without creating one.
    pub fn get(&self, path: &str) -> Option<&FileNode> {
        self.nodes.get(path)
    }

    /// Record a diversion. Replaces any existing diversion at the same
    /// `came_from`.
    pub fn add_diversion(&mut self, diversion: Diversion) {
        self.diversions.insert(diversion.came_from.clone(), diversion);
    }

    /// Remove a previously recorded diversion.
    pub fn remove_diversion(&mut self, came_from: &str) -> Option<Diversion> {
        self.diversions.remove(came_from)
    }

    /// Look up the diversion (if any) affecting `path`.
    pub fn diversion_for(&self, path: &str) -> Option<&Diversion> {
        self.diversions.get(path)
    }

    /// The placement path a write to `path` by `acting_package` should
    /// actually land on: `use_instead` if a diversion exists and the
    /// writer is not its owner, else `path` itself unchanged.
    pub fn use_target(&self, path: &str, acting_package: &str) -> String {
        match self.diversions.get(path) {
            Some(diversion) if diversion.owner.as_deref() != Some(acting_package) => {
                diversion.use_instead.clone()
            }
            _ => path.to_owned(),
        }
    }
}


// vim: foldmethod=marker
