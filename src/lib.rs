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

#![deny(missing_docs)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! `dpkg-engine` is the core of a Debian-style binary package manager:
//! the parts that decide what a package install or removal does to a
//! system, independent of a front-end, a network fetcher, or an OpenPGP
//! signature checker.
//!
//! Given an already-fetched, already-verified package archive and a
//! byte stream for its filesystem payload, this crate parses its
//! control metadata ([control]), resolves its relationships against the
//! installed set ([resolver]), unpacks its files under a crash-safe
//! three-name protocol ([unpack]), and drives the maintainer-script
//! state machine ([queue]) that takes it from unpacked to configured
//! (or from installed back down to purged). [database] is the
//! in-memory package directory these modules operate on, and [engine]
//! bundles it with the supporting state -- the file namespace, the
//! unwind stack, configuration -- that would otherwise be ambient
//! global state.
//!
//! This crate does not fetch archives over the network, verify OpenPGP
//! signatures, or spawn maintainer-script subprocesses itself -- those
//! are left to an embedding front-end, reached through the
//! [maintainer::ScriptRunner] seam for scripts and plain I/O for
//! everything else.
//!
//! # Feature flags
//!
//! | Flag          | Description                                                      |
//! | ------------- | ------------------------------------------------------------------ |
//! | `full`        | Enable all optional features.                                      |
//! | `chrono`      | Timestamp parsing via [chrono] where the control format allows it.  |
//! | `serde`       | `Serialize`/`Deserialize` impls on the data model types.            |
//! | `toml-config` | Load [config::EngineConfig] overrides from a TOML file.             |

pub mod archive;
pub mod buffer;
pub mod config;
pub mod control;
pub mod database;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod maintainer;
pub mod namespace;
pub mod package;
pub mod queue;
pub mod resolver;
pub mod unpack;
pub mod unwind;
pub mod version;

pub(crate) mod errors;

pub use error::Error;

// vim: foldmethod=marker
