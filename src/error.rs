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

//! The top-level error type every fallible engine operation returns.
//! Lower-level parse errors (control-record, version, dependency-clause)
//! keep their own small `Copy`/`Clone` enums and are wrapped in here via
//! `From` at the boundary where they cross into engine code.

use crate::{control, dependency, version};

/// Exhaustive top-level error kinds (§7).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A database file (`status`/`available`/`diversions`) did not parse.
    #[error("malformed database record in {path}: {source}")]
    DatabaseFormat {
        /// Path of the offending file.
        path: String,
        /// Underlying control-record parse error.
        #[source]
        source: control::Error,
    },

    /// An I/O error occurred reading or writing a database file.
    #[error("i/o error on database file {path}: {source}")]
    DatabaseIO {
        /// Path being read or written.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive byte stream did not conform to the tar format, or
    /// contained an entry type this engine does not understand.
    #[error("malformed archive entry: {0}")]
    ArchiveFormat(String),

    /// An I/O error occurred reading the archive pipe.
    #[error("i/o error reading archive: {0}")]
    ArchiveIO(#[source] std::io::Error),

    /// An I/O error occurred materializing or removing a filesystem
    /// object during unpack.
    #[error("i/o error on {path}: {source}")]
    FilesystemIO {
        /// Path being operated on.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A relationship clause could not be satisfied and no force flag
    /// downgraded the failure.
    #[error("dependency problems prevent {package} from being configured")]
    DependencyUnsatisfied {
        /// Package whose dependency went unsatisfied.
        package: String,
    },

    /// A conflict could not be resolved (§4.7) and no force flag
    /// downgraded the failure.
    #[error("{package} conflicts with {other}")]
    Conflict {
        /// Package being installed.
        package: String,
        /// Package it conflicts with.
        other: String,
    },

    /// Two packages both claim the same filesystem path and neither
    /// `Replaces` nor a force flag resolves it.
    #[error("{path} is claimed by both {package} and {other}")]
    FileConflict {
        /// Path in contention.
        path: String,
        /// Package being installed.
        package: String,
        /// Package that already claims the path.
        other: String,
    },

    /// The target package is held and no force flag overrides it.
    #[error("{package} is on hold")]
    Hold {
        /// Held package.
        package: String,
    },

    /// A maintainer-script hook returned [crate::maintainer::Outcome::Failed].
    #[error("maintainer script {hook} failed for {package}")]
    MaintainerScriptFailed {
        /// Package whose hook failed.
        package: String,
        /// Hook name (`preinst`, `postinst`, `prerm`, `postrm`).
        hook: &'static str,
    },

    /// Another process holds the exclusive lock on the admin directory.
    #[error("administration directory is locked by another process")]
    Locked,

    /// A bug, or a state the engine could not have reached through any
    /// documented transition.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<(String, control::Error)> for Error {
    fn from((path, source): (String, control::Error)) -> Self {
        Error::DatabaseFormat { path, source }
    }
}

impl From<version::Error> for Error {
    fn from(err: version::Error) -> Self {
        Error::Internal(format!("version parse error: {:?}", err))
    }
}

impl From<dependency::Error> for Error {
    fn from(err: dependency::Error) -> Self {
        Error::Internal(format!("dependency parse error: {:?}", err))
    }
}

/// The process-exit category an embedding `main()` should map to an exit
/// code (§6): argument parsing and the exit call itself stay outside this
/// crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitCategory {
    /// Exit code 0: the operation completed successfully.
    Success,
    /// Exit code 1: a user-visible error (parse failure, conflict,
    /// unsatisfied dependency, hold).
    UserError,
    /// Exit code 2: everything else (I/O failure, internal error, lock
    /// contention).
    InternalError,
}

impl ExitCategory {
    /// Compute the category for a given [Error].
    pub fn of(error: &Error) -> Self {
        match error {
            Error::DependencyUnsatisfied { .. }
            | Error::Conflict { .. }
            | Error::FileConflict { .. }
            | Error::Hold { .. }
            | Error::DatabaseFormat { .. }
            | Error::ArchiveFormat(_) => ExitCategory::UserError,
            _ => ExitCategory::InternalError,
        }
    }

    /// The conventional process exit code for this category.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitCategory::Success => 0,
            ExitCategory::UserError => 1,
            ExitCategory::InternalError => 2,
        }
    }
}


// vim: foldmethod=marker
