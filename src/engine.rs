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

//! Bundles the database, file namespace, unwind stack and configuration
//! that would otherwise be ambient globals (§5). Passed by mutable
//! reference through the call tree, so the engine is unit-testable
//! without a process-wide fixture.

use crate::config::EngineConfig;
use crate::database::PackageDatabase;
use crate::namespace::FileNamespace;
use crate::unwind::UnwindStack;
use nix::fcntl::{flock, FlockArg};
use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;
use tracing::{info, warn};

/// Everything one mutating operation needs, bundled so it can be passed
/// by `&mut` instead of read from global state.
pub struct Engine {
    /// The package directory.
    pub database: PackageDatabase,
    /// The interned filesystem namespace and diversion table.
    pub namespace: FileNamespace,
    /// Rollback stack for the operation in progress.
    pub unwind: UnwindStack,
    /// Layered configuration (roots, force flags, policy).
    pub config: EngineConfig,
    lock_file: Option<std::fs::File>,
}

impl Engine {
    /// Construct an engine with an empty database and namespace. Callers
    /// still need to [Engine::load] the on-disk state and
    /// [Engine::acquire_lock] before mutating anything.
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            database: PackageDatabase::new(),
            namespace: FileNamespace::new(),
            unwind: UnwindStack::new(),
            config,
            lock_file: None,
        }
    }

    /// Load `status` and `available` from the admin directory into the
    /// database.
    pub fn load(&mut self) -> Result<(), crate::error::Error> {
        use crate::control::record::DecodeMode;
        use crate::package::SnapshotKind;

        let status_path = self.config.admin_dir.join("status");
        if status_path.exists() {
            self.database
                .load(&status_path, SnapshotKind::Installed, DecodeMode::WarningsOnly)?;
        }
        let available_path = self.config.admin_dir.join("available");
        if available_path.exists() {
            self.database
                .load(&available_path, SnapshotKind::Available, DecodeMode::WarningsOnly)?;
        }
        Ok(())
    }

    /// Dump `status` and `available` back to the admin directory via the
    /// crash-safe protocol.
    pub fn dump(&self) -> Result<(), crate::error::Error> {
        use crate::package::SnapshotKind;

        self.database.dump(
            &self.config.admin_dir.join("status"),
            SnapshotKind::Installed,
            self.config.fsync_required,
        )?;
        self.database.dump(
            &self.config.admin_dir.join("available"),
            SnapshotKind::Available,
            self.config.fsync_required,
        )?;
        Ok(())
    }

    /// Acquire the exclusive advisory lock on `<admin-dir>/fs.lock` for
    /// the duration of a mutating operation (§5). Non-blocking: a
    /// concurrent holder is reported as [crate::error::Error::Locked]
    /// rather than waited on.
    pub fn acquire_lock(&mut self) -> Result<(), crate::error::Error> {
        std::fs::create_dir_all(&self.config.admin_dir).map_err(|source| {
            crate::error::Error::DatabaseIO {
                path: self.config.admin_dir.display().to_string(),
                source,
            }
        })?;
        let lock_path = self.config.admin_dir.join("fs.lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|source| crate::error::Error::DatabaseIO {
                path: lock_path.display().to_string(),
                source,
            })?;
        flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock).map_err(|_| {
            warn!(path = %lock_path.display(), "admin directory already locked");
            crate::error::Error::Locked
        })?;
        info!(path = %lock_path.display(), "acquired admin directory lock");
        self.lock_file = Some(file);
        Ok(())
    }

    /// Release the lock taken by [Engine::acquire_lock], if held.
    /// Dropping the engine (or the held file) without calling this
    /// releases it too -- `flock` locks don't outlive the descriptor --
    /// but an explicit release lets a long-lived `Engine` run more than
    /// one locked operation.
    pub fn release_lock(&mut self) {
        self.lock_file = None;
    }

    /// Whether this engine currently holds the admin directory lock.
    pub fn is_locked(&self) -> bool {
        self.lock_file.is_some()
    }

    /// Drive the action queue (§4.8) for `targets`, already unpacked
    /// onto disk by the caller via [crate::unpack::unpack_entry], then
    /// dump the resulting database state. This is the top-level
    /// entrypoint an embedding front-end calls once it has fed every
    /// archive entry through the unpack engine.
    pub fn run_queue(
        &mut self,
        targets: &[String],
        scripts: &mut dyn crate::maintainer::ScriptRunner,
    ) -> Result<Vec<(String, crate::error::Error)>, crate::error::Error> {
        let failures = crate::queue::run_queue(&mut self.database, targets, scripts);
        self.dump()?;
        Ok(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_then_release_allows_reacquire() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            admin_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config);
        engine.acquire_lock().unwrap();
        assert!(engine.is_locked());
        engine.release_lock();
        assert!(!engine.is_locked());
        engine.acquire_lock().unwrap();
        assert!(engine.is_locked());
    }

    #[test]
    fn concurrent_lock_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            admin_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        };
        let mut first = Engine::new(config.clone());
        first.acquire_lock().unwrap();

        let mut second = Engine::new(config);
        assert!(matches!(second.acquire_lock(), Err(crate::error::Error::Locked)));
    }

    #[test]
    fn load_with_no_files_leaves_database_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            admin_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config);
        engine.load().unwrap();
        assert!(engine.database.is_empty());
    }

    #[test]
    fn run_queue_installs_target_and_persists_status() {
        use crate::maintainer::NoScripts;

        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            admin_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config);
        {
            let pkg = engine.database.find_or_create("foo");
            pkg.want = crate::package::Want::Install;
            pkg.available.version = Some("1.0".parse().unwrap());
        }

        let failures = engine
            .run_queue(&["foo".to_owned()], &mut NoScripts)
            .unwrap();
        assert!(failures.is_empty());
        assert_eq!(
            crate::package::Status::Installed,
            engine.database.get("foo").unwrap().status
        );

        let status_text = std::fs::read_to_string(dir.path().join("status")).unwrap();
        assert!(status_text.contains("Package: foo"));
        assert!(status_text.contains("Status: install ok installed"));
    }
}

// vim: foldmethod=marker
