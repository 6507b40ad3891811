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

//! The per-package status transition table (§4.8): unpack, configure,
//! remove and purge, each driving [ScriptRunner] hooks and leaving the
//! package in the status the hook outcome demands. This module only
//! updates [Package::status]/[EFlags]; it does not touch the filesystem
//! (that's [crate::unpack]) or the database (that's [crate::database]).
//!
//! [run_queue] is the action queue itself: it sequences the per-package
//! transitions above across a whole operation -- unpacking the given
//! targets in order, then repeatedly configuring whatever has become
//! configurable, then cascading the removals and deconfigurations the
//! resolver scheduled via [Package::istobe].

use crate::database::PackageDatabase;
use crate::dependency::RelationKind;
use crate::maintainer::{HookContext, Outcome, ScriptRunner};
use crate::package::{IsToBe, Package, Status};
use crate::resolver::clause_satisfied;
use tracing::{info, warn};

fn ctx_for(pkg: &Package) -> HookContext {
    HookContext {
        package: pkg.name.clone(),
        version: pkg.available.version.as_ref().map(|v| v.to_string()),
    }
}

/// Run `preinst` and move the package from `not-installed`/`config-files`
/// into `unpacked`, on the assumption the caller has already placed the
/// package's files on disk (or is about to -- `preinst` traditionally
/// runs before unpack, but this module doesn't sequence that; the engine
/// does).
///
/// `preinst` failing leaves the package `half-installed` with
/// `reinstreq` set: dpkg refuses to do anything further with it except
/// remove or reinstall.
pub fn unpack(pkg: &mut Package, scripts: &mut dyn ScriptRunner) -> Result<(), crate::error::Error> {
    if !matches!(pkg.status, Status::NotInstalled | Status::ConfigFiles) {
        return Err(crate::error::Error::Internal(format!(
            "unpack called on package {} in status {:?}",
            pkg.name, pkg.status
        )));
    }

    let ctx = ctx_for(pkg);
    match scripts.preinst(&ctx) {
        Outcome::Success | Outcome::NotPresent => {
            // The archive is on disk by the time this runs (the engine
            // calls this after `unpack::unpack_entry` for every entry),
            // so what was merely `available` is now what's installed.
            pkg.installed = pkg.available.clone();
            pkg.status = Status::Unpacked;
            pkg.eflag.reinstreq = false;
            pkg.configversion = pkg.available.version.clone();
            info!(package = %pkg.name, "unpacked");
            Ok(())
        }
        Outcome::Failed => {
            pkg.status = Status::HalfInstalled;
            pkg.eflag.reinstreq = true;
            warn!(package = %pkg.name, "preinst failed");
            Err(crate::error::Error::MaintainerScriptFailed {
                package: pkg.name.clone(),
                hook: "preinst",
            })
        }
    }
}

/// Run `postinst configure` and move `unpacked`/`half-configured` into
/// `installed`. A failure leaves the package `half-configured`, without
/// `reinstreq` (unlike a failed `preinst`, a failed `postinst` can
/// usually be retried by re-running configure, not just by reinstalling).
pub fn configure(pkg: &mut Package, scripts: &mut dyn ScriptRunner) -> Result<(), crate::error::Error> {
    if !matches!(pkg.status, Status::Unpacked | Status::HalfConfigured) {
        return Err(crate::error::Error::Internal(format!(
            "configure called on package {} in status {:?}",
            pkg.name, pkg.status
        )));
    }

    let ctx = ctx_for(pkg);
    match scripts.postinst(&ctx) {
        Outcome::Success | Outcome::NotPresent => {
            pkg.status = Status::Installed;
            pkg.configversion = None;
            info!(package = %pkg.name, "configured");
            Ok(())
        }
        Outcome::Failed => {
            pkg.status = Status::HalfConfigured;
            warn!(package = %pkg.name, "postinst failed");
            Err(crate::error::Error::MaintainerScriptFailed {
                package: pkg.name.clone(),
                hook: "postinst",
            })
        }
    }
}

/// Run `prerm remove` and move `installed`/`unpacked`/`half-configured`
/// into `config-files`, on the assumption the caller removes the
/// package's non-conffile content around this call.
pub fn remove(pkg: &mut Package, scripts: &mut dyn ScriptRunner) -> Result<(), crate::error::Error> {
    if !matches!(
        pkg.status,
        Status::Installed | Status::Unpacked | Status::HalfConfigured | Status::HalfInstalled
    ) {
        return Err(crate::error::Error::Internal(format!(
            "remove called on package {} in status {:?}",
            pkg.name, pkg.status
        )));
    }

    let ctx = ctx_for(pkg);
    let prerm_ok = scripts.prerm(&ctx).is_success();
    if !prerm_ok {
        warn!(package = %pkg.name, "prerm failed, leaving package half-installed");
        pkg.status = Status::HalfInstalled;
        return Err(crate::error::Error::MaintainerScriptFailed {
            package: pkg.name.clone(),
            hook: "prerm",
        });
    }

    match scripts.postrm(&ctx) {
        Outcome::Success | Outcome::NotPresent => {
            pkg.status = Status::ConfigFiles;
            pkg.configversion = None;
            info!(package = %pkg.name, "removed, conffiles retained");
            Ok(())
        }
        Outcome::Failed => {
            pkg.status = Status::HalfInstalled;
            warn!(package = %pkg.name, "postrm remove failed");
            Err(crate::error::Error::MaintainerScriptFailed {
                package: pkg.name.clone(),
                hook: "postrm",
            })
        }
    }
}

/// Run `postrm purge` and move `config-files` into `not-installed`, on
/// the assumption the caller has already deleted the package's
/// conffiles.
pub fn purge(pkg: &mut Package, scripts: &mut dyn ScriptRunner) -> Result<(), crate::error::Error> {
    if pkg.status != Status::ConfigFiles {
        return Err(crate::error::Error::Internal(format!(
            "purge called on package {} in status {:?}",
            pkg.name, pkg.status
        )));
    }

    let ctx = ctx_for(pkg);
    match scripts.postrm(&ctx) {
        Outcome::Success | Outcome::NotPresent => {
            pkg.status = Status::NotInstalled;
            pkg.installed = Default::default();
            info!(package = %pkg.name, "purged");
            Ok(())
        }
        Outcome::Failed => {
            warn!(package = %pkg.name, "postrm purge failed");
            Err(crate::error::Error::MaintainerScriptFailed {
                package: pkg.name.clone(),
                hook: "postrm",
            })
        }
    }
}

/// Auto-deconfigure an installed package whose dependency on a
/// conflict's removal target no longer holds (§4.7 step 4). Unlike
/// [remove], the package's files stay on disk -- it is simply no longer
/// considered configured, and a later `configure` pass can bring it back
/// to `installed` once its dependencies are satisfied again.
pub fn deconfigure(pkg: &mut Package, scripts: &mut dyn ScriptRunner) -> Result<(), crate::error::Error> {
    if pkg.status != Status::Installed {
        return Err(crate::error::Error::Internal(format!(
            "deconfigure called on package {} in status {:?}",
            pkg.name, pkg.status
        )));
    }

    let ctx = ctx_for(pkg);
    // A failed prerm(deconfigure) is not treated as fatal to the whole
    // operation -- the package still ends up half-configured either
    // way, which is the state auto-deconfigure exists to produce.
    if !scripts.prerm(&ctx).is_success() {
        warn!(package = %pkg.name, "prerm deconfigure failed, proceeding anyway");
    }
    pkg.status = Status::HalfConfigured;
    pkg.configversion = pkg.installed.version.clone();
    info!(package = %pkg.name, "deconfigured");
    Ok(())
}

/// Whether every `Depends`/`Pre-Depends` possibility on `pkg`'s
/// installed snapshot is satisfied against the rest of `db` (the
/// gate `run_queue` uses to decide when an unpacked package may be
/// configured).
fn dependencies_satisfied(pkg: &Package, db: &PackageDatabase) -> bool {
    [RelationKind::Depends, RelationKind::PreDepends]
        .into_iter()
        .flat_map(|kind| pkg.installed.relationships_of(kind))
        .all(|clause| clause_satisfied(clause, db))
}

/// Drive the action queue for one operation (§4.8, second paragraph):
///
/// 1. Unpack `targets`, in the order given.
/// 2. Repeatedly scan for `unpacked` packages whose dependencies are now
///    satisfied and configure them, until a pass makes no progress.
/// 3. Cascade the removals and deconfigurations the resolver scheduled
///    via [Package::istobe] while resolving conflicts for this
///    operation.
///
/// Returns the per-package failures encountered along the way; the
/// caller decides whether that means aborting the whole operation or
/// just reporting them, per the configured
/// [crate::config::AbortAfterPolicy].
pub fn run_queue(
    db: &mut PackageDatabase,
    targets: &[String],
    scripts: &mut dyn ScriptRunner,
) -> Vec<(String, crate::error::Error)> {
    let mut failures = Vec::new();

    for name in targets {
        let Some(pkg) = db.get_mut(name) else {
            continue;
        };
        if let Err(e) = unpack(pkg, scripts) {
            failures.push((name.clone(), e));
        }
    }

    loop {
        let ready: Vec<String> = db
            .iterate()
            .filter(|pkg| pkg.status == Status::Unpacked)
            .filter(|pkg| dependencies_satisfied(pkg, db))
            .map(|pkg| pkg.name.clone())
            .collect();
        if ready.is_empty() {
            break;
        }
        for name in &ready {
            if let Some(pkg) = db.get_mut(name) {
                if let Err(e) = configure(pkg, scripts) {
                    failures.push((name.clone(), e));
                }
            }
        }
    }

    let to_remove: Vec<String> = db
        .iterate()
        .filter(|pkg| pkg.istobe == IsToBe::Remove)
        .map(|pkg| pkg.name.clone())
        .collect();
    for name in to_remove {
        if let Some(pkg) = db.get_mut(&name) {
            if matches!(
                pkg.status,
                Status::Installed | Status::Unpacked | Status::HalfConfigured | Status::HalfInstalled
            ) {
                if let Err(e) = remove(pkg, scripts) {
                    failures.push((name.clone(), e));
                }
            }
            pkg.istobe = IsToBe::Normal;
        }
    }

    let to_deconfigure: Vec<String> = db
        .iterate()
        .filter(|pkg| pkg.istobe == IsToBe::Deconfigure)
        .map(|pkg| pkg.name.clone())
        .collect();
    for name in to_deconfigure {
        if let Some(pkg) = db.get_mut(&name) {
            if pkg.status == Status::Installed {
                if let Err(e) = deconfigure(pkg, scripts) {
                    failures.push((name.clone(), e));
                }
            }
            pkg.istobe = IsToBe::Normal;
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maintainer::NoScripts;

    fn pkg_in(status: Status) -> Package {
        let mut pkg = Package::new("foo").unwrap();
        pkg.status = status;
        pkg
    }

    #[test]
    fn unpack_moves_not_installed_to_unpacked() {
        let mut pkg = pkg_in(Status::NotInstalled);
        unpack(&mut pkg, &mut NoScripts).unwrap();
        assert_eq!(Status::Unpacked, pkg.status);
    }

    #[test]
    fn configure_moves_unpacked_to_installed() {
        let mut pkg = pkg_in(Status::Unpacked);
        configure(&mut pkg, &mut NoScripts).unwrap();
        assert_eq!(Status::Installed, pkg.status);
    }

    #[test]
    fn remove_moves_installed_to_config_files() {
        let mut pkg = pkg_in(Status::Installed);
        remove(&mut pkg, &mut NoScripts).unwrap();
        assert_eq!(Status::ConfigFiles, pkg.status);
    }

    #[test]
    fn purge_moves_config_files_to_not_installed() {
        let mut pkg = pkg_in(Status::ConfigFiles);
        purge(&mut pkg, &mut NoScripts).unwrap();
        assert_eq!(Status::NotInstalled, pkg.status);
    }

    #[test]
    fn failed_preinst_sets_reinstreq() {
        struct FailPreinst;
        impl ScriptRunner for FailPreinst {
            fn preinst(&mut self, _ctx: &HookContext) -> Outcome {
                Outcome::Failed
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
        let mut pkg = pkg_in(Status::NotInstalled);
        assert!(unpack(&mut pkg, &mut FailPreinst).is_err());
        assert_eq!(Status::HalfInstalled, pkg.status);
        assert!(pkg.eflag.reinstreq);
    }

    #[test]
    fn wrong_status_is_internal_error() {
        let mut pkg = pkg_in(Status::Installed);
        assert!(unpack(&mut pkg, &mut NoScripts).is_err());
    }

    #[test]
    fn unpack_copies_available_into_installed() {
        let mut pkg = pkg_in(Status::NotInstalled);
        pkg.available.version = Some("2.0".parse().unwrap());
        unpack(&mut pkg, &mut NoScripts).unwrap();
        assert_eq!(pkg.available.version, pkg.installed.version);
    }

    #[test]
    fn deconfigure_moves_installed_to_half_configured() {
        let mut pkg = pkg_in(Status::Installed);
        deconfigure(&mut pkg, &mut NoScripts).unwrap();
        assert_eq!(Status::HalfConfigured, pkg.status);
    }

    #[test]
    fn run_queue_unpacks_and_configures_independent_targets() {
        let mut db = PackageDatabase::new();
        {
            let pkg = db.find_or_create("foo");
            pkg.status = Status::NotInstalled;
            pkg.available.version = Some("1.0".parse().unwrap());
        }
        let failures = run_queue(&mut db, &["foo".to_owned()], &mut NoScripts);
        assert!(failures.is_empty());
        assert_eq!(Status::Installed, db.get("foo").unwrap().status);
    }

    #[test]
    fn run_queue_defers_configure_until_dependency_unpacks() {
        use crate::dependency::{Possibility, Relationship};

        let mut db = PackageDatabase::new();
        {
            let pkg = db.find_or_create("dependent");
            pkg.status = Status::NotInstalled;
            pkg.available.version = Some("1.0".parse().unwrap());
            pkg.available.relationships.push(Relationship {
                kind: RelationKind::Depends,
                possibilities: vec![Possibility {
                    target: "base".into(),
                    version_constraint: None,
                }],
            });
        }
        {
            let pkg = db.find_or_create("base");
            pkg.status = Status::NotInstalled;
            pkg.available.version = Some("1.0".parse().unwrap());
        }

        // Unpack both targets in an order where the dependent comes
        // first; configure must still wait for `base` before
        // configuring `dependent`, but both converge to `installed`.
        let failures = run_queue(
            &mut db,
            &["dependent".to_owned(), "base".to_owned()],
            &mut NoScripts,
        );
        assert!(failures.is_empty());
        assert_eq!(Status::Installed, db.get("dependent").unwrap().status);
        assert_eq!(Status::Installed, db.get("base").unwrap().status);
    }

    #[test]
    fn run_queue_cascades_scheduled_removal() {
        let mut db = PackageDatabase::new();
        {
            let pkg = db.find_or_create("old");
            pkg.status = Status::Installed;
            pkg.want = crate::package::Want::Install;
            pkg.installed.version = Some("1.0".parse().unwrap());
            pkg.istobe = IsToBe::Remove;
        }
        let failures = run_queue(&mut db, &[], &mut NoScripts);
        assert!(failures.is_empty());
        assert_eq!(Status::ConfigFiles, db.get("old").unwrap().status);
        assert_eq!(IsToBe::Normal, db.get("old").unwrap().istobe);
    }

    #[test]
    fn run_queue_cascades_scheduled_deconfigure() {
        let mut db = PackageDatabase::new();
        {
            let pkg = db.find_or_create("dependent");
            pkg.status = Status::Installed;
            pkg.istobe = IsToBe::Deconfigure;
        }
        let failures = run_queue(&mut db, &[], &mut NoScripts);
        assert!(failures.is_empty());
        assert_eq!(Status::HalfConfigured, db.get("dependent").unwrap().status);
        assert_eq!(IsToBe::Normal, db.get("dependent").unwrap().istobe);
    }
}

// vim: foldmethod=marker
