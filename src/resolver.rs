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

//! Evaluates relationship clauses against the database, and implements
//! the conflict-resolution decision procedure (§4.7).

use crate::config::ForceFlags;
use crate::database::PackageDatabase;
use crate::dependency::{RelationKind, Relationship};
use crate::package::{IsToBe, Package, Status, Want};
use tracing::{info, warn};

/// Whether a single [Relationship] clause is currently satisfied.
///
/// A possibility matches when either its target's installed snapshot
/// carries a version meeting the operator, or some package declares
/// `Provides: target` in its installed snapshot and the possibility
/// carries no version constraint (versioned matches against provided
/// virtuals are rejected).
pub fn clause_satisfied(clause: &Relationship, db: &PackageDatabase) -> bool {
    clause.possibilities.iter().any(|possibility| {
        if let Some(target) = db.get(&possibility.target) {
            if let Some(installed_version) = &target.installed.version {
                let matches = match &possibility.version_constraint {
                    Some(constraint) => {
                        constraint.operator.satisfied_by(installed_version, &constraint.version)
                    }
                    None => true,
                };
                if matches {
                    return true;
                }
            }
        }

        if possibility.version_constraint.is_some() {
            return false;
        }

        db.iterate().any(|pkg| {
            pkg.installed
                .relationships_of(RelationKind::Provides)
                .any(|provides| provides.possibilities.iter().any(|p| p.target == possibility.target))
        })
    })
}

/// Outcome of [check_conflict] for one unsatisfied `Conflicts`
/// possibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConflictResolution {
    /// No conflicting package is actually installed; nothing to do.
    NoConflict,
    /// `fixbyrm` should be scheduled for removal.
    ScheduleRemoval {
        /// The package to remove.
        fixbyrm: String,
    },
    /// `fixbyrm`'s dependents must be deconfigured first.
    ScheduleDeconfigure {
        /// The package to remove.
        fixbyrm: String,
        /// Its dependents, which must be deconfigured first.
        dependents: Vec<String>,
    },
    /// The conflict cannot be resolved; the caller should either abort
    /// or, with the `conflicts` force flag, warn and continue.
    Refused {
        /// Why resolution was refused.
        reason: &'static str,
    },
}

/// Evaluate the decision procedure in §4.7 for one `Conflicts`
/// possibility naming `candidate`, where `acting_pkg` is the package
/// being installed.
pub fn check_conflict(
    acting_pkg: &Package,
    candidate: &str,
    db: &PackageDatabase,
    force: &ForceFlags,
) -> ConflictResolution {
    let Some(fixbyrm) = db.get(candidate) else {
        return ConflictResolution::NoConflict;
    };
    if fixbyrm.status == Status::NotInstalled {
        return ConflictResolution::NoConflict;
    }

    let acting_essential = acting_pkg.installed.essential || acting_pkg.available.essential;
    let fixbyrm_essential = fixbyrm.installed.essential || fixbyrm.available.essential;
    if fixbyrm_essential && !(acting_essential && fixbyrm_essential) && !force.remove_essential {
        warn!(package = %fixbyrm.name, "refusing to remove essential package");
        return ConflictResolution::Refused {
            reason: "essential package, no override",
        };
    }

    if fixbyrm.want == Want::Install {
        let replaces_satisfied = acting_pkg
            .available
            .relationships_of(RelationKind::Replaces)
            .any(|clause| clause_satisfied(clause, db));
        if !replaces_satisfied {
            return ConflictResolution::Refused {
                reason: "target wants install and no Replaces satisfies",
            };
        }
    }

    if fixbyrm.status != Status::Installed {
        return ConflictResolution::ScheduleRemoval {
            fixbyrm: fixbyrm.name.clone(),
        };
    }

    // §4.7 step 5: a reverse-dep may name either `fixbyrm` directly or
    // a virtual package it provides -- removing `fixbyrm` withdraws both.
    let withdrawn = names_withdrawn_with(fixbyrm);
    let mut still_broken = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for kind in [RelationKind::Depends, RelationKind::PreDepends] {
        for withdrawn_name in &withdrawn {
            for dependent_name in db.reverse_dependents(withdrawn_name, kind) {
                if !seen.insert((dependent_name.clone(), kind)) {
                    continue;
                }
                let Some(dependent) = db.get(&dependent_name) else {
                    continue;
                };
                let still_satisfied = dependent
                    .installed
                    .relationships_of(kind)
                    .filter(|clause| {
                        clause
                            .possibilities
                            .iter()
                            .any(|p| withdrawn.iter().any(|w| *w == p.target))
                    })
                    .all(|clause| clause_satisfied_excluding(clause, db, &fixbyrm.name));
                if !still_satisfied && !still_broken.contains(&dependent_name) {
                    still_broken.push(dependent_name);
                }
            }
        }
    }

    if !still_broken.is_empty() {
        return if fixbyrm_essential && !force.remove_essential {
            ConflictResolution::Refused {
                reason: "dependents of essential package would break",
            }
        } else {
            ConflictResolution::ScheduleDeconfigure {
                fixbyrm: fixbyrm.name.clone(),
                dependents: still_broken,
            }
        };
    }

    if fixbyrm.eflag.hold && !force.hold {
        return ConflictResolution::Refused {
            reason: "target is held, no override",
        };
    }
    if fixbyrm.eflag.reinstreq && !force.remove_reinstreq {
        return ConflictResolution::Refused {
            reason: "target requires reinstallation, no override",
        };
    }

    info!(fixbyrm = %fixbyrm.name, "conflict resolved by scheduling removal");
    ConflictResolution::ScheduleRemoval {
        fixbyrm: fixbyrm.name.clone(),
    }
}

/// [clause_satisfied], but treating `excluded` as notionally removed --
/// both as a direct target and as a `Provides` source (used for the
/// "re-check with fixbyrm removed" step in §4.7.4-5).
fn clause_satisfied_excluding(clause: &Relationship, db: &PackageDatabase, excluded: &str) -> bool {
    clause.possibilities.iter().any(|possibility| {
        if possibility.target != excluded {
            if let Some(target) = db.get(&possibility.target) {
                if let Some(installed_version) = &target.installed.version {
                    let matches = match &possibility.version_constraint {
                        Some(constraint) => {
                            constraint.operator.satisfied_by(installed_version, &constraint.version)
                        }
                        None => true,
                    };
                    if matches {
                        return true;
                    }
                }
            }
        }

        if possibility.version_constraint.is_some() {
            return false;
        }
        db.iterate().filter(|pkg| pkg.name != excluded).any(|pkg| {
            pkg.installed
                .relationships_of(RelationKind::Provides)
                .any(|provides| provides.possibilities.iter().any(|p| p.target == possibility.target))
        })
    })
}

/// The set of names whose removal notionally follows `fixbyrm`'s: its
/// own name plus every virtual package it `Provides` (§4.7 step 5).
fn names_withdrawn_with(fixbyrm: &Package) -> Vec<String> {
    let mut names = vec![fixbyrm.name.clone()];
    for clause in fixbyrm.installed.relationships_of(RelationKind::Provides) {
        for possibility in &clause.possibilities {
            names.push(possibility.target.clone());
        }
    }
    names
}

/// Apply a [ConflictResolution], marking the database accordingly. Pure
/// bookkeeping: the caller still has to materialize the removal/
/// deconfiguration via the action queue.
pub fn apply_resolution(db: &mut PackageDatabase, resolution: &ConflictResolution) {
    match resolution {
        ConflictResolution::ScheduleRemoval { fixbyrm } => {
            if let Some(pkg) = db.get_mut(fixbyrm) {
                pkg.istobe = IsToBe::Remove;
            }
        }
        ConflictResolution::ScheduleDeconfigure { fixbyrm, dependents } => {
            if let Some(pkg) = db.get_mut(fixbyrm) {
                pkg.istobe = IsToBe::Remove;
            }
            for dependent in dependents {
                if let Some(pkg) = db.get_mut(dependent) {
                    pkg.istobe = IsToBe::Deconfigure;
                }
            }
        }
        ConflictResolution::NoConflict | ConflictResolution::Refused { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Possibility;
    use crate::package::SnapshotKind;

    fn installed(db: &mut PackageDatabase, name: &str, version: &str) {
        let pkg = db.find_or_create(name);
        pkg.status = Status::Installed;
        pkg.want = Want::Install;
        pkg.installed.version = Some(version.parse().unwrap());
    }

    #[test]
    fn unversioned_clause_satisfied_by_exact_package() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "libc6", "2.35");
        let clause = Relationship {
            kind: RelationKind::Depends,
            possibilities: vec![Possibility {
                target: "libc6".into(),
                version_constraint: None,
            }],
        };
        assert!(clause_satisfied(&clause, &db));
    }

    #[test]
    fn versioned_clause_rejects_provides() {
        let mut db = PackageDatabase::new();
        let pkg = db.find_or_create("libc6-shim");
        pkg.status = Status::Installed;
        pkg.installed.relationships.push(Relationship {
            kind: RelationKind::Provides,
            possibilities: vec![Possibility {
                target: "libc6".into(),
                version_constraint: None,
            }],
        });
        let clause = Relationship {
            kind: RelationKind::Depends,
            possibilities: vec![Possibility {
                target: "libc6".into(),
                version_constraint: Some(crate::dependency::VersionConstraint {
                    operator: crate::dependency::VersionOperator::GreaterThanOrEqual,
                    version: "2.0".parse().unwrap(),
                }),
            }],
        };
        assert!(!clause_satisfied(&clause, &db));
    }

    #[test]
    fn conflict_with_not_installed_target_is_noop() {
        let db = PackageDatabase::new();
        let acting = Package::new("pa").unwrap();
        assert_eq!(
            ConflictResolution::NoConflict,
            check_conflict(&acting, "pb", &db, &ForceFlags::default())
        );
    }

    #[test]
    fn conflict_resolved_when_no_reverse_deps() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "pb", "1.0");
        let acting = Package::new("pa").unwrap();
        let resolution = check_conflict(&acting, "pb", &db, &ForceFlags::default());
        assert_eq!(ConflictResolution::ScheduleRemoval { fixbyrm: "pb".into() }, resolution);
    }

    #[test]
    fn essential_target_is_refused_without_override() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "pb", "1.0");
        db.get_mut("pb").unwrap().installed.essential = true;
        let acting = Package::new("pa").unwrap();
        let resolution = check_conflict(&acting, "pb", &db, &ForceFlags::default());
        assert!(matches!(resolution, ConflictResolution::Refused { .. }));
    }

    #[test]
    fn force_remove_essential_overrides_refusal() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "pb", "1.0");
        db.get_mut("pb").unwrap().installed.essential = true;
        let acting = Package::new("pa").unwrap();
        let mut force = ForceFlags::default();
        force.remove_essential = true;
        let resolution = check_conflict(&acting, "pb", &db, &force);
        assert_eq!(ConflictResolution::ScheduleRemoval { fixbyrm: "pb".into() }, resolution);
    }

    #[test]
    fn apply_resolution_marks_istobe() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "pb", "1.0");
        apply_resolution(
            &mut db,
            &ConflictResolution::ScheduleRemoval { fixbyrm: "pb".into() },
        );
        assert_eq!(IsToBe::Remove, db.get("pb").unwrap().istobe);
    }

    #[test]
    #[allow(unused)]
    fn snapshot_kind_is_used_in_other_modules() {
        let _ = SnapshotKind::Installed;
    }

    #[test]
    fn held_target_is_refused_without_override() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "pb", "1.0");
        db.get_mut("pb").unwrap().eflag.hold = true;
        let acting = Package::new("pa").unwrap();
        let resolution = check_conflict(&acting, "pb", &db, &ForceFlags::default());
        assert!(matches!(resolution, ConflictResolution::Refused { .. }));
    }

    #[test]
    fn force_hold_overrides_refusal() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "pb", "1.0");
        db.get_mut("pb").unwrap().eflag.hold = true;
        let acting = Package::new("pa").unwrap();
        let mut force = ForceFlags::default();
        force.hold = true;
        let resolution = check_conflict(&acting, "pb", &db, &force);
        assert_eq!(ConflictResolution::ScheduleRemoval { fixbyrm: "pb".into() }, resolution);
    }

    #[test]
    fn reinstreq_target_is_refused_without_override() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "pb", "1.0");
        db.get_mut("pb").unwrap().eflag.reinstreq = true;
        let acting = Package::new("pa").unwrap();
        let resolution = check_conflict(&acting, "pb", &db, &ForceFlags::default());
        assert!(matches!(resolution, ConflictResolution::Refused { .. }));
    }

    #[test]
    fn reverse_dep_on_provided_virtual_triggers_deconfigure() {
        let mut db = PackageDatabase::new();
        installed(&mut db, "pb", "1.0");
        db.get_mut("pb").unwrap().installed.relationships.push(Relationship {
            kind: RelationKind::Provides,
            possibilities: vec![Possibility {
                target: "mail-transport-agent".into(),
                version_constraint: None,
            }],
        });
        installed(&mut db, "dependent", "1.0");
        db.get_mut("dependent").unwrap().installed.relationships.push(Relationship {
            kind: RelationKind::Depends,
            possibilities: vec![Possibility {
                target: "mail-transport-agent".into(),
                version_constraint: None,
            }],
        });

        let acting = Package::new("pa").unwrap();
        let resolution = check_conflict(&acting, "pb", &db, &ForceFlags::default());
        assert_eq!(
            ConflictResolution::ScheduleDeconfigure {
                fixbyrm: "pb".into(),
                dependents: vec!["dependent".into()],
            },
            resolution
        );
    }
}

// vim: foldmethod=marker
