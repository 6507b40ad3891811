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

//! The in-memory directory of packages, keyed by name, with the crash-safe
//! dump protocol and the reverse-dependency index (§4.3).

use crate::control::raw::RawParagraph;
use crate::control::record::{decode_paragraph, encode_paragraph, DecodeMode, Warning};
use crate::dependency::RelationKind;
use crate::package::{Package, ReverseEdge, SnapshotKind};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// The package directory. The database exclusively owns every [Package];
/// packages own their snapshots, which own relationship and conffile
/// lists (§3 ownership).
#[derive(Clone, Debug, Default)]
pub struct PackageDatabase {
    packages: BTreeMap<String, Package>,
}

impl PackageDatabase {
    /// Construct an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up, or lazily create, the named package.
    pub fn find_or_create(&mut self, name: &str) -> &mut Package {
        self.packages
            .entry(name.to_owned())
            .or_insert_with(|| Package::new(name).expect("validated at call sites"))
    }

    /// Look up a package without creating one.
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Mutably look up a package without creating one.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.get_mut(name)
    }

    /// Iterate over every package, in name order.
    pub fn iterate(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Number of packages known to the database (installed or merely
    /// mentioned).
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the database has no packages at all.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Attach a relationship's possibilities from `owner`'s forward list,
    /// threading the matching reverse edge onto each target (§4.3).
    /// Called by the control-record decoder as it populates a snapshot.
    pub fn thread_reverse_edges(&mut self, owner: &str, kind: RelationKind, targets: &[String]) {
        for target in targets {
            let node = self.find_or_create(target);
            if !node
                .reverse_relations
                .iter()
                .any(|e| e.from == owner && e.kind == kind)
            {
                node.reverse_relations.push(ReverseEdge {
                    from: owner.to_owned(),
                    kind,
                });
            }
        }
    }

    /// Unthread every reverse edge `owner` placed via `kind`, e.g. when a
    /// snapshot is replaced wholesale. Keeps the reverse-index invariant
    /// (§4.3, §8 property 5) intact across add/remove sequences.
    pub fn unthread_reverse_edges(&mut self, owner: &str, kind: RelationKind, targets: &[String]) {
        for target in targets {
            if let Some(node) = self.packages.get_mut(target) {
                node.reverse_relations
                    .retain(|e| !(e.from == owner && e.kind == kind));
            }
        }
    }

    /// All reverse edges of `kind` pointing at `target` -- i.e. every
    /// package whose forward list names `target` under that field.
    pub fn reverse_dependents(&self, target: &str, kind: RelationKind) -> Vec<String> {
        self.packages
            .get(target)
            .map(|pkg| {
                pkg.reverse_relations
                    .iter()
                    .filter(|e| e.kind == kind)
                    .map(|e| e.from.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Load one database file (`status` or `available`) into this
    /// database, decoding every paragraph as the given [SnapshotKind].
    /// Existing packages are merged into (their other snapshot is left
    /// untouched); this is how `status` and `available` combine into one
    /// in-memory directory.
    pub fn load(
        &mut self,
        path: &Path,
        kind: SnapshotKind,
        mode: DecodeMode,
    ) -> Result<Vec<Warning>, crate::error::Error> {
        let text = std::fs::read_to_string(path).map_err(|source| crate::error::Error::DatabaseIO {
            path: path.display().to_string(),
            source,
        })?;
        let paragraphs = RawParagraph::parse_all(&text).map_err(|err| {
            crate::error::Error::DatabaseFormat {
                path: path.display().to_string(),
                source: crate::control::record::Error::Raw(err),
            }
        })?;

        let mut all_warnings = Vec::new();
        for paragraph in &paragraphs {
            let mut warnings = Vec::new();
            let decoded = decode_paragraph(paragraph, kind, mode, &mut warnings).map_err(|err| {
                crate::error::Error::DatabaseFormat {
                    path: path.display().to_string(),
                    source: err,
                }
            })?;
            debug!(package = %decoded.name, ?kind, "decoded database record");

            for relationship in decoded.snapshot(kind).relationships.clone() {
                let targets: Vec<String> = relationship
                    .possibilities
                    .iter()
                    .map(|p| p.target.clone())
                    .collect();
                self.thread_reverse_edges(&decoded.name, relationship.kind, &targets);
            }

            let existing = self.find_or_create(&decoded.name);
            *existing.snapshot_mut(kind) = decoded.snapshot(kind).clone();
            if kind == SnapshotKind::Installed {
                existing.want = decoded.want;
                existing.eflag = decoded.eflag;
                existing.status = decoded.status;
            }
            if decoded.priority.is_some() {
                existing.priority = decoded.priority;
            }
            if decoded.section.is_some() {
                existing.section = decoded.section;
            }
            if decoded.configversion.is_some() {
                existing.configversion = decoded.configversion;
            }
            for field in decoded.arbitrary_fields {
                if !existing.arbitrary_fields.contains(&field) {
                    existing.arbitrary_fields.push(field);
                }
            }

            all_warnings.extend(warnings);
        }

        if !all_warnings.is_empty() {
            warn!(count = all_warnings.len(), path = %path.display(), "decoded database with warnings");
        }
        info!(count = paragraphs.len(), path = %path.display(), "loaded database file");
        Ok(all_warnings)
    }

    /// Crash-safe dump of every package's `kind` snapshot to `path`
    /// (§4.3): write `path.new`, optionally `fsync`, `unlink path.old`,
    /// `link path -> path.old`, `rename path.new -> path`. A record is
    /// omitted when it carries no useful information.
    pub fn dump(
        &self,
        path: &Path,
        kind: SnapshotKind,
        fsync_required: bool,
    ) -> Result<(), crate::error::Error> {
        use std::io::Write;

        let new_path = path.with_extension("new");
        let old_path = path.with_extension("old");

        let mut text = String::new();
        for package in self.iterate() {
            if !package.has_useful_information() {
                continue;
            }
            let Some(paragraph) = encode_paragraph(package, kind) else {
                continue;
            };
            text.push_str(&paragraph.to_text());
        }

        let map_io = |source: std::io::Error| crate::error::Error::DatabaseIO {
            path: path.display().to_string(),
            source,
        };

        let mut file = std::fs::File::create(&new_path).map_err(map_io)?;
        file.write_all(text.as_bytes()).map_err(map_io)?;
        if fsync_required {
            file.sync_all().map_err(map_io)?;
        }
        drop(file);

        let _ = std::fs::remove_file(&old_path);
        if path.exists() {
            std::fs::hard_link(path, &old_path).map_err(map_io)?;
        }
        std::fs::rename(&new_path, path).map_err(map_io)?;

        info!(path = %path.display(), ?kind, "dumped database file");
        Ok(())
    }
}


// vim: foldmethod=marker
