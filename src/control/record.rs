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

//! Paragraph <-> [Package] conversion: the field registry, alias table,
//! and "warnings only" vs. strict decode modes (§4.1).
//!
//! Field dispatch is expressed as a match over the canonical field name
//! (after alias resolution) rather than a literal array of function
//! pointers -- the read side needs to land values in different corners
//! of [Package] (some package-level, some per-snapshot), which makes a
//! uniform `fn(&mut Package, &str)` table more ceremony than a match arm
//! here, though the effect (one registry entry per field, fixed emit
//! order, an applicability predicate before each) is the same.

use crate::control::raw::{RawField, RawParagraph};
use crate::dependency::{RelationKind, Relationship};
use crate::package::{Conffile, Package, Priority, SnapshotKind, StatusField};
use crate::version::Version;

/// Canonical field names, in the fixed order the serializer emits them.
const REGISTRY_ORDER: &[&str] = &[
    "Package",
    "Essential",
    "Status",
    "Priority",
    "Section",
    "Version",
    "Revision",
    "Pre-Depends",
    "Depends",
    "Recommends",
    "Suggests",
    "Enhances",
    "Conflicts",
    "Provides",
    "Replaces",
    "Config-Version",
    "Conffiles",
];

/// Apply the fixed field-name aliases (§4.1) before dispatch.
fn canonicalize(name: &str) -> String {
    match name {
        n if n.eq_ignore_ascii_case("recommended") => "Recommends".to_owned(),
        n if n.eq_ignore_ascii_case("optional") => "Suggests".to_owned(),
        n if n.eq_ignore_ascii_case("class") => "Priority".to_owned(),
        n if n.eq_ignore_ascii_case("package-revision") => "Revision".to_owned(),
        n if n.eq_ignore_ascii_case("package_revision") => "Revision".to_owned(),
        n => REGISTRY_ORDER
            .iter()
            .find(|c| c.eq_ignore_ascii_case(n))
            .map(|c| c.to_string())
            .unwrap_or_else(|| n.to_owned()),
    }
}

/// Errors the codec can raise (§4.1).
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A field the snapshot kind requires was absent.
    MissingField {
        /// Field name.
        name: &'static str,
    },
    /// A field was present but its value was empty.
    EmptyField {
        /// Field name.
        name: &'static str,
    },
    /// An enum-valued field (`Status`, `Priority`) did not match a known
    /// value.
    BadEnum {
        /// Field name.
        name: &'static str,
        /// The text that failed to parse.
        value: String,
    },
    /// The `Package` field's value is not a valid package name.
    BadPackageName(String),
    /// A `Version`/`Revision` field's value did not parse.
    BadVersion(String),
    /// A relationship field's value did not parse.
    BadRelationSyntax(String),
    /// The underlying paragraph itself failed to parse.
    Raw(crate::control::raw::Error),
}

crate::errors::error_enum!(Error);

impl From<crate::control::raw::Error> for Error {
    fn from(err: crate::control::raw::Error) -> Self {
        Error::Raw(err)
    }
}

/// One decode failure recorded by "warnings only" mode instead of
/// aborting the paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    /// Field the problem was found on.
    pub field: String,
    /// What went wrong.
    pub error: Error,
}

/// Whether [decode_paragraph] aborts on the first problem or records it
/// and continues.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeMode {
    /// The first [Error] aborts the whole paragraph.
    Strict,
    /// Problems are pushed onto a side channel of [Warning]s; decoding
    /// continues with the field simply left unset.
    WarningsOnly,
}

/// Decode one paragraph into a [Package], for the given [SnapshotKind].
/// In [DecodeMode::WarningsOnly], `warnings` receives every recoverable
/// problem instead of aborting.
pub fn decode_paragraph(
    paragraph: &RawParagraph,
    kind: SnapshotKind,
    mode: DecodeMode,
    warnings: &mut Vec<Warning>,
) -> Result<Package, Error> {
    let mut recognised: Vec<String> = Vec::new();
    let record_or_raise = |field: &str, err: Error, mode: DecodeMode, warnings: &mut Vec<Warning>| -> Result<(), Error> {
        match mode {
            DecodeMode::Strict => Err(err),
            DecodeMode::WarningsOnly => {
                warnings.push(Warning {
                    field: field.to_owned(),
                    error: err,
                });
                Ok(())
            }
        }
    };

    let name_field = paragraph
        .field("Package")
        .next()
        .ok_or(Error::MissingField { name: "Package" })?;
    if name_field.value.trim().is_empty() {
        return Err(Error::EmptyField { name: "Package" });
    }
    let mut package = Package::new(name_field.value.trim())
        .map_err(|_| Error::BadPackageName(name_field.value.clone()))?;
    recognised.push("Package".to_owned());

    if kind == SnapshotKind::Installed {
        let status_field = paragraph
            .field("Status")
            .next()
            .ok_or(Error::MissingField { name: "Status" })?;
        recognised.push("Status".to_owned());
        match status_field.value.parse::<StatusField>() {
            Ok(sf) => {
                package.want = sf.want;
                package.eflag = sf.eflag;
                package.status = sf.status;
            }
            Err(_) => {
                record_or_raise(
                    "Status",
                    Error::BadEnum {
                        name: "Status",
                        value: status_field.value.clone(),
                    },
                    mode,
                    warnings,
                )?;
            }
        }
    }

    for field in paragraph.iter() {
        let canon = canonicalize(&field.key);
        if recognised.iter().any(|r| r == &canon) {
            continue;
        }

        match canon.as_str() {
            "Essential" => {
                recognised.push(canon);
                package.snapshot_mut(kind).essential = field.value.trim() == "yes";
            }
            "Priority" => {
                recognised.push(canon);
                package.priority = Some(field.value.trim().parse::<Priority>().unwrap());
            }
            "Section" => {
                recognised.push(canon);
                package.section = Some(field.value.trim().to_owned());
            }
            "Version" => {
                recognised.push(canon.clone());
                match field.value.trim().parse::<Version>() {
                    Ok(v) => package.snapshot_mut(kind).version = Some(v),
                    Err(_) => record_or_raise(
                        &canon,
                        Error::BadVersion(field.value.clone()),
                        mode,
                        warnings,
                    )?,
                }
            }
            "Revision" => {
                recognised.push(canon);
                package.snapshot_mut(kind).revision = Some(field.value.trim().to_owned());
            }
            "Config-Version" => {
                recognised.push(canon.clone());
                match field.value.trim().parse::<Version>() {
                    Ok(v) => package.configversion = Some(v),
                    Err(_) => record_or_raise(
                        &canon,
                        Error::BadVersion(field.value.clone()),
                        mode,
                        warnings,
                    )?,
                }
            }
            "Pre-Depends" | "Depends" | "Recommends" | "Suggests" | "Enhances" | "Conflicts"
            | "Provides" | "Replaces" => {
                let relation_kind: RelationKind = canon.parse().map_err(|_| {
                    Error::BadRelationSyntax(format!("unknown relation field {}", canon))
                })?;
                recognised.push(canon.clone());
                match Relationship::parse_field(relation_kind, &field.value) {
                    Ok(mut rels) => package
                        .snapshot_mut(kind)
                        .relationships
                        .append(&mut rels),
                    Err(_) => record_or_raise(
                        &canon,
                        Error::BadRelationSyntax(field.value.clone()),
                        mode,
                        warnings,
                    )?,
                }
            }
            "Conffiles" => {
                recognised.push(canon);
                for line in field.value.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let Some((path, hash)) = line.rsplit_once(' ') else {
                        continue;
                    };
                    package.snapshot_mut(kind).conffiles.push(Conffile {
                        path: path.to_owned(),
                        hash: hash.to_owned(),
                    });
                }
            }
            _ => {
                package
                    .arbitrary_fields
                    .push((field.key.clone(), field.value.clone()));
            }
        }
    }

    Ok(package)
}

/// Whether a registry field applies to this snapshot/package state. Used
/// by [encode_paragraph] to omit fields that wouldn't round-trip (§4.1).
fn applies(name: &str, package: &Package, kind: SnapshotKind) -> bool {
    match name {
        "Status" => kind == SnapshotKind::Installed,
        "Config-Version" => package.status.requires_configversion(),
        "Essential" => package.snapshot(kind).essential,
        _ => true,
    }
}

/// Encode a [Package]'s `kind` snapshot back into a [RawParagraph].
/// Returns `None` when the package has no useful information for this
/// snapshot (the dump protocol then omits the record entirely).
pub fn encode_paragraph(package: &Package, kind: SnapshotKind) -> Option<RawParagraph> {
    if !package.snapshot(kind).is_valid() && kind == SnapshotKind::Available {
        return None;
    }

    let mut fields = Vec::new();
    fields.push(RawField {
        key: "Package".to_owned(),
        value: package.name.clone(),
    });

    for name in REGISTRY_ORDER.iter().skip(1) {
        if !applies(name, package, kind) {
            continue;
        }
        let value = match *name {
            "Essential" => Some("yes".to_owned()),
            "Status" => Some(
                StatusField {
                    want: package.want,
                    eflag: package.eflag,
                    status: package.status,
                }
                .to_string(),
            ),
            "Priority" => package.priority.as_ref().and_then(|p| {
                // `base` is parse-only; never re-emitted (§10 open question).
                Some(p.to_string())
            }),
            "Section" => package.section.clone(),
            "Version" => package.snapshot(kind).version.as_ref().map(|v| v.to_string()),
            "Revision" => package.snapshot(kind).revision.clone(),
            "Config-Version" => package.configversion.as_ref().map(|v| v.to_string()),
            "Conffiles" => {
                let conffiles = &package.snapshot(kind).conffiles;
                if conffiles.is_empty() {
                    None
                } else {
                    Some(
                        conffiles
                            .iter()
                            .map(|c| format!("{} {}", c.path, c.hash))
                            .collect::<Vec<_>>()
                            .join("\n"),
                    )
                }
            }
            field_name => {
                let kind_enum: Option<RelationKind> = field_name.parse().ok();
                kind_enum.and_then(|rk| {
                    let rels: Vec<_> = package
                        .snapshot(kind)
                        .relationships_of(rk)
                        .cloned()
                        .collect();
                    if rels.is_empty() {
                        None
                    } else {
                        Some(crate::dependency::join_field(&rels))
                    }
                })
            }
        };

        if let Some(value) = value {
            if !value.is_empty() {
                fields.push(RawField {
                    key: name.to_string(),
                    value,
                });
            }
        }
    }

    for (key, value) in &package.arbitrary_fields {
        fields.push(RawField {
            key: key.clone(),
            value: value.clone(),
        });
    }

    Some(RawParagraph { fields })
}


// vim: foldmethod=marker
