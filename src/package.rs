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

//! The in-memory shape of a package: its identity, its install intent
//! (`want`/`eflag`/`status`), and the two field snapshots (`installed`,
//! `available`) the control-record codec reads and writes.

use crate::dependency::{RelationKind, Relationship};
use crate::version::Version;
use std::collections::BTreeMap;

/// Validate a package name: at least two characters, beginning with a
/// letter, using only `[A-Za-z0-9-_+.@:=%]` thereafter.
pub fn validate_package_name(name: &str) -> Result<(), NameError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(NameError::Empty)?;
    if !first.is_ascii_alphabetic() {
        return Err(NameError::BadLeadingChar);
    }
    if name.chars().count() < 2 {
        return Err(NameError::TooShort);
    }
    if name
        .chars()
        .any(|c| !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '+' | '.' | '@' | ':' | '=' | '%'))
    {
        return Err(NameError::InvalidChar);
    }
    Ok(())
}

/// Error conditions returned by [validate_package_name].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameError {
    /// The name was the empty string.
    Empty,
    /// The name did not begin with a letter.
    BadLeadingChar,
    /// The name was shorter than the required two characters.
    TooShort,
    /// The name contained a character outside the permitted set.
    InvalidChar,
}

crate::errors::error_enum!(NameError);

/// The administrator's installation intent for a package, set by the
/// front-end and read by the state machine (§4.8).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Want {
    /// No selection has been made.
    #[default]
    Unknown,
    /// The package should be installed (and kept up to date).
    Install,
    /// The package should be removed, but its configuration kept.
    Deinstall,
    /// The package, and its configuration, should be removed.
    Purge,
}

impl Want {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Install => "install",
            Self::Deinstall => "deinstall",
            Self::Purge => "purge",
        }
    }
}

impl std::fmt::Display for Want {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Want {
    type Err = StatusFieldError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        Ok(match v {
            "unknown" => Self::Unknown,
            "install" => Self::Install,
            "deinstall" => Self::Deinstall,
            "purge" => Self::Purge,
            _ => return Err(StatusFieldError::BadEnum),
        })
    }
}

/// Per-package error flags. `ok` and `reinstreq` are mutually exclusive in
/// practice; `hold` is orthogonal to both.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EFlags {
    /// The package is held: state-changing operations on it are refused
    /// unless the `hold` force flag is set.
    pub hold: bool,
    /// The package's unpack was interrupted in a way that requires
    /// reinstallation before it can be considered intact.
    pub reinstreq: bool,
}

impl EFlags {
    fn as_str(&self) -> &'static str {
        match (self.hold, self.reinstreq) {
            (false, false) => "ok",
            (true, false) => "hold",
            (false, true) => "reinstreq",
            (true, true) => "hold-reinstreq",
        }
    }
}

impl std::fmt::Display for EFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EFlags {
    type Err = StatusFieldError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        Ok(match v {
            "ok" => EFlags::default(),
            "hold" => EFlags { hold: true, reinstreq: false },
            "reinstreq" => EFlags { hold: false, reinstreq: true },
            "hold-reinstreq" => EFlags { hold: true, reinstreq: true },
            _ => return Err(StatusFieldError::BadEnum),
        })
    }
}

/// The package's current filesystem/configuration status.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// No trace of the package is present.
    #[default]
    NotInstalled,
    /// Only configuration files remain, from a prior purge-pending removal.
    ConfigFiles,
    /// Files were unpacked but removal was interrupted before `postrm`.
    HalfInstalled,
    /// Files are unpacked but the package has not yet been configured.
    Unpacked,
    /// Configuration was started but did not complete (`postinst` failed).
    HalfConfigured,
    /// The package is fully unpacked and configured.
    Installed,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Self::NotInstalled => "not-installed",
            Self::ConfigFiles => "config-files",
            Self::HalfInstalled => "half-installed",
            Self::Unpacked => "unpacked",
            Self::HalfConfigured => "half-configured",
            Self::Installed => "installed",
        }
    }

    /// Whether a package in this [Status] must carry a `configversion`.
    pub fn requires_configversion(&self) -> bool {
        matches!(
            self,
            Self::Unpacked | Self::HalfConfigured | Self::HalfInstalled | Self::ConfigFiles
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = StatusFieldError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        Ok(match v {
            "not-installed" => Self::NotInstalled,
            "config-files" => Self::ConfigFiles,
            "half-installed" => Self::HalfInstalled,
            "unpacked" => Self::Unpacked,
            "half-configured" => Self::HalfConfigured,
            "installed" => Self::Installed,
            _ => return Err(StatusFieldError::BadEnum),
        })
    }
}

/// Error returned when a `Status: <want> <eflag> <status>` field fails to
/// parse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusFieldError {
    /// Fewer than three space-separated tokens were present.
    Truncated,
    /// One of the three tokens did not match a known enum value.
    BadEnum,
}

crate::errors::error_enum!(StatusFieldError);

/// `want eflag status`, as stored whole on the `Status` field.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusField {
    /// Installation intent.
    pub want: Want,
    /// Error flags.
    pub eflag: EFlags,
    /// Current status.
    pub status: Status,
}

impl std::fmt::Display for StatusField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.want, self.eflag, self.status)
    }
}

impl std::str::FromStr for StatusField {
    type Err = StatusFieldError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        let mut parts = v.split_whitespace();
        let want = parts
            .next()
            .ok_or(StatusFieldError::Truncated)?
            .parse()?;
        let eflag = parts
            .next()
            .ok_or(StatusFieldError::Truncated)?
            .parse()?;
        let status = parts
            .next()
            .ok_or(StatusFieldError::Truncated)?
            .parse()?;
        Ok(StatusField { want, eflag, status })
    }
}

/// Priority, as declared by the `Priority` field. `Other` carries any
/// free-form value the registry doesn't recognise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Priority {
    /// The package is required for the system to function at all.
    Required,
    /// The package is important to have in a reasonably useful system.
    Important,
    /// Part of a standard, minimal system install.
    Standard,
    /// Not required, but reasonable for most installs.
    Optional,
    /// Rarely needed.
    Extra,
    /// Does not meet the distribution's free-software guidelines.
    Contrib,
    /// No priority has been assigned.
    Unknown,
    /// Value the registry does not otherwise recognise.
    Other(String),
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Important => write!(f, "important"),
            Self::Standard => write!(f, "standard"),
            Self::Optional => write!(f, "optional"),
            Self::Extra => write!(f, "extra"),
            Self::Contrib => write!(f, "contrib"),
            Self::Unknown => write!(f, "unknown"),
            Self::Other(v) => write!(f, "{}", v),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = std::convert::Infallible;

    /// `base` is accepted as a legacy alias for `required`, but the
    /// serializer never emits it back (see design notes).
    fn from_str(v: &str) -> Result<Self, Self::Err> {
        Ok(match v {
            "required" | "base" => Self::Required,
            "important" => Self::Important,
            "standard" => Self::Standard,
            "optional" => Self::Optional,
            "extra" => Self::Extra,
            "contrib" => Self::Contrib,
            "unknown" => Self::Unknown,
            other => Self::Other(other.to_owned()),
        })
    }
}

/// A `path -> hash` pair tracked on a [FileSnapshot].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conffile {
    /// Path of the configuration file, relative to the install root.
    pub path: String,
    /// Hash (historically an MD5 hex digest) of the shipped content.
    pub hash: String,
}

/// A non-owning back-reference to a [Relationship] possibility that names
/// this package (or a virtual name it provides) as its target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReverseEdge {
    /// Name of the package whose forward list holds the possibility.
    pub from: String,
    /// Which field the possibility came from.
    pub kind: RelationKind,
}

/// Which of a package's two snapshots a codec operation concerns itself
/// with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnapshotKind {
    /// The snapshot describing what is currently unpacked.
    Installed,
    /// The snapshot describing what is available to install.
    Available,
}

/// One of a package's two field snapshots (`installed` or `available`).
/// Populated by the control-record codec; mutated by the unpack/configure
/// transitions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileSnapshot {
    /// Upstream/Debian version, per [crate::version::Version].
    pub version: Option<Version>,
    /// Legacy `Revision`/`Package-Revision` field, distinct from the
    /// version's own embedded Debian revision.
    pub revision: Option<String>,
    /// Whether removal of this package is refused by default.
    pub essential: bool,
    /// All relationship clauses declared on this snapshot.
    pub relationships: Vec<Relationship>,
    /// Conffiles declared on this snapshot.
    pub conffiles: Vec<Conffile>,
    /// Fields the registry does not recognise, carried over verbatim in
    /// the order they were read.
    pub arbitrary_fields: Vec<(String, String)>,
}

impl FileSnapshot {
    /// A snapshot is valid when any field has been populated -- an
    /// all-default snapshot carries no information and is omitted by the
    /// serializer.
    pub fn is_valid(&self) -> bool {
        self.version.is_some()
            || self.revision.is_some()
            || self.essential
            || !self.relationships.is_empty()
            || !self.conffiles.is_empty()
            || !self.arbitrary_fields.is_empty()
    }

    /// Relationships of the given [RelationKind].
    pub fn relationships_of(&self, kind: RelationKind) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.kind == kind)
    }
}

/// A package's scratch disposition during one operation, per §10's
/// `istobe`. Not persisted; reset at the start of each operation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum IsToBe {
    /// No change planned.
    #[default]
    Normal,
    /// Scheduled for removal by conflict resolution.
    Remove,
    /// Scheduled for deconfiguration by the auto-deconfigure policy.
    Deconfigure,
}

/// A single named package, owned exclusively by the [crate::database::PackageDatabase].
#[derive(Clone, Debug)]
pub struct Package {
    /// Package name. Validated with [validate_package_name] on construction.
    pub name: String,
    /// Installation intent.
    pub want: Want,
    /// Error flags.
    pub eflag: EFlags,
    /// Current status.
    pub status: Status,
    /// Snapshot describing what is currently unpacked, if anything.
    pub installed: FileSnapshot,
    /// Snapshot describing what is available to install, if anything.
    pub available: FileSnapshot,
    /// Version under configuration, present iff `status` demands it
    /// (see [Status::requires_configversion]).
    pub configversion: Option<Version>,
    /// Section, as declared by the `Section` field.
    pub section: Option<String>,
    /// Priority, as declared by the `Priority` field.
    pub priority: Option<Priority>,
    /// Non-owning back-references from other packages' forward relation
    /// lists that name this package (or a virtual it provides).
    pub reverse_relations: Vec<ReverseEdge>,
    /// Paths this package claims ownership of (its `.list` contents).
    pub files: Vec<String>,
    /// Package-level fields the registry does not recognise.
    pub arbitrary_fields: Vec<(String, String)>,
    /// Scratch disposition for the operation in progress.
    pub istobe: IsToBe,
}

impl Package {
    /// Construct a fresh, otherwise-empty [Package] with the given name.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        validate_package_name(&name)?;
        Ok(Package {
            name,
            want: Want::default(),
            eflag: EFlags::default(),
            status: Status::default(),
            installed: FileSnapshot::default(),
            available: FileSnapshot::default(),
            configversion: None,
            section: None,
            priority: None,
            reverse_relations: Vec::new(),
            files: Vec::new(),
            arbitrary_fields: Vec::new(),
            istobe: IsToBe::default(),
        })
    }

    /// Whether the `want`/`eflag`/`status`/`configversion` tuple is
    /// internally consistent, per §3's invariant.
    pub fn is_state_valid(&self) -> bool {
        self.status.requires_configversion() == self.configversion.is_some()
    }

    /// Borrow the snapshot named by `kind`.
    pub fn snapshot(&self, kind: SnapshotKind) -> &FileSnapshot {
        match kind {
            SnapshotKind::Installed => &self.installed,
            SnapshotKind::Available => &self.available,
        }
    }

    /// Mutably borrow the snapshot named by `kind`.
    pub fn snapshot_mut(&mut self, kind: SnapshotKind) -> &mut FileSnapshot {
        match kind {
            SnapshotKind::Installed => &mut self.installed,
            SnapshotKind::Available => &mut self.available,
        }
    }

    /// Whether this package record carries any information worth
    /// persisting (used by the dump protocol to omit empty records).
    pub fn has_useful_information(&self) -> bool {
        self.want != Want::Unknown
            || self.status != Status::NotInstalled
            || self.installed.is_valid()
            || self.available.is_valid()
            || !self.arbitrary_fields.is_empty()
    }
}

/// An ordered, name-keyed map used by the database for deterministic
/// iteration and serialization order.
pub type PackageMap = BTreeMap<String, Package>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts() {
        assert!(validate_package_name("a0").is_ok());
        assert!(validate_package_name("foo-bar+1.2").is_ok());
    }

    #[test]
    fn validate_rejects() {
        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("1foo").is_err());
        assert!(validate_package_name("foo bar").is_err());
        assert!(validate_package_name("x").is_err());
        assert!(validate_package_name("foo/bar").is_err());
    }

    #[test]
    fn status_field_round_trip() {
        let sf: StatusField = "install ok installed".parse().unwrap();
        assert_eq!(Want::Install, sf.want);
        assert_eq!(Status::Installed, sf.status);
        assert_eq!("install ok installed", sf.to_string());
    }

    #[test]
    fn status_field_hold_reinstreq() {
        let sf: StatusField = "deinstall hold-reinstreq half-installed".parse().unwrap();
        assert!(sf.eflag.hold);
        assert!(sf.eflag.reinstreq);
    }

    #[test]
    fn priority_base_alias_parses_but_does_not_emit() {
        let p: Priority = "base".parse().unwrap();
        assert_eq!(Priority::Required, p);
        assert_eq!("required", p.to_string());
    }

    #[test]
    fn unrecognised_priority_is_other() {
        let p: Priority = "frobnicate".parse().unwrap();
        assert_eq!(Priority::Other("frobnicate".into()), p);
    }

    #[test]
    fn state_validity() {
        let mut pkg = Package::new("foo").unwrap();
        assert!(pkg.is_state_valid());
        pkg.status = Status::Unpacked;
        assert!(!pkg.is_state_valid());
        pkg.configversion = Some("1.0".parse().unwrap());
        assert!(pkg.is_state_valid());
    }
}

// vim: foldmethod=marker
