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

//! Layered engine configuration: hard-coded defaults, optionally
//! overridden by a TOML file, optionally overridden again by fields the
//! embedding application sets explicitly (e.g. from its own CLI flags).

use std::path::PathBuf;

/// Force flags, each downgrading a specific class of error into a
/// logged warning (§7).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ForceFlags {
    /// Allow overwriting a file owned by another package.
    pub overwrite: bool,
    /// Allow overwriting a file that is the target of a diversion.
    pub overwrite_diverted: bool,
    /// Proceed even when a dependency is unsatisfied.
    pub depends: bool,
    /// Proceed even when a conflict cannot be resolved cleanly.
    pub conflicts: bool,
    /// Allow removing a package marked essential.
    pub remove_essential: bool,
    /// Allow removing a package flagged `reinstreq`.
    pub remove_reinstreq: bool,
    /// Allow operating on a held package.
    pub hold: bool,
}

/// What to do when a recoverable error occurs while processing one
/// package out of a multi-package operation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AbortAfterPolicy {
    /// Stop the whole operation at the first package-level failure.
    #[default]
    FirstError,
    /// Keep going, marking failed packages `half-*`, and report all
    /// failures at the end.
    Continue,
}

/// Engine-wide configuration: filesystem roots, the force-flag set, and
/// operational policy knobs.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Directory holding `status`, `available`, `diversions`, and the
    /// per-package `info/` tree.
    pub admin_dir: PathBuf,
    /// Root beneath which packages' files are actually unpacked.
    pub install_root: PathBuf,
    /// Force-flag overrides for this run.
    pub force: ForceFlags,
    /// Continuation policy for multi-package operations.
    pub abort_after: AbortAfterPolicy,
    /// Whether the dump protocol calls `fsync` before renaming database
    /// files into place.
    pub fsync_required: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            admin_dir: PathBuf::from("/var/lib/dpkg"),
            install_root: PathBuf::from("/"),
            force: ForceFlags::default(),
            abort_after: AbortAfterPolicy::default(),
            fsync_required: true,
        }
    }
}

/// Partial configuration as read from an optional TOML file: every field
/// is optional, and only present fields override the default.
#[cfg(feature = "toml-config")]
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfigFile {
    /// See [EngineConfig::admin_dir].
    pub admin_dir: Option<PathBuf>,
    /// See [EngineConfig::install_root].
    pub install_root: Option<PathBuf>,
    /// See [EngineConfig::fsync_required].
    pub fsync_required: Option<bool>,
}

#[cfg(feature = "toml-config")]
impl EngineConfig {
    /// Load a TOML file and layer it over [EngineConfig::default]. A
    /// missing file is not an error at this layer -- callers that care
    /// whether the path exists should check before calling this.
    pub fn load_toml(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let file: EngineConfigFile = toml::from_str(&text).map_err(ConfigError::Toml)?;
        let mut config = EngineConfig::default();
        config.merge_file(file);
        Ok(config)
    }

    /// Overlay a parsed file's present fields onto this configuration.
    /// Explicit field assignment performed by the caller *after* this
    /// call always wins, per the layering order in the ambient stack
    /// design: defaults, then file, then explicit overrides.
    pub fn merge_file(&mut self, file: EngineConfigFile) {
        if let Some(admin_dir) = file.admin_dir {
            self.admin_dir = admin_dir;
        }
        if let Some(install_root) = file.install_root {
            self.install_root = install_root;
        }
        if let Some(fsync_required) = file.fsync_required {
            self.fsync_required = fsync_required;
        }
    }
}

/// Error conditions encountered while loading an [EngineConfig] from
/// disk.
#[cfg(feature = "toml-config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("reading config file: {0}")]
    Io(#[source] std::io::Error),
    /// The config file's contents were not valid TOML, or did not match
    /// the expected shape.
    #[error("parsing config file: {0}")]
    Toml(#[source] toml::de::Error),
}


// vim: foldmethod=marker
