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

//! Materializes one archive entry onto the filesystem under the
//! three-name protocol (§4.6): the live object at `path`, a
//! `path.dpkg-new` holding the freshly unpacked replacement, and a
//! `path.dpkg-tmp` used only when the live object can't be swapped in
//! with a single `rename(2)`.

use crate::archive::{Entry, EntryType};
use crate::namespace::FileNamespace;
use crate::unwind::UnwindStack;
use nix::sys::stat::{mknod, utimensat, Mode, SFlag, UtimensatFlags};
use nix::sys::time::TimeSpec;
use nix::unistd::{chown, Gid, Uid};
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Errors raised while materializing an entry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading the entry's content from the archive pipe failed.
    #[error("archive error: {0}")]
    Archive(#[from] crate::archive::Error),
    /// A filesystem operation on `path` failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Path the failing operation targeted.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Another package already claims this path and neither replaces
    /// the other (§4.6 conflict detection).
    #[error("file {path} already claimed by {other}")]
    Claimed {
        /// The contested path.
        path: String,
        /// The package that already claims it.
        other: String,
    },
}

fn io_err(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Remove whatever is at `path`, file or directory, ignoring the error
/// if there is nothing there. Used only by unwind cleanups, which have
/// no error channel of their own to report through.
fn remove_any(path: &Path) {
    match path.symlink_metadata() {
        Ok(meta) if meta.is_dir() => {
            let _ = std::fs::remove_dir_all(path);
        }
        Ok(_) => {
            let _ = std::fs::remove_file(path);
        }
        Err(_) => {}
    }
}

/// Recover from a process kill between steps (9)/(10) and (7) of a
/// previous run (§4.6 step 3, property 6): if nothing is at `live`,
/// a prior run may have gotten as far as `rename(live, live.dpkg-tmp)`
/// before dying, leaving the pre-upgrade object parked at
/// `live.dpkg-tmp` with nothing at `live` itself. Renaming `dpkg-tmp`
/// back onto `live` restores that run to the state it was in just
/// before its own `rename(live.dpkg-new, live)`, so it can simply
/// proceed as normal from here. If `live` already exists, or there is
/// no `dpkg-tmp` to recover, this is a no-op.
fn recover_interrupted(paths: &NamedPaths) {
    if paths.live.symlink_metadata().is_err() && std::fs::rename(&paths.tmp, &paths.live).is_ok() {
        debug!(
            path = %paths.live.display(),
            "recovered interrupted unpack by restoring dpkg-tmp"
        );
    }
}

/// The three names a single live path is known by during unpack.
struct NamedPaths {
    live: PathBuf,
    new: PathBuf,
    tmp: PathBuf,
}

impl NamedPaths {
    fn for_live(live: PathBuf) -> Self {
        let mut new = live.clone().into_os_string();
        new.push(".dpkg-new");
        let mut tmp = live.clone().into_os_string();
        tmp.push(".dpkg-tmp");
        NamedPaths {
            live,
            new: new.into(),
            tmp: tmp.into(),
        }
    }
}

/// Unpack one archive [Entry] below `install_root`, on behalf of
/// `acting_package`. Registers rollback cleanups on `unwind` as it goes;
/// the caller discards them (via [UnwindStack::pop_discard] down to a
/// mark) once the whole archive has unpacked successfully, or unwinds
/// them on failure.
///
/// `allow_overwrite` corresponds to the `overwrite`/`overwrite-diverted`
/// force flags: when false, a path already claimed by a different
/// package that this one does not replace is a fatal conflict (§4.6
/// step 4; resolution of *which* package wins a `Replaces` is the
/// resolver's job, not this function's -- by the time unpack runs, the
/// replaces decision has already been folded into the namespace).
///
/// `conffiles` is `acting_package`'s list of conffile paths (canonical,
/// leading-slash form) off its available snapshot. An entry landing on
/// one of these paths is staged at `.dpkg-new` and left there -- §4.6
/// step 8 defers conffile installation to configure-time logic, which
/// is why this function never calls [commit] for one.
pub fn unpack_entry<R: Read>(
    entry: Entry,
    content: &mut R,
    install_root: &Path,
    acting_package: &str,
    conffiles: &[String],
    namespace: &mut FileNamespace,
    unwind: &mut UnwindStack,
    allow_overwrite: bool,
) -> Result<(), Error> {
    let canonical = format!("/{}", entry.name.trim_start_matches('/'));
    let target = namespace.use_target(&canonical, acting_package);

    {
        let node = namespace.find_or_create(&target);
        let claimed_by_other = node
            .packages
            .iter()
            .any(|p| p != acting_package);
        if claimed_by_other && !allow_overwrite {
            return Err(Error::Claimed {
                path: target,
                other: node.packages[0].clone(),
            });
        }
        if !node.packages.iter().any(|p| p == acting_package) {
            node.packages.push(acting_package.to_owned());
        }
        node.flags.new_in_archive = true;
    }

    let live = install_root.join(target.trim_start_matches('/'));
    let paths = NamedPaths::for_live(live);

    if let Some(parent) = paths.new.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    recover_interrupted(&paths);

    if entry.entry_type == EntryType::Directory {
        // Directories are placed (or chmod'd in place) directly at
        // `live`, never staged at `new` -- nothing for `commit` to swap
        // in.
        materialize_directory(&entry, &paths)?;
        debug!(path = %paths.live.display(), "unpacked directory entry");
        return Ok(());
    }

    match entry.entry_type {
        EntryType::Symlink => materialize_symlink(&entry, &paths)?,
        EntryType::Hardlink => materialize_hardlink(&entry, &paths, install_root)?,
        EntryType::NormalFile => materialize_regular(&entry, content, &paths)?,
        EntryType::CharDevice | EntryType::BlockDevice => materialize_device(&entry, &paths)?,
        EntryType::Directory => unreachable!("handled above"),
    }
    if entry.entry_type != EntryType::Symlink {
        set_times(&paths.new, entry.modtime)?;
    }

    if conffiles.iter().any(|c| c == &target) {
        let node = namespace.find_or_create(&target);
        node.flags.new_conffile = true;
        debug!(path = %paths.live.display(), "staged new conffile, deferred to configure");
        return Ok(());
    }

    let non_atomic = commit(&paths, unwind)?;
    let node = namespace.find_or_create(&target);
    node.flags.no_atomic_overwrite = non_atomic;
    node.flags.elide_other_lists = true;
    debug!(path = %paths.live.display(), "unpacked entry");
    Ok(())
}

fn materialize_directory(entry: &Entry, paths: &NamedPaths) -> Result<(), Error> {
    if paths.live.is_dir() {
        // Already a directory; nothing further to stage, avoid the
        // rename dance entirely (§4.6: directories never go through
        // dpkg-new).
        std::fs::set_permissions(&paths.live, std::fs::Permissions::from_mode(entry.mode))
            .map_err(|e| io_err(&paths.live, e))?;
    } else {
        std::fs::create_dir_all(&paths.live).map_err(|e| io_err(&paths.live, e))?;
        std::fs::set_permissions(&paths.live, std::fs::Permissions::from_mode(entry.mode))
            .map_err(|e| io_err(&paths.live, e))?;
        chown(
            &paths.live,
            Some(Uid::from_raw(entry.uid)),
            Some(Gid::from_raw(entry.gid)),
        )
        .map_err(|e| io_err(&paths.live, std::io::Error::from(e)))?;
    }
    set_times(&paths.live, entry.modtime)?;
    Ok(())
}

/// Set `atime` to now and `mtime` to the archive entry's recorded
/// modification time (§4.6 step 7). Symlinks aren't passed here -- their
/// own timestamp isn't part of what the archive describes.
fn set_times(path: &Path, modtime: i64) -> Result<(), Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let atime = TimeSpec::new(now.as_secs() as i64, now.subsec_nanos() as i64);
    let mtime = TimeSpec::new(modtime, 0);
    utimensat(None, path, &atime, &mtime, UtimensatFlags::NoFollowSymlink)
        .map_err(|e| io_err(path, std::io::Error::from(e)))?;
    Ok(())
}

fn materialize_symlink(entry: &Entry, paths: &NamedPaths) -> Result<(), Error> {
    let target = entry
        .link_target
        .as_deref()
        .ok_or_else(|| Error::Archive(crate::archive::Error::Format("symlink missing target".into())))?;
    let _ = std::fs::remove_file(&paths.new);
    std::os::unix::fs::symlink(target, &paths.new).map_err(|e| io_err(&paths.new, e))?;
    Ok(())
}

fn materialize_hardlink(entry: &Entry, paths: &NamedPaths, install_root: &Path) -> Result<(), Error> {
    let target = entry
        .link_target
        .as_deref()
        .ok_or_else(|| Error::Archive(crate::archive::Error::Format("hardlink missing target".into())))?;
    let existing = install_root.join(target.trim_start_matches('/'));
    let _ = std::fs::remove_file(&paths.new);
    std::fs::hard_link(&existing, &paths.new).map_err(|e| io_err(&paths.new, e))?;
    Ok(())
}

fn materialize_device(entry: &Entry, paths: &NamedPaths) -> Result<(), Error> {
    let device = entry.device.unwrap_or(0);
    let major = (device >> 32) as u64;
    let minor = (device & 0xFFFF_FFFF) as u64;
    let kind = match entry.entry_type {
        EntryType::CharDevice => SFlag::S_IFCHR,
        EntryType::BlockDevice => SFlag::S_IFBLK,
        _ => unreachable!("materialize_device called with non-device entry"),
    };
    let _ = std::fs::remove_file(&paths.new);
    let dev = nix::sys::stat::makedev(major, minor);
    mknod(
        &paths.new,
        kind,
        Mode::from_bits_truncate(entry.mode),
        dev,
    )
    .map_err(|e| io_err(&paths.new, std::io::Error::from(e)))?;
    Ok(())
}

fn materialize_regular<R: Read>(entry: &Entry, content: &mut R, paths: &NamedPaths) -> Result<(), Error> {
    let mut file = std::fs::File::create(&paths.new).map_err(|e| io_err(&paths.new, e))?;
    let copied = std::io::copy(content, &mut file).map_err(|e| io_err(&paths.new, e))?;
    if copied != entry.size {
        return Err(Error::Archive(crate::archive::Error::Format(format!(
            "truncated entry: expected {} bytes, got {copied}",
            entry.size
        ))));
    }
    file.sync_all().map_err(|e| io_err(&paths.new, e))?;
    drop(file);
    std::fs::set_permissions(&paths.new, std::fs::Permissions::from_mode(entry.mode))
        .map_err(|e| io_err(&paths.new, e))?;
    chown(
        &paths.new,
        Some(Uid::from_raw(entry.uid)),
        Some(Gid::from_raw(entry.gid)),
    )
    .map_err(|e| io_err(&paths.new, std::io::Error::from(e)))?;
    Ok(())
}

/// Swap `path.dpkg-new` into `path`, registering the rollback cleanup.
/// Returns whether the swap took the non-atomic `dpkg-tmp` detour
/// (§4.6 edge case), which the caller records as the node's
/// `no_atomic_overwrite` flag.
///
/// Directories are handled by their own materializer and never reach
/// here as a replacement target; if the live object currently occupying
/// `path` is a directory (or the new object is), a plain `rename(2)`
/// would either fail or silently merge -- so that case backs `live` up
/// to `tmp` first. A `live` that does not exist at all can be replaced
/// with a single bare rename (§4.6 step 9). Everything else -- `live`
/// exists as a regular file or a symlink -- needs the same backup as
/// the directory case (§4.6 step 10): a hardlink for a regular file, a
/// copy of the link target for a symlink, taken *before* the rename so
/// that a kill between the two renames, or an unwind afterwards, can
/// still restore the original object. Bare-renaming over an existing
/// `live` would make the original content unrecoverable on both counts.
fn commit(paths: &NamedPaths, unwind: &mut UnwindStack) -> Result<bool, Error> {
    let live_meta = paths.live.symlink_metadata();

    if matches!(&live_meta, Ok(meta) if meta.is_dir()) && !paths.new.is_dir() {
        let _ = std::fs::remove_file(&paths.tmp);
        std::fs::rename(&paths.live, &paths.tmp).map_err(|e| io_err(&paths.live, e))?;
        std::fs::rename(&paths.new, &paths.live).map_err(|e| io_err(&paths.new, e))?;
        push_restore_cleanup(paths, unwind);
        return Ok(true);
    }

    if live_meta.is_err() {
        std::fs::rename(&paths.new, &paths.live).map_err(|e| io_err(&paths.new, e))?;
        let live = paths.live.clone();
        unwind.push_cleanup(move || {
            let _ = std::fs::remove_file(&live);
        });
        return Ok(false);
    }

    remove_any(&paths.tmp);
    if matches!(&live_meta, Ok(meta) if meta.file_type().is_symlink()) {
        let target = std::fs::read_link(&paths.live).map_err(|e| io_err(&paths.live, e))?;
        std::os::unix::fs::symlink(&target, &paths.tmp).map_err(|e| io_err(&paths.tmp, e))?;
    } else {
        std::fs::hard_link(&paths.live, &paths.tmp).map_err(|e| io_err(&paths.tmp, e))?;
    }
    std::fs::rename(&paths.new, &paths.live).map_err(|e| io_err(&paths.new, e))?;
    push_restore_cleanup(paths, unwind);
    Ok(false)
}

/// The backup at `tmp` is what restores the original object on unwind;
/// it is only safe to discard once the whole operation this entry
/// belongs to has committed, which is the action queue's job, not this
/// function's.
fn push_restore_cleanup(paths: &NamedPaths, unwind: &mut UnwindStack) {
    let tmp = paths.tmp.clone();
    let live = paths.live.clone();
    unwind.push_cleanup(move || {
        remove_any(&live);
        if std::fs::rename(&tmp, &live).is_err() {
            warn!(path = %live.display(), "failed to restore live object during unwind");
        }
    });
}


// vim: foldmethod=marker
