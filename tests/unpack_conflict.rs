//! S3/S4/S5: file-ownership conflicts and crash recovery across the
//! three-name unpack protocol.

use dpkg_engine::archive::{Entry, EntryType};
use dpkg_engine::namespace::FileNamespace;
use dpkg_engine::unpack::{unpack_entry, Error as UnpackError};
use dpkg_engine::unwind::UnwindStack;
use std::io::Cursor;

fn file_entry(name: &str, content: &[u8]) -> Entry {
    Entry {
        name: name.to_owned(),
        mode: 0o644,
        uid: 0,
        gid: 0,
        size: content.len() as u64,
        modtime: 0,
        entry_type: EntryType::NormalFile,
        link_target: None,
        device: None,
    }
}

#[test]
fn s3_conflicting_claim_without_replaces_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut ns = FileNamespace::new();
    ns.find_or_create("/usr/bin/t").packages.push("other".into());
    let mut unwind = UnwindStack::new();

    let result = unpack_entry(
        file_entry("usr/bin/t", b"new"),
        &mut Cursor::new(b"new".to_vec()),
        dir.path(),
        "incoming",
        &[],
        &mut ns,
        &mut unwind,
        false,
    );

    assert!(matches!(result, Err(UnpackError::Claimed { .. })));
    assert!(!dir.path().join("usr/bin/t").exists());
}

#[test]
fn s4_replaces_allows_overwrite_and_swaps_the_file_in() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
    std::fs::write(dir.path().join("usr/bin/t"), b"old").unwrap();

    let mut ns = FileNamespace::new();
    ns.find_or_create("/usr/bin/t").packages.push("other".into());
    let mut unwind = UnwindStack::new();

    // The resolver has already decided this package's `Replaces`
    // clause is satisfied by `other`'s installed version; by the time
    // unpack runs that decision is just the `allow_overwrite` flag.
    unpack_entry(
        file_entry("usr/bin/t", b"new"),
        &mut Cursor::new(b"new".to_vec()),
        dir.path(),
        "incoming",
        &[],
        &mut ns,
        &mut unwind,
        true,
    )
    .unwrap();

    let written = std::fs::read(dir.path().join("usr/bin/t")).unwrap();
    assert_eq!(b"new".to_vec(), written);
    assert!(!dir.path().join("usr/bin/t.dpkg-new").exists());

    let node = ns.get("/usr/bin/t").unwrap();
    assert!(node.packages.iter().any(|p| p == "incoming"));

    // `live` pre-existed as a regular file, so `commit` must have taken
    // the atomic single-rename path (no directory involved on either
    // side), but still backed the old content up to `.dpkg-tmp` first.
    assert!(!node.flags.no_atomic_overwrite);
    let backup = std::fs::read(dir.path().join("usr/bin/t.dpkg-tmp")).unwrap();
    assert_eq!(b"old".to_vec(), backup);
}

#[test]
fn s4_new_conffile_is_deferred_to_configure_time() {
    let dir = tempfile::tempdir().unwrap();
    let mut ns = FileNamespace::new();
    let mut unwind = UnwindStack::new();

    unpack_entry(
        file_entry("etc/foo.conf", b"conf"),
        &mut Cursor::new(b"conf".to_vec()),
        dir.path(),
        "incoming",
        &["/etc/foo.conf".to_owned()],
        &mut ns,
        &mut unwind,
        false,
    )
    .unwrap();

    assert!(!dir.path().join("etc/foo.conf").exists());
    assert!(dir.path().join("etc/foo.conf.dpkg-new").exists());
    assert!(ns.get("/etc/foo.conf").unwrap().flags.new_conffile);
}

#[test]
fn s5_unwinding_after_a_committed_rename_restores_nothing_to_undo() {
    // A plain (non-directory-replacing) commit registers a cleanup that
    // removes the live object on unwind -- simulating an abort *after*
    // this entry committed but before the whole archive's unpack
    // finished, which is the crash window this cleanup exists for.
    let dir = tempfile::tempdir().unwrap();
    let mut ns = FileNamespace::new();
    let mut unwind = UnwindStack::new();

    unpack_entry(
        file_entry("usr/bin/t", b"new"),
        &mut Cursor::new(b"new".to_vec()),
        dir.path(),
        "incoming",
        &[],
        &mut ns,
        &mut unwind,
        false,
    )
    .unwrap();
    assert!(dir.path().join("usr/bin/t").exists());

    unwind.unwind_all();
    assert!(!dir.path().join("usr/bin/t").exists());
}

#[test]
fn s5_directory_replacement_backup_restores_original_on_unwind() {
    // Replacing a live directory with a non-directory goes through the
    // non-atomic dpkg-tmp detour (§4.6): the original directory is
    // preserved at `.dpkg-tmp` until the whole operation commits, so an
    // unwind mid-operation can still restore it.
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("usr/share/doc")).unwrap();
    std::fs::write(dir.path().join("usr/share/doc/marker"), b"original").unwrap();

    let mut ns = FileNamespace::new();
    let mut unwind = UnwindStack::new();

    // `doc` is an ordinary file entry (not a directory entry), so it
    // lands in the non-atomic branch: the live directory is backed up
    // to `.dpkg-tmp` before the new file is renamed into place.
    unpack_entry(
        file_entry("usr/share/doc", b"new"),
        &mut Cursor::new(b"new".to_vec()),
        dir.path(),
        "incoming",
        &[],
        &mut ns,
        &mut unwind,
        false,
    )
    .unwrap();

    assert_eq!(
        b"new".to_vec(),
        std::fs::read(dir.path().join("usr/share/doc")).unwrap()
    );
    assert!(ns.get("/usr/share/doc").unwrap().flags.no_atomic_overwrite);

    unwind.unwind_all();

    // The original directory (and its file) is back in place.
    assert!(dir.path().join("usr/share/doc").is_dir());
    assert_eq!(
        b"original".to_vec(),
        std::fs::read(dir.path().join("usr/share/doc/marker")).unwrap()
    );
}

#[test]
fn s5_process_kill_between_backup_and_final_rename_is_recovered_on_restart() {
    // §4.6 step 3 / property 6 / S5: the process dies after
    // `rename(live, live.dpkg-tmp)` but before `rename(live.dpkg-new,
    // live)`. A fresh `unpack_entry` call for the same entry must
    // observe `lstat(live)` failing, recover by renaming `dpkg-tmp`
    // back onto `live`, and then proceed normally.
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
    std::fs::write(dir.path().join("usr/bin/t"), b"old").unwrap();
    std::fs::rename(
        dir.path().join("usr/bin/t"),
        dir.path().join("usr/bin/t.dpkg-tmp"),
    )
    .unwrap();
    assert!(!dir.path().join("usr/bin/t").exists());

    let mut ns = FileNamespace::new();
    let mut unwind = UnwindStack::new();

    unpack_entry(
        file_entry("usr/bin/t", b"new"),
        &mut Cursor::new(b"new".to_vec()),
        dir.path(),
        "incoming",
        &[],
        &mut ns,
        &mut unwind,
        false,
    )
    .unwrap();

    assert_eq!(
        b"new".to_vec(),
        std::fs::read(dir.path().join("usr/bin/t")).unwrap()
    );
    // The recovery restored "old" to `live`, then this run's own commit
    // backed it up to `.dpkg-tmp` again before installing "new" --
    // discarding that backup is the action queue's job, not commit's.
    assert_eq!(
        b"old".to_vec(),
        std::fs::read(dir.path().join("usr/bin/t.dpkg-tmp")).unwrap()
    );
}
