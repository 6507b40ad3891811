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

//! Reads a tar-format byte stream (the `data.tar` member of a package
//! archive, already separated from its outer container and decompressed
//! by an upstream subprocess) and emits typed entries (§4.5).

use std::io::Read;
use tracing::debug;

/// The kind of filesystem object one archive entry materializes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryType {
    /// A regular file.
    NormalFile,
    /// An additional name for a file already seen in this archive.
    Hardlink,
    /// A symbolic link.
    Symlink,
    /// A character device node.
    CharDevice,
    /// A block device node.
    BlockDevice,
    /// A directory.
    Directory,
}

/// One entry read from the archive, with its content available through
/// [ArchiveReader::read_content] while the entry is current.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Path, with any trailing slash stripped.
    pub name: String,
    /// Unix permission and type bits.
    pub mode: u32,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Size in bytes of file content following this entry (0 for
    /// non-regular types).
    pub size: u64,
    /// Modification time, seconds since the epoch.
    pub modtime: i64,
    /// What kind of object this entry describes.
    pub entry_type: EntryType,
    /// Target of a [EntryType::Symlink] or [EntryType::Hardlink] entry.
    pub link_target: Option<String>,
    /// Raw device number for [EntryType::CharDevice]/[EntryType::BlockDevice].
    pub device: Option<u64>,
}

/// Errors raised while reading the archive pipe (§4.5, §4.6 edge cases).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tar stream was malformed, or contained an entry type this
    /// engine does not understand.
    #[error("malformed archive entry: {0}")]
    Format(String),
    /// An I/O error occurred reading the pipe, or a short read without
    /// an error signalled truncation.
    #[error("i/o error reading archive: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Wraps a [tar::Archive] and yields [Entry]s plus their content.
pub struct ArchiveReader<R: Read> {
    archive: tar::Archive<R>,
}

impl<R: Read> ArchiveReader<R> {
    /// Construct a reader over an already-decompressed tar byte stream.
    pub fn new(reader: R) -> Self {
        ArchiveReader {
            archive: tar::Archive::new(reader),
        }
    }

    /// Iterate over every entry, invoking `consume` with the [Entry]
    /// metadata and a reader positioned at its content (empty for
    /// non-regular-file entries). A short read without an underlying
    /// I/O error is reported to `consume` as a truncated byte count; it
    /// is the caller's responsibility to treat that as fatal (§4.6).
    pub fn for_each_entry<F>(&mut self, mut consume: F) -> Result<(), Error>
    where
        F: FnMut(Entry, &mut dyn Read) -> Result<(), Error>,
    {
        for entry in self.archive.entries()? {
            let mut entry = entry?;
            let header = entry.header();
            let path = entry
                .path()
                .map_err(|e| Error::Format(e.to_string()))?
                .to_string_lossy()
                .trim_end_matches('/')
                .to_string();

            let entry_type = match header.entry_type() {
                tar::EntryType::Regular | tar::EntryType::Continuous => EntryType::NormalFile,
                tar::EntryType::Link => EntryType::Hardlink,
                tar::EntryType::Symlink => EntryType::Symlink,
                tar::EntryType::Char => EntryType::CharDevice,
                tar::EntryType::Block => EntryType::BlockDevice,
                tar::EntryType::Directory => EntryType::Directory,
                other => return Err(Error::Format(format!("unsupported entry type {:?}", other))),
            };

            let link_target = entry
                .link_name()
                .ok()
                .flatten()
                .map(|p| p.to_string_lossy().into_owned());

            let device = match entry_type {
                EntryType::CharDevice | EntryType::BlockDevice => {
                    let major = header.device_major().unwrap_or(None).unwrap_or(0) as u64;
                    let minor = header.device_minor().unwrap_or(None).unwrap_or(0) as u64;
                    Some((major << 32) | minor)
                }
                _ => None,
            };

            let descriptor = Entry {
                name: path,
                mode: header.mode()?,
                uid: header.uid()? as u32,
                gid: header.gid()? as u32,
                size: header.size()?,
                modtime: header.mtime()? as i64,
                entry_type,
                link_target,
                device,
            };

            debug!(name = %descriptor.name, ?descriptor.entry_type, "read archive entry");
            consume(descriptor, &mut entry)?;
        }
        Ok(())
    }
}


// vim: foldmethod=marker
