//! Single-entry tar archives: the wire format of one boundary crossing.
//! One file per archive, read exactly once, never cached.

use std::io::Read;

use crate::{Result, TransferError};

/// Wrap one file's content in a tar archive whose single entry is named
/// `name` (the destination's base name).
pub fn pack_single(name: &str, content: &[u8]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();

    builder
        .append_data(&mut header, name, content)
        .map_err(|e| TransferError::Archive(e.to_string()))?;

    builder
        .into_inner()
        .map_err(|e| TransferError::Archive(e.to_string()))
}

/// Read the first entry of an archive stream. Anything past the first
/// entry is ignored; an entry-less archive is an error.
pub fn unpack_first(archive: &[u8]) -> Result<Vec<u8>> {
    let mut reader = tar::Archive::new(archive);
    let mut entries = reader
        .entries()
        .map_err(|e| TransferError::Archive(e.to_string()))?;

    let entry = entries.next().ok_or(TransferError::EmptyArchive)?;
    let mut entry = entry.map_err(|e| TransferError::Archive(e.to_string()))?;

    let mut content = Vec::new();
    entry
        .read_to_end(&mut content)
        .map_err(|e| TransferError::Archive(e.to_string()))?;
    Ok(content)
}
