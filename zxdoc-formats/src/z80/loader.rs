/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
use std::io::{Error, ErrorKind, Read, Result};

use log::debug;

use super::common::*;
use super::decompress::decompress;
use crate::snapshot::{Snapshot, PAGE_SIZE};

/// Page numbers of the three 48K RAM pages in versions 2 and 3, by address.
pub(super) const PAGES_48K: &[(u8, usize)] = &[
    (8, 0x4000),
    (4, 0x8000),
    (5, 0xC000),
];

/// Reads a 48K **Z80** snapshot of any version.
///
/// Version 1 is recognized by a non-zero `PC` word at offset 6; otherwise
/// the header extension length selects version 2 or 3. Snapshots of other
/// hardware than the 48K Spectrum are rejected.
pub fn load_z80<R: Read>(mut rd: R) -> Result<(Z80Header, Snapshot)> {
    let mut data = Vec::new();
    rd.read_to_end(&mut data)?;
    if data.len() < HEADER_V1_LEN {
        return Err(Error::new(ErrorKind::InvalidData, "Z80: header truncated"));
    }
    if u16::from_le_bytes([data[6], data[7]]) != 0 {
        return load_v1(&data);
    }
    if data.len() < HEADER_V1_LEN + 2 {
        return Err(Error::new(ErrorKind::InvalidData, "Z80: header truncated"));
    }
    let ext_len = u16::from_le_bytes([data[30], data[31]]) as usize;
    let version = match ext_len {
        HEADER_EX_V2_LEN => Z80Version::V2,
        HEADER_EX_V3_LEN | HEADER_EX_V3X_LEN => Z80Version::V3,
        _ => return Err(Error::new(ErrorKind::InvalidData,
                 format!("Z80: invalid header extension length: {}", ext_len)))
    };
    load_v2v3(&data, version, ext_len)
}

fn load_v1(data: &[u8]) -> Result<(Z80Header, Snapshot)> {
    let header = Z80Header::new(Z80Version::V1, data[..HEADER_V1_LEN].to_vec());
    let mem = &data[HEADER_V1_LEN..];
    let ram = if header.flags1().is_mem_compressed() {
        let end = mem.windows(MEMORY_V1_TERM.len())
                     .position(|window| window == MEMORY_V1_TERM)
                     .unwrap_or(mem.len());
        decompress(&mem[..end])
    }
    else {
        mem.to_vec()
    };
    debug!("Z80 v1 snapshot, {} bytes of RAM", ram.len());
    Ok((header, Snapshot::from_ram48(&ram)))
}

fn load_v2v3(data: &[u8], version: Z80Version, ext_len: usize)
    -> Result<(Z80Header, Snapshot)>
{
    let header_len = HEADER_V1_LEN + 2 + ext_len;
    if data.len() < header_len {
        return Err(Error::new(ErrorKind::InvalidData, "Z80: header truncated"));
    }
    let hw_mode = data[34];
    let is_48k = match version {
        Z80Version::V2 => matches!(hw_mode, 0 | 1),
        _ => matches!(hw_mode, 0 | 1 | 3)
    };
    if !is_48k {
        return Err(Error::new(ErrorKind::InvalidData,
            format!("Z80: unsupported hardware mode: {}", hw_mode)));
    }
    let header = Z80Header::new(version, data[..header_len].to_vec());
    let mut snapshot = Snapshot::new();
    let mut rest = &data[header_len..];
    while rest.len() >= 3 {
        let block_len = u16::from_le_bytes([rest[0], rest[1]]) as usize;
        let page = rest[2];
        rest = &rest[3..];
        let (block, compressed) = if block_len == 0xFFFF {
            (rest.len().min(PAGE_SIZE), false)
        }
        else {
            (rest.len().min(block_len), true)
        };
        match PAGES_48K.iter().find(|(number, _)| *number == page) {
            Some(&(_, address)) => {
                let ram = if compressed {
                    decompress(&rest[..block])
                }
                else {
                    rest[..block].to_vec()
                };
                snapshot.write_block(address, &ram[..ram.len().min(PAGE_SIZE)]);
            }
            None => debug!("Z80: skipping page {}", page)
        }
        rest = &rest[block..];
    }
    debug!("Z80 {:?} snapshot, hardware mode {}", version, hw_mode);
    Ok((header, snapshot))
}
