/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
use std::io::{Result, Write};

use log::debug;

use super::common::{Z80Header, Z80Version};
use super::compress::{compress, compress_v1};
use super::loader::PAGES_48K;
use crate::snapshot::{Snapshot, PAGE_SIZE};

/// Writes a 48K **Z80** snapshot in the version carried by `header`.
///
/// Version 1 output is always compressed. Versions 2 and 3 write the three
/// RAM pages in the order 8, 4, 5, each compressed independently.
pub fn save_z80<W: Write>(header: &Z80Header, snapshot: &Snapshot, mut wr: W)
    -> Result<()>
{
    match header.version() {
        Z80Version::V1 => {
            let mut header = header.clone();
            header.set_mem_compressed();
            wr.write_all(header.as_slice())?;
            let mem = compress_v1(snapshot.ram());
            debug!("Z80 v1 snapshot, {} bytes of compressed RAM", mem.len());
            wr.write_all(&mem)
        }
        version => {
            wr.write_all(header.as_slice())?;
            for &(page, address) in PAGES_48K {
                let block = compress(&snapshot.as_slice()[address..address + PAGE_SIZE]);
                let [lsb, msb] = (block.len() as u16).to_le_bytes();
                wr.write_all(&[lsb, msb, page])?;
                wr.write_all(&block)?;
            }
            debug!("Z80 {:?} snapshot, 3 pages", version);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::common::{HEADER_EX_V3_LEN, HEADER_V1_LEN, MEMORY_V1_TERM};
    use super::super::loader::load_z80;

    #[test]
    fn v1_output_is_compressed_and_terminated() {
        let mut header = Z80Header::new(Z80Version::V1, vec![0; HEADER_V1_LEN]);
        header.set_register("pc=$8000").unwrap();
        let snapshot = Snapshot::from_ram48(&[42; 0xC000]);
        let mut out = Vec::new();
        save_z80(&header, &snapshot, &mut out).unwrap();
        assert!(out[12] & 0x20 != 0);
        assert!(out.ends_with(MEMORY_V1_TERM));
        let (header2, snapshot2) = load_z80(&out[..]).unwrap();
        assert_eq!(header2.version(), Z80Version::V1);
        assert_eq!(header2.pc(), 0x8000);
        assert_eq!(snapshot2.ram(), snapshot.ram());
    }

    #[test]
    fn v3_round_trips_random_ram() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut data = vec![0u8; 32 + HEADER_EX_V3_LEN];
        data[30] = HEADER_EX_V3_LEN as u8;
        let header = Z80Header::new(Z80Version::V3, data);
        let ram: Vec<u8> = (0..0xC000)
            .map(|_| if rng.gen_bool(0.5) { rng.gen() } else { 0xED })
            .collect();
        let snapshot = Snapshot::from_ram48(&ram);
        let mut out = Vec::new();
        save_z80(&header, &snapshot, &mut out).unwrap();
        let (header2, snapshot2) = load_z80(&out[..]).unwrap();
        assert_eq!(header2.version(), Z80Version::V3);
        assert_eq!(snapshot2.ram(), &ram[..]);
    }
}
