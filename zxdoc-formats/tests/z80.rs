/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
use rand::Rng;

use zxdoc_formats::patch;
use zxdoc_formats::snapshot::PAGE_SIZE;
use zxdoc_formats::z80::*;
use zxdoc_formats::Snapshot;

const HEADER_V1_LEN: usize = 30;
const HEADER_EX_V2_LEN: usize = 23;
const HEADER_EX_V3_LEN: usize = 54;

fn random_ram() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..3 * PAGE_SIZE).map(|_| {
        match rng.gen_range(0..4) {
            0 => rng.gen(),
            1 => 0xED,
            _ => 0
        }
    }).collect()
}

fn v1_file(ram: &[u8], compressed: bool) -> Vec<u8> {
    let mut data = vec![0u8; HEADER_V1_LEN];
    data[6] = 1;
    if compressed {
        data[12] = 0x20;
        data.extend_from_slice(&compress(ram));
        data.extend_from_slice(&[0, 0xED, 0xED, 0]);
    }
    else {
        data.extend_from_slice(ram);
    }
    data
}

// A bare extended header with an empty page list parses as a blank snapshot.
fn extended_header(ext_len: usize) -> Z80Header {
    let mut data = vec![0u8; 32 + ext_len];
    data[30] = ext_len as u8;
    let (header, _) = load_z80(&data[..]).unwrap();
    header
}

#[test]
fn v1_uncompressed_loads() {
    let ram = random_ram();
    let (header, snapshot) = load_z80(&v1_file(&ram, false)[..]).unwrap();
    assert_eq!(header.version(), Z80Version::V1);
    assert_eq!(snapshot.ram(), &ram[..]);
}

#[test]
fn v1_compressed_round_trips() {
    let ram = random_ram();
    let (header, snapshot) = load_z80(&v1_file(&ram, true)[..]).unwrap();
    assert_eq!(snapshot.ram(), &ram[..]);
    let mut out = Vec::new();
    save_z80(&header, &snapshot, &mut out).unwrap();
    let (header2, snapshot2) = load_z80(&out[..]).unwrap();
    assert_eq!(header2.version(), Z80Version::V1);
    assert!(header2.flags1().is_mem_compressed());
    assert_eq!(snapshot2.ram(), &ram[..]);
}

#[test]
fn v2_and_v3_round_trip() {
    let ram = random_ram();
    let snapshot = Snapshot::from_ram48(&ram);
    for &ext_len in &[HEADER_EX_V2_LEN, HEADER_EX_V3_LEN] {
        let header = extended_header(ext_len);
        let mut out = Vec::new();
        save_z80(&header, &snapshot, &mut out).unwrap();
        let (header2, snapshot2) = load_z80(&out[..]).unwrap();
        assert_eq!(header2.version(), header.version());
        assert_eq!(snapshot2.ram(), &ram[..]);
    }
}

#[test]
fn hardware_mode_is_checked_per_version() {
    let mut data = vec![0u8; 32 + HEADER_EX_V2_LEN];
    data[30] = HEADER_EX_V2_LEN as u8;
    data[34] = 3;
    assert!(load_z80(&data[..]).is_err());
    let mut data = vec![0u8; 32 + HEADER_EX_V3_LEN];
    data[30] = HEADER_EX_V3_LEN as u8;
    data[34] = 3;
    assert!(load_z80(&data[..]).is_ok());
}

#[test]
fn patched_registers_and_memory_survive_a_round_trip() {
    let (mut header, mut snapshot) =
        load_z80(&v1_file(&vec![0; 3 * PAGE_SIZE], false)[..]).unwrap();
    header.set_register("sp=$8000").unwrap();
    header.set_register("^hl=1234").unwrap();
    header.set_state("border=3").unwrap();
    patch::poke(&mut snapshot, "$8000-$8002,201").unwrap();
    patch::move_block(&mut snapshot, "$8000,3,$9000").unwrap();
    let mut out = Vec::new();
    save_z80(&header, &snapshot, &mut out).unwrap();
    let (header2, snapshot2) = load_z80(&out[..]).unwrap();
    assert_eq!(&header2.as_slice()[8..10], &[0x00, 0x80]);
    assert_eq!(&header2.as_slice()[19..21], &1234u16.to_le_bytes()[..]);
    assert_eq!(header2.flags1().border_color(), 3);
    assert_eq!(&snapshot2.as_slice()[0x8000..0x8003], &[201; 3]);
    assert_eq!(&snapshot2.as_slice()[0x9000..0x9003], &[201; 3]);
}
