/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! `snapmod [options] in.z80 [out.z80]` modifies a 48K **Z80** snapshot.
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process;

use clap::{clap_app, crate_version, ArgMatches};
use log::debug;

use zxdoc::formats::patch;
use zxdoc::formats::z80::{load_z80, save_z80, REGISTER_NAMES};

const REG_HELP: &str = "\
Usage: -r name=value, --reg name=value

Set the value of a register or register pair. For example:

  --reg hl=32768
  --reg b=17

To set the value of an alternate (shadow) register, use the '^' prefix:

  --reg ^hl=10072

Recognised register names are:
";

const STATE_HELP: &str = "\
Usage: -s name=value, --state name=value

Set a hardware state attribute. Recognised names and their default values are:

  border - border colour (default=0)
  iff    - interrupt flip-flop: 0=disabled, 1=enabled (default=1)
  im     - interrupt mode (default=1)";

fn main() {
    env_logger::init();
    if let Err(error) = run() {
        eprintln!("Error: {}", error);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = clap_app!(snapmod =>
        (version: crate_version!())
        (about: "Modify a 48K Z80 snapshot")
        (@arg force: -f --force "Overwrite an existing snapshot")
        (@arg moves: -m --("move") +takes_value +multiple number_of_values(1)
            value_name("src,size,dest")
            "Move a block of bytes of the given size from src to dest. \
             This option may be used multiple times")
        (@arg pokes: -p --poke +takes_value +multiple number_of_values(1)
            value_name("a[-b[-c]],[^+]v")
            "POKE N,v for N in {a, a+c, a+2c..., b}. Prefix 'v' with '^' to \
             perform an XOR operation, or '+' to perform an ADD operation. \
             This option may be used multiple times")
        (@arg reg: -r --reg +takes_value +multiple number_of_values(1)
            value_name("name=value")
            "Set the value of a register. Do '--reg help' for more \
             information. This option may be used multiple times")
        (@arg state: -s --state +takes_value +multiple number_of_values(1)
            value_name("name=value")
            "Set a hardware state attribute. Do '--state help' for more \
             information. This option may be used multiple times")
        (@arg INFILE: "The snapshot to modify")
        (@arg OUTFILE: "The file to write (defaults to INFILE)")
    ).get_matches();

    let values = |name| matches.values_of(name).into_iter().flatten();
    if values("reg").any(|spec| spec == "help") {
        println!("{}\n  {}", REG_HELP, REGISTER_NAMES.join(", "));
        return Ok(());
    }
    if values("state").any(|spec| spec == "help") {
        println!("{}", STATE_HELP);
        return Ok(());
    }
    let infile = match matches.value_of("INFILE") {
        Some(infile) => infile,
        None => {
            eprintln!("{}", matches.usage());
            process::exit(2);
        }
    };
    if !infile.to_ascii_lowercase().ends_with(".z80") {
        return Err("Unrecognised input snapshot type".into());
    }
    let outfile = matches.value_of("OUTFILE").unwrap_or(infile);
    if !matches.is_present("force") && Path::new(outfile).is_file() {
        println!("{}: file already exists; use -f to overwrite", outfile);
        return Ok(());
    }
    modify(&matches, infile, outfile)
}

fn modify(matches: &ArgMatches, infile: &str, outfile: &str)
    -> Result<(), Box<dyn Error>>
{
    let (mut header, mut snapshot) = load_z80(File::open(infile)?)?;
    debug!("loaded {} as {:?}", infile, header.version());
    for spec in matches.values_of("moves").into_iter().flatten() {
        patch::move_block(&mut snapshot, spec)?;
    }
    for spec in matches.values_of("pokes").into_iter().flatten() {
        patch::poke(&mut snapshot, spec)?;
    }
    for spec in matches.values_of("reg").into_iter().flatten() {
        header.set_register(spec)?;
    }
    for spec in matches.values_of("state").into_iter().flatten() {
        header.set_state(spec)?;
    }
    save_z80(&header, &snapshot, BufWriter::new(File::create(outfile)?))?;
    debug!("written {}", outfile);
    Ok(())
}
