//! `spinn`: command-line tools for SpiNNaker machine descriptions.
//!
//! ```text
//! USAGE:
//!   spinn virtual --width 8 --height 8     Build a machine and summarise it
//!   spinn where-is 3 4 --cfg spynnaker.cfg Locate a chip on its board
//!   spinn check-cfg spynnaker.cfg          Parse a config and echo it back
//!   spinn to-json out.json --width 8 ...   Write a machine as JSON
//!   spinn from-json machine.json           Summarise a JSON machine file
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use spinn_machine::json::{machine_from_json_path, to_json_path};
use spinn_machine::{machine_repair, Machine, MachineConfig, VirtualMachineBuilder};

#[derive(Parser)]
#[command(name = "spinn", about = "SpiNNaker machine description CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

/// Where the machine to operate on comes from.
#[derive(Args)]
struct MachineArgs {
    /// Width of the machine in chips.
    #[arg(long)]
    width: Option<u32>,

    /// Height of the machine in chips.
    #[arg(long)]
    height: Option<u32>,

    /// A spynnaker.cfg style file with a [Machine] section.
    #[arg(long)]
    cfg: Option<PathBuf>,

    /// Remove unreachable chips and one-way links instead of failing.
    #[arg(long)]
    repair: bool,
}

#[derive(Subcommand)]
enum Cmd {
    /// Build a virtual machine and print a summary.
    Virtual {
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Print where a chip sits, globally and on its board.
    WhereIs {
        /// X coordinate of the chip.
        x: u32,
        /// Y coordinate of the chip.
        y: u32,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Parse a configuration file and echo the understood values.
    CheckCfg {
        /// The file to parse.
        path: PathBuf,
    },
    /// Build a virtual machine and write it as JSON.
    ToJson {
        /// Where to write the JSON file.
        out: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Read a JSON machine file and print a summary.
    FromJson {
        /// The file to read.
        path: PathBuf,
    },
}

impl MachineArgs {
    fn build(&self) -> Result<Machine> {
        let mut config = match &self.cfg {
            Some(path) => MachineConfig::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => MachineConfig::default(),
        };
        if self.width.is_some() {
            config.width = self.width;
        }
        if self.height.is_some() {
            config.height = self.height;
        }
        if config.width.is_none() && config.version.is_none() {
            bail!("no machine size given; pass --width/--height or --cfg");
        }
        debug!(
            "building a machine from width={:?} height={:?} version={:?}",
            config.width, config.height, config.version
        );
        let machine = VirtualMachineBuilder::from_config(&config)?.build()?;
        let machine = machine_repair(machine, self.repair || config.repair_machine)?;
        Ok(machine)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Virtual { machine } => cmd_virtual(&machine)?,
        Cmd::WhereIs { x, y, machine } => cmd_where_is(x, y, &machine)?,
        Cmd::CheckCfg { path } => cmd_check_cfg(&path)?,
        Cmd::ToJson { out, machine } => cmd_to_json(&out, &machine)?,
        Cmd::FromJson { path } => cmd_from_json(&path)?,
    }

    Ok(())
}

fn summarise(machine: &Machine) {
    let (cores, links) = machine.get_cores_and_link_count();

    println!("{machine}");
    println!("  version     {}", machine.version().name());
    println!("  cores       {cores} ({} user)", machine.total_available_user_cores());
    println!("  links       {links}");

    for chip in machine.ethernet_connected_chips() {
        match chip.ip_address {
            Some(ip) => println!("  ethernet    {} at {ip}", machine.where_is_chip(chip)),
            None => println!("  ethernet    {}", machine.where_is_chip(chip)),
        }
    }
}

fn cmd_virtual(args: &MachineArgs) -> Result<()> {
    let machine = args.build()?;
    summarise(&machine);
    machine.validate()?;
    Ok(())
}

fn cmd_where_is(x: u32, y: u32, args: &MachineArgs) -> Result<()> {
    let machine = args.build()?;
    println!("{}", machine.where_is_xy((x, y)));
    Ok(())
}

fn cmd_check_cfg(path: &PathBuf) -> Result<()> {
    let config =
        MachineConfig::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    print!("{}", config.to_cfg_string());
    if !config.down_chips.is_empty() {
        println!("# down chips: {}", config.down_chips.len());
    }
    if !config.down_cores.is_empty() {
        println!("# down cores: {}", config.down_cores.len());
    }
    if !config.down_links.is_empty() {
        println!("# down links: {}", config.down_links.len());
    }
    if let Some(name) = &config.machine_name {
        println!("# machine_name = {name} (physical machines are described, not contacted)");
    }
    if config.virtual_board {
        println!("# virtual_board = true");
    }
    println!(
        "# resolves to: {}",
        spinn_machine::MachineVersion::from_config(&config)?.name()
    );
    Ok(())
}

fn cmd_to_json(out: &PathBuf, args: &MachineArgs) -> Result<()> {
    let machine = args.build()?;
    to_json_path(&machine, out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("wrote {} ({} chips)", out.display(), machine.n_chips());
    Ok(())
}

fn cmd_from_json(path: &PathBuf) -> Result<()> {
    let machine = machine_from_json_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    summarise(&machine);
    Ok(())
}
