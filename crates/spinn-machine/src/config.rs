//! The `[Machine]` section of a `.cfg` configuration file.
//!
//! Configuration files are INI-style: `[Section]` headers, `key = value`
//! lines, `#` or `;` comment lines. Only the `[Machine]` section is read
//! here; other sections belong to other tools and are skipped. The
//! value `None` (any case) leaves a key unset.

use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SpinnMachineError};
use crate::ignores::{IgnoreChip, IgnoreCore, IgnoreLink};

/// Everything the `[Machine]` section can configure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineConfig {
    /// Board version number (2-5).
    pub version: Option<u32>,
    /// Acceptable board versions, as a cross-check on `version`.
    pub versions: Option<Vec<u32>>,
    /// Width of the machine in chips.
    pub width: Option<u32>,
    /// Height of the machine in chips.
    pub height: Option<u32>,
    /// Cap on the SDRAM reported per chip, in bytes.
    pub max_sdram_allowed_per_chip: Option<u32>,
    /// Whether to silently repair machines with isolated chips or
    /// one-way links, rather than reject them.
    pub repair_machine: bool,
    /// Cores to leave out of the machine.
    pub down_cores: Vec<IgnoreCore>,
    /// Chips to leave out of the machine.
    pub down_chips: Vec<IgnoreChip>,
    /// Links to leave out of the machine.
    pub down_links: Vec<IgnoreLink>,
    /// Cap on the cores used per chip.
    pub max_machine_core: Option<u8>,
    /// URL of a remote SpiNNaker allocation service.
    pub remote_spinnaker_url: Option<String>,
    /// Host name of a spalloc server.
    pub spalloc_server: Option<String>,
    /// Host name or IP address of the machine itself.
    pub machine_name: Option<String>,
    /// Whether to build a virtual machine instead of talking to hardware.
    pub virtual_board: bool,
}

impl MachineConfig {
    /// Parse the `[Machine]` section out of configuration text.
    ///
    /// # Errors
    ///
    /// On malformed lines, unknown `[Machine]` keys, or values that fail
    /// their key's grammar.
    pub fn parse_str(text: &str) -> Result<MachineConfig> {
        let mut config = MachineConfig::default();
        let mut in_machine = false;
        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(section) = line.strip_prefix('[') {
                let section = section.strip_suffix(']').ok_or_else(|| {
                    SpinnMachineError::parse_error(format!(
                        "unterminated section header on line {}: {raw:?}",
                        number + 1
                    ))
                })?;
                in_machine = section.eq_ignore_ascii_case("Machine");
                continue;
            }
            if !in_machine {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                SpinnMachineError::parse_error(format!(
                    "expected key = value on line {}: {raw:?}",
                    number + 1
                ))
            })?;
            config.set(key.trim(), value.trim())?;
        }
        Ok(config)
    }

    /// Parse the `[Machine]` section of a configuration file.
    ///
    /// # Errors
    ///
    /// On I/O failure or anything [`parse_str`](Self::parse_str) rejects.
    pub fn read(path: &Path) -> Result<MachineConfig> {
        debug!("reading machine configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        MachineConfig::parse_str(&text)
    }

    /// Apply one `key = value` pair.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // "None" unsets; the defaults already model every key as unset.
        if value.eq_ignore_ascii_case("none") && key != "down_cores"
            && key != "down_chips" && key != "down_links"
        {
            return Ok(());
        }
        match key {
            "version" => self.version = Some(parse_int(key, value)?),
            "versions" => {
                let mut versions = Vec::new();
                for part in value.split(',') {
                    versions.push(parse_int("versions", part.trim())?);
                }
                self.versions = Some(versions);
            }
            "width" => self.width = Some(parse_int(key, value)?),
            "height" => self.height = Some(parse_int(key, value)?),
            "max_sdram_allowed_per_chip" => {
                self.max_sdram_allowed_per_chip = Some(parse_int(key, value)?);
            }
            "repair_machine" => self.repair_machine = parse_bool(key, value)?,
            "down_cores" => self.down_cores = IgnoreCore::parse_string(value)?,
            "down_chips" => self.down_chips = IgnoreChip::parse_string(value)?,
            "down_links" => self.down_links = IgnoreLink::parse_string(value)?,
            "max_machine_core" => {
                let cores: u32 = parse_int(key, value)?;
                self.max_machine_core = Some(u8::try_from(cores).map_err(|_| {
                    SpinnMachineError::invalid_parameter(
                        "max_machine_core",
                        value.to_string(),
                        "out of range",
                    )
                })?);
            }
            "remote_spinnaker_url" => self.remote_spinnaker_url = Some(value.to_string()),
            "spalloc_server" => self.spalloc_server = Some(value.to_string()),
            "machine_name" => self.machine_name = Some(value.to_string()),
            "virtual_board" => self.virtual_board = parse_bool(key, value)?,
            _ => {
                return Err(SpinnMachineError::parse_error(format!(
                    "unknown [Machine] key: {key:?}"
                )))
            }
        }
        Ok(())
    }

    /// Render the configuration back as a `[Machine]` section.
    ///
    /// Only set keys appear; down lists are omitted (they do not
    /// round-trip through the parsed form once ranges are expanded).
    #[must_use]
    pub fn to_cfg_string(&self) -> String {
        let mut out = String::from("[Machine]\n");
        if let Some(v) = self.version {
            let _ = writeln!(out, "version = {v}");
        }
        if let Some(w) = self.width {
            let _ = writeln!(out, "width = {w}");
        }
        if let Some(h) = self.height {
            let _ = writeln!(out, "height = {h}");
        }
        if let Some(s) = self.max_sdram_allowed_per_chip {
            let _ = writeln!(out, "max_sdram_allowed_per_chip = {s}");
        }
        if self.repair_machine {
            let _ = writeln!(out, "repair_machine = True");
        }
        if let Some(c) = self.max_machine_core {
            let _ = writeln!(out, "max_machine_core = {c}");
        }
        if let Some(url) = &self.remote_spinnaker_url {
            let _ = writeln!(out, "remote_spinnaker_url = {url}");
        }
        if let Some(server) = &self.spalloc_server {
            let _ = writeln!(out, "spalloc_server = {server}");
        }
        if let Some(name) = &self.machine_name {
            let _ = writeln!(out, "machine_name = {name}");
        }
        if self.virtual_board {
            let _ = writeln!(out, "virtual_board = True");
        }
        out
    }
}

fn parse_int(key: &str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| {
        SpinnMachineError::invalid_parameter(key, value.to_string(), "expected an integer")
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(SpinnMachineError::invalid_parameter(
            key,
            value.to_string(),
            "expected a boolean",
        )),
    }
}
