//! CLI definitions for `dynargs`
//!
//! This module defines the CLI structure using clap's derive macros.
//! Everything after `--` is handed to the dynamic parser.

use clap::{Arg, Command, Parser};

/// Default name of the argument that points at a YAML config file.
pub const DEFAULT_CONFIG_ARG: &str = "conf";

/// Parse arbitrary `--a.b.c value` arguments into a YAML namespace
#[derive(Parser, Debug)]
#[command(name = "dynargs", author, version, about, long_about = None)]
pub struct Cli {
    /// Argument whose value names a YAML config file to merge
    #[arg(long)]
    pub config_arg: Option<String>,

    /// Path to a parser options file (YAML)
    #[arg(long)]
    pub options: Option<String>,

    /// Skip type unification when sources repeat a key
    #[arg(long)]
    pub no_type_check: bool,

    /// Declare a static argument, NAME or NAME=DEFAULT (repeatable)
    #[arg(short, long = "declare", value_name = "NAME[=DEFAULT]")]
    pub declare: Vec<String>,

    /// Dotted paths to read from the namespace, counting them as used
    #[arg(long, value_delimiter = ',')]
    pub consult: Vec<String>,

    /// Drop values read fewer than N times (default from options)
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "0")]
    pub trim: Option<u64>,

    /// Write the YAML to this file as well as stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Render each value with its reference count
    #[arg(long)]
    pub ref_counts: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,

    /// Argument tokens to parse
    #[arg(last = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Build a clap command from the `--declare` specs, if any were given.
    pub fn declared_command(&self) -> Option<Command> {
        if self.declare.is_empty() {
            return None;
        }
        let command = self
            .declare
            .iter()
            .fold(Command::new("declared").disable_help_flag(true), |command, spec| {
                command.arg(declared_arg(spec))
            });
        Some(command)
    }

    /// Trim threshold: an explicit `--trim N`, or `fallback` for a bare `--trim`.
    pub fn trim_threshold(&self, fallback: u64) -> Option<u64> {
        self.trim.map(|n| if n == 0 { fallback } else { n })
    }
}

fn declared_arg(spec: &str) -> Arg {
    let (name, default) = match spec.split_once('=') {
        Some((name, default)) => (name, Some(default)),
        None => (spec, None),
    };
    let arg = Arg::new(name.to_string()).long(name.to_string());
    match default {
        Some(default) => arg.default_value(default.to_string()),
        None => arg,
    }
}
