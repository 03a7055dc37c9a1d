//! dynargs
//!
//! Parses arbitrary `--a.b.c value` tokens (plus an optional YAML config file)
//! into a hierarchical namespace and prints it as YAML.

use anyhow::Result;
use clap::Parser;
use dynamic_argparse::cli::{Cli, DEFAULT_CONFIG_ARG};
use dynamic_argparse::config::{self, ParserOptions};
use dynamic_argparse::logging::{LogTarget, init_logging};
use dynamic_argparse::{ArgError, ClapStaticParser, DynamicParser, Namespace, Resolved};
use std::path::Path;
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let options = load_options(&cli)?;
    debug!(?options, "Parser options");

    let mut parser = DynamicParser::new().with_options(options.clone());
    if let Some(command) = cli.declared_command() {
        parser = parser.with_static_parser(ClapStaticParser::new(command));
    }

    let mut namespace = match parser.parse(cli.args.as_slice(), &options.config_arg) {
        Ok(namespace) => namespace,
        Err(ArgError::StaticParser(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };
    info!(keys = namespace.keys().count(), "Parsed arguments");

    consult(&mut namespace, &cli.consult);

    if let Some(min_ref_count) = cli.trim_threshold(options.trim_min_ref_count) {
        namespace.trim(min_ref_count);
        debug!(min_ref_count, "Trimmed unused arguments");
    }

    let output = cli.output.as_deref().map(Path::new);
    let yaml = if cli.ref_counts {
        config::dump(&namespace.to_nested_mapping(true), output)?
    } else {
        namespace.to_yaml(output)?
    };
    print!("{yaml}");

    Ok(())
}

/// Layer parser options: defaults, then `--options FILE`, then CLI flags.
fn load_options(cli: &Cli) -> Result<ParserOptions> {
    let mut options = match &cli.options {
        Some(path) => ParserOptions::load(path)?,
        None => ParserOptions::default(),
    };

    if let Some(config_arg) = &cli.config_arg {
        options.config_arg = config_arg.clone();
    } else if cli.options.is_none() {
        options.config_arg = DEFAULT_CONFIG_ARG.to_string();
    }
    if cli.no_type_check {
        options.check_type_consistency = false;
    }
    Ok(options)
}

/// Read each path once so trimming keeps it.
fn consult(namespace: &mut Namespace, paths: &[String]) {
    for path in paths {
        match namespace.get(path) {
            Resolved::Value(value) => debug!(%path, %value, "Consulted value"),
            Resolved::Node(_) => debug!(%path, "Consulted node"),
            Resolved::Pending(_) => warn!(%path, "Consulted path is not set"),
        }
    }
}
