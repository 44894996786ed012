//! `mockops` command line tool
//!
//! Loads a mock service config and dispatches requests against it, lists
//! its mock operations, or converts it between YAML, JSON and TOML.

mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use commands::DispatchArgs;
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Mock service config (.yaml, .json or .toml)");

    Command::new("mockops")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dispatch requests against mock service definitions")
        .after_help(format!("Log filter is read from {}", logging::LOG_ENV))
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("dispatch")
                .about("Dispatch one request and print the result")
                .arg(config_arg.clone())
                .arg(
                    Arg::new("operation")
                        .long("operation")
                        .short('o')
                        .required(true)
                        .help("Mock operation name or bound operation name"),
                )
                .arg(
                    Arg::new("body")
                        .long("body")
                        .conflicts_with("body-file")
                        .help("Request body"),
                )
                .arg(
                    Arg::new("body-file")
                        .long("body-file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Read the request body from a file"),
                )
                .arg(Arg::new("path").long("path").help("Request path"))
                .arg(Arg::new("method").long("method").help("Request method"))
                .arg(
                    Arg::new("header")
                        .long("header")
                        .short('H')
                        .action(ArgAction::Append)
                        .help("Request header as NAME=VALUE (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("List mock operations")
                .arg(config_arg.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Re-emit a config in another format")
                .arg(config_arg)
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to this file, format from its extension"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["yaml", "json", "toml"])
                        .help("Output format"),
                ),
        )
}

fn config_path(args: &ArgMatches) -> Result<PathBuf> {
    args.get_one::<PathBuf>("config")
        .cloned()
        .context("--config is required")
}

fn dispatch_args(args: &ArgMatches) -> Result<DispatchArgs> {
    let body = match args.get_one::<PathBuf>("body-file") {
        Some(file) => std::fs::read_to_string(file)
            .with_context(|| format!("failed to read body from {}", file.display()))?,
        None => args.get_one::<String>("body").cloned().unwrap_or_default(),
    };
    Ok(DispatchArgs {
        config: config_path(args)?,
        operation: args
            .get_one::<String>("operation")
            .cloned()
            .context("--operation is required")?,
        body,
        path: args.get_one::<String>("path").cloned(),
        method: args.get_one::<String>("method").cloned(),
        headers: args
            .get_many::<String>("header")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
    })
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("dispatch", args)) => {
            println!("{}", commands::dispatch(&dispatch_args(args)?)?);
        }
        Some(("inspect", args)) => {
            print!("{}", commands::inspect(&config_path(args)?, args.get_flag("json"))?);
        }
        Some(("convert", args)) => {
            let format = args
                .get_one::<String>("format")
                .map(|name| commands::parse_format(name))
                .transpose()?;
            let output = args.get_one::<PathBuf>("output");
            if let Some(text) = commands::convert(&config_path(args)?, output.map(PathBuf::as_path), format)? {
                print!("{text}");
            }
        }
        Some((other, _)) => anyhow::bail!("unknown subcommand [{other}]"),
        None => anyhow::bail!("no subcommand given"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("mockops: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn parses_dispatch_headers() {
        let matches = cli()
            .try_get_matches_from([
                "mockops", "dispatch", "-c", "svc.yaml", "-o", "GetInvoice", "--body", "<a/>",
                "-H", "A=1", "-H", "B=2",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let parsed = dispatch_args(args).unwrap();

        assert_eq!(parsed.config, PathBuf::from("svc.yaml"));
        assert_eq!(parsed.body, "<a/>");
        assert_eq!(parsed.headers, vec!["A=1".to_string(), "B=2".to_string()]);
    }

    #[test]
    fn body_and_body_file_conflict() {
        let result = cli().try_get_matches_from([
            "mockops", "dispatch", "-c", "s.yaml", "-o", "x", "--body", "a", "--body-file", "b",
        ]);
        assert!(result.is_err());
    }
}
