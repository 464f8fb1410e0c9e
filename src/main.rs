//! RAX FTP Client - Entry Point
//!
//! Uploads or downloads one file: `rax-ftp-client put|get <FILE> <URL>`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::{info, trace, warn};

use rax_ftp_client::utils::logging::setup_logging;
use rax_ftp_client::{ClientConfig, FtpClient, TransferOptions, TransferStatus};

const ARG_FILE: &str = "file";
const ARG_URL: &str = "url";
const ARG_CONFIG: &str = "config";
const ARG_VERBOSE: &str = "verbose";

const EXIT_CANCELLED: u8 = 130;

fn transfer_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(
            Arg::new(ARG_FILE)
                .help("local file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new(ARG_URL)
                .help("ftp://[user[:password]@]host[:port]/path[;type=a|i]")
                .value_name("URL")
                .required(true),
        )
}

fn build_cli_args() -> Command {
    Command::new("rax-ftp-client")
        .about("Upload or download a single file over FTP")
        .subcommand_required(true)
        .arg(
            Arg::new(ARG_CONFIG)
                .help("configuration file")
                .value_name("PATH")
                .short('c')
                .long("config")
                .global(true),
        )
        .arg(
            Arg::new(ARG_VERBOSE)
                .help("show verbose message")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .global(true),
        )
        .subcommand(transfer_command("put", "upload FILE to URL"))
        .subcommand(transfer_command("get", "download URL into FILE"))
}

fn load_config(args: &ArgMatches) -> anyhow::Result<ClientConfig> {
    let config = match args.get_one::<String>(ARG_CONFIG) {
        Some(path) => ClientConfig::load_from(&[path.as_str()])
            .with_context(|| format!("failed to load config from {path}"))?,
        None => ClientConfig::load().context("failed to load config")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = build_cli_args().get_matches();

    let verbose_level = args.get_count(ARG_VERBOSE);
    setup_logging(verbose_level);

    let config = load_config(&args)?;
    let client = FtpClient::new(config);

    let Some((subcommand, sub_args)) = args.subcommand() else {
        return Ok(ExitCode::FAILURE);
    };
    let file = sub_args
        .get_one::<PathBuf>(ARG_FILE)
        .cloned()
        .context("missing FILE")?;
    let url = sub_args.get_one::<String>(ARG_URL).context("missing URL")?;

    let options = TransferOptions::new().with_progress(|bytes| trace!("{bytes} bytes transferred"));
    let handle = match subcommand {
        "put" => client.put(file, url, options),
        "get" => client.get(file, url, options),
        other => anyhow::bail!("unknown subcommand {other}"),
    };

    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling transfer");
            cancel.cancel();
        }
    });

    let outcome = handle.await;
    let code = match (TransferStatus::of(&outcome), &outcome) {
        (TransferStatus::Success, Ok(result)) => {
            info!(
                "{subcommand} done: {} bytes in {:?}",
                result.bytes_transferred, result.duration
            );
            ExitCode::SUCCESS
        }
        (TransferStatus::Cancelled, _) => ExitCode::from(EXIT_CANCELLED),
        // errors were already logged by the client
        _ => ExitCode::FAILURE,
    };
    Ok(code)
}
