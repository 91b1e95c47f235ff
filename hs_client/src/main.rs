//! A terminal client for a hold'em game server.
//!
//! The client opens a synchronized session with the server, prints the table
//! whenever it changes, and reads commands from stdin.

use anyhow::{Context, Result};
use holdem_sync::{ChannelNotifier, ClientConfig, ConnectionState, Session};
use hs_client::{
    commands::{Command, HELP_TEXT, parse_command},
    display::{TableView, format_notice},
};
use pico_args::Arguments;
use std::{sync::Arc, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::timeout,
};

const HELP: &str = "\
Connect to a hold'em game server

USAGE:
  hs_client [OPTIONS]

OPTIONS:
  --server URL          Server URL  [default: $HOLDEM_SERVER_URL or http://localhost:8080]
  --name NAME           Join the table as NAME once connected
  --chips N             Starting chips when joining  [default: 1000]

FLAGS:
  -h, --help            Print help information

Other settings are read from HOLDEM_* environment variables (a .env file is
loaded if present).
";

struct Args {
    server_url: Option<String>,
    name: Option<String>,
    chips: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::builder().format_target(false).init();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server_url: pargs.opt_value_from_str("--server")?,
        name: pargs.opt_value_from_str("--name")?,
        chips: pargs.opt_value_from_str("--chips")?,
    };

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let mut config = ClientConfig::from_env().context("Invalid configuration")?;
    if let Some(server_url) = args.server_url {
        config.server_url = server_url;
        config.validate().context("Invalid --server")?;
    }
    let connect_timeout = config.connect_timeout;

    println!("Connecting to {}...", config.server_url);
    let (notifier, mut notices) = ChannelNotifier::new();
    let session = Session::spawn(config, Arc::new(notifier)).context("Failed to start session")?;

    // Redraw the table on every change and print notices as they arrive
    let mut views = session.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    print!("{}", TableView(&view));
                }
                Some(notice) = notices.recv() => println!("{}", format_notice(&notice)),
            }
        }
    });

    if let Some(name) = args.name {
        let mut views = session.subscribe();
        timeout(
            connect_timeout,
            views.wait_for(|view| view.connection == ConnectionState::Connected),
        )
        .await
        .context("Timed out connecting to server")?
        .context("Session stopped")?;

        if let Err(e) = session.join(name, args.chips).await {
            log::debug!("Join rejected: {e}");
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        let result = match command {
            Command::Quit => break,
            Command::Help => {
                print!("{HELP_TEXT}");
                continue;
            }
            Command::Action { kind, amount } => session.submit_action(kind, amount).await,
            Command::Join { name, chips } => session.join(name, chips).await,
            Command::Start => session.start_game().await,
            Command::CreateAutoGame => session.create_auto_game().await,
            Command::StartAutoGame => session.start_auto_game().await,
            Command::StopAutoGame => session.stop_auto_game().await,
            Command::State => session.request_state().await,
            Command::Reconnect => session.connect().await,
            Command::Close => session.close().await,
            Command::Reset => session.reset().await,
        };

        // Rejections are already shown as notices
        if let Err(e) = result
            && !e.is_precondition()
        {
            eprintln!("Error: {}", e.client_message());
        }
    }

    println!("Disconnecting...");
    let _ = timeout(Duration::from_secs(2), session.shutdown()).await;
    printer.abort();

    println!("\nDisconnected.");
    Ok(())
}
