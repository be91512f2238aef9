use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, ArgGroup, CommandFactory, FromArgMatches, Parser};
use tokio::sync::watch;
use vmc_test_client::{
    broker::Broker,
    config, logger,
    provider::{self, VmcProvider},
    shell::{self, Input, Session},
};

#[derive(Parser, Debug)]
#[command(
    name = "VmcTestClient",
    disable_help_flag = true,
    group(ArgGroup::new("provider").args(["hu", "rse", "cde"]))
)]
struct Cli {
    /// Show help message. Ex: ./VmcTestClient --RSE
    #[arg(short, long, action = ArgAction::SetTrue)]
    help: bool,

    /// Set provider as HU
    #[arg(short = '1', long = "HU")]
    hu: bool,

    /// Set provider as RSE
    #[arg(short = '2', long = "RSE")]
    rse: bool,

    /// Set provider as CDE
    #[arg(short = '3', long = "CDE")]
    cde: bool,
}

fn build_message() -> String {
    format!(
        "Welcome to test Vmc, Build on {} Allowed options:",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Instance the provider registers under, or `None` when the process
/// should stop.
fn select_instance() -> Option<&'static str> {
    let mut command = Cli::command().about(build_message());
    let cli = match command
        .try_get_matches_from_mut(std::env::args_os())
        .and_then(|matches| Cli::from_arg_matches(&matches))
    {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return None;
        }
    };

    if cli.help {
        println!("{}", command.render_help());
        return None;
    }

    if cli.hu {
        println!("{} is used by consumer.", config::HU_INSTANCE);
        Some(config::HU_INSTANCE)
    } else if cli.rse {
        Some(config::RSE_INSTANCE)
    } else if cli.cde {
        Some(config::CDE_INSTANCE)
    } else {
        eprintln!("Unknown option. Use --help to see available options.");
        None
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logger::setup_logger();

    let Some(instance) = select_instance() else {
        return ExitCode::FAILURE;
    };

    let broker = match Broker::local() {
        Ok(broker) => broker,
        Err(e) => {
            log::error!("Failed to start the local broker: {e}");
            return ExitCode::FAILURE;
        }
    };

    let provider = Arc::new(VmcProvider::new(broker.clone(), instance));
    let (shutdown, shutdown_rx) = watch::channel(false);
    let stub_task = tokio::spawn(provider::run_stub(provider.clone(), shutdown_rx));

    let loop_task = tokio::task::spawn_blocking(move || {
        let mut session = Session::new(&broker, Some(provider), Input::stdin(), instance);
        shell::primary_loop(&mut session, &shell::commands());
    });

    if let Err(e) = loop_task.await {
        log::error!("Interactive loop failed: {e}");
    }

    let _ = shutdown.send(true);
    match stub_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Provider stopped with error: {e}"),
        Err(e) => log::error!("Provider task failed: {e}"),
    }

    log::info!("Exiting the main thread.");
    ExitCode::SUCCESS
}
