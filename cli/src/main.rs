use anyhow::Result;
use clap::Parser;

use orgwiki_core::errors::RunError;

use orgwiki_cli::args::{Cli, Command};
use orgwiki_cli::commands::{
    OutputPreferences, cli_error_payload, format_error_chain, log_build_info, run_config,
    run_publish, run_render,
};
use orgwiki_cli::exit_codes::{error_kind_for_error, exit_code_for_error};
use orgwiki_cli::logger::{self, LogLevel, LoggerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if let Some(level) = cli.global.log_level {
        level
    } else if cli.global.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Info
    };
    logger::init(LoggerConfig {
        level: log_level,
        json_output: cli.global.json_output,
        json_only: cli.global.json_only,
    });
    log_build_info(&cli.global.build);

    let (result, output_prefs) = match cli.command {
        Command::Publish(args) => {
            let prefs = OutputPreferences::for_publish(&args, &cli.global);
            (run_publish(args, &prefs).await, prefs)
        }
        Command::Render(args) => {
            let prefs = OutputPreferences::for_render(&args, &cli.global);
            (run_render(args, &prefs).await, prefs)
        }
        Command::Config(cmd) => {
            let prefs = OutputPreferences::for_config(&cmd.command, &cli.global);
            (run_config(cmd, &prefs).await, prefs)
        }
    };

    if let Err(err) = result {
        let code = exit_code_for_error(&err);
        let kind = error_kind_for_error(&err);
        let message = format_error_chain(&err);
        tracing::error!(code, error = %message, "run failed");
        let summaries_printed = err.downcast_ref::<RunError>().is_some();
        if output_prefs.uses_json_output() && !summaries_printed {
            let payload = cli_error_payload(code, message, kind);
            let outputs = vec![payload];
            if output_prefs.pretty {
                if let Ok(json) = serde_json::to_string_pretty(&outputs) {
                    println!("{}", json);
                }
            } else if let Ok(json) = serde_json::to_string(&outputs) {
                println!("{}", json);
            }
        } else if !output_prefs.uses_json_output() {
            eprintln!("Error: {}", message);
        }
        std::process::exit(code);
    }

    Ok(())
}
