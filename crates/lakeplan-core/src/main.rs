use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use lakeplan_core::{
    InMemoryOrchestrator, JsonFileConfigStore, LaunchConfig, LaunchRequest, PipelineLauncher,
};
use std::path::PathBuf;
use std::sync::Arc;

mod logging;

fn target_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("records")
                .long("records")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("JSON file holding the stored configuration records"),
        )
        .arg(
            Arg::new("tenant")
                .long("tenant")
                .help("Tenant identifier"),
        )
        .arg(
            Arg::new("pipeline-type")
                .long("pipeline-type")
                .help("bulk_insert, incremental_upsert or continuous_upsert"),
        )
}

fn cli() -> Command {
    Command::new("lakeplan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile tenant ingestion configuration into job plans and launch them")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("TOML settings file (defaults to environment variables)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log level when RUST_LOG is unset (defaults to the configured level)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            target_args(Command::new("compile"))
                .about("Print the job document for a tenant and pipeline type")
                .mut_arg("tenant", |arg| arg.required(true))
                .mut_arg("pipeline-type", |arg| arg.required(true)),
        )
        .subcommand(
            target_args(Command::new("invoke"))
                .about("Run one launch invocation against an in-memory orchestrator")
                .arg(
                    Arg::new("payload")
                        .long("payload")
                        .conflicts_with_all(["tenant", "pipeline-type"])
                        .help("Raw invocation payload as JSON"),
                ),
        )
}

fn load_settings(matches: &ArgMatches) -> anyhow::Result<LaunchConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings from {}", path.display()))?;
            Ok(LaunchConfig::from_toml_str(&raw)?)
        }
        None => Ok(LaunchConfig::from_env()?),
    }
}

fn launcher(settings: LaunchConfig, args: &ArgMatches) -> anyhow::Result<PipelineLauncher> {
    let records = args
        .get_one::<PathBuf>("records")
        .context("--records is required")?;
    Ok(PipelineLauncher::new(
        settings,
        Arc::new(JsonFileConfigStore::new(records)),
        Arc::new(InMemoryOrchestrator::new()),
    ))
}

fn invocation_payload(args: &ArgMatches) -> anyhow::Result<serde_json::Value> {
    if let Some(raw) = args.get_one::<String>("payload") {
        return serde_json::from_str(raw).context("parsing --payload");
    }
    let tenant = args
        .get_one::<String>("tenant")
        .context("either --payload or --tenant is required")?;
    let pipeline_type = args
        .get_one::<String>("pipeline-type")
        .context("either --payload or --pipeline-type is required")?;
    Ok(serde_json::to_value(LaunchRequest::new(tenant, pipeline_type))?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let settings = load_settings(&matches)?;

    let level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| settings.log_level.clone());
    logging::init(&level, matches.get_flag("json-logs"));

    match matches.subcommand() {
        Some(("compile", args)) => {
            let tenant = args.get_one::<String>("tenant").context("--tenant is required")?;
            let pipeline_type = args
                .get_one::<String>("pipeline-type")
                .context("--pipeline-type is required")?;

            let document = launcher(settings, args)?
                .compile(tenant, pipeline_type)
                .await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Some(("invoke", args)) => {
            let payload = invocation_payload(args)?;
            let response = launcher(settings, args)?.handle_value(payload).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_accepted() {
                std::process::exit(1);
            }
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
