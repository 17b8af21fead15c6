//! Dataplane Harness - operator CLI
//!
//! Bootstraps a test session from the environment and exercises the
//! dataplane API from a shell.

use anyhow::Context;
use aws_config::SdkConfig;
use clap::{Parser, Subcommand};
use dataplane_harness::config::{HarnessSettings, TestEnv};
use dataplane_harness::logging::init_subscriber;
use dataplane_harness::s3::{upload_sample_media, S3MediaUploader};
use dataplane_harness::session::{load_sdk_config, TestSession};
use dataplane_harness::stack::{resolve_stack_resources, CloudFormationOutputs, StackResources};
use std::path::PathBuf;
use tracing::info;

/// Dataplane Harness - integration fixtures for the dataplane API
#[derive(Parser, Debug)]
#[command(name = "dataplane-harness")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional settings file (YAML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and print the stack resources as JSON
    Resources,
    /// Upload the sample media to the dataplane bucket
    Upload,
    /// Run one create / checkout / checkin / metadata / delete cycle
    Smoke,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_subscriber(&args.log_level, args.json_logs)?;
    info!("Starting dataplane-harness v{}", env!("CARGO_PKG_VERSION"));

    let settings = match &args.settings {
        Some(path) => {
            let settings = HarnessSettings::load(path)?;
            info!("Loaded settings from {:?}", path);
            settings
        }
        None => HarnessSettings::default(),
    };

    match args.command {
        Command::Resources => {
            let env = TestEnv::from_env()?;
            let sdk_config = load_sdk_config(&env).await;
            let resources = resolve(&env, &sdk_config).await?;
            println!("{}", serde_json::to_string_pretty(&resources)?);
        }
        Command::Upload => {
            let env = TestEnv::from_env()?;
            let sdk_config = load_sdk_config(&env).await;
            let resources = resolve(&env, &sdk_config).await?;
            let uploader = S3MediaUploader::new(&sdk_config);
            let uploaded = upload_sample_media(&uploader, &env, &resources, &settings).await?;
            println!("s3://{}/{}", uploaded.bucket, uploaded.key);
        }
        Command::Smoke => smoke(settings).await?,
    }

    Ok(())
}

async fn resolve(env: &TestEnv, sdk_config: &SdkConfig) -> anyhow::Result<StackResources> {
    let stacks = CloudFormationOutputs::new(sdk_config);
    let resources = resolve_stack_resources(&stacks, &env.region, &env.stack_name).await?;
    Ok(resources)
}

async fn smoke(settings: HarnessSettings) -> anyhow::Result<()> {
    let session = TestSession::from_environment_with(settings).await?;
    let api = session.api()?;

    let response = api.create_asset().await?;
    println!("POST /create -> {}", response.status());
    let created: serde_json::Value = response.json().await?;
    let asset_id = created
        .get("AssetId")
        .and_then(serde_json::Value::as_str)
        .context("create response carries no AssetId")?
        .to_string();

    let status = api.checkout_asset(&asset_id).await?.status();
    println!("POST /checkout/{} -> {}", asset_id, status);

    let status = api.list_checkouts().await?.status();
    println!("GET /checkouts -> {}", status);

    let status = api.checkin_asset(&asset_id).await?.status();
    println!("POST /checkin/{} -> {}", asset_id, status);

    let status = api.get_all_metadata(&asset_id, None).await?.status();
    println!("GET metadata/{} -> {}", asset_id, status);

    let status = api.delete_asset(&asset_id).await?.status();
    println!("DELETE metadata/{} -> {}", asset_id, status);

    Ok(())
}
