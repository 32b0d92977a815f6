//! orgsync - reconcile directory group memberships into platform role
//! bindings.
//!
//! One invocation performs one reconciliation pass: directory groups are
//! the desired state, current role bindings the observed state, and the
//! runner grants, revokes, and detaches until they agree.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::error;

use orgsync_client::{
    build_http_client, DirectoryClient, IdentityClient, PlatformClient, PlatformCredentials,
    TokenProvider,
};
use orgsync_core::{
    DirectoryService, GroupDescriptor, IdentityService, PlatformService, SyncResult,
};
use orgsync_engine::{MembershipReconciler, RunReport};

mod config;
mod logging;

use config::Config;

/// Reconcile directory groups into platform role bindings.
#[derive(Parser)]
#[command(name = "orgsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass over all matching groups
    Run(RunArgs),

    /// Parse a group identifier and show the target it encodes
    CheckGroup(CheckGroupArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Skip groups not yet started once this many seconds have passed
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[derive(Args)]
struct CheckGroupArgs {
    /// Group email identifier, e.g. sso__acme__dev__spacedeveloper@corp.example.com
    identifier: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckGroup(args) => check_group(&args.identifier),
        Commands::Run(args) => run(args).await,
    }
}

fn check_group(identifier: &str) -> ExitCode {
    match GroupDescriptor::parse(identifier) {
        Ok(descriptor) => {
            match &descriptor.space {
                Some(space) => println!(
                    "org '{}', space '{}', role {}",
                    descriptor.org, space, descriptor.role
                ),
                None if descriptor.is_fan_out() => println!(
                    "org '{}', role {} in every space",
                    descriptor.org, descriptor.role
                ),
                None => println!("org '{}', role {}", descriptor.org, descriptor.role),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: RunArgs) -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error");
            return ExitCode::from(2);
        }
    };

    match reconcile(&config, args.deadline_secs.map(Duration::from_secs)).await {
        Ok(report) => {
            print!("{report}");
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!(error = %e, "Run aborted");
            ExitCode::from(2)
        }
    }
}

async fn reconcile(config: &Config, deadline: Option<Duration>) -> SyncResult<RunReport> {
    let http = build_http_client(config.http_timeout)?;

    // The identity store and the platform share one OAuth client; the
    // directory uses its own static token.
    let backend_auth = TokenProvider::new(
        PlatformCredentials::RefreshToken {
            token_endpoint: config.token_endpoint.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
        },
        http.clone(),
    );
    let directory_auth = TokenProvider::new(
        PlatformCredentials::Bearer {
            token: config.directory_token.clone(),
        },
        http.clone(),
    );

    let directory: Arc<dyn DirectoryService> = Arc::new(DirectoryClient::new(
        config.directory_url.clone(),
        directory_auth,
        http.clone(),
    ));
    let identity: Arc<dyn IdentityService> = Arc::new(IdentityClient::new(
        config.identity_url.clone(),
        backend_auth.clone(),
        http.clone(),
    ));
    let platform: Arc<dyn PlatformService> = Arc::new(PlatformClient::new(
        config.platform_url.clone(),
        backend_auth,
        http,
    ));

    let reconciler =
        MembershipReconciler::new(directory, identity, platform, config.managed_origin.clone());
    reconciler.run(&config.group_query, deadline).await
}
