//! FirestoreX CLI: secure file uploads against the hosted backend.
//!
//! Configuration comes from the environment (see `Config::from_env`). Sign in with
//! `login`, then pass the access token with `--token` or FIRESTOREX_ACCESS_TOKEN.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use firestorex_cli::{
    exit_code, is_production_env, log_error, object_path, print_json, validate_file, ErrorReport,
};
use firestorex_core::models::{Credentials, RegistrationRequest};
use firestorex_core::{ActorId, AppError, CandidateFile, Config};
use firestorex_services::telemetry::{init_tracing, LogFormat};
use firestorex_services::Services;

#[derive(Parser)]
#[command(name = "firestorex", about = "FirestoreX secure file storage CLI")]
struct Cli {
    /// Access token from `login`
    #[arg(long, global = true, env = "FIRESTOREX_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Act as this user without hosted auth (local development)
    #[arg(long, global = true, env = "FIRESTOREX_ACTOR")]
    actor: Option<String>,

    /// Bucket (defaults to DEFAULT_BUCKET)
    #[arg(long, global = true)]
    bucket: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a local file against the upload policy without uploading it
    Validate {
        /// Path to the file to check
        file: PathBuf,
    },
    /// Validate and upload a file, then record its metadata
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Object path in the bucket (defaults to {user}/{file name})
        #[arg(long)]
        path: Option<String>,
    },
    /// List objects under a folder
    List {
        /// Folder prefix (bucket root when omitted)
        #[arg(default_value = "")]
        prefix: String,
    },
    /// List metadata of files you uploaded
    Files,
    /// Remove an object
    Remove {
        /// Object path in the bucket
        path: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to --password
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Sign in and print the session (including the access token)
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Revoke the current access token
    Logout,
    /// Show your recent security events
    Activity,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = match e.downcast_ref::<AppError>() {
                Some(app) => {
                    log_error(app);
                    let report = ErrorReport::new(app, is_production_env());
                    match serde_json::to_string_pretty(&report) {
                        Ok(body) => eprintln!("{}", body),
                        Err(_) => eprintln!("Error: {}", report.error),
                    }
                    exit_code(app)
                }
                None => {
                    eprintln!("Error: {:#}", e);
                    1
                }
            };
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Validation is purely local and needs no configuration
    if let Commands::Validate { file } = &cli.command {
        return print_json(&validate_file(file).await?);
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(LogFormat::for_config(&config))?;

    let bucket = cli.bucket.unwrap_or_else(|| config.default_bucket.clone());
    let services = Services::from_config(config, cli.token.as_deref()).await?;
    let actor = cli.actor.map(ActorId::new);
    let session = services.session(actor, cli.token.clone());

    match cli.command {
        Commands::Validate { .. } => {}
        Commands::Upload { file, path } => {
            let candidate = CandidateFile::from_path(&file)
                .await
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let resolved = session.current_actor().await.ok().flatten();
            let path = object_path(&file, path.as_deref(), resolved.as_ref().map(|a| a.as_str()))?;

            let receipt = services
                .uploads
                .upload(session.as_ref(), &bucket, &path, candidate)
                .await
                .map_err(AppError::from)?;
            print_json(&serde_json::json!({
                "object": receipt.object,
                "metadata": receipt.metadata,
            }))?;
        }
        Commands::List { prefix } => {
            let entries = services
                .uploads
                .list(&bucket, &prefix)
                .await
                .map_err(AppError::from)?;
            print_json(&entries)?;
        }
        Commands::Files => {
            let files = services
                .uploads
                .files_for(session.as_ref())
                .await
                .map_err(AppError::from)?;
            print_json(&files)?;
        }
        Commands::Remove { path } => {
            services
                .uploads
                .remove(session.as_ref(), &bucket, &path)
                .await
                .map_err(AppError::from)?;
            print_json(&serde_json::json!({ "success": true, "path": path }))?;
        }
        Commands::Signup {
            username,
            email,
            password,
            confirm_password,
        } => {
            let accounts = services.accounts.as_ref().context(hosted_auth_required())?;
            let request = RegistrationRequest {
                username,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            let outcome = accounts.register(&request).await?;
            print_json(&serde_json::json!({
                "user": outcome.user,
                "session": outcome.session,
                "confirmation_required": outcome.session.is_none(),
            }))?;
        }
        Commands::Login { email, password } => {
            let accounts = services.accounts.as_ref().context(hosted_auth_required())?;
            let session = accounts.sign_in(&Credentials { email, password }).await?;
            print_json(&session)?;
        }
        Commands::Logout => {
            let accounts = services.accounts.as_ref().context(hosted_auth_required())?;
            let token = cli
                .token
                .as_deref()
                .context("No access token. Pass --token or set FIRESTOREX_ACCESS_TOKEN")?;
            accounts.sign_out(session.as_ref(), token).await?;
            print_json(&serde_json::json!({ "success": true }))?;
        }
        Commands::Activity => {
            let events = services.auditor.recent_events(session.as_ref()).await?;
            print_json(&events)?;
        }
    }

    Ok(())
}

fn hosted_auth_required() -> &'static str {
    "Account commands need the hosted backend. Set SUPABASE_URL and SUPABASE_ANON_KEY"
}
