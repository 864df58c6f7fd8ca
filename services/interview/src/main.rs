use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use interview_core::agent::InterviewAgent;
use interview_core::feedback::FeedbackClient;
use interview_core::identity::{IdentityService, StaticIdentity};
use interview_core::navigation::Route;
use interview_core::session_state::{AgentProfile, CallMode, CallSettings};
use interview_core::store::{DEFAULT_LATEST_LIMIT, InMemoryInterviewStore, InterviewStore};
use interview_service::assistant_loader;
use interview_service::config::Config;
use interview_service::console;
use interview_service::realtime_adapter::RealtimeAdapter;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Voice mock-interview agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the call screen. Type `call`, `end` or `quit` on stdin.
    Call {
        /// `generate` builds a new interview, `interview` runs a stored one
        #[arg(long, default_value = "interview")]
        mode: CallMode,
        /// The stored interview to run (interview mode)
        #[arg(long)]
        interview_id: Option<String>,
        /// Existing feedback record to update instead of creating a new one
        #[arg(long)]
        feedback_id: Option<String>,
    },
    /// List your interviews and the latest interviews by others.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting interview service...");

    // --- 3. Parse Command-Line Arguments ---
    let cli = Cli::parse();

    let identity = StaticIdentity::from_parts(
        config.user_id.clone(),
        config.user_name.clone(),
        config.user_email.clone(),
    );

    match cli.command {
        Commands::List => list(&config, &identity).await,
        Commands::Call {
            mode,
            interview_id,
            feedback_id,
        } => call(&config, &identity, mode, interview_id, feedback_id).await,
    }
}

fn load_store(config: &Config) -> Result<InMemoryInterviewStore> {
    let store = InMemoryInterviewStore::from_json_file(&config.interviews_path)
        .context("Failed to load stored interviews")?;
    Ok(store)
}

async fn list(config: &Config, identity: &impl IdentityService) -> Result<()> {
    let Some(user) = identity.current_user().await? else {
        println!("Not signed in. Set USER_ID and USER_NAME to list interviews.");
        return Ok(());
    };
    let store = load_store(config)?;

    println!("Your interviews:");
    let own = store.interviews_by_user(&user.id).await;
    if own.is_empty() {
        println!("  You haven't taken any interviews yet");
    }
    for interview in &own {
        println!("  {}", console::render_interview(interview));
    }

    println!("Take an interview:");
    let latest = store.latest_interviews(&user.id, DEFAULT_LATEST_LIMIT).await;
    if latest.is_empty() {
        println!("  There are no interviews available");
    }
    for interview in &latest {
        println!("  {}", console::render_interview(interview));
    }
    Ok(())
}

async fn call(
    config: &Config,
    identity: &impl IdentityService,
    mode: CallMode,
    interview_id: Option<String>,
    feedback_id: Option<String>,
) -> Result<()> {
    let user = identity.current_user().await?;
    if user.is_none() {
        tracing::warn!("no signed-in user; feedback cannot be saved for this call");
    }

    let questions = match (mode, &interview_id) {
        (CallMode::Interview, Some(id)) => {
            let store = load_store(config)?;
            let interview = store
                .interview_by_id(id)
                .await
                .with_context(|| format!("No interview with id {id}"))?;
            tracing::info!(
                "Loaded interview {} with {} questions",
                interview.id,
                interview.questions.len()
            );
            interview.questions
        }
        (CallMode::Interview, None) => {
            anyhow::bail!("--interview-id is required for interview calls")
        }
        (CallMode::Generate, _) => Vec::new(),
    };

    let profile = AgentProfile {
        user_name: user.as_ref().map(|u| u.name.clone()),
        user_id: user.as_ref().map(|u| u.id.clone()),
        interview_id,
        feedback_id,
        questions,
    };
    let settings = CallSettings {
        workflow_id: config.generate_workflow_id.clone(),
        assistant: assistant_loader::load_assistant(config.assistant_config_path.as_deref())
            .context("Failed to load interviewer assistant")?,
    };

    // --- Initialize API Clients ---
    let call_config = realtime_call::Config::builder()
        .with_base_url(&config.call_service_url)
        .with_api_key(config.call_service_api_key.expose_secret())
        .build();
    let call_service = Arc::new(RealtimeAdapter::connect(call_config).await?);
    let feedback_service = Arc::new(FeedbackClient::new(&config.feedback_service_url));

    let agent = InterviewAgent::new(mode, profile, settings, call_service, feedback_service);

    let (action_tx, action_rx) = tokio::sync::mpsc::channel(16);
    let stdin_task = tokio::spawn(console::read_actions(action_tx));
    println!("Commands: call, end, quit");

    let outcome = tokio::select! {
        route = agent.run(action_rx, |view| println!("{}", console::render(view))) => route,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
            None
        }
    };
    stdin_task.abort();

    match outcome {
        Some(Route::Home) => println!("Navigate to {}", Route::Home.path()),
        Some(route @ Route::Feedback { .. }) => println!("Feedback ready at {}", route.path()),
        None => {}
    }
    tracing::info!("Shutting down...");
    Ok(())
}
