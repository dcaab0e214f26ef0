//! Quest builder CLI.
//!
//! Provides the `questbuilder` binary: an interactive chat with the quest
//! builder backend that shows the generated quest graph as text, plus
//! subcommands for browsing and seeding the quest library.

mod repl;

use std::process;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use quest_builder::{
    BuilderConfig, BuilderError, HttpBackend, QuestLibrary, SendOutcome, SendRejected,
    SessionController,
};
use quest_core::{EditOutcome, QuestWorkspace, ReconcilePolicy};

use repl::{describe_fields, parse_line, ReplCommand, TextCanvas, HELP};

/// AI quest builder client.
#[derive(Parser)]
#[command(name = "questbuilder", about = "Build quests by chatting with the quest builder backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Start (or resume) a builder conversation.
    Chat {
        /// Resume an existing backend session instead of starting a new one.
        #[arg(short, long)]
        session: Option<String>,

        /// Keep node positions moved on the canvas across AI turns.
        #[arg(long)]
        preserve_positions: bool,
    },
    /// List the approved quests in the library.
    Library {
        /// Load the quest with this id and show its graph.
        #[arg(short, long)]
        open: Option<String>,
    },
    /// Ask the backend to load its sample quests, then list the library.
    Seed,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match BuilderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    let backend = match HttpBackend::from_config(&config) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let exit_code = match cli.command {
        Commands::Chat {
            session,
            preserve_positions,
        } => {
            if preserve_positions {
                config.reconcile_policy = ReconcilePolicy::PreservePositions;
            }
            run_chat(&config, &backend, session).await
        }
        Commands::Library { open } => run_library(&backend, open).await,
        Commands::Seed => run_seed(&backend).await,
    };
    process::exit(exit_code);
}

/// Execute the chat subcommand.
///
/// Returns exit code: 0 = session ended normally, 1 = stdin error.
async fn run_chat(config: &BuilderConfig, backend: &HttpBackend, session: Option<String>) -> i32 {
    let mut controller = SessionController::from_config(config, session);
    let mut workspace = QuestWorkspace::new(config.reconcile_policy);
    tracing::info!(
        backend = backend.base_url(),
        policy = %config.reconcile_policy,
        "starting chat session"
    );

    for message in controller.transcript() {
        println!("{}: {}", message.role, message.content);
    }
    if let Some(id) = controller.session_id() {
        println!("(resuming session {})", id);
    }
    println!("(type /help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return 0,
            Err(e) => {
                eprintln!("Error: failed to read input: {}", e);
                return 1;
            }
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(msg) => {
                eprintln!("{}", msg);
                continue;
            }
        };

        match command {
            ReplCommand::Say(text) => {
                controller.set_input(text);
                let outcome = controller.submit(backend, &mut workspace).await;
                print_outcome(&controller, &workspace, outcome);
            }
            ReplCommand::Graph => show_graph(&workspace),
            ReplCommand::Json => {
                let json = serde_json::to_string_pretty(workspace.model().graph())
                    .unwrap_or_else(|e| {
                        format!("{{\"error\": \"failed to serialize graph: {}\"}}", e)
                    });
                println!("{}", json);
            }
            ReplCommand::Edit(edit) => match workspace.apply_edit(edit) {
                Ok(EditOutcome::Connected(id)) => println!("  connected ({})", id),
                Ok(EditOutcome::AlreadyConnected) => println!("  already connected"),
                Ok(EditOutcome::Moved) => println!("  moved"),
                Ok(EditOutcome::FieldUpdated) => println!("  updated"),
                Err(e) => eprintln!("Error: {}", e),
            },
            ReplCommand::Fields(id) => match workspace.model().get_node(&id) {
                Some(node) => println!("{}", describe_fields(node)),
                None => eprintln!("Error: no node '{}'", id),
            },
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => {
                if let Some(id) = controller.session_id() {
                    println!("(resume later with --session {})", id);
                }
                return 0;
            }
        }
    }
}

fn print_outcome(controller: &SessionController, workspace: &QuestWorkspace, outcome: SendOutcome) {
    match outcome {
        SendOutcome::Rejected(SendRejected::EmptyMessage) => {}
        SendOutcome::Rejected(reason) => eprintln!("({})", reason),
        SendOutcome::Replied { graph_updated } => {
            if let Some(reply) = controller.transcript().last() {
                println!("{}: {}", reply.role, reply.content);
            }
            println!("  [stage: {}]", controller.stage());
            if graph_updated {
                show_graph(workspace);
            }
        }
        SendOutcome::Failed { retryable } => {
            if let Some(reply) = controller.transcript().last() {
                println!("{}: {}", reply.role, reply.content);
            }
            if !retryable {
                eprintln!("(the backend rejected this request)");
            }
        }
    }
}

fn show_graph(workspace: &QuestWorkspace) {
    let mut canvas = TextCanvas::new(std::io::stdout().lock());
    workspace.render_to(&mut canvas);
    canvas.diagnostics(&workspace.diagnostics());
}

/// Execute the library subcommand.
///
/// Returns exit code: 0 = success, 1 = backend error or unknown quest.
async fn run_library(backend: &HttpBackend, open: Option<String>) -> i32 {
    let mut library = QuestLibrary::new();
    library.load(backend).await;
    if let Some(banner) = library.banner() {
        eprintln!("Error: {}", banner);
        return 1;
    }
    print_library(&library);

    let Some(quest_id) = open else {
        return 0;
    };
    let mut workspace = QuestWorkspace::default();
    match library.select(&quest_id, &mut workspace) {
        Ok(title) => {
            println!("{}", title);
            show_graph(&workspace);
            0
        }
        Err(BuilderError::QuestNotFound(id)) => {
            eprintln!("Error: no quest '{}' in the library", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Execute the seed subcommand.
///
/// Returns exit code: 0 = success, 1 = backend error.
async fn run_seed(backend: &HttpBackend) -> i32 {
    let mut library = QuestLibrary::new();
    let count = library.seed(backend).await.len();
    if let Some(banner) = library.banner() {
        eprintln!("Error: {}", banner);
        return 1;
    }
    println!("library now holds {} quest(s)", count);
    print_library(&library);
    0
}

fn print_library(library: &QuestLibrary) {
    if library.quests().is_empty() {
        println!("no quests yet");
        return;
    }
    for quest in library.quests() {
        println!(
            "{:<12} {:<32} {:<7} {:>4.1}  {} node(s)",
            quest.id,
            quest.title,
            quest.difficulty,
            quest.rating,
            quest.graph_structure.nodes.len()
        );
    }
}
