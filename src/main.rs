mod ui;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::sync::mpsc;

use skillswap_chat::common::{ChatCommand, SessionId, ViewerRole};
use skillswap_chat::config::{self, AppConfig};
use skillswap_chat::network::{ChatController, HttpTransport};
use ui::ChatApp;

#[derive(Parser)]
#[command(
    name = "skillswap_chat",
    version,
    about = "SkillSwap support chat client"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Which side of the chat to run as
    #[arg(long, value_enum)]
    role: Option<ViewerRole>,
    /// Server base URL, e.g. http://127.0.0.1:5000
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Mode {
    /// Open a chat session by id on startup
    Open {
        #[arg(value_name = "SESSION_ID")]
        session_id: SessionId,
    },
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env();
    if let Some(role) = cli.role {
        app_config.role = role;
    }
    if let Some(base_url) = &cli.base_url {
        app_config.base_url = base_url.clone();
    }
    app_config
}

fn initial_commands(role: ViewerRole, mode: Option<Mode>) -> Vec<ChatCommand> {
    let mut commands = Vec::new();
    if role == ViewerRole::User {
        commands.push(ChatCommand::LoadHistory);
    }
    match mode {
        Some(Mode::Open { session_id }) => commands.push(ChatCommand::OpenSession(session_id)),
        None if role == ViewerRole::User => commands.push(ChatCommand::ResumeActive),
        None => {}
    }
    commands
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let app_config = resolve_config(&cli);

    let transport = match HttpTransport::new(&app_config) {
        Ok(transport) => Arc::new(transport),
        Err(err) => {
            log::error!("Failed to set up HTTP client: {err}");
            std::process::exit(1);
        }
    };

    // 1. Tạo các kênh giao tiếp (Channels)
    // UI -> Controller
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Controller -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    // 2. Khởi chạy controller (Chạy ngầm)
    let controller = ChatController::from_config(&app_config, transport, event_tx);
    tokio::spawn(controller.run(cmd_rx));

    for command in initial_commands(app_config.role, cli.mode) {
        if let Err(err) = cmd_tx.send(command).await {
            log::warn!("Failed to queue startup command: {err}");
        }
    }

    log::info!(
        "Chat client started as {:?} against {}",
        app_config.role,
        app_config.base_url
    );

    // 3. Khởi chạy UI (Chạy trên Main Thread)
    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);
    let role = app_config.role;
    let offset_hours = app_config.display_offset_hours;

    eframe::run_native(
        "SkillSwap Chat",
        options,
        Box::new(move |cc| {
            let Some(event_receiver) = event_rx.take() else {
                return Err("ChatApp should only be initialized once".into());
            };
            Ok(Box::new(ChatApp::new(
                cc,
                role,
                offset_hours,
                cmd_tx.clone(),
                event_receiver,
            )))
        }),
    )
}
