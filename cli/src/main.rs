//! Terminal client for the sync engine: runs it against a live server,
//! prints conversation snapshots, and can send a message.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use majlis_core::{AppAction, AppUpdate, ChatClient, ClientConfig, UpdateListener};

#[derive(Parser, Debug)]
#[command(name = "majlis", version, about = "Chat synchronization engine terminal client")]
struct Args {
    /// JSON config file; missing fields fall back to defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server base URL (overrides the config file).
    #[arg(long, env = "MAJLIS_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token (overrides the config file).
    #[arg(long, env = "MAJLIS_TOKEN")]
    token: Option<String>,

    /// Send one message, then keep watching.
    #[arg(long, requires = "to")]
    send: Option<String>,

    /// Conversation id targeted by --send.
    #[arg(long)]
    to: Option<u64>,

    /// Print each snapshot as one JSON line instead of a summary.
    #[arg(long)]
    json: bool,

    /// Exit after this many seconds (0 = run until interrupted).
    #[arg(long, default_value_t = 0)]
    watch_secs: u64,
}

struct Printer {
    json: bool,
}

impl UpdateListener for Printer {
    fn on_update(&self, update: AppUpdate) {
        let AppUpdate::FullState(state) = update;
        if self.json {
            match serde_json::to_string(&state) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(%e, "snapshot_serialize_failed"),
            }
            return;
        }

        println!(
            "rev {} | {} conversation(s) | page {}/{}",
            state.rev,
            state.conversations.len(),
            state.page,
            state.total_pages
        );
        for conv in &state.conversations {
            let last = conv
                .last_message
                .as_ref()
                .map(|m| format!("{}: {}", m.sender_display_name, m.content))
                .unwrap_or_else(|| "(no messages)".to_string());
            println!(
                "  [{}] {} ({} msgs, {} unread) {}",
                conv.id,
                conv.display_title,
                conv.messages.len(),
                conv.unread_count,
                last
            );
        }
        if let Some(error) = &state.last_error {
            println!("  ! {error}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(token) = args.token {
        config.token = Some(token);
    }

    let client = ChatClient::new(config)?;
    client.listen_for_updates(Box::new(Printer { json: args.json }));

    if let Some(content) = args.send {
        let to = args
            .to
            .ok_or_else(|| anyhow::anyhow!("--send requires --to <conversation id>"))?;
        // The conversation list fills on the first poll; wait for the target
        // to show up before selecting it.
        let deadline = Instant::now() + Duration::from_secs(30);
        while client.state().conversation(to).is_none() {
            if Instant::now() > deadline {
                anyhow::bail!("conversation {to} did not appear within 30s");
            }
            std::thread::sleep(Duration::from_millis(200));
        }
        client.dispatch(AppAction::SelectConversation {
            conversation_id: to,
        });
        client.dispatch(AppAction::SendMessage { content });
    }

    if args.watch_secs == 0 {
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    }
    std::thread::sleep(Duration::from_secs(args.watch_secs));
    client.shutdown();
    Ok(())
}
