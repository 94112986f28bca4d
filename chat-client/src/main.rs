use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use backend_domain::RoomId;
use chat_client::{ChatApi, ClientSyncAgent, ReconnectPolicy, SyncEvent};

#[derive(Parser, Debug)]
#[command(name = "chat-client")]
#[command(about = "Room chat command line client", long_about = None)]
struct Args {
    /// Server base url
    #[arg(short, long, default_value = "http://127.0.0.1:3234")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List rooms
    Rooms,
    /// Create a room
    Create {
        #[arg(short, long = "participant")]
        participants: Vec<String>,
    },
    /// Add a participant to a room
    Join { room: RoomId, name: String },
    /// Delete a room and its history
    Delete { room: RoomId },
    /// Print a room's history
    History {
        room: RoomId,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Send one message
    Send {
        room: RoomId,
        #[arg(short, long)]
        name: String,
        message: String,
        /// Attempts for transient failures
        #[arg(long, default_value_t = 3)]
        attempts: u32,
    },
    /// Follow a room live until interrupted
    Watch {
        room: RoomId,
        #[arg(short, long, default_value = "viewer")]
        name: String,
        /// Reconnect attempts before giving up, unlimited when omitted
        #[arg(long)]
        max_reconnects: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let api = ChatApi::new(&args.server)?;

    match args.command {
        Command::Rooms => {
            for room in api.list_rooms().await? {
                println!("{}\t{}", room.id, room.participants.join(", "));
            }
        }
        Command::Create { participants } => {
            let room = api.create_room(&participants).await?;
            println!("{}", room.id);
        }
        Command::Join { room, name } => {
            let room = api.join_room(room, &name).await?;
            println!("{}\t{}", room.id, room.participants.join(", "));
        }
        Command::Delete { room } => {
            api.delete_room(room).await?;
        }
        Command::History { room, limit } => {
            for message in api.history(room, limit).await? {
                print_message(&message);
            }
        }
        Command::Send {
            room,
            name,
            message,
            attempts,
        } => {
            let agent = ClientSyncAgent::new(api, room, name);
            let sent = agent.send_with_retry(&message, attempts.max(1)).await?;
            print_message(&sent);
        }
        Command::Watch {
            room,
            name,
            max_reconnects,
        } => watch(api, room, name, max_reconnects).await?,
    }
    Ok(())
}

async fn watch(api: ChatApi, room: RoomId, name: String, max_reconnects: Option<u32>) -> Result<()> {
    let policy = ReconnectPolicy::default().with_max_attempts(max_reconnects);
    let mut agent = ClientSyncAgent::new(api, room, name).with_policy(policy);
    for message in agent.enter().await? {
        print_message(message);
    }

    let result = loop {
        tokio::select! {
            event = agent.next_event() => match event {
                Ok(SyncEvent::Message(message)) => print_message(&message),
                Ok(SyncEvent::Reconciled(messages)) | Ok(SyncEvent::Reconnected(messages)) => {
                    messages.iter().for_each(print_message);
                }
                Err(err) => break Err(anyhow::Error::from(err)),
            },
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };
    agent.leave();
    result
}

fn print_message(message: &backend_domain::ChatMessage) {
    println!(
        "[{}] #{} {}: {}",
        message.timestamp.format("%H:%M:%S"),
        message.seq,
        message.sender,
        message.message
    );
}
