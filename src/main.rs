use std::io::Write;

use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use serde::Serialize;
use uuid::Uuid;

use mathllm_client::config::{BACKEND_ADDRESS_VAR, ClientConfig};
use mathllm_client::router::RouterError;
use mathllm_client::state::ListState;
use mathllm_client::types::{CreateChat, CreateInviteCode};
use mathllm_client::{ApiError, MathLlm, Outcome};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing credentials; pass --email/--password or set MATHLLM_EMAIL/MATHLLM_PASSWORD")]
    MissingCredentials,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error("registration rejected: {0}")]
    Rejected(String),
    #[error("{0}")]
    Failed(String),
    #[error("chat {0} not found")]
    ChatNotFound(Uuid),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "mathllm", about = "MathLLM backend client")]
struct Cli {
    /// Overrides MATHLLM_BACKEND_ADDRESS from the environment or `.env`.
    #[arg(long, env = BACKEND_ADDRESS_VAR)]
    backend: Option<String>,

    #[arg(long, env = "MATHLLM_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "MATHLLM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account with --email/--password and an invite code.
    Register {
        #[arg(long)]
        invite_code: String,
    },
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands run inside a logged-in session (`check` also runs without one).
#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Report whether the backend accepts the session, and its roles.
    Check,
    Chats(ChatsCommand),
    Messages {
        chat_id: Uuid,
    },
    /// Send a message and stream the reply to stdout.
    Send {
        chat_id: Uuid,
        text: String,
    },
    Problems {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        prefix: Option<String>,
    },
    Users(UsersCommand),
    InviteCodes(InviteCodesCommand),
    /// Run the route guard for a path and print where navigation lands.
    Navigate {
        path: String,
    },
}

#[derive(Args, Debug)]
struct ChatsCommand {
    #[command(subcommand)]
    command: ChatsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatsSubcommand {
    List,
    Show {
        chat_id: Uuid,
    },
    Create {
        #[arg(long, default_value = "New chat")]
        name: String,
        #[arg(long = "type", default_value = "Chat")]
        kind: String,
    },
    Delete {
        chat_id: Uuid,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Promote { user_id: Uuid },
}

#[derive(Args, Debug)]
struct InviteCodesCommand {
    #[command(subcommand)]
    command: InviteCodesSubcommand,
}

#[derive(Subcommand, Debug)]
enum InviteCodesSubcommand {
    List,
    Create {
        code: String,
        #[arg(long, default_value_t = 1)]
        max_usages: u32,
    },
    Delete {
        id: Uuid,
    },
}

struct Credentials {
    email: String,
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let backend = cli.backend.clone();
    let config = ClientConfig::from_vars(|key| {
        if key == BACKEND_ADDRESS_VAR { backend.clone() } else { std::env::var(key).ok() }
    })?;
    let client = MathLlm::new(&config)?;
    let credentials = match (cli.email, cli.password) {
        (Some(email), Some(password)) => Some(Credentials { email, password }),
        _ => None,
    };

    match cli.command {
        Command::Register { invite_code } => run_register(&client, credentials.as_ref(), &invite_code).await,
        Command::Session(SessionCommand::Check) if credentials.is_none() => run_check(&client).await,
        Command::Session(command) => {
            let credentials = credentials.ok_or(CliError::MissingCredentials)?;
            client.auth.login(&credentials.email, &credentials.password).await?;
            let result = run_authenticated(&client, command).await;
            client.auth.logout().await;
            result
        }
    }
}

async fn run_authenticated(client: &MathLlm, command: SessionCommand) -> Result<(), CliError> {
    match command {
        SessionCommand::Check => run_check(client).await,
        SessionCommand::Chats(chats) => run_chats(client, chats).await,
        SessionCommand::Messages { chat_id } => print_json(&client.chat.get_chat_messages(chat_id).await?),
        SessionCommand::Send { chat_id, text } => run_send(client, chat_id, &text).await,
        SessionCommand::Problems { page, prefix } => {
            print_json(&client.chat.get_problems(page, prefix.as_deref()).await?)
        }
        SessionCommand::Users(users) => run_users(client, users).await,
        SessionCommand::InviteCodes(codes) => run_invite_codes(client, codes).await,
        SessionCommand::Navigate { path } => {
            client.initialize().await;
            let landed = client.router.navigate(&path).await?;
            match landed.chat_id {
                Some(chat_id) => println!("{} ({chat_id})", landed.name),
                None => println!("{}", landed.name),
            }
            Ok(())
        }
    }
}

async fn run_check(client: &MathLlm) -> Result<(), CliError> {
    if client.initialize().await {
        println!("authenticated roles={}", client.roles.roles().join(","));
    } else {
        println!("anonymous");
    }
    Ok(())
}

async fn run_register(
    client: &MathLlm,
    credentials: Option<&Credentials>,
    invite_code: &str,
) -> Result<(), CliError> {
    let credentials = credentials.ok_or(CliError::MissingCredentials)?;
    match client.auth.register(&credentials.email, &credentials.password, invite_code).await {
        Outcome::Ok(()) => {
            println!("registered {}", credentials.email);
            client.auth.logout().await;
            Ok(())
        }
        Outcome::Rejected(problem) => {
            print_json(&problem)?;
            let summary = problem.detail.or(problem.title).unwrap_or_else(|| "validation failed".to_owned());
            Err(CliError::Rejected(summary))
        }
        Outcome::Fault(e) => Err(e.into()),
    }
}

async fn run_chats(client: &MathLlm, chats: ChatsCommand) -> Result<(), CliError> {
    match chats.command {
        ChatsSubcommand::List => print_json(&client.chat.get_chats().await?),
        ChatsSubcommand::Show { chat_id } => {
            let chat = client.chat.get_chat_by_id(chat_id).await?.ok_or(CliError::ChatNotFound(chat_id))?;
            print_json(&chat)
        }
        ChatsSubcommand::Create { name, kind } => {
            let id = client.chat.create_chat(&CreateChat { name, kind }).await?;
            println!("{id}");
            Ok(())
        }
        ChatsSubcommand::Delete { chat_id } => {
            client.chat.delete_chat(chat_id).await?;
            println!("deleted {chat_id}");
            Ok(())
        }
    }
}

async fn run_send(client: &MathLlm, chat_id: Uuid, text: &str) -> Result<(), CliError> {
    let mut reply = client.chat.get_next_message(text, chat_id).await?;
    let mut stdout = std::io::stdout();
    while let Some(piece) = reply.next().await {
        stdout.write_all(piece?.as_bytes())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

async fn run_users(client: &MathLlm, users: UsersCommand) -> Result<(), CliError> {
    if !client.roles.admin_access().await {
        return Err(CliError::Failed("admin access denied".to_owned()));
    }
    match users.command {
        UsersSubcommand::List => client.admin_users.fetch_users().await,
        UsersSubcommand::Promote { user_id } => {
            client.admin_users.promote_to_admin(user_id).await;
        }
    }
    print_list(&client.admin_users.users())
}

async fn run_invite_codes(client: &MathLlm, codes: InviteCodesCommand) -> Result<(), CliError> {
    if !client.roles.admin_access().await {
        return Err(CliError::Failed("admin access denied".to_owned()));
    }
    let service = &client.invite_codes;
    match codes.command {
        InviteCodesSubcommand::List => service.fetch_invite_codes().await,
        InviteCodesSubcommand::Create { code, max_usages } => {
            service.create_invite_code(&CreateInviteCode { code, max_usages }).await;
        }
        InviteCodesSubcommand::Delete { id } => {
            service.delete_invite_code(id).await;
        }
    }
    print_list(&service.invite_codes())
}

/// Print the items, or fail with the list's error message.
fn print_list<T: Serialize>(state: &ListState<T>) -> Result<(), CliError> {
    if let Some(error) = &state.error {
        return Err(CliError::Failed(error.clone()));
    }
    print_json(&state.items)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
