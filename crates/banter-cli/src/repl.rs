//! Line-oriented interactive loop.
//!
//! Multiplexes stdin lines and advisory notifications with `tokio::select!`.
//! Every command goes through the [`Client`] facade; the loop itself holds no
//! chat state, it only renders snapshots on demand.

#![allow(clippy::print_stdout)]

use banter_client::{
    Client, Friend, Notification, Presence, RegisterProfile, StoredMessage, Transport,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

const HELP: &str = "\
commands:
  /register <username> <password> <email> [first [last]]
  /login <username> <password>
  /friends                 list friends and presence
  /add <username>          add a friend
  /remove <username>       remove a friend
  /msg <to> <text>         send a message
  /read <peer>             show the conversation with a peer
  /status                  session and synchronizer state
  /quit";

/// Run the loop until `/quit` or stdin closes.
pub async fn run<T: Transport>(client: Client<T>) -> Result<(), std::io::Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut notifications = client.subscribe_notifications();

    println!("banter ready; type /help for commands");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if !line.is_empty() && handle_command(&client, line).await {
                    break;
                }
            }

            notification = notifications.recv() => {
                match notification {
                    Ok(Notification::MessageReceived { from }) => {
                        println!("* new message from {from} (/read {from})");
                    },
                    Err(RecvError::Lagged(missed)) => {
                        println!("* {missed} notifications missed; /read still shows everything");
                    },
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

/// Dispatch one input line. Returns true if the loop should quit.
async fn handle_command<T: Transport>(client: &Client<T>, line: &str) -> bool {
    let (command, rest) = split_command(line);

    match command {
        "/help" => println!("{HELP}"),

        "/register" => handle_register(client, rest).await,

        "/login" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(username), Some(password), None) => {
                    handle_login(client, username, password).await;
                },
                _ => println!("usage: /login <username> <password>"),
            }
        },

        "/friends" => println!("{}", render_friends(&client.friends())),

        "/add" => match single_arg(rest) {
            Some(username) => match client.add_friend(username).await {
                Ok(()) => println!("added {username}"),
                Err(err) => println!("add failed: {err}"),
            },
            None => println!("usage: /add <username>"),
        },

        "/remove" => match single_arg(rest) {
            Some(username) => match client.remove_friend(username).await {
                Ok(()) => println!("removed {username}"),
                Err(err) => println!("remove failed: {err}"),
            },
            None => println!("usage: /remove <username>"),
        },

        "/msg" => match rest.split_once(char::is_whitespace) {
            Some((to, text)) if !text.trim().is_empty() => {
                match client.send_message(to, text.trim()).await {
                    Ok(()) => println!("sent to {to}"),
                    Err(err) => println!("send failed: {err}"),
                }
            },
            _ => println!("usage: /msg <to> <text>"),
        },

        "/read" => match single_arg(rest) {
            Some(peer) => println!("{}", render_conversation(peer, &client.conversation(peer))),
            None => println!("usage: /read <peer>"),
        },

        "/status" => print_status(client),

        "/quit" => return true,

        _ => println!("unknown command: {command} (try /help)"),
    }

    false
}

/// Log in, then bring live state up: friends refresh plus both synchronizers.
///
/// Each step surfaces its own failure; a failed refresh does not stop the
/// synchronizers from starting.
async fn handle_login<T: Transport>(client: &Client<T>, username: &str, password: &str) {
    match client.login(username, password).await {
        Ok(()) => println!("logged in as {username}"),
        Err(err) => {
            println!("login failed: {err}");
            return;
        },
    }

    match client.refresh_friends().await {
        Ok(count) => println!("{count} friends"),
        Err(err) => println!("friends refresh failed: {err}"),
    }
    if let Err(err) = client.start_presence_sync().await {
        println!("presence sync not started: {err}");
    }
    if let Err(err) = client.start_message_sync().await {
        println!("message sync not started: {err}");
    }
}

/// Parse `/register` arguments and create the account.
async fn handle_register<T: Transport>(client: &Client<T>, rest: &str) {
    let mut parts = rest.split_whitespace();
    let (Some(username), Some(password), Some(email)) = (parts.next(), parts.next(), parts.next())
    else {
        println!("usage: /register <username> <password> <email> [first [last]]");
        return;
    };
    let first_name = parts.next().unwrap_or_default().to_owned();
    let last_name = parts.next().unwrap_or_default().to_owned();

    let profile = RegisterProfile {
        email: email.to_owned(),
        username: username.to_owned(),
        password: password.to_owned(),
        first_name,
        last_name,
    };
    match client.register(profile).await {
        Ok(()) => println!("registered {username}; log in with /login"),
        Err(err) => println!("register failed: {err}"),
    }
}

/// Render the `/status` summary.
fn print_status<T: Transport>(client: &Client<T>) {
    let session = if client.is_authenticated() { "authenticated" } else { "anonymous" };
    println!("session: {session}");
    println!("presence sync: {}", client.presence_sync_state().borrow().clone());
    println!("message sync: {}", client.message_sync_state().borrow().clone());
    println!("friends: {}", client.friends().len());
    println!("conversations: {}", client.conversation_peers().len());
}

/// Split a line into its command word and the remainder.
fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim_start()),
        None => (line, ""),
    }
}

/// The remainder as exactly one token, if that is what it is.
fn single_arg(rest: &str) -> Option<&str> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(arg), None) => Some(arg),
        _ => None,
    }
}

/// One line per friend, or a placeholder when the registry is empty.
fn render_friends(friends: &[Friend]) -> String {
    if friends.is_empty() {
        return "(no friends)".to_owned();
    }
    friends
        .iter()
        .map(|friend| format!("{} [{}]", friend.username, presence_label(friend.presence)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `sender: body` line per stored message, oldest first.
fn render_conversation(peer: &str, messages: &[StoredMessage]) -> String {
    if messages.is_empty() {
        return format!("(no messages with {peer})");
    }
    messages
        .iter()
        .map(|message| format!("{}: {}", message.sender, message.body))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short lowercase label for a presence state.
fn presence_label(presence: Presence) -> &'static str {
    match presence {
        Presence::Unknown => "unknown",
        Presence::Online => "online",
        Presence::Offline => "offline",
        Presence::Away => "away",
    }
}
