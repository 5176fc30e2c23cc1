use crate::{Command, Error, Result, TelegramBot, TelegramDocument, TelegramReply};
use parley_core::UserId;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tracing::{debug, info, warn};

const ASK_FOR_ID: &str = "Provide your user ID by using -> @myidbot.";
const EMPTY_MESSAGE: &str = "Message is Empty";
const CONTEXT_CLEARED: &str = "Context cleared successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatKind {
    Private,
    Supergroup,
    Other,
}

impl ChatKind {
    fn of(msg: &Message) -> Self {
        if msg.chat.is_private() {
            Self::Private
        } else if msg.chat.is_supergroup() {
            Self::Supergroup
        } else {
            Self::Other
        }
    }
}

/// What to do with an incoming text message.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Turn(String),
    Command(Command),
    EmptyMessage,
    AskForId,
    Ignore,
}

/// Groups only talk through `/c`; private chats with allow-listed users
/// treat any plain text as a turn.
fn route_text(kind: ChatKind, text: &str, allowed: bool) -> Route {
    match Command::parse_from_text(text) {
        Some(Command::Chat(body)) => match kind {
            ChatKind::Supergroup if !allowed => Route::AskForId,
            ChatKind::Supergroup | ChatKind::Private if allowed => {
                if body.is_empty() {
                    Route::EmptyMessage
                } else {
                    Route::Turn(body)
                }
            }
            _ => Route::Ignore,
        },
        Some(cmd) => Route::Command(cmd),
        None if kind == ChatKind::Private && allowed => {
            if text.trim().is_empty() {
                Route::EmptyMessage
            } else {
                Route::Turn(text.to_string())
            }
        }
        None => Route::Ignore,
    }
}

fn sender_id(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().and_then(|u| UserId::try_from(u.id.0).ok())
}

fn username(msg: &Message) -> &str {
    msg.from
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown")
}

/// Best effort; a failed typing indicator never stops the turn.
async fn show_typing(bot: &Bot, chat_id: ChatId) {
    if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
        warn!("Failed to send typing action to {chat_id}: {e}");
    }
}

/// Handle any message (commands, regular text or documents)
pub async fn handle_message(bot: &TelegramBot, msg: &Message) -> Result<()> {
    let Some(user_id) = sender_id(msg) else {
        return Ok(());
    };
    let kind = ChatKind::of(msg);
    let allowed = bot.conversation.is_allowed(user_id).await;
    let reply = TelegramReply::new(bot.bot.clone(), msg.chat.id);

    if let Some(text) = msg.text() {
        match route_text(kind, text, allowed) {
            Route::Turn(body) => run_turn(bot, msg, user_id, &body, &reply).await,
            Route::Command(cmd) => {
                handle_command(bot, msg, user_id, allowed, cmd, &reply).await?;
            }
            Route::EmptyMessage => {
                bot.bot.send_message(msg.chat.id, EMPTY_MESSAGE).await?;
            }
            Route::AskForId => {
                bot.bot.send_message(msg.chat.id, ASK_FOR_ID).await?;
            }
            Route::Ignore => {
                debug!("[@{}] Ignored message in {kind:?} chat", username(msg));
            }
        }
    } else if let Some(document) = msg.document() {
        if kind == ChatKind::Private && allowed {
            info!("[@{}] Document: {:?}", username(msg), document.file_name);
            show_typing(&bot.bot, msg.chat.id).await;
            let source = TelegramDocument::new(bot.bot.clone(), document.clone());
            let outcome = bot
                .conversation
                .handle_document(user_id, &source, &reply)
                .await;
            debug!("[@{}] Document outcome: {outcome:?}", username(msg));
        }
    }

    Ok(())
}

async fn run_turn(
    bot: &TelegramBot,
    msg: &Message,
    user_id: UserId,
    text: &str,
    reply: &TelegramReply,
) {
    info!("[@{}] Message: {text}", username(msg));

    show_typing(&bot.bot, msg.chat.id).await;

    let outcome = bot.conversation.handle_turn(user_id, text, reply).await;
    info!("[@{}] Outcome: {outcome:?}", username(msg));
}

/// Handle bot commands
async fn handle_command(
    bot: &TelegramBot,
    msg: &Message,
    user_id: UserId,
    allowed: bool,
    cmd: Command,
    reply: &TelegramReply,
) -> Result<()> {
    info!("[@{}] Command: {cmd:?}", username(msg));

    if cmd.is_admin() && !bot.is_super_admin(user_id) {
        return Err(Error::Unauthorized(user_id));
    }

    let conversation = &bot.conversation;
    match cmd {
        Command::Chat(text) => {
            if allowed {
                run_turn(bot, msg, user_id, &text, reply).await;
            }
        }
        Command::Start => {
            if allowed || bot.is_super_admin(user_id) {
                bot.bot
                    .send_message(msg.chat.id, Command::welcome_text())
                    .await?;
            }
        }
        Command::Help => {
            if allowed || bot.is_super_admin(user_id) {
                bot.bot
                    .send_message(msg.chat.id, Command::help_text())
                    .await?;
            }
        }
        Command::Clear => {
            if allowed {
                conversation.clear(user_id).await;
                bot.bot.send_message(msg.chat.id, CONTEXT_CLEARED).await?;
            }
        }
        Command::List => conversation.list_users(reply).await?,
        Command::Log => conversation.tail_log(&bot.log_file, reply).await?,
        Command::Search(Some(id)) => conversation.search_user(id, reply).await?,
        Command::Delete(Some(id)) => conversation.delete_user(id, reply).await?,
        Command::Add(Some(id)) => conversation.add_user(id, reply).await?,
        Command::Search(None) | Command::Delete(None) | Command::Add(None) => {
            bot.bot
                .send_message(msg.chat.id, "Please provide a numeric user ID.")
                .await?;
        }
    }

    Ok(())
}
