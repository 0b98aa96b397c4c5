//! Telegram bot as the remote command channel and notice sink.

use calmerge_core::command::{CommandSet, CommandSource, Poll};
use calmerge_core::config::TelegramConfig;
use calmerge_core::error::{CalMergeError, CalMergeResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

pub struct TelegramBot {
    client: reqwest::Client,
    token: String,
    chat_id: i64,
}

impl TelegramBot {
    pub fn new(client: reqwest::Client, config: &TelegramConfig) -> Self {
        TelegramBot {
            client,
            token: config.bot_token.clone(),
            chat_id: config.chat_id,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.token)
    }

    pub async fn send(&self, text: &str) -> CalMergeResult<()> {
        let response: ApiResponse<serde_json::Value> = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage {
                chat_id: self.chat_id,
                text,
            })
            .send()
            .await
            .map_err(channel_error)?
            .json()
            .await
            .map_err(channel_error)?;

        if !response.ok {
            return Err(CalMergeError::CommandSource(
                response.description.unwrap_or_else(|| "sendMessage failed".into()),
            ));
        }
        Ok(())
    }
}

impl CommandSource for TelegramBot {
    async fn poll(&self, cursor: Option<i64>) -> CalMergeResult<Poll> {
        let mut request = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("timeout", "0")]);
        if let Some(offset) = cursor {
            request = request.query(&[("offset", offset)]);
        }

        let response: ApiResponse<Vec<Update>> = request
            .send()
            .await
            .map_err(channel_error)?
            .json()
            .await
            .map_err(channel_error)?;

        if !response.ok {
            return Err(CalMergeError::CommandSource(
                response.description.unwrap_or_else(|| "getUpdates failed".into()),
            ));
        }

        let updates = response.result.unwrap_or_default();
        debug!(count = updates.len(), "telegram updates received");
        Ok(poll_from_updates(&updates, self.chat_id, cursor))
    }
}

fn channel_error(e: reqwest::Error) -> CalMergeError {
    CalMergeError::CommandSource(e.to_string())
}

/// Commands from the configured chat, and the offset that acknowledges
/// every update seen (from any chat).
fn poll_from_updates(updates: &[Update], chat_id: i64, cursor: Option<i64>) -> Poll {
    let commands = CommandSet::from_texts(
        updates
            .iter()
            .filter_map(|u| u.message.as_ref())
            .filter(|m| m.chat.id == chat_id)
            .filter_map(|m| m.text.as_deref()),
    );

    let cursor = updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .or(cursor);

    Poll { commands, cursor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calmerge_core::command::Command;

    fn updates(json: &str) -> Vec<Update> {
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(response.ok);
        response.result.unwrap()
    }

    #[test]
    fn collects_commands_from_own_chat() {
        let updates = updates(
            r#"{"ok":true,"result":[
                {"update_id":10,"message":{"chat":{"id":42},"text":" Override "}},
                {"update_id":11,"message":{"chat":{"id":7},"text":"cancel"}},
                {"update_id":12,"message":{"chat":{"id":42},"text":"hello"}},
                {"update_id":13,"edited_message":{}}
            ]}"#,
        );

        let poll = poll_from_updates(&updates, 42, Some(10));
        assert!(poll.commands.contains(Command::Override));
        assert!(!poll.commands.contains(Command::Cancel));
        assert_eq!(poll.cursor, Some(14));
    }

    #[test]
    fn empty_batch_keeps_cursor() {
        let updates = updates(r#"{"ok":true,"result":[]}"#);
        let poll = poll_from_updates(&updates, 42, Some(5));
        assert!(poll.commands.is_empty());
        assert_eq!(poll.cursor, Some(5));
    }

    #[test]
    fn error_response_parses() {
        let response: ApiResponse<Vec<Update>> =
            serde_json::from_str(r#"{"ok":false,"description":"Unauthorized"}"#).unwrap();
        assert!(!response.ok);
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }
}
