//! Chat service: chats, message history, problems and streamed replies.
//!
//! Stateless request/response translation. Errors propagate to the caller,
//! except that deleting an already-missing chat counts as success.

use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::stream::MessageStream;
use crate::types::{Chat, CreateChat, Message, MessageSender, ProblemsPage, SendMessageRequest};

/// Problems are always requested ten at a time.
pub const PROBLEMS_PAGE_SIZE: u32 = 10;

#[derive(Deserialize)]
struct CreatedChat {
    id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDto {
    id: Uuid,
    creation_time: String,
    text: String,
    #[serde(rename = "type")]
    role: String,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        Self { id: dto.id, time: dto.creation_time, text: dto.text, sender: MessageSender::from_backend_role(&dto.role) }
    }
}

#[derive(Clone, Debug)]
pub struct ChatService {
    api: ApiClient,
}

impl ChatService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Create a chat and return its id.
    ///
    /// # Errors
    ///
    /// Returns the request error if the backend rejects the chat.
    pub async fn create_chat(&self, chat: &CreateChat) -> Result<Uuid, ApiError> {
        let created: CreatedChat = self.api.send_json(self.api.post("/api/chat/create").json(chat)).await?;
        tracing::debug!(chat_id = %created.id, name = %chat.name, "chat created");
        Ok(created.id)
    }

    /// Delete a chat. A chat the backend no longer knows is already deleted.
    ///
    /// # Errors
    ///
    /// Returns any failure other than a 404.
    pub async fn delete_chat(&self, id: Uuid) -> Result<(), ApiError> {
        let path = format!("/api/chat/delete/{id}");
        match self.api.send_empty(self.api.post(&path).json(&serde_json::json!({}))).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!(chat_id = %id, "chat already deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!(chat_id = %id, error = %e, "failed to delete chat");
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the request error if the list cannot be fetched.
    pub async fn get_chats(&self) -> Result<Vec<Chat>, ApiError> {
        self.api.send_json(self.api.get("/api/chat/get")).await
    }

    /// Look a chat up in the full list; `None` if it is not there.
    ///
    /// # Errors
    ///
    /// Returns the request error if the list cannot be fetched.
    pub async fn get_chat_by_id(&self, id: Uuid) -> Result<Option<Chat>, ApiError> {
        Ok(self.get_chats().await?.into_iter().find(|c| c.id == id))
    }

    /// Send `text` to a chat and stream the assistant's reply.
    ///
    /// # Errors
    ///
    /// Returns the request error if the backend refuses the message. Errors
    /// after the reply has started arrive through the stream itself.
    pub async fn get_next_message(&self, text: &str, chat_id: Uuid) -> Result<MessageStream, ApiError> {
        let body = SendMessageRequest { chat_id, text };
        let response = self.api.send_streaming(self.api.post("/api/Message/complete").json(&body)).await?;
        Ok(MessageStream::from_response(response))
    }

    /// # Errors
    ///
    /// Returns the request error if the history cannot be fetched.
    pub async fn get_chat_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, ApiError> {
        let request = self
            .api
            .get("/api/Message/get-messages-from-chat")
            .query(&[("chatId", chat_id.to_string())]);
        let messages: Vec<MessageDto> = self.api.send_json(request).await?;
        Ok(messages.into_iter().map(Message::from).collect())
    }

    /// Fetch one page of problems, optionally filtered by name prefix.
    ///
    /// # Errors
    ///
    /// Returns the request error if the page cannot be fetched.
    pub async fn get_problems(&self, page: u32, prefix: Option<&str>) -> Result<ProblemsPage, ApiError> {
        let request = self.api.get("/api/Tasks/problems").query(&problems_query(page, prefix));
        self.api.send_json(request).await
    }
}

fn problems_query(page: u32, prefix: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("page", page.to_string()), ("size", PROBLEMS_PAGE_SIZE.to_string())];
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        query.push(("prefix", prefix.to_owned()));
    }
    query
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
