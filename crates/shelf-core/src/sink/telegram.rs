use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{PhotoPost, PhotoSender};
use crate::{
    config::TelegramConfig,
    error::{Error, Result},
};

/// Posts through the Telegram Bot API `sendPhoto` method.
pub struct TelegramSender {
    client: Client,
    endpoint: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendPhotoPayload<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    result: Option<SentMessage>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramSender {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: send_photo_url(&config.api_base, &config.bot_token),
            chat_id: config.chat_id.clone(),
        })
    }
}

fn send_photo_url(api_base: &str, token: &str) -> String {
    format!("{}/bot{token}/sendPhoto", api_base.trim_end_matches('/'))
}

/// Turn a raw `sendPhoto` reply into the id of the posted message.
fn parse_reply(success: bool, status: u16, body: &str) -> Result<i64> {
    let reply: TelegramReply = serde_json::from_str(body)?;
    if !success || !reply.ok {
        return Err(Error::Telegram(
            reply
                .description
                .unwrap_or_else(|| format!("HTTP status {status}")),
        ));
    }
    reply
        .result
        .map(|m| m.message_id)
        .ok_or_else(|| Error::Telegram("reply carries no message".to_string()))
}

impl PhotoSender for TelegramSender {
    async fn send_photo(&self, post: &PhotoPost) -> Result<i64> {
        let payload = SendPhotoPayload {
            chat_id: &self.chat_id,
            photo: &post.photo,
            caption: &post.caption,
            parse_mode: "HTML",
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_reply(status.is_success(), status.as_u16(), &body)
    }
}
