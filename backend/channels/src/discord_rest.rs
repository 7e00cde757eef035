/// Discord REST transport.
///
/// Answers interactions through the interaction callback endpoint, edits
/// deferred replies through the interaction webhook, and overwrites the
/// application command list. No retries: a failed call is reported to the
/// caller as-is.
use anyhow::Result;
use async_trait::async_trait;
use botforge_core::{Choice, Interaction, PublishedCommand, Transport};
use botforge_logging::redact_sensitive_data;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use tracing::{debug, error};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Message flag marking a reply as visible to the invoker only.
const EPHEMERAL_FLAG: u64 = 1 << 6;

// ---------------------------------------------------------------------------
// Discord wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackKind {
    ChannelMessage = 4,
    DeferredChannelMessage = 5,
    AutocompleteResult = 8,
}

#[derive(Serialize, Debug)]
struct InteractionCallback<'a> {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<CallbackData<'a>>,
}

#[derive(Serialize, Debug, Default)]
struct CallbackData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    choices: Option<&'a [Choice]>,
}

#[derive(Serialize, Debug)]
struct EditMessage<'a> {
    content: &'a str,
}

fn defer_body(ephemeral: bool) -> InteractionCallback<'static> {
    InteractionCallback {
        kind: CallbackKind::DeferredChannelMessage as u8,
        data: ephemeral.then(|| CallbackData {
            flags: Some(EPHEMERAL_FLAG),
            ..Default::default()
        }),
    }
}

fn ephemeral_reply_body(content: &str) -> InteractionCallback<'_> {
    InteractionCallback {
        kind: CallbackKind::ChannelMessage as u8,
        data: Some(CallbackData {
            content: Some(content),
            flags: Some(EPHEMERAL_FLAG),
            ..Default::default()
        }),
    }
}

fn autocomplete_body(choices: &[Choice]) -> InteractionCallback<'_> {
    InteractionCallback {
        kind: CallbackKind::AutocompleteResult as u8,
        data: Some(CallbackData {
            choices: Some(choices),
            ..Default::default()
        }),
    }
}

// ---------------------------------------------------------------------------
// Transport struct
// ---------------------------------------------------------------------------

pub struct DiscordRest {
    bot_token: String,
    base_url: String,
    http_client: Client,
}

impl DiscordRest {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            base_url: DISCORD_API_BASE.to_string(),
            http_client: Client::new(),
        }
    }

    /// Point the transport at another API root (e.g. a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn callback_url(&self, interaction: &Interaction) -> String {
        format!(
            "{}/interactions/{}/{}/callback",
            self.base_url, interaction.id, interaction.token
        )
    }

    fn original_message_url(&self, interaction: &Interaction) -> String {
        format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.base_url, interaction.application_id, interaction.token
        )
    }

    fn commands_url(&self, application_id: &str, guild_id: Option<&str>) -> String {
        match guild_id {
            Some(guild_id) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.base_url, application_id, guild_id
            ),
            None => format!("{}/applications/{}/commands", self.base_url, application_id),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header("Authorization", format!("Bot {}", self.bot_token))
    }

    /// Request URLs carry interaction tokens, so transport errors are
    /// redacted before they are logged or returned.
    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<()> {
        let res = match request.send().await {
            Ok(res) => res,
            Err(e) => {
                let err = redact_sensitive_data(&e.to_string());
                error!("[Discord] {} request failed: {}", operation, err);
                anyhow::bail!("Discord {} request failed: {}", operation, err);
            }
        };
        let status = res.status();
        if !status.is_success() {
            let err = redact_sensitive_data(&res.text().await.unwrap_or_default());
            error!("[Discord] {} failed ({}): {}", operation, status, err);
            anyhow::bail!("Discord {} failed ({}): {}", operation, status, err);
        }
        debug!("[Discord] {} ok", operation);
        Ok(())
    }

    async fn callback(&self, interaction: &Interaction, operation: &str, body: &InteractionCallback<'_>) -> Result<()> {
        let url = self.callback_url(interaction);
        self.send(operation, self.request(Method::POST, &url).json(body)).await
    }

    async fn put_commands(
        &self,
        application_id: &str,
        guild_id: Option<&str>,
        commands: &[PublishedCommand],
    ) -> Result<()> {
        let url = self.commands_url(application_id, guild_id);
        self.send("command registration", self.request(Method::PUT, &url).json(commands))
            .await
    }
}

#[async_trait]
impl Transport for DiscordRest {
    fn name(&self) -> &str {
        "discord"
    }

    async fn defer_reply(&self, interaction: &Interaction, ephemeral: bool) -> Result<()> {
        self.callback(interaction, "defer", &defer_body(ephemeral)).await
    }

    async fn edit_reply(&self, interaction: &Interaction, content: &str) -> Result<()> {
        let url = self.original_message_url(interaction);
        self.send(
            "reply edit",
            self.request(Method::PATCH, &url).json(&EditMessage { content }),
        )
        .await
    }

    async fn reply_ephemeral(&self, interaction: &Interaction, content: &str) -> Result<()> {
        self.callback(interaction, "ephemeral reply", &ephemeral_reply_body(content))
            .await
    }

    async fn respond_autocomplete(&self, interaction: &Interaction, choices: &[Choice]) -> Result<()> {
        self.callback(interaction, "autocomplete", &autocomplete_body(choices))
            .await
    }

    async fn publish_command_list(&self, application_id: &str, commands: &[PublishedCommand]) -> Result<()> {
        self.put_commands(application_id, None, commands).await
    }

    async fn publish_guild_command_list(
        &self,
        application_id: &str,
        guild_id: &str,
        commands: &[PublishedCommand],
    ) -> Result<()> {
        self.put_commands(application_id, Some(guild_id), commands).await
    }
}
