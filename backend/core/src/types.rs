use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Integration surfaces & execution contexts
// ---------------------------------------------------------------------------

/// Where an application command can be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum IntegrationType {
    Guild,
    User,
}

impl IntegrationType {
    pub const ALL: [IntegrationType; 2] = [IntegrationType::Guild, IntegrationType::User];

    /// Both surfaces.
    pub fn all() -> BTreeSet<IntegrationType> {
        Self::ALL.into_iter().collect()
    }
}

impl From<IntegrationType> for u8 {
    fn from(value: IntegrationType) -> Self {
        match value {
            IntegrationType::Guild => 0,
            IntegrationType::User => 1,
        }
    }
}

impl TryFrom<u8> for IntegrationType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IntegrationType::Guild),
            1 => Ok(IntegrationType::User),
            other => Err(format!("unknown integration type {other}")),
        }
    }
}

/// Where an application command can be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ContextType {
    Guild,
    BotDm,
    PrivateChannel,
}

impl ContextType {
    pub const ALL: [ContextType; 3] = [
        ContextType::Guild,
        ContextType::BotDm,
        ContextType::PrivateChannel,
    ];

    /// Guild-only, the safe default.
    pub fn guild_only() -> BTreeSet<ContextType> {
        BTreeSet::from([ContextType::Guild])
    }
}

impl From<ContextType> for u8 {
    fn from(value: ContextType) -> Self {
        match value {
            ContextType::Guild => 0,
            ContextType::BotDm => 1,
            ContextType::PrivateChannel => 2,
        }
    }
}

impl TryFrom<u8> for ContextType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ContextType::Guild),
            1 => Ok(ContextType::BotDm),
            2 => Ok(ContextType::PrivateChannel),
            other => Err(format!("unknown context type {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Option schema
// ---------------------------------------------------------------------------

/// The value type of a command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OptionKind {
    SubCommand,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionKind {
    /// Whether the platform accepts `autocomplete` on this kind.
    pub fn supports_autocomplete(self) -> bool {
        matches!(self, OptionKind::String | OptionKind::Integer | OptionKind::Number)
    }
}

impl From<OptionKind> for u8 {
    fn from(value: OptionKind) -> Self {
        match value {
            OptionKind::SubCommand => 1,
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Mentionable => 9,
            OptionKind::Number => 10,
            OptionKind::Attachment => 11,
        }
    }
}

impl TryFrom<u8> for OptionKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => OptionKind::SubCommand,
            3 => OptionKind::String,
            4 => OptionKind::Integer,
            5 => OptionKind::Boolean,
            6 => OptionKind::User,
            7 => OptionKind::Channel,
            8 => OptionKind::Role,
            9 => OptionKind::Mentionable,
            10 => OptionKind::Number,
            11 => OptionKind::Attachment,
            other => return Err(format!("unknown option type {other}")),
        })
    }
}

/// Value of a predefined choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
    Number(f64),
}

/// A predefined choice for a string, integer or number option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,
    pub value: ChoiceValue,
}

impl Choice {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: ChoiceValue::String(value.into()) }
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self { name: name.into(), value: ChoiceValue::Integer(value) }
    }

    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), value: ChoiceValue::Number(value) }
    }
}

/// One command argument. Immutable once appended to a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSchema {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_types: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<bool>,
}

impl OptionSchema {
    pub fn new(
        kind: OptionKind,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required,
            choices: None,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            channel_types: None,
            autocomplete: None,
        }
    }

    pub fn is_autocomplete(&self) -> bool {
        self.autocomplete == Some(true) && self.kind.supports_autocomplete()
    }
}

// ---------------------------------------------------------------------------
// Published command payload
// ---------------------------------------------------------------------------

/// A subcommand entry inside a published group command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedSubcommand {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<OptionSchema>,
    /// Member-level surfaces; empty means the group's apply.
    #[serde(rename = "integration_types", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub integration_surfaces: BTreeSet<IntegrationType>,
    /// Member-level contexts; empty means the group's apply.
    #[serde(rename = "contexts", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub execution_contexts: BTreeSet<ContextType>,
}

/// The group-level command record sent to the platform's command list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedCommand {
    #[serde(rename = "name")]
    pub group_key: String,
    pub description: String,
    #[serde(rename = "options")]
    pub subcommands: Vec<PublishedSubcommand>,
    #[serde(rename = "integration_types")]
    pub integration_surfaces: BTreeSet<IntegrationType>,
    #[serde(rename = "contexts")]
    pub execution_contexts: BTreeSet<ContextType>,
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Command,
    Autocomplete,
    Other,
}

/// An option value carried by an incoming interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionOption {
    pub name: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub focused: bool,
}

/// Platform-neutral view of an incoming interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    /// Continuation token used for callbacks and reply edits.
    pub token: String,
    pub application_id: String,
    pub kind: InteractionKind,
    /// Top-level command name (the group key).
    pub command: String,
    pub subcommand: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub options: Vec<InteractionOption>,
}

impl Interaction {
    pub fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.options.iter().find(|o| o.name == name).map(|o| &o.value)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(|v| v.as_str())
    }

    pub fn option_i64(&self, name: &str) -> Option<i64> {
        self.option(name).and_then(|v| v.as_i64())
    }

    pub fn option_f64(&self, name: &str) -> Option<f64> {
        self.option(name).and_then(|v| v.as_f64())
    }

    pub fn option_bool(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(|v| v.as_bool())
    }

    /// The option the user is currently typing (autocomplete only).
    pub fn focused_option(&self) -> Option<&InteractionOption> {
        self.options.iter().find(|o| o.focused)
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    #[default]
    Online,
    Idle,
    Dnd,
    Invisible,
}

impl std::str::FromStr for PresenceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "online" => Ok(PresenceStatus::Online),
            "idle" => Ok(PresenceStatus::Idle),
            "dnd" => Ok(PresenceStatus::Dnd),
            "invisible" => Ok(PresenceStatus::Invisible),
            other => Err(format!("unknown presence status '{other}'")),
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Idle => "idle",
            PresenceStatus::Dnd => "dnd",
            PresenceStatus::Invisible => "invisible",
        };
        f.write_str(s)
    }
}

/// Bot presence applied once the gateway is ready.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    pub status: PresenceStatus,
    pub activity: Option<String>,
}
