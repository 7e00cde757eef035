pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use error::BotError;
pub use event::GatewayEvent;
pub use traits::Transport;
pub use types::{
    Choice, ChoiceValue, ContextType, IntegrationType, Interaction, InteractionKind,
    InteractionOption, OptionKind, OptionSchema, Presence, PresenceStatus, PublishedCommand,
    PublishedSubcommand,
};
