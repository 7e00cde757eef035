//! `botforge-commands`: declaring, wiring and dispatching slash commands.
//!
//! Flow: `GroupBuilder` collects member annotations → `seal` freezes the
//! group into a `GroupRegistry` → `CommandRegistry::wire` binds handlers to
//! one instance per group → `Dispatcher` resolves and runs interactions.

pub mod builder;
pub mod context;
pub mod cooldown;
pub mod definition;
pub mod dispatch;
pub mod group;
pub mod registry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use builder::{GroupBuilder, IntegerOptionMeta, MemberBuilder, NumberOptionMeta, StringOptionMeta};
pub use context::{AutocompleteContext, EventContext, InteractionContext};
pub use cooldown::{CooldownCheck, CooldownTracker};
pub use definition::{BoundCommand, CommandDefinition, Definition, EventDefinition};
pub use dispatch::{DispatchOutcome, Dispatcher, DEFAULT_WATCHDOG, EXPIRED_NOTICE, FAILURE_NOTICE};
pub use group::{CommandGroup, GroupId, GroupKind, GroupMeta, GroupRegistry, MetadataRepair};
pub use registry::{publish, CommandRegistry};
