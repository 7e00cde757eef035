/// Group registry: sealed command groups, looked up by `GroupId`.
///
/// Sealing freezes a `GroupBuilder`: it derives the group key and
/// description, repairs malformed integration/context metadata, and moves
/// the definitions into the registry. Nothing is mutated after that.
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use botforge_core::{ContextType, IntegrationType};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::builder::GroupBuilder;
use crate::definition::{bind_definition, BoundGroup, Definition};

/// Opaque identifier assigned when a group is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GroupId(Uuid);

impl GroupId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A declaring type that knows how to declare its own members.
pub trait CommandGroup: Default + Send + Sync + 'static {
    /// Type name; the group key is its lowercase form.
    const NAME: &'static str;

    fn declare(group: &mut GroupBuilder<Self>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Command,
    Event,
}

/// A repair applied to malformed group metadata while sealing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetadataRepair {
    IntegrationOverflow { supplied: usize },
    ContextOverflow { supplied: usize },
}

/// Finalized group-level metadata.
#[derive(Debug, Clone, Serialize)]
pub struct GroupMeta {
    pub id: GroupId,
    pub class_name: String,
    pub key: String,
    pub description: String,
    pub kind: GroupKind,
    pub integration_surfaces: BTreeSet<IntegrationType>,
    pub execution_contexts: BTreeSet<ContextType>,
    pub repairs: Vec<MetadataRepair>,
}

/// Type-erased view of a sealed group.
pub(crate) trait SealedGroup: Send + Sync {
    fn meta(&self) -> &GroupMeta;

    fn member_names(&self) -> Vec<String>;

    /// Instantiate the declaring type once and bind every handler to it.
    fn bind(&self) -> BoundGroup;
}

struct Sealed<G> {
    meta: GroupMeta,
    definitions: Vec<Definition<G>>,
}

impl<G: Default + Send + Sync + 'static> SealedGroup for Sealed<G> {
    fn meta(&self) -> &GroupMeta {
        &self.meta
    }

    fn member_names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.name().to_string()).collect()
    }

    fn bind(&self) -> BoundGroup {
        let instance = Arc::new(G::default());
        let mut bound = BoundGroup::default();
        for definition in &self.definitions {
            bind_definition(definition, &instance, &self.meta.key, &mut bound);
        }
        bound
    }
}

impl<G: Default + Send + Sync + 'static> GroupBuilder<G> {
    /// Finalize the group and register it. Returns the id assigned at declaration.
    pub fn seal(self, registry: &mut GroupRegistry) -> GroupId {
        let key = self.class_name.to_lowercase();
        let description = format!("Commands for {key}");
        let command_count = self.definitions.iter().filter(|d| d.is_command()).count();
        let mut repairs = Vec::new();

        let (kind, integration_surfaces, execution_contexts) = if command_count > 0 {
            let integration = resolve_integration(&key, self.integration.as_deref(), &mut repairs);
            let contexts = resolve_contexts(&key, self.contexts.as_deref(), &mut repairs);
            info!(
                "Group {} injected with {} commands",
                key,
                self.definitions.len()
            );
            (GroupKind::Command, integration, contexts)
        } else {
            info!("Group {} injected with {} events", key, self.definitions.len());
            (GroupKind::Event, IntegrationType::all(), ContextType::guild_only())
        };

        let meta = GroupMeta {
            id: self.id,
            class_name: self.class_name,
            key,
            description,
            kind,
            integration_surfaces,
            execution_contexts,
            repairs,
        };
        registry.insert(Sealed {
            meta,
            definitions: self.definitions,
        })
    }
}

fn resolve_integration(
    key: &str,
    supplied: Option<&[IntegrationType]>,
    repairs: &mut Vec<MetadataRepair>,
) -> BTreeSet<IntegrationType> {
    match supplied {
        None | Some([]) => IntegrationType::all(),
        Some(list) if list.len() > IntegrationType::ALL.len() => {
            warn!(
                group = %key,
                supplied = list.len(),
                "Too many integration types; falling back to guild + user"
            );
            repairs.push(MetadataRepair::IntegrationOverflow { supplied: list.len() });
            IntegrationType::all()
        }
        Some(list) => list.iter().copied().collect(),
    }
}

/// Counts supplied entries, duplicates included, so a repeated context
/// still trips the overflow repair.
fn resolve_contexts(
    key: &str,
    supplied: Option<&[ContextType]>,
    repairs: &mut Vec<MetadataRepair>,
) -> BTreeSet<ContextType> {
    match supplied {
        None | Some([]) => ContextType::guild_only(),
        Some(list) if list.len() > ContextType::ALL.len() => {
            warn!(
                group = %key,
                supplied = list.len(),
                "Too many contexts; falling back to guild only"
            );
            repairs.push(MetadataRepair::ContextOverflow { supplied: list.len() });
            ContextType::guild_only()
        }
        Some(list) => list.iter().copied().collect(),
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns every sealed group, keyed by the id assigned at declaration time.
#[derive(Default)]
pub struct GroupRegistry {
    groups: IndexMap<GroupId, Box<dyn SealedGroup>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare and seal a `CommandGroup` in one step.
    pub fn declare<G: CommandGroup>(&mut self) -> GroupId {
        let mut builder = GroupBuilder::<G>::new(G::NAME);
        G::declare(&mut builder);
        builder.seal(self)
    }

    fn insert<G: Default + Send + Sync + 'static>(&mut self, sealed: Sealed<G>) -> GroupId {
        let id = sealed.meta.id;
        self.groups.insert(id, Box::new(sealed));
        id
    }

    pub fn meta(&self, id: GroupId) -> Option<&GroupMeta> {
        self.groups.get(&id).map(|g| g.meta())
    }

    pub fn member_names(&self, id: GroupId) -> Option<Vec<String>> {
        self.groups.get(&id).map(|g| g.member_names())
    }

    /// Ids of all sealed groups, in sealing order.
    pub fn ids(&self) -> Vec<GroupId> {
        self.groups.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub(crate) fn get(&self, id: GroupId) -> Option<&dyn SealedGroup> {
        self.groups.get(&id).map(|g| g.as_ref())
    }
}
