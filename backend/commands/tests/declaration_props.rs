//! Property tests for option ordering and re-declaration.

use std::sync::Arc;

use anyhow::Result;
use botforge_commands::{GroupBuilder, InteractionContext, StringOptionMeta};
use proptest::prelude::*;

#[derive(Default)]
struct Probe;

impl Probe {
    async fn run(self: Arc<Self>, _ctx: InteractionContext) -> Result<()> {
        Ok(())
    }
}

fn declare(before: &[bool], after: &[bool]) -> Vec<(String, bool)> {
    let mut group = GroupBuilder::<Probe>::new("Probe");
    let mut member = group.member("probe", Probe::run);
    for (i, required) in before.iter().enumerate() {
        member = member.string_option(&format!("b{i}"), "before", *required, StringOptionMeta::default());
    }
    member = member.command("Probe", 0, false);
    for (i, required) in after.iter().enumerate() {
        member = member.string_option(&format!("a{i}"), "after", *required, StringOptionMeta::default());
    }
    drop(member);

    group
        .command_definition("probe")
        .map(|def| def.options.iter().map(|o| (o.name.clone(), o.required)).collect())
        .unwrap_or_default()
}

proptest! {
    #[test]
    fn required_options_precede_optional_at_declaration_time(
        before in prop::collection::vec(any::<bool>(), 0..12),
        after in prop::collection::vec(any::<bool>(), 0..6),
    ) {
        let options = declare(&before, &after);
        prop_assert_eq!(options.len(), before.len() + after.len());

        let (sorted, appended) = options.split_at(before.len());

        // Stable partition of the options present when `command` ran.
        let expected: Vec<String> = before
            .iter()
            .enumerate()
            .filter(|(_, r)| **r)
            .chain(before.iter().enumerate().filter(|(_, r)| !**r))
            .map(|(i, _)| format!("b{i}"))
            .collect();
        let actual: Vec<String> = sorted.iter().map(|(n, _)| n.clone()).collect();
        prop_assert_eq!(actual, expected);

        // Later options stay in append order.
        let tail: Vec<String> = appended.iter().map(|(n, _)| n.clone()).collect();
        let expected_tail: Vec<String> = (0..after.len()).map(|i| format!("a{i}")).collect();
        prop_assert_eq!(tail, expected_tail);
    }

    #[test]
    fn redeclaration_keeps_one_definition_with_latest_scalars(
        declarations in prop::collection::vec((any::<u8>(), any::<bool>()), 1..6),
    ) {
        let mut group = GroupBuilder::<Probe>::new("Probe");
        for (i, (cooldown, ephemeral)) in declarations.iter().enumerate() {
            group
                .member("probe", Probe::run)
                .command(format!("description {i}"), u64::from(*cooldown), *ephemeral);
        }

        prop_assert_eq!(group.definitions().len(), 1);
        let def = group.command_definition("probe").unwrap();
        let (cooldown, ephemeral) = declarations[declarations.len() - 1];
        prop_assert_eq!(def.cooldown_secs, u64::from(cooldown));
        prop_assert_eq!(def.ephemeral, ephemeral);
        prop_assert_eq!(def.description.clone(), format!("description {}", declarations.len() - 1));
    }
}
