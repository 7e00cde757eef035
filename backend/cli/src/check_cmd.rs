//! CLI Check Command
//!
//! Validates the config file and lists the command groups the binary
//! would publish, without connecting to Discord.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use botforge_commands::{GroupKind, GroupRegistry};
use botforge_config::ValidationReport;

use crate::groups;

/// Executes the check and returns whether the config is usable.
pub async fn run(config_path: &Path) -> Result<bool> {
    println!("\n🔍 Checking BotForge setup...\n");

    let (_config, report) = botforge_config::load_and_prepare(config_path).await?;
    print!("{}", render_report(config_path, &report));

    let mut registry = GroupRegistry::new();
    groups::declare_all(&mut registry);
    print!("{}", render_groups(&registry));

    println!();
    if report.is_valid() {
        println!("✅ All checks passed! The bot is ready to run.");
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
    }
    Ok(report.is_valid())
}

fn render_report(path: &Path, report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Config ({}):", path.display());
    if report.errors.is_empty() && report.warnings.is_empty() {
        let _ = writeln!(out, "  🟢 no problems found");
    }
    for error in &report.errors {
        let _ = writeln!(out, "  🔴 {}: {}", error.path, error.message);
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "  🟡 {}: {}", warning.path, warning.message);
    }
    out
}

fn render_groups(registry: &GroupRegistry) -> String {
    let mut out = String::from("Groups:\n");
    for id in registry.ids() {
        let (Some(meta), Some(members)) = (registry.meta(id), registry.member_names(id)) else {
            continue;
        };
        let kind = match meta.kind {
            GroupKind::Command => "/",
            GroupKind::Event => "events of ",
        };
        let _ = writeln!(out, "  🟢 {}{} [{}]", kind, meta.key, members.join(", "));
        for repair in &meta.repairs {
            let _ = writeln!(out, "  🟡 {} metadata repaired: {:?}", meta.key, repair);
        }
    }
    out
}
