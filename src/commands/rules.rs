use anyhow::Result;

use crate::config::ScacheConfig;
use crate::container::AnnotatedData;
use crate::rule::{Group, Registry};

/// List built-in and configured rules
pub fn list(config: &ScacheConfig, group: Option<Group>) -> Result<()> {
    let mut registry = Registry::<AnnotatedData>::builtin()?;
    registry.extend(&config.rules)?;

    for rule in registry.rules() {
        if group.is_some_and(|g| g != rule.group()) {
            continue;
        }

        println!("{} [{}] -> {}", rule.name(), rule.group(), rule.default_fname());
        for entry in rule.entries() {
            let optional = if entry.optional { " (optional)" } else { "" };
            println!("  {:<14} {}{}", entry.declared, entry.key, optional);
        }
        for (alias, canonical) in rule.aliases() {
            println!("  alias {} = {}", alias, canonical);
        }
    }

    Ok(())
}
