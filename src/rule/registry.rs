use std::sync::Arc;
use tracing::debug;

use super::{builtin, Callback, CacheRule, Group, RuleDecl};
use crate::container::Container;
use crate::error::CacheError;
use crate::orchestrator::plot::{plot_rule, Renderer};

/// Rules known to the application, built once at start-up
///
/// Registration order is preserved. Registering a rule under an existing name
/// replaces the earlier one, so configured rules can shadow built-ins.
pub struct Registry<C> {
    rules: Vec<CacheRule<C>>,
}

impl<C: Container + 'static> Registry<C> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Registry holding the built-in preprocessing and tool rules
    pub fn builtin() -> Result<Self, CacheError> {
        let mut registry = Self::new();
        registry.extend(&builtin::declarations()?)?;
        Ok(registry)
    }

    /// Build and register declared rules
    pub fn extend(&mut self, decls: &[RuleDecl]) -> Result<(), CacheError> {
        for decl in decls {
            self.register(decl.build()?);
        }
        Ok(())
    }

    /// Add a rule, returning the one it replaced
    pub fn register(&mut self, rule: CacheRule<C>) -> Option<CacheRule<C>> {
        debug!(rule = rule.name(), group = %rule.group(), "registering rule");

        match self.rules.iter_mut().find(|r| r.name() == rule.name()) {
            Some(existing) => Some(std::mem::replace(existing, rule)),
            None => {
                self.rules.push(rule);
                None
            }
        }
    }

    /// Register the plot-capture rule `<name>_plot` for `renderer`
    pub fn register_plot(
        &mut self,
        name: &str,
        renderer: Arc<dyn Renderer<C>>,
    ) -> Result<&CacheRule<C>, CacheError> {
        let rule = plot_rule(name, renderer)?;
        let rule_name = rule.name().to_string();
        self.register(rule);
        self.get(&rule_name)
            .ok_or_else(|| CacheError::config(format!("Plot rule `{}` was not registered", rule_name)))
    }

    /// Attach the default computation of a registered rule
    pub fn bind(&mut self, name: &str, callback: Callback<C>) -> Result<(), CacheError> {
        let index = self
            .rules
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| CacheError::config(format!("Unknown rule: `{}`", name)))?;

        let rule = self.rules.remove(index).with_default_fn(callback);
        self.rules.insert(index, rule);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CacheRule<C>> {
        self.rules.iter().find(|r| r.name() == name)
    }

    pub fn rules(&self) -> impl Iterator<Item = &CacheRule<C>> {
        self.rules.iter()
    }

    pub fn in_group(&self, group: Group) -> impl Iterator<Item = &CacheRule<C>> {
        self.rules.iter().filter(move |r| r.group() == group)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<C: Container + 'static> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}
