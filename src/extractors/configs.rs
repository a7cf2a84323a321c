//! Config-surface extraction.
//!
//! Env keys come from two places: string literals carrying a configured
//! prefix, and the literal argument of `env::var(...)` calls. App props
//! are `receiver.field` accesses whose receiver looks like a config
//! value (`self.config.token`, `app_config.retries`).

use std::collections::BTreeSet;

use crate::domain::model::ConfigSection;
use crate::ports::SemanticProvider;

#[derive(Debug, Clone, Default)]
pub struct ConfigsOptions {
    /// Env-key literal prefixes, e.g. `APP_`. Empty means only
    /// `env::var` arguments are collected.
    pub env_prefixes: Vec<String>,
}

pub struct ConfigsExtractor {
    options: ConfigsOptions,
}

impl ConfigsExtractor {
    pub fn new(options: ConfigsOptions) -> Self {
        Self { options }
    }

    pub fn extract<P: SemanticProvider + ?Sized>(&self, provider: &P) -> ConfigSection {
        let mut env_keys = BTreeSet::new();
        let mut app_props = BTreeSet::new();

        for project in provider.projects() {
            for lit in provider.string_literals(&project.name) {
                if self
                    .options
                    .env_prefixes
                    .iter()
                    .any(|p| lit.value.starts_with(p) && lit.value.len() > p.len())
                {
                    env_keys.insert(lit.value);
                }
            }
            for inv in provider.invocations(&project.name) {
                if inv.method != "var" {
                    continue;
                }
                let from_env = inv
                    .receiver
                    .as_deref()
                    .is_some_and(|r| r == "env" || r.ends_with("::env"));
                if from_env {
                    if let Some(key) = &inv.first_str_arg {
                        env_keys.insert(key.clone());
                    }
                }
            }
            for access in provider.field_accesses(&project.name) {
                let tail = access
                    .receiver
                    .rsplit(['.', ':'])
                    .next()
                    .unwrap_or(&access.receiver);
                if tail.to_lowercase().ends_with("config") {
                    app_props.insert(format!("{}.{}", tail, access.field));
                }
            }
        }

        ConfigSection {
            env_keys: env_keys.into_iter().collect(),
            app_props: app_props.into_iter().collect(),
        }
    }
}
