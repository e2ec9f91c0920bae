//! Trigger → entry → settings → effects

use std::sync::Arc;

use crit_types::ConfigurationEntry;

use crate::debug_log;
use crate::dispatch::{DispatchContext, DispatchReport, Dispatcher};
use crate::repository::ConfigRepository;
use crate::resolve::{MatchTier, ResolvedSettings, Trigger, resolve_settings, select_with_tier};

/// The entry selected for a trigger and its final settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub entry: ConfigurationEntry,
    pub tier: MatchTier,
    pub settings: ResolvedSettings,
}

pub struct CritEngine {
    repo: Arc<ConfigRepository>,
    dispatcher: Dispatcher,
}

impl CritEngine {
    pub fn new(repo: Arc<ConfigRepository>, dispatcher: Dispatcher) -> Self {
        Self { repo, dispatcher }
    }

    pub fn repository(&self) -> &Arc<ConfigRepository> {
        &self.repo
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Select and resolve without dispatching. Never fails: an unreadable
    /// store behaves like an empty one.
    pub fn resolve(&self, trigger: &Trigger) -> Option<Resolution> {
        let entries = self.repo.list();
        let (entry, tier) = select_with_tier(&entries, trigger)?;
        Some(self.resolve_entry(entry.clone(), tier))
    }

    fn resolve_entry(&self, entry: ConfigurationEntry, tier: MatchTier) -> Resolution {
        let bundle = self.repo.bundle(&entry.id);
        let settings = resolve_settings(&entry, &bundle, &self.repo.global_defaults());
        debug_log!(
            "Resolved {} ({:?}): text {:?}, fx {:?}, sound {:?}, art {:?}",
            entry.id,
            tier,
            settings.text.layer,
            settings.fx.layer,
            settings.sound.layer,
            settings.art.layer
        );
        Resolution {
            entry,
            tier,
            settings,
        }
    }

    /// Resolve and run the effects. A miss is silent.
    pub fn resolve_and_dispatch(
        &self,
        trigger: &Trigger,
        ctx: &DispatchContext,
    ) -> Option<DispatchReport> {
        let Some(resolution) = self.resolve(trigger) else {
            debug_log!("Nothing to dispatch for {}", trigger);
            return None;
        };
        tracing::debug!(
            trigger = %trigger,
            entry = %resolution.entry.id,
            tier = ?resolution.tier,
            "Dispatching critical"
        );
        Some(self.dispatcher.dispatch(&resolution.settings, ctx))
    }

    /// Dispatch one entry directly, whatever it targets.
    pub fn preview(&self, entry_id: &str, ctx: &DispatchContext) -> Option<DispatchReport> {
        let Some(entry) = self.repo.find(entry_id) else {
            self.repo.notifier().warn("Configuration not found");
            return None;
        };
        let tier = if entry.is_default {
            MatchTier::Default
        } else if entry.is_wildcard() {
            MatchTier::Wildcard
        } else {
            MatchTier::Specific
        };
        let resolution = self.resolve_entry(entry, tier);
        Some(self.dispatcher.dispatch(&resolution.settings, ctx))
    }
}
