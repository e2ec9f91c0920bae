use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crit_core::listeners::ChatMessage;
use crit_core::store::{debug_mode, register_defaults};
use crit_core::{
    ChatLog, ConfigRepository, CritEngine, CritListener, Dispatcher, JsonFileStore,
    LocalFileBrowser, LogNotifier, MemoryStore, Notifier, SettingsStore, StaticRoster,
};

use crate::config::CliConfig;
use crate::surface::{ConsoleAudio, ConsoleFx, ConsoleOverlay};

/// Chat messages fed through the `event` command, so deferred events can
/// be re-validated on animation complete.
#[derive(Debug, Default)]
pub struct ChatRecord {
    messages: Mutex<HashMap<String, ChatMessage>>,
}

impl ChatRecord {
    pub fn record(&self, message: ChatMessage) {
        self.guard().insert(message.id.clone(), message);
    }

    pub fn remove(&self, id: &str) -> bool {
        self.guard().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, HashMap<String, ChatMessage>> {
        self.messages.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ChatLog for ChatRecord {
    fn message(&self, id: &str) -> Option<ChatMessage> {
        self.guard().get(id).cloned()
    }
}

/// Holds all shared state for the CLI application.
/// This is a lightweight container - logic lives in crit-core.
pub struct CliContext {
    pub config: CliConfig,
    pub store: Arc<dyn SettingsStore>,
    pub repo: Arc<ConfigRepository>,
    pub engine: Arc<CritEngine>,
    pub listener: CritListener,
    pub roster: Arc<StaticRoster>,
    pub chat: Arc<ChatRecord>,
}

impl CliContext {
    /// Open the configured store and bootstrap it.
    pub fn new(config: CliConfig) -> Result<Self, String> {
        let store: Arc<dyn SettingsStore> = match config.resolved_store_path() {
            Some(path) => Arc::new(JsonFileStore::open(path).map_err(|e| e.to_string())?),
            None => {
                tracing::warn!("No config directory, settings will not be saved");
                Arc::new(MemoryStore::new())
            }
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: CliConfig, store: Arc<dyn SettingsStore>) -> Result<Self, String> {
        register_defaults(&*store).map_err(|e| e.to_string())?;
        crit_core::debug_log::set_enabled(config.debug || debug_mode(&*store));

        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let repo = Arc::new(ConfigRepository::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
        ));
        match repo.ensure_defaults() {
            Ok(report) if !report.is_noop() => tracing::info!(
                created = report.created.len(),
                migrated = report.migrated.len(),
                "Bootstrapped default configurations"
            ),
            Ok(_) => {}
            Err(err) => tracing::error!(error = %err, "Could not ensure default configurations"),
        }

        let roster = Arc::new(match &config.roster_file {
            Some(path) => load_roster(path)?,
            None => StaticRoster::default(),
        });

        let dispatcher = Dispatcher::from_host(
            Arc::new(ConsoleOverlay),
            Arc::new(ConsoleFx::new(config.viewport_width, config.viewport_height)),
            Arc::new(ConsoleAudio),
            Arc::new(LocalFileBrowser::new(config.asset_root.clone())),
            notifier,
        );
        let engine = Arc::new(CritEngine::new(Arc::clone(&repo), dispatcher));
        let chat = Arc::new(ChatRecord::default());
        let listener = CritListener::new(
            Arc::clone(&engine),
            roster.clone(),
            chat.clone(),
        );

        Ok(Self {
            config,
            store,
            repo,
            engine,
            listener,
            roster,
            chat,
        })
    }
}

pub fn load_roster(path: &Path) -> Result<StaticRoster, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read roster {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("invalid roster {}: {e}", path.display()))
}
