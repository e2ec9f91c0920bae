pub mod debug_log;
pub mod dispatch;
pub mod engine;
pub mod host;
pub mod listeners;
pub mod repository;
pub mod resolve;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use dispatch::{DispatchContext, DispatchMode, DispatchReport, Dispatcher};
pub use engine::{CritEngine, Resolution};
pub use host::{
    ActorInfo, ActorKind, AudioPlayer, ChatLog, FileBrowser, LocalFileBrowser, LogNotifier,
    NoticeLevel, Notifier, NullAudio, PlaybackRequest, Roster, SoundHandle, StaticRoster,
    UserInfo,
};
pub use listeners::{CritListener, HostEvent, ListenerOutcome};
pub use repository::{ConfigRepository, DefaultsReport, EntryPatch, RepositoryError};
pub use resolve::{
    GlobalDefaults, Layer, MatchTier, ResolvedSettings, Trigger, resolve_settings, select_entry,
};
pub use store::{JsonFileStore, MemoryStore, SettingsStore, SettingsStoreExt, StoreError};
pub use validation::{EntryDraft, ValidationError, validate_batch, validate_entry};
