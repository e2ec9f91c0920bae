//! Error types for repository operations

use crit_types::SettingCategory;
use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Errors surfaced by [`super::ConfigRepository`] writes
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to load configurations")]
    Load(#[source] StoreError),

    #[error("failed to save configuration")]
    Save(#[source] StoreError),

    #[error("failed to save {} settings for configuration '{id}'", .category.key())]
    SaveSettings {
        id: String,
        category: SettingCategory,
        #[source]
        source: StoreError,
    },

    #[error("failed to encode {} settings", .category.key())]
    Encode {
        category: SettingCategory,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} configuration(s) failed validation", .0.len())]
    Validation(Vec<ValidationError>),
}
