//! Game configuration: tunable settings plus optional content overrides.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use classroom_core::ConfigError;
use classroom_core::model::{
    ContentCatalog, Difficulty, GameSettings, GameSettingsDraft, QuestionDraft, QuestionItem, Topic,
};

use crate::error::ConfigLoadError;

/// On-disk shape. Every section is optional; missing topics keep the
/// built-in content and missing settings keep the classroom defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GameConfigFile {
    settings: GameSettingsDraft,
    content: HashMap<Topic, BTreeMap<Difficulty, Vec<QuestionDraft>>>,
}

/// Validated settings and one catalog per topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    settings: GameSettings,
    catalogs: HashMap<Topic, ContentCatalog>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GameConfig {
    /// Classroom defaults with the content that ships with the app.
    #[must_use]
    pub fn builtin() -> Self {
        let catalogs = [Topic::Planets, Topic::Constellations]
            .into_iter()
            .map(|topic| (topic, ContentCatalog::builtin(topic)))
            .collect();
        Self {
            settings: GameSettings::default_for_classroom(),
            catalogs,
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigLoadError::Json` for malformed documents and
    /// `ConfigLoadError::Config` for values that fail validation.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigLoadError> {
        let file: GameConfigFile = serde_json::from_str(json)?;
        let mut config = Self::builtin();
        config.settings = file.settings.validate()?;

        for (topic, tiers) in file.content {
            let tiers = tiers
                .into_iter()
                .map(|(difficulty, drafts)| Ok((difficulty, validate_tier(drafts)?)))
                .collect::<Result<Vec<_>, ConfigError>>()?;
            config
                .catalogs
                .insert(topic, ContentCatalog::from_tiers(topic, tiers)?);
        }

        log::debug!("loaded game config: {:?}", config.settings);
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigLoadError::Io` if the file cannot be read, otherwise as
    /// for [`GameConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("reading game config from {}", path.display());
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn with_settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Catalog for `topic`; falls back to the built-in content.
    #[must_use]
    pub fn catalog(&self, topic: Topic) -> ContentCatalog {
        self.catalogs
            .get(&topic)
            .cloned()
            .unwrap_or_else(|| ContentCatalog::builtin(topic))
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: ContentCatalog) -> Self {
        self.catalogs.insert(catalog.topic(), catalog);
        self
    }
}

fn validate_tier(drafts: Vec<QuestionDraft>) -> Result<Vec<QuestionItem>, ConfigError> {
    drafts
        .into_iter()
        .map(|draft| draft.validate().map_err(ConfigError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_builtin() {
        let config = GameConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GameConfig::builtin());
        assert_eq!(config.settings().question_target(Difficulty::Normal), 8);
    }

    #[test]
    fn content_override_replaces_one_topic() {
        let json = r#"{
            "settings": { "revealDelayMs": 500 },
            "content": {
                "planets": {
                    "easy": [
                        { "id": "p1", "prompt": "Red planet?", "expectedAnswer": "Mars", "media": "mars.png" }
                    ]
                }
            }
        }"#;
        let config = GameConfig::from_json_str(json).unwrap();
        assert_eq!(config.settings().reveal_delay_ms(), 500);

        let planets = config.catalog(Topic::Planets);
        assert_eq!(planets.tier_len(Difficulty::Easy), 1);
        assert!(planets.items(Difficulty::Hard).is_err());
        assert_eq!(
            config.catalog(Topic::Constellations),
            ContentCatalog::builtin(Topic::Constellations)
        );
    }

    #[test]
    fn invalid_question_is_config_error() {
        let json = r#"{ "content": { "planets": { "easy": [
            { "id": "p1", "prompt": "  ", "expectedAnswer": "Mars" }
        ] } } }"#;
        let err = GameConfig::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Config(ConfigError::Question(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{ "content": { "constellations": { "hard": [
            { "id": "x", "prompt": "a", "expectedAnswer": "b" },
            { "id": "x", "prompt": "c", "expectedAnswer": "d" }
        ] } } }"#;
        assert!(matches!(
            GameConfig::from_json_str(json),
            Err(ConfigLoadError::Config(ConfigError::DuplicateQuestionId { .. }))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GameConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            GameConfig::from_json_str("{ nope"),
            Err(ConfigLoadError::Json(_))
        ));
    }
}
