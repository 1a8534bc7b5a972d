use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

const CONFIG_DIR_NAME: &str = "flipcard";
const CONFIG_FILE_NAME: &str = "config.json";
const ASSET_DIR_ENV: &str = "FLIPCARD_ASSET_DIR";
const IMAGE_INDEX_PLACEHOLDER: &str = "{}";

/// Game constants. Every field falls back to the shipped asset pack's value
/// when absent from the config file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub card_count: usize,
    pub image_count: usize,
    pub asset_dir: PathBuf,
    pub card_image_pattern: String,
    pub card_back: String,
    pub background: String,
    pub music: Option<String>,
    pub music_loop: bool,
    pub names: Vec<String>,
    pub name_colors: Vec<String>,
    pub flip_lock_ms: u64,
    pub click_debounce_ms: u64,
    pub load_jitter_ms: u64,
    pub loading_hold_ms: u64,
    pub loading_fade_ms: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            card_count: 6,
            image_count: 6,
            asset_dir: PathBuf::from("assets"),
            card_image_pattern: "IMG_145{}-min.PNG".to_string(),
            card_back: "Card-bg-min.PNG".to_string(),
            background: "bg.jpg".to_string(),
            music: Some("music.mp3".to_string()),
            music_loop: true,
            names: ["Trang", "Hà", "Ngân", "Huyền", "Trâm", ""]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            name_colors: ["#8eb168", "#ecbeb7", "#ca9ff9", "#b1d4e0", "#fbb79d", ""]
                .iter()
                .map(|color| color.to_string())
                .collect(),
            flip_lock_ms: 800,
            click_debounce_ms: 50,
            load_jitter_ms: 100,
            loading_hold_ms: 200,
            loading_fade_ms: 300,
        }
    }
}

fn config_path() -> PathBuf {
    glib::user_config_dir()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

impl GameConfig {
    /// Reads the user config file, then applies `FLIPCARD_ASSET_DIR`.
    pub fn load() -> Self {
        let asset_dir = std::env::var(ASSET_DIR_ENV).ok();
        Self::load_or_default(&config_path(), asset_dir.as_deref())
    }

    /// A bad file is logged and replaced by the defaults. The asset
    /// directory override applies either way.
    pub fn load_or_default(path: &Path, asset_dir: Option<&str>) -> Self {
        let mut config = Self::load_from(path).unwrap_or_else(|err| {
            log::warn!("ignoring {}: {err:#}", path.display());
            Self::default()
        });
        config.override_asset_dir(asset_dir);
        config
    }

    fn override_asset_dir(&mut self, asset_dir: Option<&str>) {
        if let Some(dir) = asset_dir.filter(|dir| !dir.is_empty()) {
            self.asset_dir = PathBuf::from(dir);
        }
    }

    /// A missing file is not an error.

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let config: GameConfig = serde_json::from_str(raw).context("malformed JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.card_count == 0 {
            bail!("card_count must be at least 1");
        }
        if self.image_count == 0 {
            bail!("image_count must be at least 1");
        }
        if !self.card_image_pattern.contains(IMAGE_INDEX_PLACEHOLDER) {
            bail!(
                "card_image_pattern must contain {} for the image number",
                IMAGE_INDEX_PLACEHOLDER
            );
        }
        Ok(())
    }

    fn asset_url(&self, file_name: &str) -> String {
        self.asset_dir.join(file_name).to_string_lossy().into_owned()
    }

    /// URL of card image `index`, counted from 1.
    pub fn card_image_url(&self, index: usize) -> String {
        let file_name = self
            .card_image_pattern
            .replacen(IMAGE_INDEX_PLACEHOLDER, &index.to_string(), 1);
        self.asset_url(&file_name)
    }

    pub fn card_back_url(&self) -> String {
        self.asset_url(&self.card_back)
    }

    pub fn background_url(&self) -> String {
        self.asset_url(&self.background)
    }

    pub fn music_url(&self) -> Option<String> {
        self.music
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| self.asset_url(name))
    }

    /// Card images first, then the card back and the background.
    pub fn image_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = (1..=self.image_count)
            .map(|index| self.card_image_url(index))
            .collect();
        urls.push(self.card_back_url());
        urls.push(self.background_url());
        urls
    }

    pub fn name_color(&self, name_index: usize) -> Option<&str> {
        self.name_colors
            .get(name_index)
            .map(String::as_str)
            .filter(|color| !color.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls_follow_asset_pack_layout() {
        let config = GameConfig::default();
        let urls = config.image_urls();
        assert_eq!(urls.len(), 8);
        assert_eq!(urls[0], Path::new("assets").join("IMG_1451-min.PNG").to_string_lossy());
        assert_eq!(urls[5], Path::new("assets").join("IMG_1456-min.PNG").to_string_lossy());
        assert_eq!(urls[6], Path::new("assets").join("Card-bg-min.PNG").to_string_lossy());
        assert_eq!(urls[7], Path::new("assets").join("bg.jpg").to_string_lossy());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{ "card_count": 4, "asset_dir": "/srv/cards" }"#)
            .expect("valid config");
        assert_eq!(config.card_count, 4);
        assert_eq!(config.image_count, 6);
        assert_eq!(config.flip_lock_ms, 800);
        assert_eq!(config.names.len(), 6);
        assert!(config.card_back_url().starts_with("/srv/cards"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(GameConfig::from_json("{ card_count: ").is_err());
        assert!(GameConfig::from_json(r#"{ "card_count": "six" }"#).is_err());
    }

    #[test]
    fn zero_counts_are_rejected() {
        assert!(GameConfig::from_json(r#"{ "card_count": 0 }"#).is_err());
        assert!(GameConfig::from_json(r#"{ "image_count": 0 }"#).is_err());
        assert!(GameConfig::from_json(r#"{ "card_image_pattern": "card.png" }"#).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("flipcard-no-such-dir/config.json");
        assert_eq!(GameConfig::load_from(&path).unwrap(), GameConfig::default());
    }

    #[test]
    fn asset_dir_override_survives_a_bad_file() {
        let dir = std::env::temp_dir().join(format!("flipcard-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let malformed = dir.join("malformed.json");
        fs::write(&malformed, "{ card_count: ").unwrap();
        let config = GameConfig::load_or_default(&malformed, Some("/opt/cards"));
        assert_eq!(config.asset_dir, PathBuf::from("/opt/cards"));
        assert_eq!(config.card_count, 6);

        let invalid = dir.join("invalid.json");
        fs::write(&invalid, r#"{ "image_count": 0 }"#).unwrap();
        let config = GameConfig::load_or_default(&invalid, Some("/opt/cards"));
        assert_eq!(config.asset_dir, PathBuf::from("/opt/cards"));
        assert_eq!(config.image_count, 6);

        let valid = dir.join("valid.json");
        fs::write(&valid, r#"{ "asset_dir": "/srv/cards" }"#).unwrap();
        let config = GameConfig::load_or_default(&valid, Some(""));
        assert_eq!(config.asset_dir, PathBuf::from("/srv/cards"));
        let config = GameConfig::load_or_default(&valid, Some("/opt/cards"));
        assert_eq!(config.asset_dir, PathBuf::from("/opt/cards"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn music_can_be_disabled() {
        let config = GameConfig::from_json(r#"{ "music": null }"#).unwrap();
        assert_eq!(config.music_url(), None);
        let config = GameConfig::from_json(r#"{ "music": "" }"#).unwrap();
        assert_eq!(config.music_url(), None);
        assert!(GameConfig::default().music_url().is_some());
    }

    #[test]
    fn empty_name_colors_are_skipped() {
        let config = GameConfig::default();
        assert_eq!(config.name_color(0), Some("#8eb168"));
        assert_eq!(config.name_color(5), None);
        assert_eq!(config.name_color(42), None);
    }
}
