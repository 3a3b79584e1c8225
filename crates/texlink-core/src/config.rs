use serde::{Deserialize, Serialize};

use crate::error::TexlinkResult;
use crate::types::{VideoBufferType, VideoFrameFormat, VideoFrameFormatSeries};

/// Default name of the UI event channel.
pub const DEFAULT_EVENT_CHANNEL: &str = "texlink/texture_renderer_event_handler";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventChannelConfig {
    pub name: String,
}

impl Default for EventChannelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_EVENT_CHANNEL.to_string(),
        }
    }
}

/// What the media engine is asked to deliver once custom rendering is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct CustomRenderConfig {
    #[serde(default)]
    pub buffer_type: VideoBufferType,
    #[serde(default)]
    pub frame_format_series: VideoFrameFormatSeries,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
pub struct MediaPlayerConfig {
    /// Format used when arming or disarming a player's frame handler.
    #[serde(default)]
    pub frame_format: VideoFrameFormat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    pub filter: String, // tracing EnvFilter directive, e.g. "info,texlink_render=debug"
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TexlinkConfig {
    #[serde(default)]
    pub event_channel: EventChannelConfig,
    #[serde(default)]
    pub custom_render: CustomRenderConfig,
    #[serde(default)]
    pub media_player: MediaPlayerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl TexlinkConfig {
    pub fn from_toml_str(contents: &str) -> TexlinkResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> TexlinkResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load_from_file(path: &std::path::Path) -> TexlinkResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> TexlinkResult<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TexlinkConfig::from_toml_str("").unwrap();
        assert_eq!(config.event_channel.name, DEFAULT_EVENT_CHANNEL);
        assert_eq!(config.custom_render.buffer_type, VideoBufferType::RawData);
        assert_eq!(
            config.custom_render.frame_format_series,
            VideoFrameFormatSeries::Rgb
        );
        assert_eq!(config.media_player.frame_format, VideoFrameFormat::Rgba32);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_partial_override() {
        let config = TexlinkConfig::from_toml_str(
            r#"
            [event_channel]
            name = "my/channel"

            [media_player]
            frame_format = "bgra32"
            "#,
        )
        .unwrap();
        assert_eq!(config.event_channel.name, "my/channel");
        assert_eq!(config.media_player.frame_format, VideoFrameFormat::Bgra32);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = TexlinkConfig::from_toml_str("[log\nfilter = 1").unwrap_err();
        assert!(matches!(err, crate::TexlinkError::Config(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join(format!("texlink-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("texlink.toml");

        let mut config = TexlinkConfig::default();
        config.log.filter = "debug".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = TexlinkConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.log.filter, "debug");
        std::fs::remove_dir_all(&dir).ok();
    }
}
