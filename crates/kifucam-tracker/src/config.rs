//! トラッカー設定（TOML）

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 指し手推定の設定
///
/// 省略したキーは既定値になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// 安定とみなす連続無変化フレーム数（1バーストの枚数）
    pub stable_frames: usize,
    /// 確定に必要な同一候補の連続回数
    pub required_votes: usize,
    /// これを超える升が変化したバーストは雑音として捨てる
    pub max_changed_squares: usize,
    /// 駒画像帳に残す直近の見本数（手番ごと）
    pub recent_exemplars: usize,
    /// 初手の移動先からカメラの向き（180度回転）を判定する
    pub detect_orientation: bool,
    /// 保持する安定バーストの履歴数
    pub max_bursts_kept: usize,
    /// 雑音バーストがこの回数続いたら基準盤面を取り直す（Noneなら取り直さない）
    pub rebaseline_after: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            stable_frames: 3,
            required_votes: 3,
            max_changed_squares: 2,
            recent_exemplars: 4,
            detect_orientation: true,
            max_bursts_kept: 16,
            rebaseline_after: None,
        }
    }
}

impl TrackerConfig {
    /// 値の範囲を検証する
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("stable_frames", self.stable_frames, 1),
            ("required_votes", self.required_votes, 1),
            ("max_changed_squares", self.max_changed_squares, 2),
            ("recent_exemplars", self.recent_exemplars, 1),
            ("max_bursts_kept", self.max_bursts_kept, 1),
            ("rebaseline_after", self.rebaseline_after.unwrap_or(1), 1),
        ];
        for (field, value, min) in checks {
            if value < min {
                return Err(ConfigError::TooSmall { field, min, value });
            }
        }
        Ok(())
    }

    /// TOML文字列から読み込む
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: TrackerConfig = toml::from_str(s).context("Failed to parse tracker config")?;
        config.validate()?;
        Ok(config)
    }

    /// TOMLファイルから読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tracker config: {}", path.display()))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("Invalid tracker config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stable_frames, 3);
        assert_eq!(config.required_votes, 3);
        assert_eq!(config.rebaseline_after, None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = "required_votes = 5\nrebaseline_after = 4\n";
        let config = TrackerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.required_votes, 5);
        assert_eq!(config.rebaseline_after, Some(4));
        assert_eq!(config.stable_frames, 3);
        assert!(config.detect_orientation);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(TrackerConfig::from_toml_str("stable_frames = 0").is_err());
        assert!(
            TrackerConfig::from_toml_str("max_changed_squares = 1").is_err()
        );
        assert!(TrackerConfig::from_toml_str("unknown_key = true").is_err());
        assert!(
            TrackerConfig::from_toml_str("stable_frames = \"three\"").is_err()
        );
    }

    #[test]
    fn test_validate_reports_field() {
        let config = TrackerConfig {
            rebaseline_after: Some(0),
            ..TrackerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooSmall {
                field: "rebaseline_after",
                min: 1,
                value: 0
            })
        );
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = TrackerConfig::load("/nonexistent/kifucam/tracker.toml").unwrap_err();
        assert!(format!("{err:#}").contains("tracker.toml"));
    }
}
