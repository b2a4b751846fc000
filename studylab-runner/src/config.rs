//! Study configuration — the dashboard's recognized options as a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use studylab_core::domain::Stage;

/// All recognized options, with the deployed defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Answers a participant must submit for stage 1 to count as complete.
    pub required_answers_stage1: usize,
    /// Answers a participant must submit for stage 2 to count as complete.
    pub required_answers_stage2: usize,
    /// Snapshot cache TTL and watch-mode tick interval.
    pub refresh_interval_secs: u64,
    /// Locale token opening an "I don't know" answer.
    pub uncertain_prefix: String,
    /// Allow-list of algorithms for the corner-question breakdown.
    pub corner_algorithms: Vec<String>,
    pub source: SourceConfig,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            required_answers_stage1: Stage::One.default_required_answers(),
            required_answers_stage2: Stage::Two.default_required_answers(),
            refresh_interval_secs: 30,
            uncertain_prefix: "затруд".to_string(),
            corner_algorithms: vec![
                "socolov_lab_result".to_string(),
                "socolov_rgb_result".to_string(),
            ],
            source: SourceConfig::default(),
        }
    }
}

/// Where the spreadsheet gateway lives and which document/worksheets hold
/// the study log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub document: String,
    pub stage2_worksheet: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            document: "human_study_results".to_string(),
            stage2_worksheet: "stage2_log".to_string(),
            timeout_secs: 30,
        }
    }
}

impl StudyConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("parse study config TOML")
    }

    pub fn required_answers(&self, stage: Stage) -> usize {
        match stage {
            Stage::One => self.required_answers_stage1,
            Stage::Two => self.required_answers_stage2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployment() {
        let config = StudyConfig::default();
        assert_eq!(config.required_answers(Stage::One), 40);
        assert_eq!(config.required_answers(Stage::Two), 15);
        assert_eq!(config.refresh_interval_secs, 30);
        assert_eq!(config.uncertain_prefix, "затруд");
        assert_eq!(config.corner_algorithms.len(), 2);
        assert_eq!(config.source.stage2_worksheet, "stage2_log");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = StudyConfig::from_toml(
            r#"
            required_answers_stage2 = 20

            [source]
            base_url = "https://sheets.example.com/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.required_answers_stage1, 40);
        assert_eq!(config.required_answers_stage2, 20);
        assert_eq!(config.source.base_url, "https://sheets.example.com/api");
        assert_eq!(config.source.document, "human_study_results");
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        assert_eq!(StudyConfig::from_toml("").unwrap(), StudyConfig::default());
    }
}
