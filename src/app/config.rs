use crate::app::error::{FolderError, Result};
use crate::app::models::FolderSpec;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const WILDCARD: &str = "*";

/// The whole plugin configuration file.
#[derive(Deserialize, Debug, Default)]
pub struct PluginConfig {
    /// Variables available to every path template, on top of the process context.
    #[serde(default)]
    pub variables: HashMap<String, String>,
    #[serde(default, rename = "config")]
    pub blocks: Vec<ConfigBlock>,
}

/// One `[[config]]` block, scoped to a set of projects and steps.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ConfigBlock {
    #[serde(default = "wildcard")]
    pub project: Vec<String>,
    #[serde(default = "wildcard")]
    pub step: Vec<String>,
    #[serde(default, rename = "folder")]
    pub folders: Vec<FolderSpec>,
}

fn wildcard() -> Vec<String> {
    vec![WILDCARD.to_string()]
}

impl ConfigBlock {
    /// `None` stands for the wildcard entry.
    fn applies_to(&self, project: Option<&str>, step: Option<&str>) -> bool {
        let project = project.unwrap_or(WILDCARD);
        let step = step.unwrap_or(WILDCARD);
        self.project.iter().any(|p| p == project) && self.step.iter().any(|s| s == step)
    }
}

impl PluginConfig {
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| FolderError::ConfigParse(origin.to_path_buf(), e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| FolderError::ConfigRead(path.to_path_buf(), e))?;
        let config = Self::parse(&content, path)?;
        log::debug!(
            "Loaded {} configuration block(s) from {}",
            config.blocks.len(),
            path.display()
        );
        Ok(config)
    }

    /// Picks the block for a project and step.
    ///
    /// Lookup order: exact project and step, any project with exact step,
    /// exact project with any step, then the fully generic block.
    pub fn block_for(&self, project: &str, step: &str) -> Result<&ConfigBlock> {
        let lookups = [
            (Some(project), Some(step)),
            (None, Some(step)),
            (Some(project), None),
            (None, None),
        ];

        lookups
            .iter()
            .find_map(|&(p, s)| self.blocks.iter().find(|b| b.applies_to(p, s)))
            .ok_or_else(|| FolderError::NoMatchingConfig {
                project: project.to_string(),
                step: step.to_string(),
            })
    }
}

/// Default config location: `~/.config/display_content/plugin.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(
        home.join(".config")
            .join("display_content")
            .join("plugin.toml"),
    )
}

/// Parses a `key=value` pair given on the command line.
pub fn parse_variable(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((key.to_lowercase(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[variables]
metadata = "/opt/goobi/metadata"

[[config]]
project = ["*"]
step = ["*"]

[[config.folder]]
label = "Everything"
path = "{metadata}/{processid}"

[[config]]
project = ["Archive"]
step = ["*"]

[[config.folder]]
label = "OCR"
path = "{metadata}/{processid}/ocr"
filter = '.*\.xml'

[[config]]
project = ["*"]
step = ["Quality control"]

[[config.folder]]
label = "Images"
path = "{metadata}/{processid}/images"

[[config]]
project = ["Archive", "Library"]
step = ["Quality control"]

[[config.folder]]
label = "Masters"
path = "{metadata}/{processid}/masters"
filter = '.*\.tif'

[[config.folder]]
label = "PDF"
path = "{metadata}/{processid}/pdf"
"#;

    fn sample() -> PluginConfig {
        PluginConfig::parse(SAMPLE, Path::new("plugin.toml")).unwrap()
    }

    fn labels(block: &ConfigBlock) -> Vec<&str> {
        block.folders.iter().map(|f| f.label.as_str()).collect()
    }

    #[test]
    fn parses_folders_with_default_filter() {
        let config = sample();
        assert_eq!(config.blocks.len(), 4);
        assert_eq!(config.variables["metadata"], "/opt/goobi/metadata");
        assert_eq!(config.blocks[0].folders[0].filter, "");
        assert_eq!(config.blocks[1].folders[0].filter, r".*\.xml");
    }

    #[test]
    fn exact_project_and_step_wins() {
        let config = sample();
        let block = config.block_for("Library", "Quality control").unwrap();
        assert_eq!(labels(block), vec!["Masters", "PDF"]);
    }

    #[test]
    fn single_wildcard_blocks_match_their_named_side() {
        let config = sample();
        assert_eq!(labels(config.block_for("Archive", "Export").unwrap()), vec!["OCR"]);
        assert_eq!(
            labels(config.block_for("Other", "Quality control").unwrap()),
            vec!["Images"]
        );
    }

    #[test]
    fn step_match_beats_project_match() {
        let config = PluginConfig::parse(
            r#"
[[config]]
project = ["Archive"]
step = ["*"]

[[config.folder]]
label = "ProjectOnly"
path = "/srv/project"

[[config]]
project = ["*"]
step = ["QC"]

[[config.folder]]
label = "StepOnly"
path = "/srv/step"
"#,
            Path::new("plugin.toml"),
        )
        .unwrap();

        assert_eq!(labels(config.block_for("Archive", "QC").unwrap()), vec!["StepOnly"]);
        assert_eq!(
            labels(config.block_for("Archive", "Export").unwrap()),
            vec!["ProjectOnly"]
        );
    }

    #[test]
    fn falls_back_to_generic_block() {
        let config = sample();
        assert_eq!(
            labels(config.block_for("Other", "Export").unwrap()),
            vec!["Everything"]
        );
    }

    #[test]
    fn no_matching_block_is_an_error() {
        let config = PluginConfig::parse(
            "[[config]]\nproject = [\"Archive\"]\nstep = [\"Export\"]\n",
            Path::new("plugin.toml"),
        )
        .unwrap();
        let err = config.block_for("Library", "Export").unwrap_err();
        assert!(matches!(err, FolderError::NoMatchingConfig { .. }));
    }

    #[test]
    fn missing_scope_means_wildcard() {
        let config = PluginConfig::parse(
            "[[config]]\n[[config.folder]]\nlabel = \"Any\"\npath = \"/srv\"\n",
            Path::new("plugin.toml"),
        )
        .unwrap();
        assert_eq!(labels(config.block_for("X", "Y").unwrap()), vec!["Any"]);
    }

    #[test]
    fn shipped_example_parses() {
        let example = include_str!("../../config/plugin.example.toml");
        let config = PluginConfig::parse(example, Path::new("plugin.example.toml")).unwrap();

        let block = config.block_for("Archive", "Quality control").unwrap();
        assert_eq!(labels(block), vec!["Derivatives"]);
        assert_eq!(labels(config.block_for("Library", "Export").unwrap()).len(), 3);
    }

    #[test]
    fn invalid_toml_reports_origin() {
        let err = PluginConfig::parse("[[config]\n", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn parses_command_line_variables() {
        assert_eq!(
            parse_variable("ImagePath=/data/img=1").unwrap(),
            ("imagepath".to_string(), "/data/img=1".to_string())
        );
        assert!(parse_variable("novalue").is_err());
        assert!(parse_variable("=x").is_err());
    }
}
