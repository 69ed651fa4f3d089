use crate::app::config::ConfigBlock;
use crate::app::download::{stream_download, DownloadSink};
use crate::app::error::Result;
use crate::app::formatter::file_size_display;
use crate::app::models::{FolderConfiguration, ProcessContext};
use crate::app::resolver::resolve;
use crate::app::storage::Storage;
use crate::app::substitution::VariableReplacer;
use std::path::Path;

pub const TITLE: &str = "intranda_step_displayContent";
pub const PAGE_PATH: &str = "/uii/plugin_step_displayContent.xhtml";
const NAVIGATION_PREFIX: &str = "/uii";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginGuiType {
    Part,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginType {
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Finish,
    #[allow(dead_code)]
    Error,
}

/// Workflow step that shows the contents of configured folders.
///
/// Folders are resolved once in [`DisplayContentStep::initialize`] and only read afterwards.
pub struct DisplayContentStep<S: Storage> {
    storage: S,
    context: ProcessContext,
    return_path: String,
    folders: Vec<FolderConfiguration>,
}

impl<S: Storage> DisplayContentStep<S> {
    pub fn initialize(
        storage: S,
        block: &ConfigBlock,
        context: ProcessContext,
        return_path: &str,
    ) -> Result<Self> {
        let replacer = VariableReplacer::from_context(&context);
        let folders = resolve(&block.folders, &replacer, &storage)?;
        log::info!(
            "{} initialized for process '{}' with {} folder(s)",
            TITLE,
            context.process_title,
            folders.len()
        );

        Ok(Self {
            storage,
            context,
            return_path: return_path.to_string(),
            folders,
        })
    }

    pub fn title(&self) -> &'static str {
        TITLE
    }

    pub fn gui_type(&self) -> PluginGuiType {
        PluginGuiType::Part
    }

    pub fn plugin_type(&self) -> PluginType {
        PluginType::Step
    }

    pub fn page_path(&self) -> &'static str {
        PAGE_PATH
    }

    pub fn interface_version(&self) -> u32 {
        0
    }

    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    pub fn configured_folders(&self) -> &[FolderConfiguration] {
        &self.folders
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// True if `file` was discovered in one of the configured folders.
    pub fn is_discovered(&self, file: &Path) -> bool {
        self.folders.iter().any(|f| f.contains(file))
    }

    pub fn cancel(&self) -> String {
        format!("{NAVIGATION_PREFIX}{}", self.return_path)
    }

    pub fn finish(&self) -> String {
        format!("{NAVIGATION_PREFIX}{}", self.return_path)
    }

    /// Validation messages keyed by field; this step has none.
    pub fn validate(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    pub fn run(&self) -> StepOutcome {
        log::info!("DisplayContent step plugin executed");
        StepOutcome::Finish
    }

    pub fn execute(&self) -> bool {
        self.run() != StepOutcome::Error
    }

    pub fn file_size(&self, file: &Path) -> String {
        file_size_display(&self.storage, file)
    }

    pub fn download(&self, file: &Path, sink: &mut dyn DownloadSink) -> Option<u64> {
        stream_download(&self.storage, file, sink)
    }
}
