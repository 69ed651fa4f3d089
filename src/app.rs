// Declare modules
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod formatter;
pub mod models;
pub mod resolver;
pub mod step;
pub mod storage;
pub mod substitution;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use self::cli::{Cli, Command};
use self::config::{default_config_path, PluginConfig};
use self::download::{overwrites_source, FileSink, StdoutSink};
use self::formatter::OutputGenerator;
use self::models::ProcessContext;
use self::step::DisplayContentStep;
use self::storage::{LocalStorage, Storage};

/// Initializes the step for the requested process and runs one command against it.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = Cli::parse();

    // 2. Load plugin configuration
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path().context("Could not determine home directory")?,
    };
    let config = PluginConfig::load(&config_path)?;

    // 3. Pick the block for this project and step
    let block = config.block_for(&args.project, &args.step)?;

    // 4. Initialize the step; folders are resolved here, once
    let context = build_context(&args, &config);
    let step = DisplayContentStep::initialize(LocalStorage, block, context, &args.return_path)
        .context("Failed to initialize folder configuration")?;
    log::debug!(
        "{} ({:?}/{:?}, interface {}) renders {}",
        step.title(),
        step.plugin_type(),
        step.gui_type(),
        step.interface_version(),
        step.page_path()
    );
    for (field, message) in step.validate() {
        log::warn!("{}: {}", field, message);
    }

    // 5. Serve the command
    let next = serve(&step, &args.command)?;
    log::debug!("Returning to {}", next);
    Ok(())
}

/// Runs one command against an initialized step and returns the page to navigate to.
fn serve<S: Storage>(step: &DisplayContentStep<S>, command: &Command) -> Result<String> {
    match command {
        Command::List => {
            if step.configured_folders().is_empty() {
                log::warn!("No folders configured for this project and step.");
            } else {
                println!(
                    "{}",
                    OutputGenerator::generate_listing(step.configured_folders(), step.storage())
                );
            }
        }
        Command::Size { file } => {
            println!("{}", step.file_size(file));
        }
        Command::Download { file, output } => {
            if let Err(err) = download(step, file, output.as_deref()) {
                log::debug!("Returning to {}", step.cancel());
                return Err(err);
            }
        }
    }

    if !step.execute() {
        bail!("{} did not finish", step.title());
    }
    Ok(step.finish())
}

fn build_context(args: &Cli, config: &PluginConfig) -> ProcessContext {
    let mut variables: HashMap<String, String> = config
        .variables
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect();
    // Command line wins over the file.
    variables.extend(args.vars.iter().cloned());

    ProcessContext {
        project: args.project.clone(),
        step: args.step.clone(),
        process_title: args.process_title.clone(),
        process_id: args.process_id,
        step_id: args.step_id,
        variables,
    }
}

fn download<S: Storage>(
    step: &DisplayContentStep<S>,
    file: &Path,
    output: Option<&Path>,
) -> Result<()> {
    if !step.is_discovered(file) {
        bail!(
            "{} is not listed in any folder configured for process '{}'",
            file.display(),
            step.context().process_title
        );
    }

    let copied = match output {
        Some(dir) => {
            fs::create_dir_all(dir)
                .context(format!("Failed to create output directory {:?}", dir))?;
            if overwrites_source(dir, file) {
                bail!(
                    "{} would be saved over itself; choose another output directory",
                    file.display()
                );
            }
            let mut sink = FileSink::new(dir);
            let copied = step.download(file, &mut sink);
            if let (Some(_), Some(target)) = (copied, sink.target()) {
                log::info!("Saved to {}", target.display());
            }
            copied
        }
        None => step.download(file, &mut StdoutSink),
    };

    if copied.is_none() {
        // Already logged by the download itself; only the exit status is left to set.
        bail!("Download of {} did not complete", file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::ConfigBlock;
    use crate::app::models::FolderSpec;
    use tempfile::TempDir;

    fn local_step(dir: &Path) -> DisplayContentStep<LocalStorage> {
        let block = ConfigBlock {
            project: vec!["*".into()],
            step: vec!["*".into()],
            folders: vec![FolderSpec::new("Images", &dir.to_string_lossy(), "")],
        };
        DisplayContentStep::initialize(LocalStorage, &block, ProcessContext::default(), "")
            .unwrap()
    }

    #[test]
    fn listing_without_folders_still_finishes() {
        let block = ConfigBlock {
            project: vec!["*".into()],
            step: vec!["*".into()],
            folders: Vec::new(),
        };
        let step = DisplayContentStep::initialize(
            LocalStorage,
            &block,
            ProcessContext::default(),
            "/task_edit.xhtml",
        )
        .unwrap();

        assert_eq!(serve(&step, &Command::List).unwrap(), "/uii/task_edit.xhtml");
    }

    #[test]
    fn refuses_to_save_a_file_over_itself() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("scan.tif");
        fs::write(&file, b"II*\0image").unwrap();
        let step = local_step(dir.path());

        assert!(download(&step, &file, Some(dir.path())).is_err());
        assert_eq!(fs::read(&file).unwrap(), b"II*\0image");
    }

    #[test]
    fn saves_discovered_file_elsewhere() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let file = dir.path().join("scan.tif");
        fs::write(&file, b"II*\0image").unwrap();
        let step = local_step(dir.path());

        download(&step, &file, Some(out.path())).unwrap();

        assert_eq!(fs::read(out.path().join("scan.tif")).unwrap(), b"II*\0image");
        assert!(download(&step, &dir.path().join("other.tif"), Some(out.path())).is_err());
    }

    #[test]
    fn command_line_variables_override_file_variables() {
        let args = Cli::try_parse_from([
            "display-content",
            "--process-title",
            "book_1",
            "--var",
            "root=/cli",
            "list",
        ])
        .unwrap();
        let config = PluginConfig::parse(
            "[variables]\nRoot = \"/file\"\nother = \"/x\"\n",
            Path::new("plugin.toml"),
        )
        .unwrap();

        let context = build_context(&args, &config);

        assert_eq!(context.process_title, "book_1");
        assert_eq!(context.variables["root"], "/cli");
        assert_eq!(context.variables["other"], "/x");
    }
}
