//! fontinst CLI (made by FontLab https://www.fontlab.com/)

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use inquire::Confirm;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use fontinst_core::batch::{BatchRunner, BatchSummary, FileReport, FileStatus};
use fontinst_core::discovery::{validate_root, FontFile};
use fontinst_core::engine::{Installer, OverwritePolicy, OverwritePrompt};
use fontinst_core::output::{write_json_pretty, write_ndjson};
use fontinst_core::platform::{self, FontStore, REGISTRY_FILE_NAME};

const EXAMPLES: &str = "\
Examples:
  fontinst                         install fonts under the current folder, asking before overwriting
  fontinst ~/Downloads/Fonts       install fonts from a specific folder
  fontinst --dry-run               show what would be installed
  fontinst --overwrite always      replace installed fonts without asking
  fontinst --overwrite never       skip installed fonts
  fontinst --force                 same as --overwrite always

Supported font formats: .ttf, .otf, .ttc, .fon, .fnt";

/// CLI entrypoint for fontinst.
#[derive(Debug, Parser)]
#[command(
    name = "fontinst",
    about = "Install font files from a folder and all its subfolders (made by FontLab https://www.fontlab.com/)",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Folder to scan (default: current directory)
    #[arg(value_hint = ValueHint::DirPath)]
    folder: Option<PathBuf>,

    /// Show what would be installed without installing anything
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,

    /// How to handle fonts that are already installed
    #[arg(long = "overwrite", default_value_t = OverwriteArg::Prompt, value_enum)]
    overwrite: OverwriteArg,

    /// Overwrite installed fonts without asking (same as --overwrite always)
    #[arg(long = "force", action = ArgAction::SetTrue)]
    force: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    verbose: bool,

    /// Skip the administrator privilege check
    #[arg(long = "no-admin-check", action = ArgAction::SetTrue)]
    no_admin_check: bool,

    /// Install into this folder instead of the system fonts folder
    #[arg(long = "fonts-dir", value_hint = ValueHint::DirPath)]
    fonts_dir: Option<PathBuf>,

    /// Record installs in this JSON registry file (needs --fonts-dir)
    #[arg(long = "registry", value_hint = ValueHint::FilePath)]
    registry: Option<PathBuf>,

    /// Follow symlinks while walking the folder
    #[arg(long = "follow-symlinks", action = ArgAction::SetTrue)]
    follow_symlinks: bool,

    /// Emit the summary as a single JSON document
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit one JSON record per font
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OverwriteArg {
    #[value(alias = "yes")]
    Always,
    #[value(alias = "no")]
    Never,
    #[value(alias = "ask")]
    Prompt,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl Cli {
    fn policy(&self) -> OverwritePolicy {
        if self.force {
            return OverwritePolicy::Always;
        }
        match self.overwrite {
            OverwriteArg::Always => OverwritePolicy::Always,
            OverwriteArg::Never => OverwritePolicy::Never,
            OverwriteArg::Prompt => OverwritePolicy::Prompt,
        }
    }

    fn machine_output(&self) -> bool {
        self.json || self.ndjson
    }
}

/// Asks on the terminal. Anything but an explicit "yes" keeps the installed font.
struct ConsolePrompt;

impl OverwritePrompt for ConsolePrompt {
    fn confirm_overwrite(&self, file: &FontFile) -> bool {
        let question = format!("Font '{}' is already installed. Overwrite?", file.file_name);
        Confirm::new(&question)
            .with_default(false)
            .prompt()
            .unwrap_or_else(|err| {
                warn!(font = %file.file_name, error = %err, "overwrite prompt failed, skipping font");
                false
            })
    }
}

/// Parse CLI args and execute the run.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.no_admin_check && !cli.dry_run && !confirm_without_admin()? {
        println!("Exiting...");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    execute(&cli, &mut handle, &ConsolePrompt)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Warn when not elevated on platforms that need it. `Ok(false)` means the
/// user chose to stop.
fn confirm_without_admin() -> Result<bool> {
    if platform::is_elevated() != Some(false) {
        return Ok(true);
    }

    eprintln!("WARNING: fontinst is not running with administrator privileges.");
    eprintln!("   Some font installations may fail without admin rights.");
    eprintln!("   Consider running as administrator for best results.");
    eprintln!("   Use --no-admin-check to skip this warning.");
    eprintln!();

    let answer = Confirm::new("Continue anyway?")
        .with_default(false)
        .prompt()
        .unwrap_or(false);
    Ok(answer)
}

fn execute(cli: &Cli, out: &mut impl Write, prompt: &dyn OverwritePrompt) -> Result<()> {
    let folder = match &cli.folder {
        Some(folder) => folder.clone(),
        None => env::current_dir().context("reading current directory")?,
    };
    let policy = cli.policy();
    let text = !cli.machine_output();
    let color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stdout().is_terminal(),
    };

    if text {
        write_banner(&mut *out, &folder, cli.dry_run, policy)?;
    }

    let summary = if cli.dry_run {
        fontinst_core::batch::preview(&folder, cli.follow_symlinks)?
    } else {
        validate_root(&folder)?;
        let store = resolve_store(cli.fonts_dir.clone(), cli.registry.clone())?;
        fs::create_dir_all(store.fonts_dir()).with_context(|| {
            format!("creating fonts folder {}", store.fonts_dir().display())
        })?;
        let runner = BatchRunner::new(Installer::new(store)).follow_symlinks(cli.follow_symlinks);
        runner.run(&folder, policy, prompt)?
    };

    if cli.ndjson {
        write_ndjson(&summary.details, &mut *out)?;
    } else if cli.json {
        write_json_pretty(&summary, &mut *out)?;
    } else {
        write_report(&summary, cli.dry_run, color, &mut *out)?;
        if !cli.dry_run && summary.successful > 0 {
            writeln!(out)?;
            writeln!(out, "Font installation completed!")?;
            writeln!(out, "Note: You may need to restart applications to see new fonts.")?;
        }
    }

    Ok(())
}

fn resolve_store(fonts_dir: Option<PathBuf>, registry: Option<PathBuf>) -> Result<FontStore> {
    let fonts_dir = fonts_dir.or_else(|| env_path("FONTINST_FONTS_DIR"));
    let registry = registry.or_else(|| env_path("FONTINST_REGISTRY"));

    if fonts_dir.is_none() && registry.is_none() {
        return FontStore::system().context("locating the system fonts folder");
    }

    // A registry override alone would still write into the system fonts folder.
    let Some(fonts_dir) = fonts_dir else {
        bail!("--registry (or FONTINST_REGISTRY) needs --fonts-dir (or FONTINST_FONTS_DIR)");
    };
    let registry = registry.unwrap_or_else(|| fonts_dir.join(REGISTRY_FILE_NAME));
    Ok(FontStore::with_json_registry(fonts_dir, registry))
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn write_banner(
    mut w: impl Write,
    folder: &Path,
    dry_run: bool,
    policy: OverwritePolicy,
) -> Result<()> {
    writeln!(w, "Font Installer")?;
    writeln!(w, "{}", "=".repeat(40))?;

    if dry_run {
        writeln!(w, "DRY RUN MODE - No fonts will be actually installed")?;
    } else {
        let mode = match policy {
            OverwritePolicy::Always => {
                "OVERWRITE MODE: Existing fonts will be replaced without prompting"
            }
            OverwritePolicy::Never => "SKIP MODE: Existing fonts will be skipped",
            OverwritePolicy::Prompt => "ASK MODE: You will be prompted for each existing font",
        };
        writeln!(w, "{mode}")?;
    }
    writeln!(w)?;

    let shown = folder.canonicalize().unwrap_or_else(|_| folder.to_path_buf());
    writeln!(w, "Processing folder: {}", shown.display())?;
    writeln!(w, "{}", "-".repeat(40))?;
    Ok(())
}

fn write_report(summary: &BatchSummary, dry_run: bool, color: bool, mut w: impl Write) -> Result<()> {
    let rule = "=".repeat(60);
    let title = if dry_run {
        "DRY RUN - FONT PREVIEW"
    } else {
        "FONT INSTALLATION SUMMARY"
    };

    writeln!(w)?;
    writeln!(w, "{rule}")?;
    writeln!(w, "{title}")?;
    writeln!(w, "{rule}")?;

    if summary.folders_processed > 0 {
        writeln!(w, "Folders with fonts processed: {}", summary.folders_processed)?;
    }
    writeln!(w, "Total font files processed: {}", summary.processed)?;

    if dry_run {
        writeln!(w, "Fonts that would be installed: {}", summary.successful)?;
    } else {
        writeln!(w, "Successfully installed: {}", summary.successful)?;
        writeln!(w, "Failed installations: {}", summary.failed)?;
        if summary.skipped > 0 {
            writeln!(w, "Skipped (already installed): {}", summary.skipped)?;
        }
    }

    if !summary.details.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", if dry_run { "Fonts Found:" } else { "Detailed Results:" })?;
        writeln!(w, "{}", "-".repeat(40))?;

        for (dir, reports) in group_by_dir(&summary.details) {
            writeln!(w)?;
            writeln!(w, "Folder: {}", dir.display())?;
            for report in reports {
                writeln!(w, "  {}", render_detail(report, color))?;
            }
        }
    }

    if summary.processed == 0 {
        writeln!(w)?;
        writeln!(w, "No folders with font files were found to process.")?;
        writeln!(
            w,
            "   Folders without .ttf, .otf, .ttc, .fon, or .fnt files are automatically skipped."
        )?;
    }

    writeln!(w, "{rule}")?;
    Ok(())
}

/// Group reports by folder, keeping the order folders were first seen in.
fn group_by_dir(details: &[FileReport]) -> Vec<(&Path, Vec<&FileReport>)> {
    let mut groups: Vec<(&Path, Vec<&FileReport>)> = Vec::new();
    for report in details {
        match groups.iter_mut().find(|(dir, _)| *dir == report.dir.as_path()) {
            Some((_, reports)) => reports.push(report),
            None => groups.push((report.dir.as_path(), vec![report])),
        }
    }
    groups
}

fn render_detail(report: &FileReport, color: bool) -> String {
    match report.status {
        FileStatus::WouldInstall => format!("{} {}", apply_color("+", color, AnsiColor::Cyan), report.file),
        FileStatus::Success => format!("{} {}", apply_color("✓", color, AnsiColor::Green), report.file),
        FileStatus::Skipped => format!(
            "{} {} - {}",
            apply_color("-", color, AnsiColor::Yellow),
            report.file,
            report.message
        ),
        FileStatus::Failed => format!(
            "{} {} - Error: {}",
            apply_color("✗", color, AnsiColor::Red),
            report.file,
            report.message
        ),
    }
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Cyan,
    Yellow,
    Green,
    Red,
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Cyan => "36",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
        AnsiColor::Red => "31",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}

#[cfg(test)]
mod tests;
