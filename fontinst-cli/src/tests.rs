use super::*;
use clap::CommandFactory;
use std::io::Cursor;
use tempfile::tempdir;

use fontinst_core::engine::DeclineAll;

fn report(file: &str, dir: &str, status: FileStatus, message: &str) -> FileReport {
    FileReport {
        file: file.to_string(),
        dir: PathBuf::from(dir),
        status,
        message: message.to_string(),
    }
}

fn summary_with(details: Vec<FileReport>) -> BatchSummary {
    let mut summary = BatchSummary {
        processed: details.len(),
        details,
        ..BatchSummary::default()
    };
    for d in &summary.details {
        match d.status {
            FileStatus::Success | FileStatus::WouldInstall => summary.successful += 1,
            FileStatus::Skipped => summary.skipped += 1,
            FileStatus::Failed => summary.failed += 1,
        }
    }
    summary
}

#[test]
fn defaults_to_prompt_policy_and_current_dir() {
    let cli = Cli::try_parse_from(["fontinst"]).expect("parse cli");

    assert_eq!(cli.policy(), OverwritePolicy::Prompt);
    assert!(cli.folder.is_none());
    assert!(!cli.dry_run);
}

#[test]
fn overwrite_accepts_legacy_aliases() {
    for (raw, expected) in [
        ("yes", OverwritePolicy::Always),
        ("no", OverwritePolicy::Never),
        ("ask", OverwritePolicy::Prompt),
        ("always", OverwritePolicy::Always),
        ("never", OverwritePolicy::Never),
    ] {
        let cli = Cli::try_parse_from(["fontinst", "--overwrite", raw]).expect("parse cli");
        assert_eq!(cli.policy(), expected, "--overwrite {raw}");
    }
}

#[test]
fn force_wins_over_overwrite() {
    let cli = Cli::try_parse_from(["fontinst", "--overwrite", "never", "--force"])
        .expect("parse cli");
    assert_eq!(cli.policy(), OverwritePolicy::Always);
}

#[test]
fn json_and_ndjson_conflict() {
    let parse = Cli::try_parse_from(["fontinst", "--json", "--ndjson", "/fonts"]);
    assert!(parse.is_err());
}

#[test]
fn explicit_paths_build_json_store() {
    let tmp = tempdir().expect("tempdir");
    let fonts = tmp.path().join("fonts");

    let store = resolve_store(Some(fonts.clone()), None).expect("store");

    assert_eq!(store.fonts_dir(), fonts.as_path());
    store.registry().set("A (TrueType)", "A.ttf").expect("set");
    assert!(fonts.join(REGISTRY_FILE_NAME).exists());
}

#[test]
fn registry_override_requires_fonts_dir() {
    if std::env::var_os("FONTINST_FONTS_DIR").is_some() {
        return;
    }
    let tmp = tempdir().expect("tempdir");

    let err = resolve_store(None, Some(tmp.path().join("registry.json"))).unwrap_err();

    assert!(err.to_string().contains("needs --fonts-dir"), "{err}");
}

#[test]
fn report_groups_details_by_folder() {
    let summary = summary_with(vec![
        report("A.ttf", "/in/one", FileStatus::Success, "Installed successfully using copy method"),
        report("B.ttf", "/in/two", FileStatus::Skipped, "already installed"),
        report("C.ttf", "/in/one", FileStatus::Failed, "All installation methods failed"),
    ]);

    let mut buf = Cursor::new(Vec::new());
    write_report(&summary, false, false, &mut buf).expect("write");
    let output = String::from_utf8(buf.into_inner()).expect("utf8");

    assert!(output.contains("FONT INSTALLATION SUMMARY"));
    assert!(output.contains("Successfully installed: 1"));
    assert!(output.contains("Skipped (already installed): 1"));
    assert!(output.contains("✗ C.ttf - Error: All installation methods failed"));
    let one = output.find("Folder: /in/one").expect("first folder");
    let two = output.find("Folder: /in/two").expect("second folder");
    let c_line = output.find("C.ttf").expect("C line");
    assert!(one < c_line && c_line < two);
}

#[test]
fn empty_report_explains_skipped_folders() {
    let mut buf = Cursor::new(Vec::new());
    write_report(&BatchSummary::default(), true, false, &mut buf).expect("write");
    let output = String::from_utf8(buf.into_inner()).expect("utf8");

    assert!(output.contains("DRY RUN - FONT PREVIEW"));
    assert!(output.contains("No folders with font files were found to process."));
}

#[test]
fn color_choice_is_applied() {
    let summary = summary_with(vec![report("A.ttf", "/in", FileStatus::Success, "ok")]);

    let mut buf = Cursor::new(Vec::new());
    write_report(&summary, false, true, &mut buf).expect("write");

    let output = String::from_utf8(buf.into_inner()).expect("utf8");
    assert!(output.contains("\u{1b}[32m"));
}

#[test]
fn dry_run_execute_writes_json_summary() {
    let tmp = tempdir().expect("tempdir");
    std::fs::write(tmp.path().join("A.ttf"), b"").expect("touch");
    let folder = tmp.path().display().to_string();
    let cli = Cli::try_parse_from(["fontinst", "--dry-run", "--json", folder.as_str()])
        .expect("parse cli");

    let mut buf = Cursor::new(Vec::new());
    execute(&cli, &mut buf, &DeclineAll).expect("execute");

    let parsed: serde_json::Value = serde_json::from_slice(buf.get_ref()).expect("json");
    assert_eq!(parsed["processed"], 1);
    assert_eq!(parsed["details"][0]["status"], "would_install");
}

#[test]
fn missing_folder_is_an_error_before_touching_store() {
    let tmp = tempdir().expect("tempdir");
    let fonts = tmp.path().join("fonts");
    let missing = tmp.path().join("missing").display().to_string();
    let fonts_arg = fonts.display().to_string();
    let cli = Cli::try_parse_from([
        "fontinst",
        "--overwrite",
        "never",
        "--fonts-dir",
        fonts_arg.as_str(),
        missing.as_str(),
    ])
    .expect("parse cli");

    let mut buf = Cursor::new(Vec::new());
    let result = execute(&cli, &mut buf, &DeclineAll);

    assert!(result.is_err());
    assert!(!fonts.exists());
}

#[test]
fn help_output_lists_flags() {
    let help = Cli::command().render_long_help().to_string();
    assert!(help.contains("--dry-run"));
    assert!(help.contains("--overwrite <OVERWRITE>"));
    assert!(help.contains("--no-admin-check"));
    assert!(help.contains("Supported font formats"));
}
