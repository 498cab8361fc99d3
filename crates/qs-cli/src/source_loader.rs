use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use qs_core::{normalize_script_path, ScriptError};
use walkdir::WalkDir;

use crate::{map_walk_error, CliStage};

pub(crate) const SCRIPT_EXTENSION: &str = "txt";

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, ScriptError> {
    let path = PathBuf::from(scripts_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(CliStage::SourcePath.at(&path))?
            .join(&path)
    };

    if !absolute.exists() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("scripts-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Every `.txt` script under `scripts_dir`, keyed by normalised relative path.
pub(crate) fn read_scripts_from_dir(
    scripts_dir: &Path,
) -> Result<BTreeMap<String, String>, ScriptError> {
    let mut scripts = BTreeMap::new();

    for entry in WalkDir::new(scripts_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|error| map_walk_error(scripts_dir, error))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_script = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case(SCRIPT_EXTENSION));
        if !is_script {
            continue;
        }

        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(CliStage::SourceScan.at(path))?
            .to_string_lossy()
            .to_string();

        let content = fs::read_to_string(path).map_err(CliStage::SourceRead.at(path))?;
        scripts.insert(normalize_script_path(&relative), content);
    }

    if scripts.is_empty() {
        return Err(ScriptError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .txt scripts under {}", scripts_dir.display()),
        ));
    }

    Ok(scripts)
}

pub(crate) fn load_scripts(scripts_dir: &str) -> Result<BTreeMap<String, String>, ScriptError> {
    let root = resolve_scripts_dir(scripts_dir)?;
    read_scripts_from_dir(&root)
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn resolve_scripts_dir_validates_existence_and_directory() {
        let missing = temp_path("missing-dir");
        let missing_err = resolve_scripts_dir(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(missing_err.code, "CLI_SOURCE_NOT_FOUND");

        let file_path = temp_path("plain-file");
        write_file(&file_path, "x");
        let file_err = resolve_scripts_dir(file_path.to_string_lossy().as_ref())
            .expect_err("file path should fail");
        assert_eq!(file_err.code, "CLI_SOURCE_NOT_DIR");
    }

    #[test]
    fn read_scripts_from_dir_keeps_only_txt_files_with_normalised_keys() {
        let root = temp_path("scripts-dir");
        write_file(&root.join("Main.txt"), "Say(\"hi\");");
        write_file(&root.join("Script/Common/Greet.TXT"), "Return();");
        write_file(&root.join("talk.ini"), "[1]");
        write_file(&root.join("notes.md"), "ignored");

        let scripts = read_scripts_from_dir(&root).expect("scan should pass");
        assert_eq!(
            scripts.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["main.txt", "script/common/greet.txt"]
        );
    }

    #[test]
    fn read_scripts_from_dir_errors_when_no_scripts() {
        let root = temp_path("empty-scripts-dir");
        write_file(&root.join("readme.md"), "not a script");

        let error = read_scripts_from_dir(&root).expect_err("empty source set should fail");
        assert_eq!(error.code, "CLI_SOURCE_EMPTY");
    }
}
