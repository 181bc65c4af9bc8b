//! `markin check`: parse files and report the first error in each.

use anyhow::{Context, Result};
use colored::Colorize;
use markin_parse::{ParseOptions, Parser};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::MarkinConfig;

/// Outcome of checking a set of paths.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub checked: usize,
    pub failed: usize,
}

/// Expand `paths` into the files to check.
///
/// Files named directly are always included. Directories are walked
/// recursively, in file-name order, keeping files with a configured
/// extension.
pub fn collect_files(paths: &[String], config: &MarkinConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = Path::new(path);
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }

        for entry in WalkDir::new(path).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && config.matches_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}

/// Parse every file, printing `path:line:column: error: message` for each
/// failure and `path: OK` for each success unless `quiet`.
pub fn check_files(files: &[PathBuf], options: ParseOptions, quiet: bool) -> Result<CheckReport> {
    let parser = Parser::new(options);
    let mut report = CheckReport::default();

    for file in files {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read '{}'", file.display()))?;
        report.checked += 1;

        match parser.parse(&content) {
            Ok(_) => {
                if !quiet {
                    println!("{}: {}", file.display(), "OK".green());
                }
            }
            Err(err) => {
                report.failed += 1;
                let location = err.location();
                println!(
                    "{}:{}:{}: {}: {}",
                    file.display(),
                    location.line,
                    location.column,
                    "error".red().bold(),
                    err
                );
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_tree(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("markin-check-unit").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("a.markin"), "# A").unwrap();
        fs::write(dir.join("sub/b.mkn"), "*open").unwrap();
        fs::write(dir.join("sub/c.txt"), "*ignored").unwrap();
        dir
    }

    #[test]
    fn test_collect_files_filters_by_extension() {
        let dir = temp_tree("collect");
        let files = collect_files(&[dir.to_string_lossy().to_string()], &MarkinConfig::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.markin", "b.mkn"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_named_file_is_kept_regardless_of_extension() {
        let dir = temp_tree("named");
        let named = dir.join("sub/c.txt").to_string_lossy().to_string();
        let files = collect_files(&[named], &MarkinConfig::default()).unwrap();
        assert_eq!(files.len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_check_counts_failures() {
        let dir = temp_tree("count");
        let files = collect_files(&[dir.to_string_lossy().to_string()], &MarkinConfig::default()).unwrap();
        let report = check_files(&files, ParseOptions::default(), true).unwrap();
        assert_eq!(report.checked, 2);
        assert_eq!(report.failed, 1);
        let _ = fs::remove_dir_all(&dir);
    }
}
