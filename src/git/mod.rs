//! Git integration via the `git` binary
//!
//! A run that was asked to commit stages exactly the paths it wrote and
//! commits with the configured bot identity. All operations run in
//! `repo_dir` so the output tree can live anywhere relative to the
//! repository.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),
}

fn run_git(repo_dir: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<String, GitError> {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .envs(envs.iter().copied())
        .output()?;

    if !output.status.success() {
        return Err(GitError::Command {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Whether `repo_dir` is inside a git repository
pub fn is_git_repo(repo_dir: &Path) -> bool {
    run_git(repo_dir, &["rev-parse", "--git-dir"], &[]).is_ok()
}

/// Whether the repository has any uncommitted changes
pub fn has_changes(repo_dir: &Path) -> Result<bool, GitError> {
    let status = run_git(repo_dir, &["status", "--porcelain"], &[])?;
    Ok(!status.trim().is_empty())
}

/// Stages specific files
pub fn stage_files(repo_dir: &Path, files: &[PathBuf]) -> Result<(), GitError> {
    if files.is_empty() {
        return Ok(());
    }

    let mut args = vec!["add".to_string(), "--".to_string()];
    args.extend(files.iter().map(|p| p.display().to_string()));
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    run_git(repo_dir, &arg_refs, &[]).map(|_| ())
}

/// Stages the given paths and commits with the given author identity
///
/// Only the named paths end up in the commit; unrelated changes in the
/// repository are left alone. Returns the short commit SHA, or `None`
/// when none of the paths had changes to commit.
pub fn commit_changes(
    repo_dir: &Path,
    message: &str,
    files: &[PathBuf],
    author_name: &str,
    author_email: &str,
) -> Result<Option<String>, GitError> {
    if files.is_empty() || !has_changes(repo_dir)? {
        info!("no changes to commit");
        return Ok(None);
    }

    stage_files(repo_dir, files)?;

    // The repository may be dirty only outside the named paths
    let staged = run_git(repo_dir, &["diff", "--cached", "--name-only"], &[])?;
    if staged.trim().is_empty() {
        info!("no changes to commit");
        return Ok(None);
    }

    let envs = [
        ("GIT_AUTHOR_NAME", author_name),
        ("GIT_AUTHOR_EMAIL", author_email),
        ("GIT_COMMITTER_NAME", author_name),
        ("GIT_COMMITTER_EMAIL", author_email),
    ];

    run_git(repo_dir, &["commit", "-m", message], &envs)?;

    let sha = run_git(repo_dir, &["rev-parse", "--short", "HEAD"], &[])?;
    Ok(Some(sha.trim().to_string()))
}

/// Expands the commit message template
///
/// `{changed_count}` is the number of changed files and `{changed_files}` a
/// comma-separated list, truncated past five entries.
pub fn format_commit_message(template: &str, changed_files: &[String]) -> String {
    const MAX_LISTED: usize = 5;

    let files = if changed_files.len() > MAX_LISTED {
        format!(
            "{}, ... (+{} more)",
            changed_files[..MAX_LISTED].join(", "),
            changed_files.len() - MAX_LISTED
        )
    } else {
        changed_files.join(", ")
    };

    template
        .replace("{changed_count}", &changed_files.len().to_string())
        .replace("{changed_files}", &files)
}
