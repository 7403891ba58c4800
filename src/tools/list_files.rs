//! Builtin tool: list the immediate children of a directory.
//!
//! Entries come back directories-first, then case-insensitively by name —
//! a deterministic ordering the LLM can rely on across rounds. A metadata
//! failure on one entry is recorded inline on that entry and never aborts
//! the rest of the listing.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde_json::{json, Value};

use super::{Tool, ToolContext, ToolError};

/// One listed entry, pre-serialization.
struct Entry {
    name: String,
    is_dir: bool,
    value: Value,
}

/// Builtin tool that lists files and directories under a relative path.
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "List files and directories under a given path, relative to the \
         working directory. Returns one entry per immediate child with its \
         name, kind (file/dir/symlink), size and modification time, \
         directories first."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Relative path to list (e.g. '.', 'pkg', 'src/utils'). Defaults to '.'"
                }
            },
            "required": []
        })
    }

    async fn invoke(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let directory = args
            .get("directory")
            .and_then(Value::as_str)
            .unwrap_or(".");

        let resolved = ctx.boundary.resolve(directory)?;

        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| ToolError::NotFound(format!("path {directory:?} does not exist")))?;
        if !metadata.is_dir() {
            return Err(ToolError::NotADirectory(format!(
                "path {directory:?} is not a directory"
            )));
        }

        let mut reader = tokio::fs::read_dir(&resolved).await?;
        let mut entries: Vec<Entry> = Vec::new();

        while let Some(dir_entry) = reader.next_entry().await? {
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            let path = dir_entry.path();
            let relative = path
                .strip_prefix(ctx.boundary.root())
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();

            // Symlinks are reported as their own kind, not followed.
            match tokio::fs::symlink_metadata(&path).await {
                Ok(meta) => {
                    let file_type = meta.file_type();
                    let kind = if file_type.is_symlink() {
                        "symlink"
                    } else if file_type.is_dir() {
                        "dir"
                    } else {
                        "file"
                    };
                    let modified = meta
                        .modified()
                        .ok()
                        .map(|t| DateTime::<Local>::from(t).to_rfc3339());
                    entries.push(Entry {
                        name: name.clone(),
                        is_dir: file_type.is_dir() && !file_type.is_symlink(),
                        value: json!({
                            "name": name,
                            "path": relative,
                            "kind": kind,
                            "size": meta.len(),
                            "modified": modified,
                        }),
                    });
                }
                Err(e) => {
                    // The entry stays in the listing with its own error.
                    entries.push(Entry {
                        name: name.clone(),
                        is_dir: false,
                        value: json!({
                            "name": name,
                            "path": relative,
                            "error": e.to_string(),
                        }),
                    });
                }
            }
        }

        entries.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        Ok(json!({
            "directory": directory,
            "entries": entries.into_iter().map(|e| e.value).collect::<Vec<_>>(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::sandbox::PathBoundary;

    use super::*;

    fn context(root: &std::path::Path) -> ToolContext {
        ToolContext {
            boundary: PathBoundary::new(root).unwrap(),
            read_limit: 10_000,
            exec_timeout: Duration::from_secs(30),
        }
    }

    async fn list(ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        ListFilesTool.invoke(args, ctx).await
    }

    #[tokio::test]
    async fn test_directories_first_then_case_insensitive_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let ctx = context(dir.path());

        let result = list(&ctx, json!({"directory": "."})).await.unwrap();
        let entries = result["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["name"], "sub");
        assert_eq!(entries[0]["kind"], "dir");
        assert_eq!(entries[1]["name"], "a.txt");
        assert_eq!(entries[1]["kind"], "file");
        assert_eq!(entries[1]["size"], 5);
    }

    #[tokio::test]
    async fn test_case_insensitive_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Beta.txt"), "").unwrap();
        std::fs::write(dir.path().join("alpha.txt"), "").unwrap();
        std::fs::write(dir.path().join("Gamma.txt"), "").unwrap();
        let ctx = context(dir.path());

        let result = list(&ctx, json!({})).await.unwrap();
        let names: Vec<&str> = result["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["alpha.txt", "Beta.txt", "Gamma.txt"]);
    }

    #[tokio::test]
    async fn test_listing_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("d")).unwrap();
        let ctx = context(dir.path());

        let first = list(&ctx, json!({"directory": "."})).await.unwrap();
        let second = list(&ctx, json!({"directory": "."})).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_directory_defaults_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("only.txt"), "").unwrap();
        let ctx = context(dir.path());

        let result = list(&ctx, json!({})).await.unwrap();
        assert_eq!(result["directory"], ".");
        assert_eq!(result["entries"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let err = list(&ctx, json!({"directory": "missing"})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_target_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plain.txt"), "").unwrap();
        let ctx = context(dir.path());

        let err = list(&ctx, json!({"directory": "plain.txt"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_escape_is_boundary_violation() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let err = list(&ctx, json!({"directory": "../"})).await.unwrap_err();
        assert!(matches!(err, ToolError::Boundary(_)));
    }

    #[tokio::test]
    async fn test_modified_timestamp_reflects_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("dated.txt");
        std::fs::write(&file, "").unwrap();
        filetime::set_file_mtime(&file, filetime::FileTime::from_unix_time(1_700_000_000, 0))
            .unwrap();
        let ctx = context(dir.path());

        let result = list(&ctx, json!({})).await.unwrap();
        let modified = result["entries"][0]["modified"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(modified).unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_reported_as_symlink() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("target.txt"), "").unwrap();
        std::os::unix::fs::symlink(dir.path().join("target.txt"), dir.path().join("link"))
            .unwrap();
        let ctx = context(dir.path());

        let result = list(&ctx, json!({})).await.unwrap();
        let link = result["entries"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["name"] == "link")
            .unwrap();
        assert_eq!(link["kind"], "symlink");
    }
}
