//! File system tools: `read_file`, `write_file`, `list_files`.
//!
//! Each tool receives the `path` argument exactly as the model wrote it (the
//! gateway has already confirmed it stays under the sandbox root) and
//! resolves it against `ToolContext::work_dir`. Observations quote the path
//! as given, never the resolved absolute form.

use std::fs;
use std::io::ErrorKind;

use serde_json::{json, Value};
use tracing::debug;

use warden_contracts::{
    error::ToolError,
    tool::{Tool, ToolContext, ToolKind},
};

use crate::str_arg;

pub struct ReadFile;

impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads the entire content of a file at the specified path and returns it as a string. \
         The path should be relative to the working directory."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "The relative path to the file to be read." }
            },
            "required": ["path"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::FileSystem
    }

    fn execute(&self, args: &Value, ctx: &ToolContext<'_>) -> Result<String, ToolError> {
        let path = str_arg(args, "path")?;
        let target = ctx.resolve(path);
        debug!(path = %target.display(), "reading file");

        match fs::read_to_string(&target) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(format!("Error: File not found at '{path}'.")),
            Err(e) => Ok(format!("Error reading file: {e}")),
        }
    }
}

pub struct WriteFile;

impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a file at a specified path. If the file exists, it will be overwritten. \
         If the parent directories do not exist, they will be created."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "The relative path for the file to be written." },
                "content": { "type": "string", "description": "The content to be written to the file." }
            },
            "required": ["path", "content"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::FileSystem
    }

    fn execute(&self, args: &Value, ctx: &ToolContext<'_>) -> Result<String, ToolError> {
        let path = str_arg(args, "path")?;
        let content = str_arg(args, "content")?;
        let target = ctx.resolve(path);
        debug!(path = %target.display(), bytes = content.len(), "writing file");

        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return Ok(format!("Error writing file: {e}"));
            }
        }
        match fs::write(&target, content) {
            Ok(()) => Ok(format!("Successfully wrote {} bytes to '{path}'.", content.len())),
            Err(e) => Ok(format!("Error writing file: {e}")),
        }
    }
}

pub struct ListFiles;

impl Tool for ListFiles {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "Lists all files and subdirectories within a specified directory. \
         Returns a newline-separated list of names."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the directory whose contents are to be listed. Use '.' for the working directory."
                }
            },
            "required": ["path"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::FileSystem
    }

    fn execute(&self, args: &Value, ctx: &ToolContext<'_>) -> Result<String, ToolError> {
        let path = str_arg(args, "path")?;
        let target = ctx.resolve(path);

        let entries = match fs::read_dir(&target) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(format!("Error: Directory not found at '{path}'."));
            }
            Err(e) => return Ok(format!("Error listing files: {e}")),
        };

        let mut names = entries
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>, _>>()?;
        names.sort();
        debug!(path = %target.display(), entry_count = names.len(), "listed directory");

        if names.is_empty() {
            return Ok(format!("Directory '{path}' is empty."));
        }
        Ok(names.join("\n"))
    }
}
