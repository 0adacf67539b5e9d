//! Shell-script assembly for the pipeline stages.
//!
//! Generated scripts are plain-text artifacts: each stage formats toolkit
//! command lines into one `.sh` file and appends a self-invocation of the
//! flag updater, so a script that runs to completion records itself.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One shell script under construction.
#[derive(Debug)]
pub struct ScriptFile {
    name: &'static str,
    lines: Vec<String>,
}

impl ScriptFile {
    /// Start an empty script with the given file name.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lines: Vec::new(),
        }
    }

    /// Append one command line.
    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append a multi-line block verbatim.
    pub fn block(&mut self, block: &str) {
        for line in block.lines() {
            self.lines.push(line.to_string());
        }
    }

    /// Append a visual divider between per-observation sections.
    pub fn divider(&mut self) {
        self.lines
            .push("#-----------------------------------------------------------".to_string());
    }

    /// Append the flag-updater invocation that marks this stage complete.
    ///
    /// This must stay the script's final command: the flag flips only when
    /// everything before it has run.
    pub fn mark_complete(&mut self, root: &Path, flag: &str) {
        let exe = std::env::current_exe()
            .map(|path| quote_path(&path))
            .unwrap_or_else(|_| "acispipe".to_string());
        self.lines
            .push(format!("{exe} flag --root {} {flag}", quote_path(root)));
    }

    /// Write the script into the scripts directory, creating it if needed.
    pub fn write_to(&self, script_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(script_dir)
            .with_context(|| format!("create {}", script_dir.display()))?;
        let path = script_dir.join(self.name);
        let mut text = self.lines.join("\n");
        text.push('\n');
        fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

/// Quote a path for interpolation into a shell command line.
pub fn quote_path(path: &Path) -> String {
    shell_words::quote(&path.to_string_lossy()).into_owned()
}
