//! Engine command lines.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::filters::ResolvedFilters;
use super::instance::EngineInvocationContext;

/// A fully built engine invocation.
///
/// Tokens are kept separate and handed to the OS as an argument vector, so paths
/// need no escaping. [`EngineCommand::to_shell_string`] renders a quoted form for
/// logs and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

/// Inputs for one engine command line.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec<'a> {
    pub engine_path: &'a Path,
    pub input_extension: &'a str,
    pub output_format: &'a str,
    pub source_path: &'a Path,
    pub output_dir: &'a Path,
}

impl EngineCommand {
    /// Builds a headless conversion command bound to `context`.
    pub fn build(spec: CommandSpec<'_>, context: &EngineInvocationContext) -> Self {
        let filters = ResolvedFilters::resolve(spec.input_extension, spec.output_format);

        let mut args: Vec<OsString> = vec![
            "--headless".into(),
            "--norestore".into(),
            "--nolockcheck".into(),
            "-env:SingleAppInstance=false".into(),
            format!("-env:UserInstallation={}", context.user_installation_url()).into(),
            format!("--accept={}", context.accept_socket()).into(),
        ];

        if let Some(import) = &filters.import {
            args.push(format!("--infilter={}", import).into());
        }

        args.push("--convert-to".into());
        args.push(filters.export.into());
        args.push(spec.source_path.as_os_str().to_owned());
        args.push("--outdir".into());
        args.push(spec.output_dir.as_os_str().to_owned());

        Self {
            program: spec.engine_path.to_path_buf(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Creates a process command with all three standard streams piped.
    ///
    /// On unix the engine leads its own process group, so helpers it forks can be
    /// signalled together with it.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        command
    }

    /// Renders the command as a single POSIX shell line with every token quoted
    /// where needed.
    pub fn to_shell_string(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|token| shell_quote(&token.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quotes `token` for a POSIX shell. Tokens made only of safe characters are left
/// as they are.
pub fn shell_quote(token: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "-_./:=,@+%".contains(c);
    if !token.is_empty() && token.chars().all(is_safe) {
        return token.to_string();
    }
    format!("'{}'", token.replace('\'', r"'\''"))
}
