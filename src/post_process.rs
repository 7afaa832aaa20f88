//! Post-processing of generated output.
//!
//! Two stages exist: a synchronous per-file hook applied to every file body
//! while generating ([`CodePostProcessor`]), and post-generation shell
//! commands run once files are on disk ([`run_post_generation_commands`]).

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, error, info, warn};

use crate::config::FormatterCommand;
use crate::shell::CommandExecutor;

/// File extensions never handed to a source formatter
const UNFORMATTED_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Per-file hook run on every generated body
pub trait CodePostProcessor: Send + Sync {
    fn process(&self, filename: &str, code: String) -> String;
}

/// Leaves code untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPostProcessor;

impl CodePostProcessor for IdentityPostProcessor {
    fn process(&self, _filename: &str, code: String) -> String {
        code
    }
}

/// Pipes code through an external formatter (stdin -> stdout).
/// Falls back to the unformatted code when the formatter fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFormatter {
    command: FormatterCommand,
}

impl ExternalFormatter {
    pub fn new(command: FormatterCommand) -> Self {
        Self { command }
    }

    fn skips(filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                UNFORMATTED_EXTENSIONS
                    .iter()
                    .any(|skipped| skipped.eq_ignore_ascii_case(ext))
            })
    }

    fn run(&self, code: &str) -> Result<String, String> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| e.to_string())?;

        // stdin and stdout must drain concurrently for large files
        let writer = child.stdin.take().map(|mut stdin| {
            let code = code.to_string();
            std::thread::spawn(move || stdin.write_all(code.as_bytes()))
        });

        let output = child.wait_with_output().map_err(|e| e.to_string())?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| "stdin writer panicked".to_string())?
                .map_err(|e| e.to_string())?;
        }
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }
        String::from_utf8(output.stdout).map_err(|e| e.to_string())
    }
}

impl CodePostProcessor for ExternalFormatter {
    fn process(&self, filename: &str, code: String) -> String {
        if Self::skips(filename) {
            return code;
        }
        match self.run(&code) {
            Ok(formatted) => formatted,
            Err(reason) => {
                warn!(
                    filename = %filename,
                    program = %self.command.program,
                    error = %reason,
                    "Failed to format file, keeping unformatted code"
                );
                code
            }
        }
    }
}

/// Run each command in `target_dir`, in order. Failures are logged, never fatal.
/// Returns the number of commands that succeeded.
pub async fn run_post_generation_commands(
    executor: &dyn CommandExecutor,
    commands: &[String],
    target_dir: &Path,
) -> usize {
    let mut succeeded = 0;
    for command in commands {
        info!(
            command = %command,
            target_dir = %target_dir.display(),
            "Executing post-generation command"
        );

        match executor.execute(command, target_dir).await {
            Ok(output) if output.is_success() => {
                succeeded += 1;
                if !output.stdout.trim().is_empty() {
                    debug!(command = %command, output = %output.stdout.trim(), "Post-generation command output");
                }
            }
            Ok(output) => {
                error!(
                    command = %command,
                    exit_code = output.exit_code,
                    stderr = %output.stderr,
                    "Post-generation command failed"
                );
            }
            Err(e) => {
                error!(command = %command, error = %e, "Failed to execute post-generation command");
            }
        }
    }
    succeeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::tests::RecordingExecutor;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn formatter(program: &str, args: &[&str]) -> ExternalFormatter {
        ExternalFormatter::new(FormatterCommand {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        })
    }

    #[test]
    fn test_identity() {
        assert_eq!(IdentityPostProcessor.process("a.ts", "x".to_string()), "x");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_formatter_pipes_stdin() {
        let upper = formatter("tr", &["a-z", "A-Z"]);
        assert_eq!(upper.process("Main.java", "class a {}".to_string()), "CLASS A {}");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_formatter_skips_markdown_and_text() {
        let upper = formatter("tr", &["a-z", "A-Z"]);
        assert_eq!(upper.process("README.md", "hello".to_string()), "hello");
        assert_eq!(upper.process("notes.TXT", "hello".to_string()), "hello");
    }

    #[test]
    #[traced_test]
    fn test_external_formatter_falls_back_on_failure() {
        let missing = formatter("definitely-not-a-formatter-binary", &[]);
        assert_eq!(missing.process("a.ts", "let a=1".to_string()), "let a=1");
        assert!(logs_contain("Failed to format file"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_post_generation_commands_continue_after_failure() {
        let executor = RecordingExecutor::default()
            .with_result("npm install", 1, "network down")
            .with_result("git init", 0, "");
        let dir = tempdir().unwrap();
        let commands = vec![
            "npm install".to_string(),
            "unknown".to_string(),
            "git init".to_string(),
        ];

        let succeeded = run_post_generation_commands(&executor, &commands, dir.path()).await;

        assert_eq!(succeeded, 1);
        assert_eq!(
            *executor.calls.lock().unwrap(),
            vec!["npm install", "unknown", "git init"]
        );
        assert!(logs_contain("Post-generation command failed"));
        assert!(logs_contain("Failed to execute post-generation command"));
    }
}
