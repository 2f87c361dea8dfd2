//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;

use colored::Colorize;
use tracing::debug;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// List the entries of a directory (not recursive).
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;

    /// Current working directory, used to absolutize user paths.
    fn current_dir(&self) -> io::Result<PathBuf>;
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with arguments.
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output>;
}

/// Line-based user interaction used by `init`.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question. Empty input selects `default`.
    fn confirm(&self, message: &str, default: bool) -> io::Result<bool>;

    /// Ask for a value. Empty input selects `default`.
    fn input(&self, message: &str, default: &str) -> io::Result<String>;

    /// Show an informational line.
    fn say(&self, message: &str);
}

/// Source of diagnostic key/value pairs for `sysinfo`.
///
/// Iteration order of the returned pairs is the display order.
pub trait SystemProbe: Send + Sync {
    fn collect(&self) -> Vec<(String, String)>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        std::process::Command::new(cmd).args(args).output()
    }
}

/// Prompter reading answers from stdin, writing prompts to stdout.
#[derive(Debug, Default)]
pub struct StdioPrompter;

impl StdioPrompter {
    fn read_answer(&self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{} ", prompt.cyan())?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim().to_string())
    }
}

impl Prompter for StdioPrompter {
    fn confirm(&self, message: &str, default: bool) -> io::Result<bool> {
        let choices = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.read_answer(&format!("{message} {choices}:"))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("Error: invalid input"),
            }
        }
    }

    fn input(&self, message: &str, default: &str) -> io::Result<String> {
        let answer = self.read_answer(&format!("{message} [{default}]:"))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    fn say(&self, message: &str) {
        println!("{message}");
    }
}

/// Probe collecting host, toolchain and accelerator details.
///
/// Missing tools are reported as values, never as errors.
pub struct RealSystemProbe {
    cmd: Arc<dyn CommandRunner>,
}

const UNKNOWN: &str = "unknown";
const NOT_FOUND: &str = "not found";

impl RealSystemProbe {
    pub fn new(cmd: Arc<dyn CommandRunner>) -> Self {
        Self { cmd }
    }

    /// Trimmed stdout of a successful command, `None` otherwise.
    fn command_output(&self, cmd: &str, args: &[&str]) -> Option<String> {
        match self.cmd.run(cmd, args) {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!stdout.is_empty()).then_some(stdout)
            }
            Ok(output) => {
                debug!("probe: {} exited with {}", cmd, output.status);
                None
            }
            Err(e) => {
                debug!("probe: {} unavailable: {}", cmd, e);
                None
            }
        }
    }

    fn kernel_release(&self) -> String {
        if cfg!(unix) {
            self.command_output("uname", &["-r"])
                .unwrap_or_else(|| UNKNOWN.to_string())
        } else {
            UNKNOWN.to_string()
        }
    }

    fn git_version(&self) -> String {
        self.command_output("git", &["--version"])
            .map(|v| v.trim_start_matches("git version").trim().to_string())
            .unwrap_or_else(|| NOT_FOUND.to_string())
    }

    fn nvidia_gpus(&self) -> String {
        self.command_output(
            "nvidia-smi",
            &["--query-gpu=name", "--format=csv,noheader"],
        )
        .map(|names| names.lines().map(str::trim).collect::<Vec<_>>().join(", "))
        .unwrap_or_else(|| NOT_FOUND.to_string())
    }
}

impl SystemProbe for RealSystemProbe {
    fn collect(&self) -> Vec<(String, String)> {
        let node = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| UNKNOWN.to_string());
        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get().to_string())
            .unwrap_or_else(|_| UNKNOWN.to_string());

        vec![
            ("platform.node".to_string(), node),
            (
                "platform.system".to_string(),
                std::env::consts::OS.to_string(),
            ),
            (
                "platform.family".to_string(),
                std::env::consts::FAMILY.to_string(),
            ),
            ("platform.release".to_string(), self.kernel_release()),
            (
                "platform.machine".to_string(),
                std::env::consts::ARCH.to_string(),
            ),
            ("platform.cpu_count".to_string(), cpu_count),
            (
                "ilab.version".to_string(),
                env!("CARGO_PKG_VERSION").to_string(),
            ),
            ("git.version".to_string(), self.git_version()),
            ("gpu.nvidia".to_string(), self.nvidia_gpus()),
        ]
    }
}
