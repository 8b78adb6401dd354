//! Launch strategy candidates
//!
//! Each strategy is one command that can present a URL: kiosk-capable
//! browsers first, the platform opener as a non-kiosk last resort.

use tokio::process::Command;

/// One candidate command for presenting the frontend URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchStrategy {
    /// Short name used in logs and failure reports
    pub name: String,
    /// Program to execute
    pub program: String,
    /// Arguments placed before the URL
    pub args: Vec<String>,
}

impl LaunchStrategy {
    /// Create a strategy from a program and fixed arguments
    pub fn new(name: &str, program: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    /// Chromium-family browser in kiosk mode
    pub fn kiosk_browser(program: &str) -> Self {
        Self::new(
            program,
            program,
            &["--kiosk", "--no-first-run", "--disable-restore-session-state"],
        )
    }

    /// Platform default opener (non-kiosk last resort)
    pub fn system_opener() -> Self {
        #[cfg(target_os = "macos")]
        {
            Self::new("system-opener", "open", &[])
        }
        #[cfg(target_os = "windows")]
        {
            Self::new("system-opener", "cmd", &["/C", "start", ""])
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Self::new("system-opener", "xdg-open", &[])
        }
    }

    /// Command ready to spawn for the given URL
    ///
    /// The child is killed when its handle is dropped, so an abandoned
    /// launch cannot outlive the shell.
    pub(crate) fn command(&self, url: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(url).kill_on_drop(true);
        command
    }
}

/// Kiosk-capable browsers tried in order, then the platform opener
pub fn default_strategies() -> Vec<LaunchStrategy> {
    vec![
        LaunchStrategy::kiosk_browser("chromium-browser"),
        LaunchStrategy::kiosk_browser("google-chrome"),
        LaunchStrategy::new("firefox", "firefox", &["--kiosk"]),
        LaunchStrategy::kiosk_browser("chromium"),
        LaunchStrategy::system_opener(),
    ]
}
