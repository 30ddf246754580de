use std::process::Command;
use tracing::{debug, warn};

/// Launch strategy for the host platform's native "open URL" facility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Platform {
    MacOs,
    Unix,
    Windows,
    Unsupported,
}

impl Platform {
    fn detect() -> Self {
        match std::env::consts::OS {
            "macos" => Self::MacOs,
            "linux" | "freebsd" | "openbsd" | "netbsd" => Self::Unix,
            "windows" => Self::Windows,
            _ => Self::Unsupported,
        }
    }

    /// The command that opens `url` in the default browser, or `None` when
    /// the platform has no known launcher.
    fn launch_command(self, url: &str) -> Option<Command> {
        match self {
            Self::MacOs => {
                let mut cmd = Command::new("open");
                cmd.arg(url);
                Some(cmd)
            }
            Self::Unix => {
                let mut cmd = Command::new("xdg-open");
                cmd.arg(url);
                Some(cmd)
            }
            Self::Windows => {
                // The empty string is the window title `start` would
                // otherwise steal from a quoted URL.
                let mut cmd = Command::new("cmd");
                cmd.args(["/C", "start", "", url]);
                Some(cmd)
            }
            Self::Unsupported => None,
        }
    }
}

/// Open a URL in the user's default web browser
///
/// Best effort: launching the browser is a convenience, not a correctness
/// requirement, so failures and unsupported platforms are logged and
/// swallowed. The user can always open the URL manually.
pub fn open_browser(url: &str) {
    match Platform::detect().launch_command(url) {
        Some(mut command) => match command.spawn() {
            Ok(_) => debug!(%url, "opened system browser"),
            Err(e) => warn!(%url, error = %e, "failed to launch system browser"),
        },
        None => warn!(
            %url,
            os = std::env::consts::OS,
            "no known browser launcher for this platform"
        ),
    }
}
