//! Helpers for spawning external media tools such as ffmpeg.

use std::ffi::OsStr;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Command for a non-interactive external tool.
///
/// No console window on Windows, stdin closed, and the C locale so that
/// diagnostics are stable English text.
#[cfg(feature = "tokio")]
pub fn tool_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd.env("LC_ALL", "C").stdin(std::process::Stdio::null());
    cmd
}

/// Run `<program> -version` and return the first line of its stdout.
///
/// `None` when the program cannot be spawned or exits unsuccessfully.
#[cfg(feature = "tokio")]
pub async fn probe_version(program: impl AsRef<OsStr>) -> Option<String> {
    let output = tool_command(program).arg("-version").output().await.ok()?;
    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
