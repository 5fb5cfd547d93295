//! Subprocess plumbing for ispell/aspell style backends.
//!
//! Process lifecycle is the host's problem in an editor; the CLI needs a
//! working transport, so a minimal one lives here.

use super::{BulkChecker, Transport};
use crate::config::EngineConfig;
use crate::{Error, Result};
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// Transport over a persistent `<backend> -a` child process.
pub struct ProcessTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ProcessTransport {
    /// Spawn the configured backend in interactive (`-a`) mode and consume
    /// its greeting banner.
    pub fn spawn(config: &EngineConfig) -> Result<Self> {
        let mut command = Command::new(&config.backend_program);
        command
            .arg("-a")
            .arg("-d")
            .arg(&config.language)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(personal) = &config.personal_dictionary {
            command.arg("-p").arg(personal);
        }

        let mut child = command
            .spawn()
            .map_err(|e| Error::BackendUnavailable(format!("{}: {e}", config.backend_program)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::BackendUnavailable("backend stdin not piped".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::BackendUnavailable("backend stdout not piped".into()))?;
        let mut transport = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };

        // The identification banner is one line starting with '@'.
        match transport.read_line()? {
            Some(banner) if banner.starts_with('@') => Ok(transport),
            Some(other) => Err(Error::Protocol(format!("unexpected greeting: {other:?}"))),
            None => Err(Error::BackendUnavailable(
                "backend exited before greeting".into(),
            )),
        }
    }
}

impl Transport for ProcessTransport {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.stdout.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// One-shot `<backend> list` invocation over a byte range.
pub struct ProcessBulk {
    program: String,
    language: String,
}

impl ProcessBulk {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            program: config.backend_program.clone(),
            language: config.language.clone(),
        }
    }
}

impl BulkChecker for ProcessBulk {
    fn list_misspellings(&mut self, text: &str) -> Result<Vec<String>> {
        let mut child = Command::new(&self.program)
            .arg("list")
            .arg("-d")
            .arg(&self.language)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::BackendUnavailable(format!("{}: {e}", self.program)))?;

        child
            .stdin
            .take()
            .ok_or_else(|| Error::BackendUnavailable("backend stdin not piped".into()))?
            .write_all(text.as_bytes())?;

        let output = child.wait_with_output()?;
        if !output.status.success() {
            // No partial annotations are trusted when the backend fails.
            return Err(Error::Region(format!(
                "backend exited with {}",
                output.status
            )));
        }

        let listed = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Ok(listed)
    }
}
