//! Shell command runner dengan readiness-polled pipes
//!
//! Child process dijalankan lewat `/bin/sh -c`. Stdout dan stderr
//! di-register ke satu `mio::Poll`, lalu di-drain setiap kali readable
//! sampai keduanya EOF. Dengan begitu child tidak pernah macet karena
//! salah satu pipe penuh.

use std::fmt;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};

use mio::unix::pipe::Receiver;
use mio::{Events, Interest, Poll, Token};
use thiserror::Error;
use tracing::{debug, trace};

use super::output::{OutputBuffer, PipeState};

const STDOUT_TOKEN: Token = Token(0);
const STDERR_TOKEN: Token = Token(1);
const EVENTS_CAPACITY: usize = 8;
const SHELL: &str = "/bin/sh";

/// Stream output dari child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Error dari shell runner
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to spawn shell command")]
    Spawn(#[source] io::Error),

    #[error("child {0} pipe was not captured")]
    MissingPipe(StreamKind),

    #[error("readiness polling failed")]
    Poll(#[source] io::Error),

    #[error("failed to read child {stream}")]
    Read {
        stream: StreamKind,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for child process")]
    Wait(#[source] io::Error),
}

/// Hasil command yang sudah selesai
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, atau `128 + signal` kalau child dibunuh signal
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Satu pipe yang sedang di-drain
struct PipeReader {
    kind: StreamKind,
    token: Token,
    pipe: Receiver,
    output: OutputBuffer,
    state: PipeState,
}

impl PipeReader {
    fn new(kind: StreamKind, token: Token, pipe: Receiver) -> io::Result<Self> {
        pipe.set_nonblocking(true)?;
        Ok(Self {
            kind,
            token,
            pipe,
            output: OutputBuffer::new(),
            state: PipeState::Open,
        })
    }

    fn is_open(&self) -> bool {
        self.state == PipeState::Open
    }

    /// Drain pipe; deregister saat EOF
    fn drain(&mut self, poll: &Poll) -> Result<(), ShellError> {
        if !self.is_open() {
            return Ok(());
        }

        let (state, n) = self
            .output
            .fill_from(&mut self.pipe)
            .map_err(|source| ShellError::Read {
                stream: self.kind,
                source,
            })?;
        trace!(stream = %self.kind, bytes = n, total = self.output.len(), "pipe drained");

        if state == PipeState::Closed {
            self.state = PipeState::Closed;
            poll.registry()
                .deregister(&mut self.pipe)
                .map_err(ShellError::Poll)?;
        }
        Ok(())
    }
}

/// Jalankan `command` lewat `/bin/sh -c` dan kumpulkan semua output.
///
/// # Errors
/// [`ShellError`] kalau spawn, polling, read, atau wait gagal. Exit code
/// non-zero bukan error; lihat [`CommandOutput::exit_code`].
pub fn run(command: &str) -> Result<CommandOutput, ShellError> {
    debug!(command, "spawning shell command");

    let mut child = Command::new(SHELL)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(ShellError::Spawn)?;

    let collected = collect_output(&mut child);

    // Selalu wait supaya tidak ada zombie, walaupun collect gagal
    let status = child.wait().map_err(ShellError::Wait);
    let (stdout, stderr) = collected?;
    let exit_code = exit_code(status?);

    debug!(
        exit_code,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "shell command finished"
    );

    Ok(CommandOutput {
        exit_code,
        stdout,
        stderr,
    })
}

fn collect_output(child: &mut Child) -> Result<(Vec<u8>, Vec<u8>), ShellError> {
    let stdout = child
        .stdout
        .take()
        .ok_or(ShellError::MissingPipe(StreamKind::Stdout))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(ShellError::MissingPipe(StreamKind::Stderr))?;

    let mut out = PipeReader::new(StreamKind::Stdout, STDOUT_TOKEN, Receiver::from(stdout))
        .map_err(ShellError::Poll)?;
    let mut err = PipeReader::new(StreamKind::Stderr, STDERR_TOKEN, Receiver::from(stderr))
        .map_err(ShellError::Poll)?;

    let mut poll = Poll::new().map_err(ShellError::Poll)?;
    for reader in [&mut out, &mut err] {
        poll.registry()
            .register(&mut reader.pipe, reader.token, Interest::READABLE)
            .map_err(ShellError::Poll)?;
    }

    // Drain awal: data yang sudah ada sebelum register tidak selalu
    // menghasilkan edge baru
    out.drain(&poll)?;
    err.drain(&poll)?;

    let mut events = Events::with_capacity(EVENTS_CAPACITY);
    while out.is_open() || err.is_open() {
        if let Err(e) = poll.poll(&mut events, None) {
            if e.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(ShellError::Poll(e));
        }

        for event in events.iter() {
            match event.token() {
                STDOUT_TOKEN => out.drain(&poll)?,
                STDERR_TOKEN => err.drain(&poll)?,
                _ => {}
            }
        }
    }

    Ok((out.output.into_bytes(), err.output.into_bytes()))
}

/// Exit code gaya shell: status normal, atau 128 + nomor signal
fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => 128 + status.signal().unwrap_or(0),
    }
}
