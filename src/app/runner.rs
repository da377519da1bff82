use std::ffi::OsStr;
use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::app::error::AppError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long to keep reading pipes after the child exits. A helper the tool left
/// behind can hold the write ends open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Collects one pipe on a background thread without ever blocking the caller past a deadline.
struct Drain {
    buffer: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

impl Drain {
    fn spawn<R: Read + Send + 'static>(mut reader: R) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink = Arc::clone(&buffer);
        let (done_tx, done) = mpsc::channel();
        std::thread::spawn(move || {
            let mut temp = [0u8; 4096];
            loop {
                match reader.read(&mut temp) {
                    Ok(0) => break,
                    Ok(count) => {
                        if let Ok(mut guard) = sink.lock() {
                            guard.extend_from_slice(&temp[..count]);
                        }
                    }
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            let _ = done_tx.send(());
        });
        Self { buffer, done }
    }

    fn finish(self, grace: Duration) -> Vec<u8> {
        let _ = self.done.recv_timeout(grace);
        self.buffer
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

pub fn run_command_with_timeout<S, A>(
    program: S,
    args: &[A],
    timeout: Duration,
    trace_id: &str,
) -> Result<CommandOutput, AppError>
where
    S: AsRef<OsStr>,
    A: AsRef<OsStr>,
{
    let mut command = Command::new(program.as_ref());
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group, so a timeout also takes down anything the tool forked.
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(|err| match err.kind() {
        ErrorKind::NotFound => AppError::dependency(
            format!(
                "Executable not found: {}",
                program.as_ref().to_string_lossy()
            ),
            trace_id,
        ),
        _ => AppError::system(format!("Failed to spawn command: {err}"), trace_id),
    })?;

    // Drain stdout/stderr in parallel; otherwise, a chatty child process can block once the pipe
    // buffer fills, and we will incorrectly hit the timeout.
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stdout", trace_id))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stderr", trace_id))?;

    let stdout_drain = Drain::spawn(stdout);
    let stderr_drain = Drain::spawn(stderr);

    let start = Instant::now();
    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {
                if start.elapsed() > timeout {
                    terminate(&mut child);
                    return Err(AppError::timeout(
                        format!("Command timed out after {} ms", timeout.as_millis()),
                        trace_id,
                    ));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                terminate(&mut child);
                return Err(AppError::system(
                    format!("Failed to wait for command: {err}"),
                    trace_id,
                ));
            }
        }
    };

    let stdout_bytes = stdout_drain.finish(DRAIN_GRACE);
    let stderr_bytes = stderr_drain.finish(DRAIN_GRACE);

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
        stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
        exit_code,
    })
}

/// Drain threads are left to finish on their own once the pipes close.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain kill(2) on the group created for this child at spawn time.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
