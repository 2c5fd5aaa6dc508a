//! Blocking execution of external tools with an optional deadline.

use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run `command` to completion and capture its output.
///
/// Returns `Ok(None)` when `timeout` elapses first; the child is killed in
/// that case.
pub(crate) fn run(command: &mut Command, timeout: Option<Duration>) -> std::io::Result<Option<Output>> {
    debug!("Running {:?}", command);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match timeout {
        None => child.wait()?,
        Some(limit) => {
            let deadline = Instant::now() + limit;
            loop {
                if let Some(status) = child.try_wait()? {
                    break status;
                }
                if Instant::now() >= deadline {
                    debug!("Command exceeded {:?}, killing it", limit);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(None);
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let stdout = stdout.map(|h| h.join().unwrap_or_default()).unwrap_or_default();
    let stderr = stderr.map(|h| h.join().unwrap_or_default()).unwrap_or_default();
    trace!("Command exited with {} ({} bytes stdout)", status, stdout.len());

    Ok(Some(Output { status, stdout, stderr }))
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let output = run(Command::new("sh").args(["-c", "printf hello"]), None)
            .unwrap()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"hello");
    }

    #[test]
    fn test_timeout_kills_child() {
        let started = Instant::now();
        let output = run(
            Command::new("sh").args(["-c", "sleep 5"]),
            Some(Duration::from_millis(100)),
        )
        .unwrap();
        assert!(output.is_none());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = run(&mut Command::new("pagewise-definitely-missing-binary"), None).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
