//! Unix-socket [`EventSource`] for UI commands.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`] and
//! forwarded as [`Event::Command`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"Drag":{"type":"view","source":{"droppableId":"droppable-ws-1","index":0},"destination":{"droppableId":"new-ws","index":0}}}
//! {"StepMaxViews":{"output":"HDMI-2","delta":-1}}
//! {"StepTopK":{"workspace":"1","delta":{"wheel":-120.0}}}
//! {"AddTag":{"view":"v1","text":"web"}}
//! {"RemoveTag":{"view":"v1","tag":"web"}}
//! ```

use crate::command::{Command, Event};
use crate::traits::EventSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Command socket for the UI.  One connection is served at a time and
/// may carry any number of commands.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UnixSocketListener {
    /// The socket file is only created by [`run`](EventSource::run).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether the main loop still wants events.
enum Flow {
    Continue,
    Stop,
}

/// Removes the socket file when the listener returns.
struct SocketFile<'a>(&'a Path);

impl Drop for SocketFile<'_> {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(self.0);
    }
}

/// Forward every command line from one UI connection.
fn serve(stream: UnixStream, sink: &mpsc::Sender<Event>) -> Flow {
    for line in BufReader::new(stream).lines() {
        let text = match line {
            Ok(text) => text,
            Err(e) => {
                warn!("ui read failed: {}", e);
                return Flow::Continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }
        let cmd = match serde_json::from_str::<Command>(&text) {
            Ok(cmd) => cmd,
            Err(e) => {
                error!("bad command: {} ({})", text, e);
                continue;
            }
        };
        debug!("ui sent {:?}", cmd);
        if sink.send(Event::Command(cmd)).is_err() {
            return Flow::Stop;
        }
    }
    Flow::Continue
}

impl EventSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and serve UI connections one after another.
    ///
    /// Blocks until the main loop drops its receiver.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        // A previous run may have left its socket behind.
        let _ = std::fs::remove_file(&self.path);
        let listener = UnixListener::bind(&self.path)?;
        let _socket = SocketFile(&self.path);
        info!("accepting ui commands on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("ui accept failed: {}", e);
                    continue;
                }
            };
            debug!("ui connected");
            if let Flow::Stop = serve(stream, &sink) {
                info!("event loop gone, command listener stopping");
                return Ok(());
            }
            debug!("ui disconnected");
        }
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Step;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    static NEXT_SOCKET: AtomicU32 = AtomicU32::new(0);

    /// Unique per process and per test.
    fn tmp_socket_path() -> PathBuf {
        let id = NEXT_SOCKET.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir();
        dir.join(format!(
            "layout-remote-test-{}-{}.sock",
            std::process::id(),
            id
        ))
    }

    /// Start a listener on a fresh socket and return its path and the
    /// receiving end of its sink.
    fn spawn_listener() -> (PathBuf, mpsc::Receiver<Event>) {
        let path = tmp_socket_path();
        let (tx, rx) = mpsc::channel();
        let mut listener = UnixSocketListener::new(&path);
        std::thread::spawn(move || listener.run(tx));
        std::thread::sleep(Duration::from_millis(150));
        (path, rx)
    }

    /// Write `lines` over one connection, then wait for them to be read.
    fn send_lines(path: &Path, lines: &[&str]) {
        let mut stream = UnixStream::connect(path).expect("connect");
        for line in lines {
            writeln!(stream, "{}", line).unwrap();
        }
        stream.shutdown(std::net::Shutdown::Write).unwrap();
        std::thread::sleep(Duration::from_millis(150));
    }

    #[test]
    fn commands_arrive_as_events() {
        let (path, rx) = spawn_listener();
        send_lines(
            &path,
            &[
                r#"{"StepMaxViews":{"output":"HDMI-2","delta":-1}}"#,
                "",
                r#"{"AddTag":{"view":"v1","text":"web"}}"#,
                r#"{"Drag":{"type":"view","source":{"droppableId":"droppable-ws-1","index":0},"destination":null}}"#,
            ],
        );

        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            Event::Command(Command::StepMaxViews {
                output: "HDMI-2".into(),
                delta: Step(-1)
            })
        );
        assert_eq!(
            events[1],
            Event::Command(Command::AddTag {
                view: "v1".into(),
                text: "web".into()
            })
        );
        assert!(matches!(&events[2], Event::Command(Command::Drag(d)) if d.destination.is_none()));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn bad_lines_are_skipped() {
        let (path, rx) = spawn_listener();
        send_lines(
            &path,
            &[
                "not json at all",
                r#"{"StepTopK":{"workspace":"1","delta":"up"}}"#,
                r#"{"RemoveTag":{"view":"v1","tag":"web"}}"#,
            ],
        );

        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![Event::Command(Command::RemoveTag {
                view: "v1".into(),
                tag: "web".into()
            })]
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn serves_successive_connections() {
        let (path, rx) = spawn_listener();
        send_lines(&path, &[r#"{"StepTopK":{"workspace":"1","delta":1}}"#]);
        send_lines(&path, &[r#"{"StepTopK":{"workspace":"1","delta":{"wheel":-1.0}}}"#]);

        let deltas: Vec<i32> = rx
            .try_iter()
            .map(|e| match e {
                Event::Command(Command::StepTopK { delta, .. }) => delta.0,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(deltas, vec![1, 1]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn path_accessor() {
        let listener = UnixSocketListener::new("/tmp/x.sock");
        assert_eq!(listener.path(), Path::new("/tmp/x.sock"));
    }
}
