use std::io::{self, BufRead, BufReader, Write};
use std::thread;

use stdiomux_session::{
    CancellationToken, DialedStream, Session, SessionConfig, SessionError, Stream,
};

use crate::cmd::{ServeArgs, ECHO_SERVICE};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let config = SessionConfig::new()
        .with_compression(args.compression)
        .with_cancellation(cancel);
    let session =
        Session::from_stdio(config).map_err(|err| session_error("session start failed", err))?;
    tracing::info!(compression = args.compression, "serving on stdio");

    let listener = session.listener();
    let mut handlers = Vec::new();
    let mut ended = None;
    for conn in listener.incoming() {
        match conn {
            Ok(conn) => {
                let handler = thread::Builder::new()
                    .name(format!("echo-{}", conn.id()))
                    .spawn(move || serve_stream(conn));
                match handler {
                    Ok(handle) => handlers.push(handle),
                    Err(err) => tracing::warn!(error = %err, "cannot spawn stream handler"),
                }
            }
            Err(err) => ended = Some(err),
        }
    }

    for handler in handlers {
        let _ = handler.join();
    }
    session.drain();

    match ended {
        Some(err) if is_clean_end(&err) => {
            tracing::info!(reason = %err, "session ended");
            Ok(SUCCESS)
        }
        Some(err) => Err(session_error("session failed", err)),
        None => Ok(SUCCESS),
    }
}

fn is_clean_end(err: &SessionError) -> bool {
    matches!(
        err,
        SessionError::Closed | SessionError::ListenerClosed | SessionError::Cancelled
    )
}

fn serve_stream(conn: DialedStream) {
    let (stream, args) = conn.into_parts();
    let id = stream.id();
    let service = args.service_name;
    if !service.is_empty() && service != ECHO_SERVICE {
        tracing::warn!(stream_id = id, service = %service, "unknown service, closing stream");
        stream.close();
        return;
    }

    match echo_lines(&stream) {
        Ok(lines) => tracing::debug!(stream_id = id, lines, "stream finished"),
        Err(err) => tracing::debug!(stream_id = id, error = %err, "stream failed"),
    }
    stream.close();
}

/// Answer every newline-terminated line with itself until end of stream.
fn echo_lines(stream: &Stream) -> io::Result<u64> {
    let mut reader = BufReader::new(stream);
    let mut writer = stream;
    let mut line = Vec::new();
    let mut count = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(count);
        }
        writer.write_all(&line)?;
        count += 1;
    }
}

fn install_ctrlc_handler(cancel: CancellationToken) -> CliResult<()> {
    ctrlc::set_handler(move || {
        cancel.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use stdiomux_session::{Code, Status};

    use super::*;

    #[test]
    fn local_and_peer_endings_are_clean() {
        assert!(is_clean_end(&SessionError::Closed));
        assert!(is_clean_end(&SessionError::Cancelled));
        assert!(!is_clean_end(&SessionError::Protocol("bad".to_string())));
        assert!(!is_clean_end(&SessionError::Status(Status::new(
            Code::Internal,
            "x"
        ))));
    }
}
