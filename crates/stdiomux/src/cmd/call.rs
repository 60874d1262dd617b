use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

use stdiomux_session::{DialArgs, Session, SessionConfig};

use crate::cmd::CallArgs;
use crate::exit::{
    io_error, session_error, stream_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, USAGE,
};
use crate::output::{print_exchanges, Exchange, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let messages = if args.messages.is_empty() {
        read_stdin_lines()?
    } else {
        args.messages.clone()
    };

    let mut child = spawn_tool(&args.command)?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| CliError::new(INTERNAL, "child stdin was not captured"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| CliError::new(INTERNAL, "child stdout was not captured"))?;

    let config = SessionConfig::new().with_compression(args.compression);
    let session = match Session::with_config(stdout, stdin, config) {
        Ok(session) => session,
        Err(err) => {
            reap(&mut child);
            return Err(session_error("session start failed", err));
        }
    };

    let result = exchange(&session, &args.service, &messages);
    session.shutdown();
    let status = child
        .wait()
        .map_err(|err| io_error("waiting for tool failed", err))?;
    tracing::debug!(%status, "tool exited");

    let exchanges = result?;
    print_exchanges(&exchanges, format);
    Ok(SUCCESS)
}

fn spawn_tool(command: &[String]) -> CliResult<Child> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| CliError::new(USAGE, "missing command to spawn"))?;
    tracing::debug!(program = %program, args = ?rest, "spawning tool");
    Command::new(program)
        .args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|err| io_error(&format!("cannot spawn {program}"), err))
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Dial one stream and send each message as a line, collecting the replies.
fn exchange(session: &Session, service: &str, messages: &[String]) -> CliResult<Vec<Exchange>> {
    let stream = session
        .dial(DialArgs::service(service))
        .map_err(|err| session_error("dial failed", err))?;
    let mut replies = BufReader::new(&stream);
    let mut exchanges = Vec::with_capacity(messages.len());

    for message in messages {
        let mut line = message.clone().into_bytes();
        line.push(b'\n');
        (&stream)
            .write_all(&line)
            .map_err(|err| stream_error("send failed", err))?;

        let mut reply = String::new();
        let read = replies
            .read_line(&mut reply)
            .map_err(|err| stream_error("receive failed", err))?;
        if read == 0 {
            return Err(CliError::new(
                FAILURE,
                format!("stream {} closed before replying", stream.id()),
            ));
        }
        exchanges.push(Exchange {
            stream_id: stream.id(),
            service: service.to_string(),
            request: message.clone(),
            reply: reply.trim_end_matches(['\r', '\n']).to_string(),
        });
    }

    stream.close();
    Ok(exchanges)
}

fn read_stdin_lines() -> CliResult<Vec<String>> {
    io::stdin()
        .lock()
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .map_err(|err| io_error("reading stdin failed", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_a_usage_error() {
        let err = spawn_tool(&[]).expect_err("nothing to spawn");
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn missing_program_is_reported() {
        let err = spawn_tool(&["/nonexistent/stdiomux-tool".to_string()])
            .expect_err("spawn should fail");
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("cannot spawn"));
    }
}
