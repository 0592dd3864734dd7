use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::smtp_verify::error::SmtpVerifyError;

/// RFC 5321 reply line limit, CRLF included.
const MAX_REPLY_LINE: usize = 512;
/// Continuation lines accepted in a single reply.
const MAX_REPLY_LINES: usize = 64;

/// One plaintext SMTP connection bounded by a single absolute deadline.
pub(crate) struct SmtpSession {
    host: String,
    stream: TcpStream,
    buffer: Vec<u8>,
    deadline: Instant,
    transcript: Vec<String>,
}

impl SmtpSession {
    pub(crate) fn connect(host: &str, port: u16, deadline: Instant) -> Result<Self, SmtpVerifyError> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| SmtpVerifyError::Resolve {
                host: host.to_string(),
                source,
            })?
            .collect();
        // the lookup above cannot be interrupted; it may have eaten the budget
        if time_left(deadline).is_none() {
            return Err(SmtpVerifyError::DeadlineExceeded);
        }

        let mut last_err = None;
        for addr in &addrs {
            let Some(remaining) = time_left(deadline) else {
                break;
            };
            match TcpStream::connect_timeout(addr, remaining) {
                Ok(stream) => {
                    return Ok(Self {
                        host: host.to_string(),
                        stream,
                        buffer: Vec::new(),
                        deadline,
                        transcript: Vec::new(),
                    });
                }
                Err(source) => {
                    last_err = Some(SmtpVerifyError::Connect {
                        host: addr.to_string(),
                        source,
                    })
                }
            }
        }
        Err(last_err.unwrap_or_else(|| SmtpVerifyError::NoAddress {
            host: host.to_string(),
        }))
    }

    pub(crate) fn record(&mut self, direction: &str, message: &str) {
        self.transcript
            .push(format!("[{}] {direction}: {message}", self.host));
    }

    pub(crate) fn send_command(&mut self, command: &str) -> Result<(), SmtpVerifyError> {
        self.record("C", command);
        log_trace!("[{}] C: {command}", self.host);
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        if let Some(remaining) = time_left(self.deadline) {
            self.stream
                .set_write_timeout(Some(remaining))
                .map_err(SmtpVerifyError::io)?;
        }
        self.stream.write_all(&line).map_err(SmtpVerifyError::io)?;
        self.stream.flush().map_err(SmtpVerifyError::io)
    }

    /// Next complete reply (continuation lines included, joined by `\n`).
    /// `Ok(None)` once the deadline has passed.
    pub(crate) fn read_reply(&mut self) -> Result<Option<String>, SmtpVerifyError> {
        let mut lines = Vec::new();
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let is_last = line.as_bytes().get(3).copied() != Some(b'-');
            self.record("S", &line);
            log_trace!("[{}] S: {line}", self.host);
            lines.push(line);
            if is_last {
                break;
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(SmtpVerifyError::ReplyTooLong);
            }
        }
        Ok(Some(lines.join("\n")))
    }

    /// Best effort: `QUIT`, then close both directions. Errors are ignored.
    pub(crate) fn quit(mut self) -> Vec<String> {
        if let Err(err) = self.send_command("QUIT") {
            self.record("!", &err.to_string());
        }
        let _ = self.stream.shutdown(Shutdown::Both);
        self.transcript
    }

    fn read_line(&mut self) -> Result<Option<String>, SmtpVerifyError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                if pos + 1 > MAX_REPLY_LINE {
                    return Err(SmtpVerifyError::ReplyTooLong);
                }
                let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&raw)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                return Ok(Some(line));
            }

            if self.buffer.len() >= MAX_REPLY_LINE {
                return Err(SmtpVerifyError::ReplyTooLong);
            }

            let Some(remaining) = time_left(self.deadline) else {
                return Ok(None);
            };
            self.stream
                .set_read_timeout(Some(remaining))
                .map_err(SmtpVerifyError::io)?;

            let mut buf = [0u8; 512];
            match self.stream.read(&mut buf) {
                Ok(0) => return Err(SmtpVerifyError::Closed),
                Ok(read) => self.buffer.extend_from_slice(&buf[..read]),
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(err) => return Err(SmtpVerifyError::io(err)),
            }
        }
    }
}

fn time_left(deadline: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn spent_deadline_refuses_to_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let err = SmtpSession::connect("127.0.0.1", port, Instant::now())
            .err()
            .expect("deadline already spent");
        assert!(matches!(err, SmtpVerifyError::DeadlineExceeded));
    }
}
