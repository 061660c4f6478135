//! Line oriented transport used by the Horizons dialogue.
//!
//! [`LineTransport`] abstracts the remote service: send one line, read what
//! arrived within a deadline. [`TcpTransport`] implements it over a raw TCP
//! connection to the telnet port, filtering out the telnet option
//! negotiation. [`ExpectBuffer`] accumulates received text and matches it
//! against the patterns of the current dialogue step.

use std::{
    io::{self, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::{Duration, Instant},
};

use regex::Regex;

/// Result of one read on a [`LineTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Text received from the remote service.
    Data(String),
    /// Nothing arrived before the deadline.
    Timeout,
    /// The remote service closed the connection.
    Closed,
}

pub trait LineTransport {
    /// Send `line` followed by the line terminator.
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Wait at most `timeout` for incoming text.
    fn read_chunk(&mut self, timeout: Duration) -> io::Result<Chunk>;
}

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TelnetState {
    #[default]
    Data,
    Iac,
    Option(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Telnet command filter.
///
/// Strips IAC sequences from the byte stream and refuses every option the
/// server proposes, which leaves the connection in plain NVT mode. The state
/// survives across reads, so a sequence split between two packets is handled.
#[derive(Debug, Default)]
pub struct TelnetFilter {
    state: TelnetState,
}

impl TelnetFilter {
    /// Filter one packet.
    ///
    /// Return
    /// ------
    /// * the payload bytes
    /// * the negotiation replies to send back
    pub fn feed(&mut self, bytes: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::with_capacity(bytes.len());
        let mut replies = Vec::new();

        for &byte in bytes {
            self.state = match (self.state, byte) {
                (TelnetState::Data, IAC) => TelnetState::Iac,
                (TelnetState::Data, b) => {
                    data.push(b);
                    TelnetState::Data
                }
                // escaped 0xFF
                (TelnetState::Iac, IAC) => {
                    data.push(IAC);
                    TelnetState::Data
                }
                (TelnetState::Iac, SB) => TelnetState::Subnegotiation,
                (TelnetState::Iac, cmd @ (DO | DONT | WILL | WONT)) => TelnetState::Option(cmd),
                (TelnetState::Iac, _) => TelnetState::Data,
                (TelnetState::Option(cmd), option) => {
                    match cmd {
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    TelnetState::Data
                }
                (TelnetState::Subnegotiation, IAC) => TelnetState::SubnegotiationIac,
                (TelnetState::Subnegotiation, _) => TelnetState::Subnegotiation,
                (TelnetState::SubnegotiationIac, SE) => TelnetState::Data,
                (TelnetState::SubnegotiationIac, _) => TelnetState::Subnegotiation,
            };
        }
        (data, replies)
    }
}

/// [`LineTransport`] over a TCP connection to a telnet service.
pub struct TcpTransport {
    stream: TcpStream,
    filter: TelnetFilter,
}

impl TcpTransport {
    /// Connect to `host:port`, trying every resolved address.
    ///
    /// Arguments
    /// ---------
    /// * `host`: host name of the service
    /// * `port`: telnet port
    /// * `timeout`: connection timeout for each address
    pub fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<Self> {
        let mut last_error = io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address found for {host}"),
        );
        for address in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&address, timeout) {
                Ok(stream) => {
                    log::debug!("connected to {host}:{port} ({address})");
                    return Ok(TcpTransport {
                        stream,
                        filter: TelnetFilter::default(),
                    });
                }
                Err(err) => last_error = err,
            }
        }
        Err(last_error)
    }
}

impl LineTransport for TcpTransport {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\r\n")?;
        self.stream.flush()
    }

    fn read_chunk(&mut self, timeout: Duration) -> io::Result<Chunk> {
        // a zero read timeout is rejected by the standard library
        self.stream
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;

        let mut buffer = [0u8; 4096];
        let read = match self.stream.read(&mut buffer) {
            Ok(0) => return Ok(Chunk::Closed),
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Ok(Chunk::Timeout)
            }
            Err(err) => return Err(err),
        };

        let (data, replies) = self.filter.feed(&buffer[..read]);
        if !replies.is_empty() {
            self.stream.write_all(&replies)?;
        }
        Ok(Chunk::Data(String::from_utf8_lossy(&data).into_owned()))
    }
}

/// A successful match of [`ExpectBuffer::expect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched {
    /// Index of the matching pattern.
    pub index: usize,
    /// Text received before the match.
    pub before: String,
}

#[derive(Debug)]
pub enum ExpectFailure {
    Timeout,
    Closed,
    Io(io::Error),
}

/// Received text waiting to be matched, plus the full transcript.
pub struct ExpectBuffer<'a, T: LineTransport + ?Sized> {
    transport: &'a mut T,
    pending: String,
    transcript: String,
}

impl<'a, T: LineTransport + ?Sized> ExpectBuffer<'a, T> {
    pub fn new(transport: &'a mut T) -> Self {
        ExpectBuffer {
            transport,
            pending: String::new(),
            transcript: String::new(),
        }
    }

    pub fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.transport.send_line(line)
    }

    /// Everything received so far.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn into_transcript(self) -> String {
        self.transcript
    }

    /// Wait until one of `patterns` matches the pending text.
    ///
    /// When several patterns match, the one matching earliest in the text
    /// wins, then the first one in `patterns`. The pending text is consumed
    /// up to the end of the match.
    ///
    /// Arguments
    /// ---------
    /// * `patterns`: candidate patterns
    /// * `timeout`: deadline for the whole wait
    pub fn expect(
        &mut self,
        patterns: &[&Regex],
        timeout: Duration,
    ) -> Result<Matched, ExpectFailure> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(matched) = self.try_match(patterns) {
                return Ok(matched);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ExpectFailure::Timeout);
            }

            match self.transport.read_chunk(remaining).map_err(ExpectFailure::Io)? {
                Chunk::Data(text) => {
                    self.pending.push_str(&text);
                    self.transcript.push_str(&text);
                }
                Chunk::Timeout => return Err(ExpectFailure::Timeout),
                Chunk::Closed => return Err(ExpectFailure::Closed),
            }
        }
    }

    fn try_match(&mut self, patterns: &[&Regex]) -> Option<Matched> {
        let (index, start, end) = patterns
            .iter()
            .enumerate()
            .filter_map(|(i, re)| re.find(&self.pending).map(|m| (i, m.start(), m.end())))
            .min_by_key(|&(i, start, _)| (start, i))?;

        let before = self.pending[..start].to_string();
        self.pending.drain(..end);
        Some(Matched { index, before })
    }
}
