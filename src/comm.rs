/* ************************************************************************
*   File: comm.rs                                       Part of CircleMUD *
*  Usage: Communication, socket handling on the I/O thread                *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::collections::BTreeMap;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::MAX_PLAYING;
use crate::error::MudResult;
use crate::interpreter::is_abbrev;
use crate::structs::{HISTORY_SIZE, LARGE_BUFSIZE, MAX_INPUT_LENGTH, MAX_RAW_INPUT_LENGTH};
use crate::telnet::{echo_sequence, TelnetFilter};

pub type ConnId = u64;

/* what the I/O thread tells the simulation */
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetEvent {
    Connected { conn: ConnId, host: String },
    Line { conn: ConnId, line: String },
    Closed { conn: ConnId },
}

/* what the simulation asks of the I/O thread */
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetCommand {
    Write { conn: ConnId, text: String },
    Close { conn: ConnId },
    Echo { conn: ConnId, on: bool },
}

const OVERFLOW_MESSG: &str = "**OVERFLOW**\r\n";
const FULL_MESSG: &str = "Sorry, TickMUD is full right now... please try again later!\r\n";

/* the I/O thread polls this often when nothing happens */
const IO_SLEEP: Duration = Duration::from_millis(5);

/* one line of player input, with what the player should see about it */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputLine {
    pub text: String,
    pub notice: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct InputOverflow;

/*
 * Cuts the raw byte stream of a connection into command lines: handles
 * backspace, drops control characters, doubles '$' so act() codes can't
 * be typed, truncates long lines and resolves '!' history repeats.
 */
pub struct LineAssembler {
    inbuf: Vec<u8>,
    last_input: String,
    history: [String; HISTORY_SIZE],
    history_pos: usize,
}

impl Default for LineAssembler {
    fn default() -> Self {
        LineAssembler::new()
    }
}

fn isnewl(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

impl LineAssembler {
    pub fn new() -> LineAssembler {
        LineAssembler {
            inbuf: vec![],
            last_input: String::new(),
            history: [(); HISTORY_SIZE].map(|_| String::new()),
            history_pos: 0,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<InputLine>, InputOverflow> {
        self.inbuf.extend_from_slice(bytes);
        let mut lines = vec![];

        while let Some(nl_pos) = self.inbuf.iter().position(|b| isnewl(*b)) {
            let raw: Vec<u8> = self.inbuf.drain(..nl_pos).collect();
            /* find the end of this line */
            let end = self.inbuf.iter().position(|b| !isnewl(*b)).unwrap_or(self.inbuf.len());
            self.inbuf.drain(..end);
            lines.push(self.assemble(&raw));
        }

        if self.inbuf.len() >= MAX_RAW_INPUT_LENGTH {
            warn!("WARNING: process_input: about to close connection: input overflow");
            return Err(InputOverflow);
        }
        Ok(lines)
    }

    fn assemble(&mut self, raw: &[u8]) -> InputLine {
        let mut tmp = String::new();
        let mut space_left = MAX_INPUT_LENGTH as i32 - 1;
        let mut truncated = false;

        for &x in raw {
            /* The '> 1' reserves room for a '$ => $$' expansion. */
            if space_left <= 1 {
                truncated = true;
                break;
            }
            if x == 8 || x == 127 {
                /* handle backspacing or delete key */
                if tmp.pop().is_some() {
                    if tmp.ends_with('$') {
                        tmp.pop();
                        space_left += 2;
                    } else {
                        space_left += 1;
                    }
                }
            } else if x.is_ascii() && !x.is_ascii_control() {
                tmp.push(x as char);
                if x == b'$' {
                    tmp.push('$');
                    space_left -= 2;
                } else {
                    space_left -= 1;
                }
            }
        }

        let mut notice = truncated.then(|| format!("Line too long.  Truncated to:\r\n{}\r\n", tmp));

        if tmp == "!" {
            /* Redo last command. */
            tmp = self.last_input.clone();
        } else if tmp.len() > 1 && tmp.starts_with('!') {
            let prefix = tmp[1..].trim_start().to_string();
            let found = (1..HISTORY_SIZE)
                .map(|back| (self.history_pos + HISTORY_SIZE - back) % HISTORY_SIZE)
                .map(|cnt| &self.history[cnt])
                .find(|h| !h.is_empty() && is_abbrev(&prefix, h))
                .cloned();
            if let Some(cmd) = found {
                notice = Some(format!("{}\r\n", cmd));
                self.last_input = cmd.clone();
                tmp = cmd;
            }
        } else {
            self.last_input = tmp.clone();
            self.history[self.history_pos] = tmp.clone();
            self.history_pos = (self.history_pos + 1) % HISTORY_SIZE;
        }
        InputLine { text: tmp, notice }
    }
}

/*
 * init_socket sets up the mother descriptor - creates the socket, sets
 * its options up, binds it, and listens.
 */
pub fn init_socket(port: u16) -> MudResult<TcpListener> {
    info!("Binding to all IP interfaces on this host.");
    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let listener = TcpListener::bind(socket_addr)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/* the simulation's end of the two channels */
pub struct NetHandle {
    pub events: Receiver<NetEvent>,
    commands: Sender<NetCommand>,
    thread: Option<JoinHandle<()>>,
}

impl NetHandle {
    pub fn send(&self, cmd: NetCommand) {
        if self.commands.send(cmd).is_err() {
            error!("SYSERR: the network thread is gone");
        }
    }

    /* closes the command channel and waits for the I/O thread to flush and exit */
    pub fn shutdown(self) {
        let NetHandle {
            commands, thread, ..
        } = self;
        drop(commands);
        if let Some(thread) = thread {
            if thread.join().is_err() {
                error!("SYSERR: the network thread panicked");
            }
        }
    }
}

pub fn start_network(
    listener: TcpListener,
    nameserver_is_slow: bool,
    shutdown: Arc<AtomicBool>,
) -> io::Result<NetHandle> {
    let (event_tx, event_rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let io = IoLoop {
        listener,
        conns: BTreeMap::new(),
        last_conn: 0,
        events: event_tx,
        commands: cmd_rx,
        nameserver_is_slow,
        shutdown,
    };
    let thread = thread::Builder::new()
        .name("network".to_string())
        .spawn(move || io.run())?;
    Ok(NetHandle {
        events: event_rx,
        commands: cmd_tx,
        thread: Some(thread),
    })
}

struct Connection {
    stream: TcpStream,
    telnet: TelnetFilter,
    lines: LineAssembler,
    output: Vec<u8>,
    overflowed: bool,
    closing: bool,
}

impl Connection {
    fn queue(&mut self, bytes: &[u8]) {
        if self.output.len() + bytes.len() > LARGE_BUFSIZE {
            if !self.overflowed {
                self.output.extend_from_slice(OVERFLOW_MESSG.as_bytes());
                self.overflowed = true;
            }
            return;
        }
        self.output.extend_from_slice(bytes);
    }

    /* false when the connection is dead */
    fn read_available(&mut self, conn: ConnId, events: &Sender<NetEvent>) -> bool {
        let mut buf = [0u8; 1024];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    info!("EOF on socket read (connection broken by peer)");
                    return false;
                }
                Ok(n) => {
                    let data = self.telnet.filter(&buf[..n]);
                    let lines = match self.lines.feed(&data) {
                        Ok(lines) => lines,
                        Err(InputOverflow) => return false,
                    };
                    for line in lines {
                        if let Some(notice) = &line.notice {
                            self.queue(notice.as_bytes());
                        }
                        let _ = events.send(NetEvent::Line {
                            conn,
                            line: line.text,
                        });
                    }
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => return true,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    error!("SYSERR: perform_socket_read: about to lose connection: {}", err);
                    return false;
                }
            }
        }
    }

    /* writes what the socket accepts now; false when the connection is dead */
    fn write_pending(&mut self) -> bool {
        while !self.output.is_empty() {
            match self.stream.write(&self.output) {
                Ok(0) => return false,
                Ok(n) => {
                    self.output.drain(..n);
                }
                /* Temporary failure -- socket buffer full. */
                Err(err) if err.kind() == ErrorKind::WouldBlock => return true,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    error!("SYSERR: write_to_descriptor: {}", err);
                    return false;
                }
            }
        }
        self.overflowed = false;
        true
    }
}

struct IoLoop {
    listener: TcpListener,
    conns: BTreeMap<ConnId, Connection>,
    last_conn: ConnId,
    events: Sender<NetEvent>,
    commands: Receiver<NetCommand>,
    nameserver_is_slow: bool,
    shutdown: Arc<AtomicBool>,
}

impl IoLoop {
    fn run(mut self) {
        loop {
            let mut busy = self.accept_new();

            let mut dead = vec![];
            for (conn, c) in self.conns.iter_mut() {
                if !c.closing && !c.read_available(*conn, &self.events) {
                    dead.push(*conn);
                }
            }
            for conn in dead {
                self.drop_conn(conn, true);
            }

            let finished = loop {
                match self.commands.try_recv() {
                    Ok(cmd) => {
                        busy = true;
                        self.apply(cmd);
                    }
                    Err(TryRecvError::Empty) => break false,
                    Err(TryRecvError::Disconnected) => break true,
                }
            };

            let mut dead = vec![];
            for (conn, c) in self.conns.iter_mut() {
                if !c.write_pending() || (c.closing && c.output.is_empty()) {
                    dead.push(*conn);
                }
            }
            for conn in dead {
                let notify = self.conns.get(&conn).map_or(false, |c| !c.closing);
                self.drop_conn(conn, notify);
            }

            if finished {
                break;
            }
            if !busy {
                thread::sleep(IO_SLEEP);
            }
        }

        info!("Closing all sockets.");
        for (_, mut c) in std::mem::take(&mut self.conns) {
            c.write_pending();
            let _ = c.stream.shutdown(Shutdown::Both);
        }
    }

    fn accept_new(&mut self) -> bool {
        let mut accepted = false;
        loop {
            let (mut stream, addr) = match self.listener.accept() {
                Ok(pair) => pair,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return accepted,
                Err(err) => {
                    error!("SYSERR: Could not get client: {}", err);
                    return accepted;
                }
            };
            accepted = true;
            if self.shutdown.load(Ordering::Relaxed) {
                let _ = stream.shutdown(Shutdown::Both);
                continue;
            }
            if let Err(err) = stream.set_nonblocking(true) {
                error!("SYSERR: setting non-blocking on a new connection: {}", err);
                continue;
            }

            /* make sure we have room for it */
            if self.conns.len() >= MAX_PLAYING {
                let _ = stream.write(FULL_MESSG.as_bytes());
                let _ = stream.shutdown(Shutdown::Both);
                continue;
            }

            /* find the sitename */
            let host = if self.nameserver_is_slow {
                addr.ip().to_string()
            } else {
                match dns_lookup::lookup_addr(&addr.ip()) {
                    Ok(name) => name,
                    Err(err) => {
                        debug!("Error resolving address {}: {}", addr.ip(), err);
                        addr.ip().to_string()
                    }
                }
            };

            self.last_conn += 1;
            let conn = self.last_conn;
            info!("New connection {} from [{}].", conn, host);
            self.conns.insert(
                conn,
                Connection {
                    stream,
                    telnet: TelnetFilter::new(),
                    lines: LineAssembler::new(),
                    output: vec![],
                    overflowed: false,
                    closing: false,
                },
            );
            let _ = self.events.send(NetEvent::Connected { conn, host });
        }
    }

    fn apply(&mut self, cmd: NetCommand) {
        match cmd {
            NetCommand::Write { conn, text } => {
                if let Some(c) = self.conns.get_mut(&conn) {
                    c.queue(text.as_bytes());
                }
            }
            NetCommand::Echo { conn, on } => {
                if let Some(c) = self.conns.get_mut(&conn) {
                    c.output.extend_from_slice(&echo_sequence(on));
                }
            }
            NetCommand::Close { conn } => {
                if let Some(c) = self.conns.get_mut(&conn) {
                    c.closing = true;
                }
            }
        }
    }

    fn drop_conn(&mut self, conn: ConnId, notify: bool) {
        if let Some(c) = self.conns.remove(&conn) {
            let _ = c.stream.shutdown(Shutdown::Both);
            if notify {
                let _ = self.events.send(NetEvent::Closed { conn });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: Vec<InputLine>) -> Vec<String> {
        lines.into_iter().map(|l| l.text).collect()
    }

    #[test]
    fn lines_are_cut_on_any_newline() {
        let mut la = LineAssembler::new();
        assert_eq!(texts(la.feed(b"look\r\nsou").unwrap()), vec!["look"]);
        assert_eq!(texts(la.feed(b"th\n\nnorth\r").unwrap()), vec!["south", "north"]);
        assert!(la.feed(b"").unwrap().is_empty());
    }

    #[test]
    fn backspace_and_dollars() {
        let mut la = LineAssembler::new();
        assert_eq!(texts(la.feed(b"lp\x08ook\n").unwrap()), vec!["look"]);
        assert_eq!(texts(la.feed(b"say $n\n").unwrap()), vec!["say $$n"]);
        assert_eq!(texts(la.feed(b"a$\x7fb\n").unwrap()), vec!["ab"]);
    }

    #[test]
    fn long_lines_are_truncated_and_raw_overflow_disconnects() {
        let mut la = LineAssembler::new();
        let mut long = vec![b'x'; MAX_INPUT_LENGTH + 10];
        long.push(b'\n');
        let lines = la.feed(&long).unwrap();
        assert_eq!(lines[0].text.len(), MAX_INPUT_LENGTH - 2);
        assert!(lines[0].notice.as_deref().unwrap().starts_with("Line too long."));

        let mut la = LineAssembler::new();
        assert_eq!(la.feed(&vec![b'y'; MAX_RAW_INPUT_LENGTH]), Err(InputOverflow));
    }

    #[test]
    fn bang_repeats_history() {
        let mut la = LineAssembler::new();
        la.feed(b"cast 'magic missile' golem\nlook\n").unwrap();
        assert_eq!(texts(la.feed(b"!\n").unwrap()), vec!["look"]);
        let lines = la.feed(b"!ca\n").unwrap();
        assert_eq!(lines[0].text, "cast 'magic missile' golem");
        assert_eq!(lines[0].notice.as_deref(), Some("cast 'magic missile' golem\r\n"));
        /* no match leaves the line alone */
        assert_eq!(texts(la.feed(b"!zz\n").unwrap()), vec!["!zz"]);
    }
}
