use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use stdiomux_frame::{Frame, FrameReader, FrameWriter, Op, MAX_PAYLOAD};
use stdiomux_transport::{BufferedPipe, PipeError, PipeReader, PipeWriter, StdioConnection};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::compress;
use crate::config::{CloseNotifier, DebugSink, SessionConfig};
use crate::error::{Result, SessionError};
use crate::listener::SessionListener;
use crate::messages::{Code, DialArgs, HelloArgs, Status, COMPRESSION_MIN_VERSION};
use crate::stream::{DialedStream, Direction, Stream, StreamCore};

/// Highest stream id a session can allocate.
pub const MAX_STREAM_ID: u32 = 0xFFFF;

const COPY_BUFFER_SIZE: usize = 32 * 1024;
const OUTBOUND_WORKER: &str = "stdiomux-outbound";

/// A multiplexing session over one reader/writer pair.
///
/// Both ends of a stdio pair run a session; either side may dial streams
/// and either side may accept the streams its peer dials. Stream ids are
/// allocated independently on each side, so a local stream and a peer stream
/// may share an id.
///
/// `Session` is a cheap handle; clones share the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    state: Mutex<State>,
    accept_ready: Condvar,
    ended: Condvar,
    inbound: Arc<BufferedPipe>,
    outbound: Arc<BufferedPipe>,
    writer: Mutex<FrameWriter<PipeWriter>>,
    version: u32,
    compression: bool,
    compress_outbound: AtomicBool,
    debug: Option<DebugSink>,
    close_notifier: Option<CloseNotifier>,
    closed: CancellationToken,
    workers: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

struct State {
    next_id: u32,
    error: Option<SessionError>,
    our_streams: HashMap<u16, Arc<StreamCore>>,
    peer_streams: HashMap<u16, Arc<StreamCore>>,
    pending: VecDeque<(Arc<StreamCore>, DialArgs)>,
    peer_hello: Option<HelloArgs>,
}

impl State {
    fn streams(&mut self, direction: Direction) -> &mut HashMap<u16, Arc<StreamCore>> {
        match direction {
            Direction::Client => &mut self.our_streams,
            Direction::Server => &mut self.peer_streams,
        }
    }
}

impl Session {
    /// Start a session with default options.
    ///
    /// `reader` receives the peer's frames and `writer` carries ours.
    pub fn new<R, W>(reader: R, writer: W) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self::with_config(reader, writer, SessionConfig::default())
    }

    /// Start a session over this process's stdin and stdout.
    pub fn from_stdio(config: SessionConfig) -> Result<Self> {
        let (writer, reader) = StdioConnection::from_process().into_inner();
        Self::with_config(reader, writer, config)
    }

    /// Start a session.
    ///
    /// Sends `hello` before returning, then runs four worker threads: one
    /// drains queued frames into `writer`, one copies `reader` into the
    /// inbound queue, one dispatches inbound frames, and one watches the
    /// cancellation token.
    ///
    /// Fails if the cancellation watcher's runtime cannot be built or a
    /// worker thread cannot be spawned.
    pub fn with_config<R, W>(reader: R, writer: W, config: SessionConfig) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|err| SessionError::Io(Arc::new(err)))?;
        let inbound = BufferedPipe::new();
        let outbound = BufferedPipe::new();
        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                next_id: 1,
                error: None,
                our_streams: HashMap::new(),
                peer_streams: HashMap::new(),
                pending: VecDeque::new(),
                peer_hello: None,
            }),
            accept_ready: Condvar::new(),
            ended: Condvar::new(),
            inbound: Arc::clone(&inbound),
            outbound: Arc::clone(&outbound),
            writer: Mutex::new(FrameWriter::new(PipeWriter::new(Arc::clone(&outbound)))),
            version: config.version,
            compression: config.compression && compress::AVAILABLE,
            compress_outbound: AtomicBool::new(false),
            debug: config.debug,
            close_notifier: config.close_notifier,
            closed: CancellationToken::new(),
            workers: Mutex::new(Vec::with_capacity(4)),
        });

        let hello = serde_json::to_vec(&HelloArgs::new(inner.version))?;
        inner.send_frame(Op::Hello, 0, 0, &hello)?;

        let session = Session { inner };
        session.spawn(OUTBOUND_WORKER, {
            let source = PipeReader::new(outbound);
            move |_: Arc<Inner>| drain_outbound(source, writer)
        })?;
        session.spawn("stdiomux-inbound", {
            let sink = PipeWriter::new(Arc::clone(&inbound));
            move |_: Arc<Inner>| copy_inbound(reader, sink)
        })?;
        session.spawn("stdiomux-cancel", {
            let token = config.cancellation;
            move |inner: Arc<Inner>| watch_cancellation(inner, runtime, token)
        })?;
        session.spawn("stdiomux-loop", {
            let frames = FrameReader::new(PipeReader::new(inbound));
            move |inner: Arc<Inner>| run_loop(inner, frames)
        })?;

        debug!(version = session.inner.version, "session started");
        Ok(session)
    }

    fn spawn<F>(&self, name: &'static str, work: F) -> Result<()>
    where
        F: FnOnce(Arc<Inner>) + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || work(inner));
        match spawned {
            Ok(handle) => {
                lock(&self.inner.workers).push((name, handle));
                Ok(())
            }
            Err(err) => {
                let err = SessionError::Io(Arc::new(err));
                self.inner.quit(err.clone());
                Err(err)
            }
        }
    }

    /// Open a new stream to the peer.
    ///
    /// # Panics
    ///
    /// Panics once more than [`MAX_STREAM_ID`] streams have been dialed on
    /// this session.
    pub fn dial(&self, args: DialArgs) -> Result<Stream> {
        let payload = serde_json::to_vec(&args)?;
        let inner = &self.inner;

        let mut state = inner.lock_state();
        if let Some(err) = &state.error {
            return Err(err.clone());
        }
        let id = state.next_id;
        if id > MAX_STREAM_ID {
            panic!("stdiomux: stream id space exhausted");
        }
        state.next_id += 1;
        let id = id as u16;

        inner.debugf(format_args!("dial sid={id} args={args:?}"));
        inner.send_frame(Op::Dial, id, 0, &payload)?;
        let core = StreamCore::new(id, Direction::Client);
        state.our_streams.insert(id, Arc::clone(&core));
        drop(state);

        Ok(Stream::new(core, Arc::clone(inner)))
    }

    /// Block until the peer dials a stream, in dial order.
    ///
    /// Fails with the terminal error once the session has ended.
    pub fn accept(&self) -> Result<DialedStream> {
        let inner = &self.inner;
        let mut state = inner.lock_state();
        loop {
            if let Some(err) = &state.error {
                return Err(err.clone());
            }
            if let Some((core, args)) = state.pending.pop_front() {
                drop(state);
                inner.debugf(format_args!("accept sid={}", core.id));
                return Ok(DialedStream::new(Stream::new(core, Arc::clone(inner)), args));
            }
            state = inner
                .accept_ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// End the session. Every stream fails, pending and later calls return
    /// [`SessionError::ListenerClosed`]. Idempotent.
    pub fn shutdown(&self) {
        self.inner.quit(SessionError::ListenerClosed);
    }

    /// A listener view of this session's incoming streams.
    pub fn listener(&self) -> SessionListener {
        SessionListener::new(self.clone())
    }

    /// The terminal error, once the session has ended.
    pub fn error(&self) -> Option<SessionError> {
        self.inner.lock_state().error.clone()
    }

    /// Block until the session ends and return why.
    pub fn wait(&self) -> SessionError {
        let inner = &self.inner;
        let mut state = inner.lock_state();
        loop {
            if let Some(err) = &state.error {
                return err.clone();
            }
            state = inner
                .ended
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// The peer's `hello`, once it has arrived.
    pub fn peer_hello(&self) -> Option<HelloArgs> {
        self.inner.lock_state().peer_hello
    }

    /// Tool API version this side advertised.
    pub fn version(&self) -> u32 {
        self.inner.version
    }

    /// Whether outbound stream data is being compressed.
    pub fn compression_active(&self) -> bool {
        self.inner.compress_outbound.load(Ordering::Acquire)
    }

    /// Join the worker threads.
    ///
    /// Returns once the session has ended and the underlying reader has
    /// reached end of file or failed; a reader that never returns keeps this
    /// blocked.
    pub fn join(&self) {
        let workers = std::mem::take(&mut *lock(&self.inner.workers));
        join_workers(workers);
    }

    /// Wait until every frame queued before the session ended has been
    /// handed to the writer.
    ///
    /// Only returns once the session has ended. Unlike [`join`](Self::join)
    /// it does not wait on the underlying reader.
    pub fn drain(&self) {
        let outbound = {
            let mut workers = lock(&self.inner.workers);
            let (outbound, rest) = std::mem::take(&mut *workers)
                .into_iter()
                .partition(|(name, _)| *name == OUTBOUND_WORKER);
            *workers = rest;
            outbound
        };
        join_workers(outbound);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("Session")
            .field("version", &self.inner.version)
            .field("our_streams", &state.our_streams.len())
            .field("peer_streams", &state.peer_streams.len())
            .field("pending", &state.pending.len())
            .field("error", &state.error)
            .finish()
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    pub(crate) fn debugf(&self, args: fmt::Arguments<'_>) {
        trace!("{}", args);
        if let Some(sink) = &self.debug {
            sink(args);
        }
    }

    /// Queue one frame for the outbound worker.
    fn send_frame(&self, op: Op, stream_id: u16, flags: u16, payload: &[u8]) -> Result<()> {
        self.debugf(format_args!(
            "send op={op} sid={stream_id} len={}",
            payload.len()
        ));
        lock(&self.writer)
            .send_with_flags(op, stream_id, flags, payload)
            .map_err(SessionError::from)
    }

    /// Send a control frame from the dispatch path. Failure ends the session.
    fn send_control(&self, state: &mut State, op: Op, stream_id: u16, payload: &[u8]) {
        if let Err(err) = self.send_frame(op, stream_id, 0, payload) {
            self.quit_locked(state, err);
        }
    }

    fn send_status(&self, state: &mut State, op: Op, stream_id: u16, status: Status) {
        debug!(stream_id, op = %op, status = %status, "rejecting frame");
        self.send_control(state, op, stream_id, &status.encode());
    }

    pub(crate) fn write_to_stream(&self, core: &StreamCore, buf: &[u8]) -> Result<usize> {
        if buf.len() > MAX_PAYLOAD {
            return Err(SessionError::PayloadTooLarge {
                size: buf.len(),
                max: MAX_PAYLOAD,
            });
        }
        if let Some(reason) = core.pipe.write_error() {
            return Err(match reason {
                PipeError::Eof | PipeError::Closed => SessionError::StreamClosed,
                other => SessionError::from_pipe(other),
            });
        }

        let op = match core.direction {
            Direction::Client => Op::SendToServer,
            Direction::Server => Op::SendToClient,
        };
        if self.compress_outbound.load(Ordering::Acquire) {
            let (flags, payload) = compress::deflate(buf)?;
            self.send_frame(op, core.id, flags, &payload)?;
        } else {
            self.send_frame(op, core.id, 0, buf)?;
        }
        Ok(buf.len())
    }

    /// Close a stream from the local side: tell the peer, then finalize.
    pub(crate) fn close_stream(&self, core: &Arc<StreamCore>) {
        let mut state = self.lock_state();
        self.close_stream_locked(&mut state, core);
    }

    fn close_stream_locked(&self, state: &mut State, core: &Arc<StreamCore>) {
        let live = state
            .streams(core.direction)
            .get(&core.id)
            .is_some_and(|current| Arc::ptr_eq(current, core));
        if !live {
            return;
        }
        let op = match core.direction {
            Direction::Client => Op::CloseClientSide,
            Direction::Server => Op::CloseServerSide,
        };
        self.send_control(state, op, core.id, &[]);
        self.finish_stream(state, core, None);
    }

    /// Forget a stream, failing its pipes with `reason` if given.
    fn finish_stream(
        &self,
        state: &mut State,
        core: &Arc<StreamCore>,
        reason: Option<PipeError>,
    ) {
        if let Some(reason) = reason {
            core.close_pipes(reason);
        }
        let streams = state.streams(core.direction);
        if streams
            .get(&core.id)
            .is_some_and(|current| Arc::ptr_eq(current, core))
        {
            streams.remove(&core.id);
        }
        self.debugf(format_args!(
            "stream finished sid={} dir={}",
            core.id, core.direction
        ));
        if let Some(notify) = &self.close_notifier {
            notify(&core.info());
        }
    }

    /// Local delivery failed: fail the stream and close it toward the peer.
    fn stream_failed(&self, state: &mut State, core: &Arc<StreamCore>, reason: PipeError) {
        core.close_pipes(reason);
        self.close_stream_locked(state, core);
    }

    fn quit(&self, err: SessionError) {
        let mut state = self.lock_state();
        self.quit_locked(&mut state, err);
    }

    /// Record the terminal error and tear everything down. First error wins.
    fn quit_locked(&self, state: &mut State, err: SessionError) {
        if state.error.is_some() {
            return;
        }
        if err.is_closed() {
            debug!(error = %err, "session ending");
        } else {
            warn!(error = %err, "session failed");
        }
        state.error = Some(err.clone());
        self.accept_ready.notify_all();
        self.ended.notify_all();

        for core in state.our_streams.values().chain(state.peer_streams.values()) {
            core.close_pipes(err.clone().into());
        }
        state.our_streams.clear();
        state.peer_streams.clear();
        state.pending.clear();

        self.inbound.close(err.clone().into());
        self.outbound.close(err.into());
        self.closed.cancel();
    }

    /// Dispatch one inbound frame. Returns false once the session has ended.
    fn handle(&self, frame: Frame) -> bool {
        let payload = match compress::inflate(&frame) {
            Ok(payload) => payload,
            Err(err) => {
                self.quit(err);
                return false;
            }
        };
        let id = frame.stream_id;
        self.debugf(format_args!(
            "recv op={} sid={id} len={}",
            frame.op,
            payload.len()
        ));

        let mut state = self.lock_state();
        if state.error.is_some() {
            return false;
        }

        match frame.op {
            Op::Hello => match serde_json::from_slice::<HelloArgs>(&payload) {
                Ok(hello) => {
                    let active = self.compression
                        && self.version >= COMPRESSION_MIN_VERSION
                        && hello.supports_compression();
                    self.compress_outbound.store(active, Ordering::Release);
                    debug!(
                        api_version = hello.api_version,
                        tool_api_version = hello.tool_api_version,
                        compression = active,
                        "peer hello"
                    );
                    state.peer_hello = Some(hello);
                }
                Err(err) => warn!(error = %err, "ignoring undecodable hello"),
            },
            Op::Dial => match serde_json::from_slice::<DialArgs>(&payload) {
                Err(err) => self.send_status(
                    &mut state,
                    Op::ServerError,
                    id,
                    Status::new(Code::InvalidArgument, format!("bad dial arguments: {err}")),
                ),
                Ok(_) if state.peer_streams.contains_key(&id) => self.send_status(
                    &mut state,
                    Op::ServerError,
                    id,
                    Status::new(Code::AlreadyExists, "stream already exists"),
                ),
                Ok(args) => {
                    let core = StreamCore::new(id, Direction::Server);
                    state.peer_streams.insert(id, Arc::clone(&core));
                    state.pending.push_back((core, args));
                    self.accept_ready.notify_one();
                }
            },
            Op::SendToServer => self.deliver(&mut state, Direction::Server, id, &payload),
            Op::SendToClient => self.deliver(&mut state, Direction::Client, id, &payload),
            Op::CloseClientSide => {
                self.finish_remote(&mut state, Direction::Server, id, PipeError::Eof)
            }
            Op::CloseServerSide => {
                self.finish_remote(&mut state, Direction::Client, id, PipeError::Eof)
            }
            Op::ServerError => {
                let reason = SessionError::Status(Status::decode(&payload)).into();
                self.finish_remote(&mut state, Direction::Client, id, reason);
            }
            Op::ClientError => {
                let reason = SessionError::Status(Status::decode(&payload)).into();
                self.finish_remote(&mut state, Direction::Server, id, reason);
            }
            Op::Unknown(code) => trace!(code, stream_id = id, "ignoring unknown op"),
        }

        state.error.is_none()
    }

    fn deliver(&self, state: &mut State, direction: Direction, id: u16, payload: &[u8]) {
        let Some(core) = state.streams(direction).get(&id).cloned() else {
            let op = match direction {
                Direction::Server => Op::ServerError,
                Direction::Client => Op::ClientError,
            };
            self.send_status(state, op, id, Status::new(Code::NotFound, "no such stream"));
            return;
        };
        if let Err(reason) = core.deliver(payload) {
            self.stream_failed(state, &core, reason);
        }
    }

    fn finish_remote(&self, state: &mut State, direction: Direction, id: u16, reason: PipeError) {
        if let Some(core) = state.streams(direction).get(&id).cloned() {
            self.finish_stream(state, &core, Some(reason));
        }
    }
}

fn join_workers(workers: Vec<(&'static str, JoinHandle<()>)>) {
    for (name, worker) in workers {
        if worker.join().is_err() {
            warn!(worker = name, "session worker panicked");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_loop(inner: Arc<Inner>, mut frames: FrameReader<PipeReader>) {
    loop {
        let frame = match frames.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                inner.quit(err.into());
                break;
            }
        };
        if !inner.handle(frame) {
            break;
        }
    }
    trace!("frame loop exited");
}

fn drain_outbound<W: Write>(mut source: PipeReader, mut writer: W) {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let reason = loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break PipeError::Eof,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => break PipeError::from_io(err),
        };
        if let Err(err) = writer.write_all(&buf[..n]).and_then(|()| writer.flush()) {
            debug!(error = %err, "outbound writer failed");
            break PipeError::from_io(err);
        }
    };
    let _ = source.close_with_error(reason);
    trace!("outbound worker exited");
}

fn copy_inbound<R: Read>(mut reader: R, mut sink: PipeWriter) {
    let reason = match io::copy(&mut reader, &mut sink) {
        Ok(_) => PipeError::Eof,
        Err(err) => PipeError::from_io(err),
    };
    trace!(reason = %reason, "inbound worker exited");
    let _ = sink.close_with_error(reason);
}

fn watch_cancellation(inner: Arc<Inner>, runtime: Runtime, token: CancellationToken) {
    let cancelled = runtime.block_on(async {
        tokio::select! {
            _ = token.cancelled() => true,
            _ = inner.closed.cancelled() => false,
        }
    });
    if cancelled {
        debug!("session cancelled");
        let _ = inner
            .inbound
            .close_read(PipeError::other(SessionError::Cancelled));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use stdiomux_transport::pipe;

    use super::*;

    fn detached() -> (Session, PipeReader, PipeWriter) {
        let (their_reader, our_writer) = pipe();
        let (our_reader, their_writer) = pipe();
        let session = Session::new(our_reader, our_writer).unwrap();
        (session, their_reader, their_writer)
    }

    #[test]
    fn hello_is_the_first_frame() {
        let (session, wire, _input) = detached();
        let mut frames = FrameReader::new(wire);
        let hello = frames.read_frame().unwrap();
        assert_eq!((hello.op, hello.stream_id), (Op::Hello, 0));
        let args: HelloArgs = serde_json::from_slice(&hello.payload).unwrap();
        assert_eq!(args.tool_api_version, session.version());
        session.shutdown();
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let (session, wire, _input) = detached();
        let first = session.dial(DialArgs::default()).unwrap();
        let second = session.dial(DialArgs::default()).unwrap();
        assert_eq!((first.id(), second.id()), (1, 2));

        let mut frames = FrameReader::new(wire);
        assert_eq!(frames.read_frame().unwrap().op, Op::Hello);
        let dial = frames.read_frame().unwrap();
        assert_eq!((dial.op, dial.stream_id), (Op::Dial, 1));
        session.shutdown();
    }

    #[test]
    fn last_id_is_usable_then_exhausted() {
        let (session, _wire, _input) = detached();
        session.inner.lock_state().next_id = MAX_STREAM_ID;
        let last = session.dial(DialArgs::default()).unwrap();
        assert_eq!(last.id(), 0xFFFF);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            session.dial(DialArgs::default())
        }));
        assert!(result.is_err());
        session.shutdown();
    }

    #[test]
    fn debug_sink_sees_diagnostics() {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let (_their_reader, our_writer) = pipe();
        let (our_reader, _their_writer) = pipe();
        let config = SessionConfig::new().with_debug(move |args| {
            let _ = lock(&tx).send(args.to_string());
        });
        let session = Session::with_config(our_reader, our_writer, config).unwrap();
        session.shutdown();

        let first = rx.recv().unwrap();
        assert!(first.starts_with("send op=hello"), "got {first}");
    }

    #[test]
    fn shutdown_is_terminal_and_idempotent() {
        let (session, _wire, _input) = detached();
        session.shutdown();
        session.shutdown();
        assert!(matches!(session.error(), Some(SessionError::ListenerClosed)));
        assert!(matches!(
            session.dial(DialArgs::default()),
            Err(SessionError::ListenerClosed)
        ));
        assert!(matches!(session.accept(), Err(SessionError::ListenerClosed)));
        assert!(matches!(session.wait(), SessionError::ListenerClosed));
    }

    #[test]
    fn inbound_failure_reaches_blocked_readers() {
        let (session, _wire, _input) = detached();
        let stream = session.dial(DialArgs::default()).unwrap();
        let reader = stream.try_clone().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let blocked = thread::spawn(move || {
            let _ = started_tx.send(());
            (&reader).read(&mut [0u8; 8])
        });
        started_rx.recv().unwrap();
        thread::sleep(Duration::from_millis(50));

        let broken = PipeError::Io(Arc::new(io::Error::other("broken")));
        session.inner.inbound.close_read(broken).unwrap();

        let is_broken =
            |err: &SessionError| matches!(err, SessionError::Io(inner) if inner.to_string() == "broken");
        let err = SessionError::from_io(blocked.join().unwrap().unwrap_err());
        assert!(is_broken(&err), "got {err:?}");
        let err = SessionError::from_io((&stream).write(b"late").unwrap_err());
        assert!(is_broken(&err), "got {err:?}");
        assert!(is_broken(&session.dial(DialArgs::default()).unwrap_err()));
        assert!(is_broken(&session.accept().unwrap_err()));
        assert!(is_broken(&session.wait()));
    }

    #[test]
    fn token_cancelled_before_start_ends_the_session() {
        let token = CancellationToken::new();
        token.cancel();
        let (_their_reader, our_writer) = pipe();
        let (our_reader, _their_writer) = pipe();
        let config = SessionConfig::new().with_cancellation(token);
        let session = Session::with_config(our_reader, our_writer, config).unwrap();
        assert!(matches!(session.wait(), SessionError::Cancelled));
    }

    #[test]
    fn peer_eof_ends_session_as_closed() {
        let (session, _wire, input) = detached();
        drop(input);
        assert!(matches!(session.wait(), SessionError::Closed));
        session.join();
    }
}
