use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use log::{debug, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
};

use cellsync_shared::{ConnectionConfig, FrameDecoder};

use super::{
    FrameReceiver, FrameSender, RecvError, SendError, SessionAcceptor, Socket as TransportSocket,
};

const READ_BUFFER_SIZE: usize = 16 * 1024;

type Pending = Arc<Mutex<VecDeque<(Box<dyn FrameSender>, Box<dyn FrameReceiver>)>>>;

/// Framed TCP listener. Each accepted connection carries one session.
pub struct Socket {
    listen_addr: SocketAddr,
    max_frame_size: usize,
}

impl Socket {
    pub fn new(listen_addr: SocketAddr, config: &ConnectionConfig) -> Self {
        Self {
            listen_addr,
            max_frame_size: config.max_frame_size,
        }
    }
}

impl From<Socket> for Box<dyn TransportSocket> {
    fn from(socket: Socket) -> Self {
        Box::new(socket)
    }
}

impl TransportSocket for Socket {
    fn listen(self: Box<Self>) -> Box<dyn SessionAcceptor> {
        let pending: Pending = Arc::new(Mutex::new(VecDeque::new()));
        let failed = Arc::new(AtomicBool::new(false));
        spawn_listener(
            self.listen_addr,
            self.max_frame_size,
            pending.clone(),
            failed.clone(),
        );
        Box::new(TcpAcceptor { pending, failed })
    }
}

fn spawn_listener(listen_addr: SocketAddr, max_frame_size: usize, pending: Pending, failed: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(error) => {
                warn!("cannot start tcp runtime: {}", error);
                failed.store(true, Ordering::SeqCst);
                return;
            }
        };

        runtime.block_on(async move {
            let listener = match TcpListener::bind(listen_addr).await {
                Ok(listener) => listener,
                Err(error) => {
                    warn!("cannot listen on {}: {}", listen_addr, error);
                    failed.store(true, Ordering::SeqCst);
                    return;
                }
            };
            info!("listening for sessions on {}", listen_addr);

            loop {
                match listener.accept().await {
                    Ok((stream, peer_addr)) => {
                        info!("accepted tcp connection from {}", peer_addr);
                        let pipes = spawn_stream(stream, peer_addr, max_frame_size);
                        match pending.lock() {
                            Ok(mut pending) => pending.push_back(pipes),
                            Err(_) => {
                                failed.store(true, Ordering::SeqCst);
                                return;
                            }
                        }
                    }
                    Err(error) => {
                        warn!("accept failed on {}: {}", listen_addr, error);
                    }
                }
            }
        });
    });
}

/// Splits a connected stream into a writer task fed by a channel and a
/// reader task that re-frames incoming bytes
fn spawn_stream(
    stream: TcpStream,
    peer_addr: SocketAddr,
    max_frame_size: usize,
) -> (Box<dyn FrameSender>, Box<dyn FrameReceiver>) {
    let (mut read_half, mut write_half) = stream.into_split();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let incoming = Arc::new(Mutex::new(VecDeque::new()));
    let closed = Arc::new(AtomicBool::new(false));

    tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            if let Err(error) = write_half.write_all(&frame).await {
                debug!("write to {} failed: {}", peer_addr, error);
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let reader_incoming = incoming.clone();
    let reader_closed = closed.clone();
    tokio::spawn(async move {
        let mut decoder = FrameDecoder::new(max_frame_size);
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let read = match read_half.read(&mut buffer).await {
                Ok(0) => break,
                Ok(read) => read,
                Err(error) => {
                    debug!("read from {} failed: {}", peer_addr, error);
                    break;
                }
            };
            decoder.extend(&buffer[..read]);
            let mut frames = Vec::new();
            let mut broken = false;
            loop {
                match decoder.next_frame_bytes() {
                    Ok(Some(frame)) => frames.push(frame),
                    Ok(None) => break,
                    Err(error) => {
                        // hand the bad bytes on so the session reports the
                        // classified framing error
                        warn!("{} sent a bad frame header: {}", peer_addr, error);
                        frames.push(decoder.take_buffer());
                        broken = true;
                        break;
                    }
                }
            }
            match reader_incoming.lock() {
                Ok(mut incoming) => incoming.extend(frames),
                Err(_) => break,
            }
            if broken {
                break;
            }
        }
        reader_closed.store(true, Ordering::SeqCst);
        debug!("connection from {} closed", peer_addr);
    });

    (
        Box::new(TcpFrameSender { frame_tx }),
        Box::new(TcpFrameReceiver {
            incoming,
            closed,
            current: None,
        }),
    )
}

struct TcpAcceptor {
    pending: Pending,
    failed: Arc<AtomicBool>,
}

impl SessionAcceptor for TcpAcceptor {
    fn accept(
        &mut self,
    ) -> Result<Option<(Box<dyn FrameSender>, Box<dyn FrameReceiver>)>, RecvError> {
        let mut pending = self.pending.lock().map_err(|_| RecvError)?;
        if let Some(pipes) = pending.pop_front() {
            return Ok(Some(pipes));
        }
        if self.failed.load(Ordering::SeqCst) {
            return Err(RecvError);
        }
        Ok(None)
    }
}

struct TcpFrameSender {
    frame_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl FrameSender for TcpFrameSender {
    fn send(&self, frame: &[u8]) -> Result<(), SendError> {
        self.frame_tx.send(frame.to_vec()).map_err(|_| SendError)
    }
}

struct TcpFrameReceiver {
    incoming: Arc<Mutex<VecDeque<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
    current: Option<Vec<u8>>,
}

impl FrameReceiver for TcpFrameReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, RecvError> {
        // read the flag first: the reader queues its last frames before setting it
        let closed = self.closed.load(Ordering::SeqCst);
        let next = self.incoming.lock().map_err(|_| RecvError)?.pop_front();
        match next {
            Some(frame) => {
                self.current = Some(frame);
                Ok(self.current.as_deref())
            }
            None if closed => Err(RecvError),
            None => Ok(None),
        }
    }
}
