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
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::mpsc,
};

use cellsync_shared::{ConnectionConfig, FrameDecoder};

use super::{FrameReceiver, FrameSender, RecvError, SendError, Socket as TransportSocket};

const READ_BUFFER_SIZE: usize = 16 * 1024;

type Incoming = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// Framed TCP connection to a host
pub struct Socket {
    server_addr: SocketAddr,
    max_frame_size: usize,
}

impl Socket {
    pub fn new(server_addr: SocketAddr, config: &ConnectionConfig) -> Self {
        Self {
            server_addr,
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
    fn connect(self: Box<Self>) -> (Box<dyn FrameSender>, Box<dyn FrameReceiver>) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let incoming: Incoming = Arc::new(Mutex::new(VecDeque::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let server_addr = self.server_addr;
        let max_frame_size = self.max_frame_size;
        let reader_incoming = incoming.clone();
        let reader_closed = closed.clone();

        // frames sent before the connection is up wait in the channel
        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(error) => {
                    warn!("cannot start tcp runtime: {}", error);
                    reader_closed.store(true, Ordering::SeqCst);
                    return;
                }
            };

            runtime.block_on(async move {
                let stream = match TcpStream::connect(server_addr).await {
                    Ok(stream) => stream,
                    Err(error) => {
                        warn!("cannot connect to {}: {}", server_addr, error);
                        reader_closed.store(true, Ordering::SeqCst);
                        return;
                    }
                };
                info!("connected to {}", server_addr);
                let (read_half, write_half) = stream.into_split();
                tokio::join!(
                    write_frames(write_half, frame_rx),
                    read_frames(read_half, max_frame_size, reader_incoming),
                );
                reader_closed.store(true, Ordering::SeqCst);
                debug!("connection to {} closed", server_addr);
            });
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
}

async fn write_frames(mut write_half: OwnedWriteHalf, mut frame_rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(frame) = frame_rx.recv().await {
        if let Err(error) = write_half.write_all(&frame).await {
            debug!("write to host failed: {}", error);
            break;
        }
    }
    let _ = write_half.shutdown().await;
}

async fn read_frames(mut read_half: OwnedReadHalf, max_frame_size: usize, incoming: Incoming) {
    let mut decoder = FrameDecoder::new(max_frame_size);
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = match read_half.read(&mut buffer).await {
            Ok(0) => return,
            Ok(read) => read,
            Err(error) => {
                debug!("read from host failed: {}", error);
                return;
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
                    warn!("host sent a bad frame header: {}", error);
                    frames.push(decoder.take_buffer());
                    broken = true;
                    break;
                }
            }
        }
        match incoming.lock() {
            Ok(mut incoming) => incoming.extend(frames),
            Err(_) => return,
        }
        if broken {
            return;
        }
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
    incoming: Incoming,
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
