//! In-memory framed stream for end-to-end tests.
//! Routes frames between host and client without network I/O.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use cellsync_shared::{FrameReceiver, FrameSender, RecvError, SendError};

type Queue = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// Both ends of a connected stream
pub struct LocalTransportPair {
    pub server_sender: Box<dyn FrameSender>,
    pub server_receiver: Box<dyn FrameReceiver>,
    pub client_sender: Box<dyn FrameSender>,
    pub client_receiver: Box<dyn FrameReceiver>,
    /// Breaks the stream in both directions, as a dropped connection would
    pub cut: LinkCut,
}

impl LocalTransportPair {
    pub fn new() -> Self {
        let server_to_client: Queue = Arc::new(Mutex::new(VecDeque::new()));
        let client_to_server: Queue = Arc::new(Mutex::new(VecDeque::new()));
        let broken = Arc::new(AtomicBool::new(false));

        Self {
            server_sender: Box::new(LocalSender {
                queue: server_to_client.clone(),
                broken: broken.clone(),
            }),
            server_receiver: Box::new(LocalReceiver {
                queue: client_to_server.clone(),
                broken: broken.clone(),
                current: None,
            }),
            client_sender: Box::new(LocalSender {
                queue: client_to_server,
                broken: broken.clone(),
            }),
            client_receiver: Box::new(LocalReceiver {
                queue: server_to_client,
                broken: broken.clone(),
                current: None,
            }),
            cut: LinkCut { broken },
        }
    }
}

impl Default for LocalTransportPair {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct LinkCut {
    broken: Arc<AtomicBool>,
}

impl LinkCut {
    pub fn cut(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

struct LocalSender {
    queue: Queue,
    broken: Arc<AtomicBool>,
}

impl FrameSender for LocalSender {
    fn send(&self, frame: &[u8]) -> Result<(), SendError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(SendError);
        }
        let mut queue = self.queue.lock().map_err(|_| SendError)?;
        queue.push_back(frame.to_vec());
        Ok(())
    }
}

struct LocalReceiver {
    queue: Queue,
    broken: Arc<AtomicBool>,
    current: Option<Vec<u8>>,
}

impl FrameReceiver for LocalReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, RecvError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(RecvError);
        }
        let next = self.queue.lock().map_err(|_| RecvError)?.pop_front();
        self.current = next;
        Ok(self.current.as_deref())
    }
}

/// Pushes raw bytes at a receiver, for feeding hand-made frames to a host
pub struct RawSender {
    queue: Queue,
}

impl RawSender {
    pub fn send(&self, bytes: &[u8]) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(bytes.to_vec());
        }
    }
}

/// A receiver fed only by a `RawSender`, plus a sender whose frames can be
/// read back with `drain`. Used to talk to a host byte by byte.
pub fn raw_pipe() -> (RawSender, Box<dyn FrameReceiver>, Box<dyn FrameSender>, RawOutbox) {
    let inbound: Queue = Arc::new(Mutex::new(VecDeque::new()));
    let outbound: Queue = Arc::new(Mutex::new(VecDeque::new()));
    let broken = Arc::new(AtomicBool::new(false));
    (
        RawSender {
            queue: inbound.clone(),
        },
        Box::new(LocalReceiver {
            queue: inbound,
            broken: broken.clone(),
            current: None,
        }),
        Box::new(LocalSender {
            queue: outbound.clone(),
            broken,
        }),
        RawOutbox { queue: outbound },
    )
}

/// Frames a host sent on a raw pipe
pub struct RawOutbox {
    queue: Queue,
}

impl RawOutbox {
    pub fn drain(&self) -> Vec<Vec<u8>> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}
