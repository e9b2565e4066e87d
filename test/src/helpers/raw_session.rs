use cellsync_server::SessionKey;
use cellsync_shared::{encode_tx, Frame, Msg, MsgOp, FRAME_HEADER_LEN};

use super::TestHost;
use crate::local_transport::{raw_pipe, RawOutbox, RawSender};

const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// A hand-driven client: sends whatever messages a test builds, including
/// ones a real `Client` would refuse to send, and decodes what comes back
pub struct RawSession {
    pub session: SessionKey,
    inbound: RawSender,
    outbox: RawOutbox,
    pub received: Vec<Msg>,
    pub ended: bool,
}

impl RawSession {
    pub fn connect(host: &mut TestHost) -> Self {
        let (inbound, receiver, sender, outbox) = raw_pipe();
        let session = host.server.accept_transport(sender, receiver);
        Self {
            session,
            inbound,
            outbox,
            received: Vec::new(),
            ended: false,
        }
    }

    pub fn send(&self, msgs: Vec<Msg>) {
        let frame = encode_tx(&msgs, MAX_FRAME_SIZE).expect("test batch fits in a frame");
        self.inbound.send(&frame);
    }

    pub fn send_op(&self, req_id: u64, op: MsgOp) {
        self.send(vec![Msg::new(req_id, op)]);
    }

    pub fn send_bytes(&self, bytes: &[u8]) {
        self.inbound.send(bytes);
    }

    /// Lets the host handle what was sent, then decodes its answer
    pub fn exchange(&mut self, host: &mut TestHost) -> Vec<Msg> {
        host.receive();
        host.send();
        let mut msgs = Vec::new();
        for bytes in self.outbox.drain() {
            match Frame::decode(&bytes, MAX_FRAME_SIZE).expect("host sends valid frames") {
                Frame::Tx(batch) => msgs.extend(batch),
                Frame::EndOfStream => {
                    assert_eq!(bytes.len(), FRAME_HEADER_LEN);
                    self.ended = true;
                }
            }
        }
        self.received.extend(msgs.iter().cloned());
        msgs
    }
}
