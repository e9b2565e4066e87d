/// Contains Config properties which will be shared by Server and Client
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Largest frame, header included, that will be sent or accepted
    pub max_frame_size: usize,
    /// Maximum number of messages batched into one transaction frame
    pub max_batch_len: usize,
}

impl ConnectionConfig {
    pub fn new(max_frame_size: usize, max_batch_len: usize) -> Self {
        Self {
            max_frame_size,
            max_batch_len: max_batch_len.max(1),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 4 * 1024 * 1024,
            max_batch_len: 256,
        }
    }
}
