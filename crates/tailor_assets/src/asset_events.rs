use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

use crate::asset_server::AssetWorkerMessage;

/// Host-side end of the asset channel. Never blocks.
pub struct AssetEvents {
    receiver: UnboundedReceiver<AssetWorkerMessage>,
}

impl AssetEvents {
    pub(crate) fn new(receiver: UnboundedReceiver<AssetWorkerMessage>) -> Self {
        Self { receiver }
    }

    /// Everything that arrived since the last call, in arrival order.
    pub fn drain(&mut self) -> Vec<AssetWorkerMessage> {
        let mut messages = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(msg) => messages.push(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("[AssetEvents] Every sender is gone");
                    break;
                }
            }
        }
        messages
    }

    /// Waits for the next message. For tests and headless tools; the
    /// host loop uses `drain`.
    pub async fn recv(&mut self) -> Option<AssetWorkerMessage> {
        self.receiver.recv().await
    }
}
