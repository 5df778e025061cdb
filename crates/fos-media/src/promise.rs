//! Play promises
//!
//! `play()` hands back a [`PlayPromise`]; the element keeps the matching
//! [`PlaySettler`] until the request resolves or is rejected.

use smol::channel::{self, Receiver, Sender};

use crate::MediaError;

/// Outcome of a play request
pub type PlayResult = Result<(), MediaError>;

/// Pending result of a `play()` call
#[derive(Debug)]
pub struct PlayPromise {
    rx: Receiver<PlayResult>,
}

/// Write half of a play promise
#[derive(Debug)]
pub struct PlaySettler {
    tx: Sender<PlayResult>,
}

/// Create a linked settler/promise pair
pub fn pending() -> (PlaySettler, PlayPromise) {
    let (tx, rx) = channel::bounded(1);
    (PlaySettler { tx }, PlayPromise { rx })
}

impl PlaySettler {
    pub fn resolve(self) {
        self.settle(Ok(()));
    }

    pub fn reject(self, error: MediaError) {
        self.settle(Err(error));
    }

    fn settle(self, result: PlayResult) {
        // Nobody waiting on the promise is fine.
        let _ = self.tx.try_send(result);
    }
}

impl PlayPromise {
    /// A promise that is already resolved
    pub fn resolved() -> Self {
        let (settler, promise) = pending();
        settler.resolve();
        promise
    }

    /// A promise that is already rejected
    pub fn rejected(error: MediaError) -> Self {
        let (settler, promise) = pending();
        settler.reject(error);
        promise
    }

    /// Wait for the request to settle
    ///
    /// A request dropped without settling (its element was reclaimed)
    /// counts as aborted.
    pub async fn settled(self) -> PlayResult {
        self.rx.recv().await.unwrap_or(Err(MediaError::Aborted))
    }

    /// Poll without waiting; `None` while still pending
    pub fn try_settled(&self) -> Option<PlayResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(channel::TryRecvError::Closed) => Some(Err(MediaError::Aborted)),
            Err(channel::TryRecvError::Empty) => None,
        }
    }
}
