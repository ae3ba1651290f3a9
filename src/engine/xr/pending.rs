use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::engine::xr::{SessionId, XrError};

/// Single-shot asynchronous result, polled without blocking.
///
/// The producing side holds the matching `Resolver`. Dropping the resolver without
/// answering reads as `XrError::Dropped`.
#[derive(Debug)]
pub struct Pending<T> {
    rx: Receiver<Result<T, XrError>>,
}

#[derive(Debug)]
pub struct Resolver<T> {
    tx: Sender<Result<T, XrError>>,
}

pub fn pending<T>() -> (Resolver<T>, Pending<T>) {
    let (tx, rx) = mpsc::channel();
    (Resolver { tx }, Pending { rx })
}

impl<T> Resolver<T> {
    pub fn resolve(self, value: T) {
        // The requester may have given up; nothing to do then.
        let _ = self.tx.send(Ok(value));
    }

    pub fn reject(self, error: XrError) {
        let _ = self.tx.send(Err(error));
    }
}

impl<T> Pending<T> {
    #[cfg(test)]
    pub fn ready(value: T) -> Self {
        let (resolver, pending) = pending();
        resolver.resolve(value);
        pending
    }

    pub fn rejected(error: XrError) -> Self {
        let (resolver, pending) = pending();
        resolver.reject(error);
        pending
    }

    /// `None` while still outstanding.
    pub fn poll(&mut self) -> Option<Result<T, XrError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(XrError::Dropped)),
        }
    }
}

/// Subscription to a session's end event.
///
/// Latches: once fired it stays fired. A session that is dropped without ending also
/// counts as ended.
#[derive(Debug)]
pub struct SessionEndSignal {
    session: SessionId,
    rx: Receiver<()>,
    fired: bool,
}

impl SessionEndSignal {
    pub fn channel(session: SessionId) -> (Sender<()>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                session,
                rx,
                fired: false,
            },
        )
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn poll_fired(&mut self) -> bool {
        if !self.fired {
            self.fired = !matches!(self.rx.try_recv(), Err(TryRecvError::Empty));
        }
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_stays_outstanding_until_resolved() {
        let (resolver, mut p) = pending::<u32>();

        assert!(p.poll().is_none());
        assert!(p.poll().is_none());

        resolver.resolve(7);
        assert_eq!(p.poll(), Some(Ok(7)));
    }

    #[test]
    fn settled_pendings_answer_on_first_poll() {
        let mut ready = Pending::ready(5u32);
        assert_eq!(ready.poll(), Some(Ok(5)));

        let mut rejected = Pending::<u32>::rejected(XrError::Dropped);
        assert_eq!(rejected.poll(), Some(Err(XrError::Dropped)));
    }

    #[test]
    fn dropped_resolver_reads_as_rejection() {
        let (resolver, mut p) = pending::<u32>();
        drop(resolver);

        assert_eq!(p.poll(), Some(Err(XrError::Dropped)));
    }

    #[test]
    fn end_signal_latches() {
        let (tx, mut signal) = SessionEndSignal::channel(SessionId(3));

        assert!(!signal.poll_fired());
        tx.send(()).unwrap();
        assert!(signal.poll_fired());
        assert!(signal.poll_fired());
        assert_eq!(signal.session(), SessionId(3));
    }

    #[test]
    fn end_signal_fires_when_session_goes_away() {
        let (tx, mut signal) = SessionEndSignal::channel(SessionId(1));
        drop(tx);

        assert!(signal.poll_fired());
    }
}
