use core::{
    pin::Pin,
    task::{Context, Poll},
};
use futures::Stream;
use pin_project_lite::pin_project;
use tokio_util::sync::{CancellationToken, DropGuard};

pin_project! {
    /// Response stream that cancels its emitter when dropped.
    ///
    /// tonic drops the response stream as soon as the client cancels or the
    /// connection goes away. Holding a [`DropGuard`] here turns that drop into
    /// a cancellation the emitting task can observe, even while it sleeps
    /// between records.
    pub struct CancelOnDrop<S> {
        #[pin]
        inner: S,
        _guard: DropGuard,
    }
}

impl<S> CancelOnDrop<S> {
    pub fn new(inner: S, token: CancellationToken) -> Self {
        Self {
            inner,
            _guard: token.drop_guard(),
        }
    }
}

impl<S: Stream> Stream for CancelOnDrop<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
