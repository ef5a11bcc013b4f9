use crate::Broker;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use warren_sync::Completion;

/// The inbound stream of a [`Consumer`](crate::Consumer), handed out by
/// [`Consumer::deliveries`](crate::Consumer::deliveries).
///
/// Holds the consumer's completion signal and posts it when dropped. A
/// shutdown therefore waits until this stream is dropped, so drop it only
/// after every delivery pulled from it has been fully handled.
pub struct Deliveries<B: Broker> {
    stream: B::Stream,
    _completion: Completion,
}

impl<B: Broker> Deliveries<B> {
    pub(crate) fn new(stream: B::Stream, completion: Completion) -> Self {
        Self {
            stream,
            _completion: completion,
        }
    }
}

impl<B: Broker> Stream for Deliveries<B> {
    type Item = Result<B::Delivery, B::StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}
