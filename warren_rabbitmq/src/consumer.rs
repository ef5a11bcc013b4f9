use crate::topology::Topology;
use crate::{Broker, ConsumeError, Connection, ConsumerError, Handle, Session, ShutdownError};
use futures::StreamExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, info, info_span, warn};
use warren_sync::{Completion, CompletionWaiter, completion};
use warren_tracing::LogContext;

pub(crate) mod deliveries;
use self::deliveries::Deliveries;

/// A RabbitMQ consumer: one connection, one declared topology, one stream of
/// deliveries, and a shutdown that waits for the stream to be drained.
///
/// ## Lifecycle
///
/// - [`Consumer::start`] opens the connection and declares the
///   [`Session`]. A consumer only exists once this has fully succeeded.
/// - [`Consumer::consume`] dispatches the deliveries to a handler, one at a
///   time and in arrival order, until the stream ends.
/// - [`Consumer::shutdown`] (usually called from another task) cancels the
///   subscription, which ends the stream. It then waits for the dispatch to
///   finish, and closes the channel and the connection.
///
/// The consumer is generic over its [`Broker`], which defaults to the RabbitMQ
/// [`Connection`].
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use warren_rabbitmq::{
///     BindingOptions, Consumer, ConsumerOptions, Exchange, ExchangeKind, Handle, Queue, Session,
/// };
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new(
///     Exchange::named("orders").with_kind(ExchangeKind::Topic),
///     Queue::named("orders.q"),
///     BindingOptions::with_routing_key("order.*"),
///     ConsumerOptions::tagged("orders-consumer").with_auto_ack(true),
/// );
///
/// let consumer = Arc::new(Consumer::start(&Handle::default(), session).await?);
/// let shutdown = Arc::clone(&consumer).shutdown_on_signal();
///
/// consumer
///     .consume(|delivery| async move {
///         println!("{} bytes", delivery.data.len());
///     })
///     .await?;
///
/// shutdown.await??;
/// # Ok(())
/// # }
/// ```
pub struct Consumer<B: Broker = Connection> {
    name: Arc<str>,
    session: Session,
    queue: String,
    broker: B,
    state: Mutex<State<B::Stream>>,
    waiter: CompletionWaiter,
    shutdown_timeout: Option<Duration>,
    span: Span,
}

/// The internal lifecycle state: owns the delivery stream until it is handed
/// out.
enum State<S> {
    Connected { stream: S, completion: Completion },
    Consuming,
    ShuttingDown,
    ShutDown,
}

/// The observable lifecycle phase of a [`Consumer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// The topology is declared; the deliveries were not taken yet.
    Connected,
    /// The deliveries were taken, and no shutdown was requested yet.
    Consuming,
    /// The stream of deliveries ended (e.g., the broker closed the channel)
    /// and every delivery taken from it was handled. The connection stays
    /// open until [shutdown](Consumer::shutdown).
    Drained,
    /// A shutdown is in progress.
    ShuttingDown,
    /// The shutdown finished, and the connection is closed.
    Closed,
}

impl Consumer<Connection> {
    /// Opens a connection to the RabbitMQ cluster behind the given [`Handle`],
    /// declares the topology of the given [`Session`], and starts consuming.
    ///
    /// If any step after opening the connection fails, the connection is
    /// closed before the error is returned.
    pub async fn start(handle: &Handle, session: Session) -> Result<Self, ConsumerError> {
        let connection = Connection::open(handle, session.tag()).await?;

        Self::with_broker(connection, session).await
    }

    /// Same as [`Consumer::start`], but places the consumer's log events
    /// within the span of the given [`LogContext`].
    pub async fn start_in(
        context: &LogContext,
        handle: &Handle,
        session: Session,
    ) -> Result<Self, ConsumerError> {
        Self::start(handle, session)
            .instrument(context.span().clone())
            .await
    }
}

impl<B: Broker> Consumer<B> {
    /// Declares the topology of the given [`Session`] on the given, already
    /// opened [`Broker`], and starts consuming.
    ///
    /// If declaration fails, the broker is closed before the error is
    /// returned.
    ///
    /// The consumer's span is a child of the span current at the time of this
    /// call.
    pub async fn with_broker(broker: B, session: Session) -> Result<Self, ConsumerError> {
        let name = Self::compose_name(session.tag());

        let (queue, stream) = match Topology::new(&session).declare(&broker).await {
            Ok(declared) => declared,
            Err(error) => {
                if let Err(close_error) = broker.close().await {
                    warn!(
                        consumer = name.as_ref(),
                        error = ?close_error,
                        error_message = %close_error,
                        "Failed to close the RabbitMQ connection of a consumer that failed to start",
                    );
                }

                return Err(error);
            }
        };

        let span = info_span!("consumer", consumer = name.as_ref(), queue = queue.as_str());
        let (completion, waiter) = completion();

        span.in_scope(|| {
            info!(
                exchange = session.exchange().name(),
                routing_key = session.binding().routing_key(),
                "Started a RabbitMQ consumer",
            )
        });

        Ok(Self {
            name,
            session,
            queue,
            broker,
            state: Mutex::new(State::Connected { stream, completion }),
            waiter,
            shutdown_timeout: None,
            span,
        })
    }

    /// Sets the drain deadline applied by
    /// [`shutdown_on_signal`](Consumer::shutdown_on_signal).
    pub fn with_shutdown_timeout(self, shutdown_timeout: Option<Duration>) -> Self {
        Self {
            shutdown_timeout,
            ..self
        }
    }

    fn compose_name(tag: &str) -> Arc<str> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        Arc::from(format!(
            "rabbitmq:consumer:{}:{}",
            tag,
            COUNTER.fetch_add(1, Ordering::Relaxed),
        ))
    }
}

impl<B: Broker> Consumer<B> {
    /// Reports the consumer name, which is unique within this process.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports the consumer tag.
    pub fn tag(&self) -> &str {
        self.session.tag()
    }

    /// Exposes the [`Session`] this consumer was started with.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reports the name of the consumed queue, as assigned by the server.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Reports the drain deadline applied on a shutdown signal, if any.
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout
    }

    /// Reports the current lifecycle [`Phase`].
    pub fn phase(&self) -> Phase {
        match *self.state.lock() {
            State::Connected { .. } => Phase::Connected,
            State::Consuming if self.waiter.is_posted() => Phase::Drained,
            State::Consuming => Phase::Consuming,
            State::ShuttingDown => Phase::ShuttingDown,
            State::ShutDown => Phase::Closed,
        }
    }
}

impl<B: Broker> Consumer<B> {
    /// Hands out the stream of deliveries, for callers that dispatch on their
    /// own. The deliveries can be taken only once.
    ///
    /// A [shutdown](Consumer::shutdown) waits until the returned stream is
    /// dropped.
    pub fn deliveries(&self) -> Result<Deliveries<B>, ConsumeError> {
        let mut state = self.state.lock();

        match std::mem::replace(&mut *state, State::Consuming) {
            State::Connected { stream, completion } => Ok(Deliveries::new(stream, completion)),
            State::Consuming => Err(ConsumeError::AlreadyTaken {
                tag: self.tag().to_string(),
            }),
            previous => {
                *state = previous;

                Err(ConsumeError::ShuttingDown {
                    tag: self.tag().to_string(),
                })
            }
        }
    }

    /// Passes every delivery to the given handler, one at a time and in
    /// arrival order: the next delivery is pulled only once the handler's
    /// future for the previous one has completed.
    ///
    /// Returns once the stream ends (normally, after a
    /// [shutdown](Consumer::shutdown) was requested). Failed deliveries are
    /// logged and skipped.
    pub async fn consume<F, Fut>(&self, mut handler: F) -> Result<(), ConsumeError>
    where
        F: FnMut(B::Delivery) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut deliveries = self.deliveries()?;

        async move {
            debug!("Consuming RabbitMQ deliveries");

            let mut handled: usize = 0;
            while let Some(item) = deliveries.next().await {
                match item {
                    Ok(delivery) => {
                        handler(delivery).await;
                        handled += 1;
                    }
                    Err(error) => warn!(
                        ?error,
                        error_message = %error,
                        "Skipped a failed RabbitMQ delivery",
                    ),
                }
            }

            // Posts the completion
            drop(deliveries);

            info!(handled, "Stopped consuming RabbitMQ deliveries");
        }
        .instrument(self.span.clone())
        .await;

        Ok(())
    }
}

impl<B: Broker> Consumer<B> {
    /// Shuts this consumer down:
    ///
    /// 1. Cancels the broker-side subscription, which ends the stream of
    ///    deliveries.
    /// 2. Waits until the dispatch of the deliveries already pulled from the
    ///    stream is finished.
    /// 3. Closes the channel and the connection.
    ///
    /// All steps run even if an earlier one failed, and the first error is
    /// returned. If the deliveries were never taken, the consumer is still
    /// closed, and [`ShutdownError::NeverConsumed`] is returned. A repeated
    /// call does nothing and returns [`ShutdownError::AlreadyShutDown`].
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        self.shut_down(None).instrument(self.span.clone()).await
    }

    /// Same as [`Consumer::shutdown`], but stops waiting for the dispatch to
    /// finish after the given deadline. The connection is closed either way,
    /// and an elapsed deadline is reported as [`ShutdownError::TimedOut`].
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<(), ShutdownError> {
        self.shut_down(Some(timeout))
            .instrument(self.span.clone())
            .await
    }

    /// Spawns a task that waits for an OS shutdown signal (`SIGINT` or
    /// `SIGTERM` on Unix, `ctrl_c` elsewhere), then shuts this consumer down,
    /// applying the configured [shutdown timeout](Consumer::shutdown_timeout).
    ///
    /// The returned handle resolves to the outcome of the shutdown.
    pub fn shutdown_on_signal(self: Arc<Self>) -> JoinHandle<Result<(), ShutdownError>> {
        tokio::spawn(async move {
            crate::signal::wait_for_shutdown_signal()
                .instrument(self.span.clone())
                .await;

            match self.shutdown_timeout {
                Some(timeout) => self.shutdown_with_timeout(timeout).await,
                None => self.shutdown().await,
            }
        })
    }

    async fn shut_down(&self, timeout: Option<Duration>) -> Result<(), ShutdownError> {
        let never_consumed = {
            let mut state = self.state.lock();

            match std::mem::replace(&mut *state, State::ShuttingDown) {
                // Dropping the unused stream posts the completion
                State::Connected { .. } => true,
                State::Consuming => false,
                previous => {
                    *state = previous;

                    return Err(ShutdownError::AlreadyShutDown {
                        tag: self.tag().to_string(),
                    });
                }
            }
        };

        info!("Shutting down a RabbitMQ consumer");

        let mut errors = Vec::new();
        let mut closed = false;

        let stream_ends = match self.broker.cancel(self.tag()).await {
            Ok(()) => true,
            Err(source) => {
                errors.push(ShutdownError::Cancel {
                    tag: self.tag().to_string(),
                    source,
                });

                // Closing the channel ends the stream too
                closed = true;
                match self.broker.close().await {
                    Ok(()) => true,
                    Err(source) => {
                        errors.push(ShutdownError::Close {
                            tag: self.tag().to_string(),
                            source,
                        });
                        false
                    }
                }
            }
        };

        if stream_ends {
            match timeout {
                Some(timeout) => {
                    if self.waiter.wait_with_timeout(timeout).await.is_err() {
                        errors.push(ShutdownError::TimedOut {
                            tag: self.tag().to_string(),
                            timeout,
                        });
                    }
                }
                None => self.waiter.wait().await,
            }
        }

        if !closed {
            if let Err(source) = self.broker.close().await {
                errors.push(ShutdownError::Close {
                    tag: self.tag().to_string(),
                    source,
                });
            }
        }

        *self.state.lock() = State::ShutDown;

        let mut errors = errors.into_iter();
        match errors.next() {
            Some(first) => {
                for later in errors {
                    warn!(
                        error = ?later,
                        error_message = %later,
                        "Encountered a further problem while shutting down a RabbitMQ consumer",
                    );
                }
                warn!(
                    error = ?first,
                    error_message = %first,
                    "Shut down a RabbitMQ consumer with errors",
                );

                Err(first)
            }
            None if never_consumed => {
                info!("Shut down a RabbitMQ consumer that never consumed");

                Err(ShutdownError::NeverConsumed {
                    tag: self.tag().to_string(),
                })
            }
            None => {
                info!("Shut down a RabbitMQ consumer");

                Ok(())
            }
        }
    }
}
