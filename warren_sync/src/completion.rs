use std::time::Duration;
use tokio::time::error::Elapsed;
use tokio_util::sync::CancellationToken;

/// Creates a linked pair of a single-use [`Completion`] and its
/// [`CompletionWaiter`].
///
/// The completion is posted exactly once: either explicitly via
/// [`Completion::post`], or implicitly when the [`Completion`] is dropped. The
/// waiter observes the post no matter whether it started waiting before or
/// after it happened.
///
/// ## Example
///
/// ```
/// use warren_sync::completion;
///
/// # tokio_test::block_on(async {
///
/// // Make a linked pair
/// let (completion, waiter) = completion();
///
/// // Spawn an asynchronous task that owns the posting side
/// tokio::spawn(async move {
///     // Perform some asynchronous work
///     println!("This will print first");
///
///     // Signal completion
///     completion.post();
/// });
///
/// // Wait for the completion signal
/// waiter.wait().await;
///
/// println!("Asynchronous task completed!")
/// # })
/// ```
pub fn completion() -> (Completion, CompletionWaiter) {
    let token = CancellationToken::new();
    let waiter = CompletionWaiter {
        token: token.clone(),
    };

    (Completion { token }, waiter)
}

/// The posting side of a single-use completion signal.
///
/// This type is neither [`Clone`] nor [`Copy`]: there is exactly
/// one producer, and consuming it (by [posting](Completion::post) or by
/// dropping) is the only way to post.
#[derive(Debug)]
pub struct Completion {
    token: CancellationToken,
}

/// The waiting side of a single-use completion signal.
///
/// Waiting does not consume the signal: once posted, every subsequent
/// [`wait`](CompletionWaiter::wait) resolves immediately.
#[derive(Debug)]
pub struct CompletionWaiter {
    token: CancellationToken,
}

impl Completion {
    /// Posts the completion signal, waking up the linked [`CompletionWaiter`].
    pub fn post(self) {
        drop(self);
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl CompletionWaiter {
    /// Waits asynchronously until the linked [`Completion`] is posted.
    /// Resolves immediately if it has already been posted.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// Same as [`wait`](CompletionWaiter::wait), but gives up after the given
    /// `timeout`.
    pub async fn wait_with_timeout(&self, timeout: Duration) -> Result<(), Elapsed> {
        tokio::time::timeout(timeout, self.wait()).await
    }

    /// Reports whether the linked [`Completion`] has been posted as of this
    /// moment.
    pub fn is_posted(&self) -> bool {
        self.token.is_cancelled()
    }
}
