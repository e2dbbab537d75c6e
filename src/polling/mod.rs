/*!
 * Pipeline status polling.
 *
 * - `backoff`: delay computation after failed status checks
 * - `poller`: the polling state machine and its cancellable task handle
 */

pub mod backoff;
pub mod poller;

pub use backoff::backoff_delay;
pub use poller::{PollCallbacks, PollHandle, PollObserver, PollOutcome, PollPolicy, StatusPoller};
