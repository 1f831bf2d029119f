//! Authenticated dispatch with single-flight credential renewal
//!
//! - [`taxonomy`] classifies completed exchanges
//! - [`transport`] attaches credentials and classifies results
//! - [`queue`] parks requests while a renewal runs
//! - [`renewer`] runs at most one renewal at a time
//! - [`dispatcher`] is what callers use

pub mod dispatcher;
pub mod queue;
pub mod renewer;
pub mod taxonomy;
pub mod transport;

pub use dispatcher::{decode_body, RequestDispatcher};
pub use queue::{CompletionReceiver, DrainOutcome, QueueEntry, RetryQueue};
pub use renewer::{RenewalState, RenewalTicket, SingleFlightRenewer};
pub use taxonomy::{classify, classify_unauthenticated, Classification};
pub use transport::TransportClient;
