pub mod controller;
pub mod poller;
pub mod transport;

pub use controller::ChatController;
pub use poller::{PollHandle, PollTick, SessionPoller};
pub use transport::{ChatTransport, HttpTransport};
