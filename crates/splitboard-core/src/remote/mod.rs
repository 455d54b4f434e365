pub mod changes;
pub mod client;
pub mod worker;

pub use changes::ChangeEvent;
pub use client::RemoteClient;
pub use worker::{RemoteCommand, RemoteHandle, RemoteWorker};
