//! Telephony media-stream leg.

pub mod messages;
mod server;

pub use server::{TelephonyReceiver, TelephonySender, split_socket};
