//! SCTP socket API extensions resolved at runtime. Unix targets only.
#![cfg(unix)]

pub mod addrs;
pub mod config;
pub mod error;
pub mod loader;
pub mod options;
pub mod socket;
pub mod sys;

pub use config::LoaderConfig;
pub use error::SCTPError;
pub use loader::{init_socket_extension, socket_extension, Capability, SocketExtension, Symbol};
pub use options::SctpOption;
pub use socket::{BindxOp, Domain, SctpSocket, Style};
