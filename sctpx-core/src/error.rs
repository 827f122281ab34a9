use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SCTPError {
    #[error("unable to load SCTP socket extension library: {0}")]
    LibraryLoadError(String),
    #[error("{0} is not available on this platform")]
    Unavailable(&'static str),
    #[error("socket option {0} is not supported on this platform")]
    UnsupportedOption(&'static str),
    #[error("unsupported address family {0}")]
    UnsupportedAddressFamily(i32),
    #[error("truncated socket address list")]
    TruncatedAddress,
    #[error("no addresses given")]
    EmptyAddressList,
    #[error("{call} failed: {source}")]
    Os {
        call: &'static str,
        #[source]
        source: io::Error,
    },
}

impl SCTPError {
    /// Wraps the current `errno` for a failed call
    pub(crate) fn last_os_error(call: &'static str) -> Self {
        SCTPError::Os {
            call,
            source: io::Error::last_os_error(),
        }
    }
}
