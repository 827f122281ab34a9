//! Send flags and socket option codes that older SCTP stacks lack.
//!
//! Every code resolves to the platform's own value when its headers define
//! one. Otherwise the two send flags alias the legacy message flags and the
//! socket options collapse to [`UNSUPPORTED`].

use libc::c_int;

/// Sentinel for an option the platform cannot honour
pub const UNSUPPORTED: c_int = -1;

/// Message flags used in place of the send flags by stacks predating the socket API draft
pub mod legacy {
    use libc::c_int;

    pub const MSG_EOF: c_int = 0x200;
    pub const MSG_UNORDERED: c_int = 0x400;
}

/// Values from the platform's own SCTP headers, `None` where they are absent
pub mod native {
    use libc::c_int;

    #[cfg(any(target_os = "linux", target_os = "android"))]
    mod values {
        use libc::c_int;

        pub const SCTP_EOF: Option<c_int> = Some(libc::MSG_FIN);
        pub const SCTP_UNORDERED: Option<c_int> = Some(0x01);
        pub const SCTP_EXPLICIT_EOR: Option<c_int> = None;
        pub const SCTP_FRAGMENT_INTERLEAVE: Option<c_int> = Some(18);
        pub const SCTP_SET_PEER_PRIMARY_ADDR: Option<c_int> = Some(5);
    }

    #[cfg(target_os = "freebsd")]
    mod values {
        use libc::c_int;

        pub const SCTP_EOF: Option<c_int> = Some(0x0100);
        pub const SCTP_UNORDERED: Option<c_int> = Some(0x0400);
        pub const SCTP_EXPLICIT_EOR: Option<c_int> = Some(0x001b);
        pub const SCTP_FRAGMENT_INTERLEAVE: Option<c_int> = Some(0x0010);
        pub const SCTP_SET_PEER_PRIMARY_ADDR: Option<c_int> = Some(0x0006);
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    mod values {
        use libc::c_int;

        pub const SCTP_EOF: Option<c_int> = None;
        pub const SCTP_UNORDERED: Option<c_int> = None;
        pub const SCTP_EXPLICIT_EOR: Option<c_int> = None;
        pub const SCTP_FRAGMENT_INTERLEAVE: Option<c_int> = None;
        pub const SCTP_SET_PEER_PRIMARY_ADDR: Option<c_int> = None;
    }

    pub const SCTP_EOF: Option<c_int> = values::SCTP_EOF;
    pub const SCTP_UNORDERED: Option<c_int> = values::SCTP_UNORDERED;
    pub const SCTP_EXPLICIT_EOR: Option<c_int> = values::SCTP_EXPLICIT_EOR;
    pub const SCTP_FRAGMENT_INTERLEAVE: Option<c_int> = values::SCTP_FRAGMENT_INTERLEAVE;
    pub const SCTP_SET_PEER_PRIMARY_ADDR: Option<c_int> = values::SCTP_SET_PEER_PRIMARY_ADDR;
}

/// Picks the native value if there is one, `substitute` otherwise
pub const fn fallback(native: Option<c_int>, substitute: c_int) -> c_int {
    match native {
        Some(code) => code,
        None => substitute,
    }
}

pub const SCTP_EOF: c_int = fallback(native::SCTP_EOF, legacy::MSG_EOF);
pub const SCTP_UNORDERED: c_int = fallback(native::SCTP_UNORDERED, legacy::MSG_UNORDERED);
pub const SCTP_EXPLICIT_EOR: c_int = fallback(native::SCTP_EXPLICIT_EOR, UNSUPPORTED);
pub const SCTP_FRAGMENT_INTERLEAVE: c_int =
    fallback(native::SCTP_FRAGMENT_INTERLEAVE, UNSUPPORTED);
pub const SCTP_SET_PEER_PRIMARY_ADDR: c_int =
    fallback(native::SCTP_SET_PEER_PRIMARY_ADDR, UNSUPPORTED);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SctpOption {
    Eof,
    Unordered,
    ExplicitEor,
    FragmentInterleave,
    SetPeerPrimaryAddr,
}

impl SctpOption {
    pub const ALL: [SctpOption; 5] = [
        SctpOption::Eof,
        SctpOption::Unordered,
        SctpOption::ExplicitEor,
        SctpOption::FragmentInterleave,
        SctpOption::SetPeerPrimaryAddr,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SctpOption::Eof => "SCTP_EOF",
            SctpOption::Unordered => "SCTP_UNORDERED",
            SctpOption::ExplicitEor => "SCTP_EXPLICIT_EOR",
            SctpOption::FragmentInterleave => "SCTP_FRAGMENT_INTERLEAVE",
            SctpOption::SetPeerPrimaryAddr => "SCTP_SET_PEER_PRIMARY_ADDR",
        }
    }

    /// Raw code, possibly [`UNSUPPORTED`]
    pub fn code(&self) -> c_int {
        match self {
            SctpOption::Eof => SCTP_EOF,
            SctpOption::Unordered => SCTP_UNORDERED,
            SctpOption::ExplicitEor => SCTP_EXPLICIT_EOR,
            SctpOption::FragmentInterleave => SCTP_FRAGMENT_INTERLEAVE,
            SctpOption::SetPeerPrimaryAddr => SCTP_SET_PEER_PRIMARY_ADDR,
        }
    }

    /// Whether the value came from the platform rather than a fallback
    pub fn is_native(&self) -> bool {
        match self {
            SctpOption::Eof => native::SCTP_EOF.is_some(),
            SctpOption::Unordered => native::SCTP_UNORDERED.is_some(),
            SctpOption::ExplicitEor => native::SCTP_EXPLICIT_EOR.is_some(),
            SctpOption::FragmentInterleave => native::SCTP_FRAGMENT_INTERLEAVE.is_some(),
            SctpOption::SetPeerPrimaryAddr => native::SCTP_SET_PEER_PRIMARY_ADDR.is_some(),
        }
    }

    /// Send flags go in `sinfo_flags`, the rest are `setsockopt` names
    pub fn is_send_flag(&self) -> bool {
        matches!(self, SctpOption::Eof | SctpOption::Unordered)
    }

    pub fn supported(&self) -> bool {
        self.code() != UNSUPPORTED
    }

    /// The code, or `None` when it is the unsupported sentinel
    pub fn checked(&self) -> Option<c_int> {
        if self.supported() {
            Some(self.code())
        } else {
            None
        }
    }
}
