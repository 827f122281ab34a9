use crate::error::SCTPError;
use crate::loader::{socket_extension, SocketExtension};
use crate::options::SctpOption;
use crate::sys::{sctp_assoc_t, IPPROTO_SCTP, SCTP_BINDX_ADD_ADDR, SCTP_BINDX_REM_ADDR, SOL_SCTP};
use libc::{c_int, c_void, socklen_t};
use log::debug;
use std::net::{IpAddr, SocketAddr};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::{fmt, mem};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    Ipv4,
    Ipv6,
}

impl Domain {
    fn raw(&self) -> c_int {
        match self {
            Domain::Ipv4 => libc::AF_INET,
            Domain::Ipv6 => libc::AF_INET6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    /// TCP-like, one association per socket
    OneToOne,
    /// UDP-like, many associations multiplexed on one socket
    OneToMany,
}

impl Style {
    fn raw(&self) -> c_int {
        match self {
            Style::OneToOne => libc::SOCK_STREAM,
            Style::OneToMany => libc::SOCK_SEQPACKET,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindxOp {
    Add,
    Remove,
}

impl BindxOp {
    pub fn flags(&self) -> c_int {
        match self {
            BindxOp::Add => SCTP_BINDX_ADD_ADDR,
            BindxOp::Remove => SCTP_BINDX_REM_ADDR,
        }
    }
}

/// An SCTP socket
///
/// Multi-address operations go through the dynamically resolved extension
/// functions and fail with [`SCTPError::Unavailable`] when those are missing.
pub struct SctpSocket {
    fd: OwnedFd,
    extension: &'static SocketExtension,
}

impl fmt::Debug for SctpSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SctpSocket").field("fd", &self.fd).finish()
    }
}

impl SctpSocket {
    /// Creates a new socket backed by the process-wide extension
    pub fn open(domain: Domain, style: Style) -> Result<Self, SCTPError> {
        Self::open_with(socket_extension(), domain, style)
    }

    pub fn open_with(
        extension: &'static SocketExtension,
        domain: Domain,
        style: Style,
    ) -> Result<Self, SCTPError> {
        let fd = unsafe { libc::socket(domain.raw(), style.raw(), IPPROTO_SCTP) };
        if fd < 0 {
            return Err(SCTPError::last_os_error("socket"));
        }
        debug!("opened {:?} {:?} SCTP socket {}", domain, style, fd);
        Ok(Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
            extension,
        })
    }

    /// Takes ownership of an existing SCTP descriptor
    ///
    /// # Safety
    /// `fd` must be an open SCTP socket not owned elsewhere.
    pub unsafe fn from_raw_fd_with(fd: RawFd, extension: &'static SocketExtension) -> Self {
        Self {
            fd: OwnedFd::from_raw_fd(fd),
            extension,
        }
    }

    pub fn bindx(&self, addrs: &[SocketAddr], op: BindxOp) -> Result<(), SCTPError> {
        self.extension.bindx(self.as_raw_fd(), addrs, op.flags())
    }

    /// Binds every address in `ips` on the same `port`
    pub fn bind_all(&self, ips: &[IpAddr], port: u16) -> Result<(), SCTPError> {
        let addrs: Vec<SocketAddr> = ips.iter().map(|ip| SocketAddr::new(*ip, port)).collect();
        self.bindx(&addrs, BindxOp::Add)
    }

    /// Local addresses; `assoc` is ignored on one-to-one sockets
    pub fn local_addrs(&self, assoc: sctp_assoc_t) -> Result<Vec<SocketAddr>, SCTPError> {
        self.extension.local_addrs(self.as_raw_fd(), assoc)
    }

    pub fn peer_addrs(&self, assoc: sctp_assoc_t) -> Result<Vec<SocketAddr>, SCTPError> {
        self.extension.peer_addrs(self.as_raw_fd(), assoc)
    }

    /// Moves `assoc` onto a new one-to-one socket
    pub fn peeloff(&self, assoc: sctp_assoc_t) -> Result<SctpSocket, SCTPError> {
        let fd = self.extension.peeloff(self.as_raw_fd(), assoc)?;
        debug!("association {} peeled off onto fd {}", assoc, fd);
        Ok(unsafe { Self::from_raw_fd_with(fd, self.extension) })
    }

    pub fn set_explicit_eor(&self, enable: bool) -> Result<(), SCTPError> {
        set_int_option(self.as_raw_fd(), SctpOption::ExplicitEor, enable as c_int)
    }

    pub fn set_fragment_interleave(&self, level: i32) -> Result<(), SCTPError> {
        set_int_option(self.as_raw_fd(), SctpOption::FragmentInterleave, level)
    }

    /// Asks the peer of `assoc` to use `addr` as its primary destination
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub fn set_peer_primary_addr(
        &self,
        assoc: sctp_assoc_t,
        addr: SocketAddr,
    ) -> Result<(), SCTPError> {
        let option = SctpOption::SetPeerPrimaryAddr;
        let code = option
            .checked()
            .ok_or(SCTPError::UnsupportedOption(option.name()))?;

        let mut prim: SetPeerPrim = unsafe { mem::zeroed() };
        prim.sspp_assoc_id = assoc;
        let encoded = crate::addrs::encode(&[addr]);
        unsafe {
            std::ptr::copy_nonoverlapping(
                encoded.as_ptr(),
                std::ptr::addr_of_mut!(prim.sspp_addr) as *mut u8,
                encoded.len(),
            );
        }
        setsockopt(self.as_raw_fd(), code, &prim, option.name())
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    pub fn set_peer_primary_addr(
        &self,
        _assoc: sctp_assoc_t,
        _addr: SocketAddr,
    ) -> Result<(), SCTPError> {
        Err(SCTPError::UnsupportedOption(
            SctpOption::SetPeerPrimaryAddr.name(),
        ))
    }
}

impl AsRawFd for SctpSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for SctpSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl From<SctpSocket> for OwnedFd {
    fn from(socket: SctpSocket) -> Self {
        socket.fd
    }
}

// struct sctp_setpeerprim from linux/sctp.h
#[cfg(any(target_os = "linux", target_os = "android"))]
#[repr(C, packed(4))]
struct SetPeerPrim {
    sspp_assoc_id: sctp_assoc_t,
    sspp_addr: libc::sockaddr_storage,
}

/// Sets an integer option, refusing sentinel codes before any system call
fn set_int_option(fd: RawFd, option: SctpOption, value: c_int) -> Result<(), SCTPError> {
    let code = option
        .checked()
        .ok_or(SCTPError::UnsupportedOption(option.name()))?;
    setsockopt(fd, code, &value, option.name())
}

fn setsockopt<T>(fd: RawFd, code: c_int, value: &T, name: &'static str) -> Result<(), SCTPError> {
    let ret = unsafe {
        libc::setsockopt(
            fd,
            SOL_SCTP,
            code,
            value as *const T as *const c_void,
            mem::size_of::<T>() as socklen_t,
        )
    };
    if ret < 0 {
        return Err(SCTPError::last_os_error(name));
    }
    Ok(())
}
