//! Packed `sockaddr` arrays, the format `sctp_bindx` consumes and
//! `sctp_getladdrs`/`sctp_getpaddrs` hand back.
//!
//! Records sit back to back with no alignment padding: a `sockaddr_in` for
//! IPv4, a `sockaddr_in6` for IPv6.

use crate::error::SCTPError;
use libc::{c_void, sa_family_t, sockaddr_in, sockaddr_in6, AF_INET, AF_INET6};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::{mem, ptr, slice};

const SOCKADDR_IN_LEN: usize = mem::size_of::<sockaddr_in>();
const SOCKADDR_IN6_LEN: usize = mem::size_of::<sockaddr_in6>();
// sa_family on Linux, sa_len + sa_family on the BSDs
const FAMILY_PREFIX_LEN: usize = 2;

/// Packs `addrs` into a single buffer
pub fn encode(addrs: &[SocketAddr]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(addrs.len() * SOCKADDR_IN6_LEN);
    for addr in addrs {
        match addr {
            SocketAddr::V4(v4) => buf.extend_from_slice(as_bytes(&sockaddr_v4(v4))),
            SocketAddr::V6(v6) => buf.extend_from_slice(as_bytes(&sockaddr_v6(v6))),
        }
    }
    buf
}

/// Unpacks `count` addresses from `buf`
pub fn decode(buf: &[u8], count: usize) -> Result<Vec<SocketAddr>, SCTPError> {
    let mut addrs = Vec::with_capacity(count.min(buf.len() / SOCKADDR_IN_LEN));
    let mut offset = 0;
    for _ in 0..count {
        let rest = buf.get(offset..).ok_or(SCTPError::TruncatedAddress)?;
        let (addr, len) = decode_one(rest)?;
        addrs.push(addr);
        offset += len;
    }
    Ok(addrs)
}

/// Unpacks `count` addresses from an array the OS allocated
///
/// # Safety
/// `ptr` must point at `count` packed `sockaddr_in`/`sockaddr_in6` records.
pub unsafe fn from_raw(ptr: *const c_void, count: usize) -> Result<Vec<SocketAddr>, SCTPError> {
    let base = ptr as *const u8;
    let mut addrs = Vec::new();
    let mut offset = 0;
    for _ in 0..count {
        let prefix = slice::from_raw_parts(base.add(offset), FAMILY_PREFIX_LEN);
        let len = record_len(family(prefix)?)?;
        let record = slice::from_raw_parts(base.add(offset), len);
        let (addr, _) = decode_one(record)?;
        addrs.push(addr);
        offset += len;
    }
    Ok(addrs)
}

fn decode_one(bytes: &[u8]) -> Result<(SocketAddr, usize), SCTPError> {
    if bytes.len() < FAMILY_PREFIX_LEN {
        return Err(SCTPError::TruncatedAddress);
    }
    let family = family(bytes)?;
    let len = record_len(family)?;
    if bytes.len() < len {
        return Err(SCTPError::TruncatedAddress);
    }

    let addr = if family == AF_INET {
        let sin: sockaddr_in = unsafe { ptr::read_unaligned(bytes.as_ptr() as *const sockaddr_in) };
        SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::from(sin.sin_addr.s_addr.to_ne_bytes()),
            u16::from_be(sin.sin_port),
        ))
    } else {
        let sin6: sockaddr_in6 =
            unsafe { ptr::read_unaligned(bytes.as_ptr() as *const sockaddr_in6) };
        SocketAddr::V6(SocketAddrV6::new(
            Ipv6Addr::from(sin6.sin6_addr.s6_addr),
            u16::from_be(sin6.sin6_port),
            sin6.sin6_flowinfo,
            sin6.sin6_scope_id,
        ))
    };
    Ok((addr, len))
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
fn family(prefix: &[u8]) -> Result<i32, SCTPError> {
    Ok(prefix[1] as i32)
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
fn family(prefix: &[u8]) -> Result<i32, SCTPError> {
    Ok(sa_family_t::from_ne_bytes([prefix[0], prefix[1]]) as i32)
}

fn record_len(family: i32) -> Result<usize, SCTPError> {
    match family {
        AF_INET => Ok(SOCKADDR_IN_LEN),
        AF_INET6 => Ok(SOCKADDR_IN6_LEN),
        other => Err(SCTPError::UnsupportedAddressFamily(other)),
    }
}

fn sockaddr_v4(addr: &SocketAddrV4) -> sockaddr_in {
    let mut sin: sockaddr_in = unsafe { mem::zeroed() };
    sin.sin_family = AF_INET as sa_family_t;
    sin.sin_port = addr.port().to_be();
    sin.sin_addr.s_addr = u32::from_ne_bytes(addr.ip().octets());
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))]
    {
        sin.sin_len = SOCKADDR_IN_LEN as u8;
    }
    sin
}

fn sockaddr_v6(addr: &SocketAddrV6) -> sockaddr_in6 {
    let mut sin6: sockaddr_in6 = unsafe { mem::zeroed() };
    sin6.sin6_family = AF_INET6 as sa_family_t;
    sin6.sin6_port = addr.port().to_be();
    sin6.sin6_flowinfo = addr.flowinfo();
    sin6.sin6_addr.s6_addr = addr.ip().octets();
    sin6.sin6_scope_id = addr.scope_id();
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))]
    {
        sin6.sin6_len = SOCKADDR_IN6_LEN as u8;
    }
    sin6
}

// sockaddr_in and sockaddr_in6 have no implicit padding
fn as_bytes<T>(value: &T) -> &[u8] {
    unsafe { slice::from_raw_parts(value as *const T as *const u8, mem::size_of::<T>()) }
}
