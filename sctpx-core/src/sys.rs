//! C-ABI signatures of the SCTP socket API extension functions.
//!
//! These are resolved at runtime by [`crate::loader`] so that nothing links
//! against `libsctp` at build or load time.
#![allow(non_camel_case_types)]

use libc::{c_int, c_void};

/// Association identifier
#[cfg(any(target_os = "freebsd", target_os = "macos", target_os = "netbsd"))]
pub type sctp_assoc_t = u32;
#[cfg(not(any(target_os = "freebsd", target_os = "macos", target_os = "netbsd")))]
pub type sctp_assoc_t = i32;

/// Protocol number, also the socket option level
pub const IPPROTO_SCTP: c_int = 132;
pub const SOL_SCTP: c_int = IPPROTO_SCTP;

#[cfg(target_os = "freebsd")]
pub const SCTP_BINDX_ADD_ADDR: c_int = 0x0000_8001;
#[cfg(target_os = "freebsd")]
pub const SCTP_BINDX_REM_ADDR: c_int = 0x0000_8002;
#[cfg(not(target_os = "freebsd"))]
pub const SCTP_BINDX_ADD_ADDR: c_int = 0x01;
#[cfg(not(target_os = "freebsd"))]
pub const SCTP_BINDX_REM_ADDR: c_int = 0x02;

pub type sctp_getladdrs_func =
    unsafe extern "C" fn(sock: c_int, id: sctp_assoc_t, addrs: *mut *mut c_void) -> c_int;
pub type sctp_freeladdrs_func = unsafe extern "C" fn(addrs: *mut c_void) -> c_int;
pub type sctp_getpaddrs_func =
    unsafe extern "C" fn(sock: c_int, id: sctp_assoc_t, addrs: *mut *mut c_void) -> c_int;
pub type sctp_freepaddrs_func = unsafe extern "C" fn(addrs: *mut c_void) -> c_int;
pub type sctp_bindx_func =
    unsafe extern "C" fn(sock: c_int, addrs: *mut c_void, addrcnt: c_int, flags: c_int) -> c_int;
pub type sctp_peeloff_func = unsafe extern "C" fn(sock: c_int, id: sctp_assoc_t) -> c_int;
