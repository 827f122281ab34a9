//! Runtime resolution of the SCTP socket API extension functions.
//!
//! Nothing here links against `libsctp`. The library is opened with
//! `dlopen`-style loading and each of the six entry points is looked up on its
//! own. Whatever is missing is simply reported as unavailable; callers check
//! [`SocketExtension::has`] or get [`SCTPError::Unavailable`] back from the
//! operation itself.

use crate::config::LoaderConfig;
use crate::error::SCTPError;
use crate::sys::{
    sctp_bindx_func, sctp_freeladdrs_func, sctp_freepaddrs_func, sctp_getladdrs_func,
    sctp_getpaddrs_func, sctp_peeloff_func,
};
use crate::{addrs, sys::sctp_assoc_t};
use libc::{c_int, c_void};
use libloading::Library;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use std::{net::SocketAddr, os::unix::io::RawFd, ptr};

static EXTENSION: OnceCell<SocketExtension> = OnceCell::new();

/// The process-wide extension, loaded on first use from [`LoaderConfig::from_env`]
///
/// Never fails: if no library can be opened every capability is just absent.
pub fn socket_extension() -> &'static SocketExtension {
    EXTENSION.get_or_init(|| SocketExtension::load_or_unavailable(&LoaderConfig::from_env()))
}

/// Loads the process-wide extension from `config` unless something already did
pub fn init_socket_extension(config: &LoaderConfig) -> &'static SocketExtension {
    EXTENSION.get_or_init(|| SocketExtension::load_or_unavailable(config))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    GetLaddrs,
    FreeLaddrs,
    GetPaddrs,
    FreePaddrs,
    Bindx,
    Peeloff,
}

impl Symbol {
    pub const ALL: [Symbol; 6] = [
        Symbol::GetLaddrs,
        Symbol::FreeLaddrs,
        Symbol::GetPaddrs,
        Symbol::FreePaddrs,
        Symbol::Bindx,
        Symbol::Peeloff,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Symbol::GetLaddrs => "sctp_getladdrs",
            Symbol::FreeLaddrs => "sctp_freeladdrs",
            Symbol::GetPaddrs => "sctp_getpaddrs",
            Symbol::FreePaddrs => "sctp_freepaddrs",
            Symbol::Bindx => "sctp_bindx",
            Symbol::Peeloff => "sctp_peeloff",
        }
    }

    fn c_name(&self) -> &'static [u8] {
        match self {
            Symbol::GetLaddrs => b"sctp_getladdrs\0",
            Symbol::FreeLaddrs => b"sctp_freeladdrs\0",
            Symbol::GetPaddrs => b"sctp_getpaddrs\0",
            Symbol::FreePaddrs => b"sctp_freepaddrs\0",
            Symbol::Bindx => b"sctp_bindx\0",
            Symbol::Peeloff => b"sctp_peeloff\0",
        }
    }
}

/// A feature backed by one or more extension functions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    LocalAddrs,
    PeerAddrs,
    Bindx,
    Peeloff,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::LocalAddrs,
        Capability::PeerAddrs,
        Capability::Bindx,
        Capability::Peeloff,
    ];

    /// Symbols that must all resolve for this capability
    pub fn symbols(&self) -> &'static [Symbol] {
        match self {
            Capability::LocalAddrs => &[Symbol::GetLaddrs, Symbol::FreeLaddrs],
            Capability::PeerAddrs => &[Symbol::GetPaddrs, Symbol::FreePaddrs],
            Capability::Bindx => &[Symbol::Bindx],
            Capability::Peeloff => &[Symbol::Peeloff],
        }
    }
}

/// Resolved extension functions
///
/// The libraries they came from stay open for as long as this value lives.
#[derive(Debug, Default)]
pub struct SocketExtension {
    sources: Vec<String>,
    _libraries: Vec<Library>,
    getladdrs: Option<sctp_getladdrs_func>,
    freeladdrs: Option<sctp_freeladdrs_func>,
    getpaddrs: Option<sctp_getpaddrs_func>,
    freepaddrs: Option<sctp_freepaddrs_func>,
    bindx: Option<sctp_bindx_func>,
    peeloff: Option<sctp_peeloff_func>,
}

impl SocketExtension {
    /// An extension with nothing resolved
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Opens the configured candidates and resolves what they export
    ///
    /// Candidates are tried in order; the process image first if the config
    /// asks for it. Loading stops once every symbol is resolved or at the
    /// first library that opens. Fails only when no candidate supplied
    /// anything.
    pub fn load(config: &LoaderConfig) -> Result<Self, SCTPError> {
        let mut extension = Self::unavailable();
        let mut failures = Vec::new();

        if config.searches_process() {
            extension.search_process(&mut failures);
        }

        if !extension.is_complete() {
            for path in config.libraries() {
                let lib = match unsafe { Library::new(path) } {
                    Ok(lib) => lib,
                    Err(e) => {
                        debug!("cannot open {}: {}", path.display(), e);
                        failures.push(format!("{}: {}", path.display(), e));
                        continue;
                    }
                };
                extension.resolve_from(lib, path.display().to_string(), true);
                break;
            }
        }

        if extension.sources.is_empty() {
            if failures.is_empty() {
                failures.push("no candidate libraries configured".to_owned());
            }
            return Err(SCTPError::LibraryLoadError(failures.join("; ")));
        }

        info!(
            "SCTP socket extension loaded from {} ({} of {} functions)",
            extension.sources.join(", "),
            Symbol::ALL.len() - extension.missing().len(),
            Symbol::ALL.len()
        );
        Ok(extension)
    }

    /// Like [`SocketExtension::load`] but degrades to an empty extension
    pub fn load_or_unavailable(config: &LoaderConfig) -> Self {
        match Self::load(config) {
            Ok(extension) => extension,
            Err(e) => {
                warn!("SCTP socket extension unavailable: {}", e);
                Self::unavailable()
            }
        }
    }

    fn search_process(&mut self, failures: &mut Vec<String>) {
        let lib: Library = libloading::os::unix::Library::this().into();
        if !self.resolve_from(lib, "<process>".to_owned(), false) {
            failures.push("<process>: no SCTP extension functions".to_owned());
        }
    }

    /// Fills in still-missing functions from `lib`. The library is kept open
    /// if it supplied any of them, or unconditionally with `keep_if_empty`.
    fn resolve_from(&mut self, lib: Library, source: String, keep_if_empty: bool) -> bool {
        let before = self.missing().len();
        self.getladdrs = self.getladdrs.or_else(|| lookup(&lib, Symbol::GetLaddrs));
        self.freeladdrs = self.freeladdrs.or_else(|| lookup(&lib, Symbol::FreeLaddrs));
        self.getpaddrs = self.getpaddrs.or_else(|| lookup(&lib, Symbol::GetPaddrs));
        self.freepaddrs = self.freepaddrs.or_else(|| lookup(&lib, Symbol::FreePaddrs));
        self.bindx = self.bindx.or_else(|| lookup(&lib, Symbol::Bindx));
        self.peeloff = self.peeloff.or_else(|| lookup(&lib, Symbol::Peeloff));

        let found = before > self.missing().len();
        if found || keep_if_empty {
            self.sources.push(source);
            self._libraries.push(lib);
        }
        found
    }

    /// Where the functions were resolved from
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn has(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::GetLaddrs => self.getladdrs.is_some(),
            Symbol::FreeLaddrs => self.freeladdrs.is_some(),
            Symbol::GetPaddrs => self.getpaddrs.is_some(),
            Symbol::FreePaddrs => self.freepaddrs.is_some(),
            Symbol::Bindx => self.bindx.is_some(),
            Symbol::Peeloff => self.peeloff.is_some(),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        capability.symbols().iter().all(|s| self.has(*s))
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|c| self.supports(*c))
            .collect()
    }

    pub fn missing(&self) -> Vec<&'static str> {
        Symbol::ALL
            .iter()
            .filter(|s| !self.has(**s))
            .map(|s| s.name())
            .collect()
    }

    /// True only when all six functions resolved
    pub fn is_complete(&self) -> bool {
        Symbol::ALL.iter().all(|s| self.has(*s))
    }


    /// Local addresses of `fd`, or of association `assoc` on a one-to-many socket
    pub fn local_addrs(
        &self,
        fd: RawFd,
        assoc: sctp_assoc_t,
    ) -> Result<Vec<SocketAddr>, SCTPError> {
        let get = self
            .getladdrs
            .ok_or(SCTPError::Unavailable(Symbol::GetLaddrs.name()))?;
        let free = self
            .freeladdrs
            .ok_or(SCTPError::Unavailable(Symbol::FreeLaddrs.name()))?;
        retrieve(fd, assoc, get, free, Symbol::GetLaddrs.name())
    }

    /// Peer addresses of association `assoc`
    pub fn peer_addrs(
        &self,
        fd: RawFd,
        assoc: sctp_assoc_t,
    ) -> Result<Vec<SocketAddr>, SCTPError> {
        let get = self
            .getpaddrs
            .ok_or(SCTPError::Unavailable(Symbol::GetPaddrs.name()))?;
        let free = self
            .freepaddrs
            .ok_or(SCTPError::Unavailable(Symbol::FreePaddrs.name()))?;
        retrieve(fd, assoc, get, free, Symbol::GetPaddrs.name())
    }

    /// Adds or removes local addresses; `flags` is `SCTP_BINDX_ADD_ADDR` or `SCTP_BINDX_REM_ADDR`
    pub fn bindx(&self, fd: RawFd, addrs: &[SocketAddr], flags: c_int) -> Result<(), SCTPError> {
        let bindx = self
            .bindx
            .ok_or(SCTPError::Unavailable(Symbol::Bindx.name()))?;
        if addrs.is_empty() {
            return Err(SCTPError::EmptyAddressList);
        }

        let mut buf = addrs::encode(addrs);
        debug!("{} {} address(es) on fd {}", Symbol::Bindx.name(), addrs.len(), fd);
        let ret = unsafe { bindx(fd, buf.as_mut_ptr() as *mut c_void, addrs.len() as c_int, flags) };
        if ret < 0 {
            return Err(SCTPError::last_os_error(Symbol::Bindx.name()));
        }
        Ok(())
    }

    /// Branches association `assoc` off into a new descriptor owned by the caller
    pub fn peeloff(&self, fd: RawFd, assoc: sctp_assoc_t) -> Result<RawFd, SCTPError> {
        let peeloff = self
            .peeloff
            .ok_or(SCTPError::Unavailable(Symbol::Peeloff.name()))?;
        let new_fd = unsafe { peeloff(fd, assoc) };
        if new_fd < 0 {
            return Err(SCTPError::last_os_error(Symbol::Peeloff.name()));
        }
        Ok(new_fd)
    }
}

fn lookup<T: Copy>(lib: &Library, symbol: Symbol) -> Option<T> {
    match unsafe { lib.get::<T>(symbol.c_name()) } {
        Ok(f) => {
            debug!("resolved {}", symbol.name());
            Some(*f)
        }
        Err(e) => {
            debug!("{} not resolved: {}", symbol.name(), e);
            None
        }
    }
}

fn retrieve(
    fd: RawFd,
    assoc: sctp_assoc_t,
    get: sctp_getladdrs_func,
    free: sctp_freeladdrs_func,
    call: &'static str,
) -> Result<Vec<SocketAddr>, SCTPError> {
    let mut raw: *mut c_void = ptr::null_mut();
    let count = unsafe { get(fd, assoc, &mut raw) };
    if count < 0 {
        return Err(SCTPError::last_os_error(call));
    }
    if raw.is_null() {
        if count > 0 {
            warn!("{} reported {} address(es) but returned no array", call, count);
            return Err(SCTPError::TruncatedAddress);
        }
        return Ok(Vec::new());
    }

    let addrs = unsafe { addrs::from_raw(raw, count as usize) };
    unsafe { free(raw) };
    addrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    thread_local! {
        static RECORDS: RefCell<Vec<u8>> = RefCell::new(Vec::new());
        static REPORTED: Cell<c_int> = Cell::new(0);
        static FREED: Cell<usize> = Cell::new(0);
        static BOUND: RefCell<Option<(Vec<u8>, c_int, c_int)>> = RefCell::new(None);
    }

    unsafe extern "C" fn fake_getaddrs(
        _sock: c_int,
        _id: sctp_assoc_t,
        addrs: *mut *mut c_void,
    ) -> c_int {
        RECORDS.with(|r| *addrs = r.borrow_mut().as_mut_ptr() as *mut c_void);
        REPORTED.with(|c| c.get())
    }

    unsafe extern "C" fn fake_getaddrs_null(
        _sock: c_int,
        _id: sctp_assoc_t,
        _addrs: *mut *mut c_void,
    ) -> c_int {
        REPORTED.with(|c| c.get())
    }

    unsafe extern "C" fn fake_freeaddrs(_addrs: *mut c_void) -> c_int {
        FREED.with(|f| f.set(f.get() + 1));
        0
    }

    unsafe extern "C" fn fake_bindx(
        _sock: c_int,
        addrs: *mut c_void,
        addrcnt: c_int,
        flags: c_int,
    ) -> c_int {
        let decoded = addrs::from_raw(addrs, addrcnt as usize).unwrap_or_default();
        let len = addrs::encode(&decoded).len();
        let bytes = std::slice::from_raw_parts(addrs as *const u8, len).to_vec();
        BOUND.with(|b| *b.borrow_mut() = Some((bytes, addrcnt, flags)));
        0
    }

    fn fake_extension() -> SocketExtension {
        SocketExtension {
            getladdrs: Some(fake_getaddrs as sctp_getladdrs_func),
            freeladdrs: Some(fake_freeaddrs as sctp_freeladdrs_func),
            getpaddrs: Some(fake_getaddrs_null as sctp_getpaddrs_func),
            freepaddrs: Some(fake_freeaddrs as sctp_freepaddrs_func),
            bindx: Some(fake_bindx as sctp_bindx_func),
            ..SocketExtension::unavailable()
        }
    }

    fn reset(records: Vec<u8>, reported: c_int) {
        RECORDS.with(|r| *r.borrow_mut() = records);
        REPORTED.with(|c| c.set(reported));
        FREED.with(|f| f.set(0));
    }

    fn freed() -> usize {
        FREED.with(|f| f.get())
    }

    #[test]
    fn test_local_addrs_decoded_and_freed() {
        let expected: Vec<SocketAddr> = vec![
            "10.1.1.1:7000".parse().unwrap(),
            "[2001:db8::7]:7000".parse().unwrap(),
        ];
        reset(addrs::encode(&expected), 2);

        let extension = fake_extension();
        assert_eq!(extension.local_addrs(3, 0).unwrap(), expected);
        assert_eq!(freed(), 1);
    }

    #[test]
    fn test_array_freed_when_decoding_fails() {
        // AF_UNSPEC record
        reset(vec![0u8; 32], 1);

        let extension = fake_extension();
        assert!(matches!(
            extension.local_addrs(3, 0),
            Err(SCTPError::UnsupportedAddressFamily(_))
        ));
        assert_eq!(freed(), 1);
    }

    #[test]
    fn test_empty_array_still_freed() {
        reset(Vec::with_capacity(16), 0);

        let extension = fake_extension();
        assert!(extension.local_addrs(3, 0).unwrap().is_empty());
        assert_eq!(freed(), 1);
    }

    #[test]
    fn test_count_without_array_is_an_error() {
        reset(Vec::new(), 2);

        let extension = fake_extension();
        assert!(matches!(
            extension.peer_addrs(3, 1),
            Err(SCTPError::TruncatedAddress)
        ));
        assert_eq!(freed(), 0);

        REPORTED.with(|c| c.set(0));
        assert!(extension.peer_addrs(3, 1).unwrap().is_empty());
        assert_eq!(freed(), 0);
    }

    #[test]
    fn test_bindx_hands_packed_addrs_to_os() {
        let addrs: Vec<SocketAddr> = vec![
            "192.0.2.1:9000".parse().unwrap(),
            "[2001:db8::1]:9000".parse().unwrap(),
        ];
        let extension = fake_extension();
        extension
            .bindx(3, &addrs, crate::sys::SCTP_BINDX_ADD_ADDR)
            .unwrap();

        let (bytes, count, flags) = BOUND.with(|b| b.borrow_mut().take()).unwrap();
        assert_eq!(bytes, addrs::encode(&addrs));
        assert_eq!(count, 2);
        assert_eq!(flags, crate::sys::SCTP_BINDX_ADD_ADDR);
    }

    #[test]
    fn test_capability_symbols_cover_all() {
        let mut symbols: Vec<Symbol> = Capability::ALL
            .iter()
            .flat_map(|c| c.symbols().iter().copied())
            .collect();
        symbols.dedup();
        assert_eq!(symbols, Symbol::ALL.to_vec());
    }

    #[test]
    fn test_c_names_are_nul_terminated() {
        for symbol in Symbol::ALL.iter() {
            let c_name = symbol.c_name();
            assert_eq!(&c_name[..c_name.len() - 1], symbol.name().as_bytes());
            assert_eq!(c_name[c_name.len() - 1], 0);
        }
    }

    #[test]
    fn test_unavailable_has_nothing() {
        let extension = SocketExtension::unavailable();
        assert!(!extension.is_complete());
        assert!(extension.capabilities().is_empty());
        assert_eq!(extension.missing().len(), 6);
        assert!(extension.sources().is_empty());
    }
}
