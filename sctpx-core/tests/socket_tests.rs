#![cfg(unix)]

use sctpx_core::{BindxOp, Domain, SCTPError, SctpSocket, SocketExtension, Style};
use std::net::IpAddr;

fn unavailable() -> &'static SocketExtension {
    Box::leak(Box::new(SocketExtension::unavailable()))
}

// Kernels without SCTP refuse the socket itself; nothing else to check then.
fn open(domain: Domain, style: Style) -> Option<SctpSocket> {
    match SctpSocket::open_with(unavailable(), domain, style) {
        Ok(socket) => Some(socket),
        Err(SCTPError::Os { call, .. }) => {
            assert!(call == "socket");
            None
        }
        Err(e) => panic!("unexpected {:?}", e),
    }
}

#[test]
fn test_socket_without_extension() {
    let socket = match open(Domain::Ipv4, Style::OneToMany) {
        Some(socket) => socket,
        None => return,
    };

    let ips: Vec<IpAddr> = vec!["127.0.0.1".parse().unwrap()];
    assert!(matches!(
        socket.bind_all(&ips, 0),
        Err(SCTPError::Unavailable("sctp_bindx"))
    ));
    assert!(matches!(
        socket.bindx(&[], BindxOp::Remove),
        Err(SCTPError::Unavailable("sctp_bindx"))
    ));
    assert!(matches!(socket.peeloff(1), Err(SCTPError::Unavailable(_))));
    assert!(matches!(socket.local_addrs(0), Err(SCTPError::Unavailable(_))));
}

#[test]
fn test_unsupported_options_are_refused() {
    let socket = match open(Domain::Ipv6, Style::OneToOne) {
        Some(socket) => socket,
        None => return,
    };

    if sctpx_core::options::SCTP_EXPLICIT_EOR == sctpx_core::options::UNSUPPORTED {
        assert!(matches!(
            socket.set_explicit_eor(true),
            Err(SCTPError::UnsupportedOption("SCTP_EXPLICIT_EOR"))
        ));
    }
    if sctpx_core::options::SCTP_FRAGMENT_INTERLEAVE != sctpx_core::options::UNSUPPORTED {
        assert!(socket.set_fragment_interleave(1).is_ok());
    }
}
