use sctpx_core::options::{self, fallback, legacy, native, SctpOption, UNSUPPORTED};

#[test]
fn test_fallback_prefers_native() {
    assert!(fallback(Some(18), UNSUPPORTED) == 18);
    assert!(fallback(Some(0), legacy::MSG_EOF) == 0);
}

#[test]
fn test_fallback_substitutes_when_missing() {
    assert!(fallback(None, UNSUPPORTED) == -1);
    assert!(fallback(None, legacy::MSG_EOF) == legacy::MSG_EOF);
    assert!(fallback(None, legacy::MSG_UNORDERED) == legacy::MSG_UNORDERED);
}

#[test]
fn test_send_flags_alias_legacy_flags() {
    if native::SCTP_EOF.is_none() {
        assert!(options::SCTP_EOF == legacy::MSG_EOF);
    }
    if native::SCTP_UNORDERED.is_none() {
        assert!(options::SCTP_UNORDERED == legacy::MSG_UNORDERED);
    }
}

#[test]
fn test_missing_socket_options_are_sentinel() {
    let pairs = [
        (native::SCTP_EXPLICIT_EOR, options::SCTP_EXPLICIT_EOR),
        (native::SCTP_FRAGMENT_INTERLEAVE, options::SCTP_FRAGMENT_INTERLEAVE),
        (native::SCTP_SET_PEER_PRIMARY_ADDR, options::SCTP_SET_PEER_PRIMARY_ADDR),
    ];
    for (native, resolved) in pairs.iter() {
        match native {
            Some(code) => assert!(resolved == code),
            None => assert!(*resolved == UNSUPPORTED),
        }
    }
}

#[test]
fn test_option_reports_origin() {
    for option in SctpOption::ALL.iter() {
        // a fallback socket option is never usable, a native one always is
        if !option.is_send_flag() {
            assert!(option.is_native() == option.supported());
        }
    }
    assert!(SctpOption::Eof.is_send_flag());
    assert!(!SctpOption::SetPeerPrimaryAddr.is_send_flag());
}
