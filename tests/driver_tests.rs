//! Integration tests for the modem driver's retry and reset policy.

use rs_dispenser::{
    commands::AtCommand,
    config::TimingConfig,
    hal::{MockDelay, MockSystem, MockTransport},
    DriverError, ModemDriver, ReplyPattern, TransportError,
};

fn driver(transport: MockTransport) -> ModemDriver<MockTransport, MockDelay, MockSystem> {
    ModemDriver::new(
        transport,
        MockDelay::new(),
        MockSystem::new(),
        &TimingConfig::default(),
    )
}

#[test]
fn retryable_lines_reread_without_resending() {
    // Noise of every kind before the success token: the command line must
    // go out exactly once, no matter how many lines it takes.
    let mut transport = MockTransport::new();
    for line in ["AT+CWJAP=\"net\",\"pwd\"", "", "WIFI CONNECTED", "WIFI GOT IP", "OK"] {
        transport.push_reply(line);
    }

    let mut d = driver(transport);
    d.execute(&AtCommand::JoinNetwork {
        ssid: "net",
        password: "pwd",
    })
    .unwrap();

    assert_eq!(d.transport().sent_lines(), ["AT+CWJAP=\"net\",\"pwd\""]);
    assert_eq!(d.transport().remaining_replies(), 0);
}

#[test]
fn every_retryable_line_is_followed_by_the_fixed_delay() {
    let mut transport = MockTransport::new();
    for line in ["x", "y", "ready"] {
        transport.push_reply(line);
    }

    let mut d = driver(transport);
    d.execute(&AtCommand::Reset).unwrap();

    // Two retryable lines, 2 s each; the success line ends the loop with
    // no further delay.
    assert_eq!(d.delay().calls(), [2_000, 2_000]);
}

#[test]
fn fatal_during_tcp_connect_reboots_exactly_once() {
    let mut transport = MockTransport::new();
    transport.push_reply("busy p...");
    // Lines after the fatal one must never be read.
    transport.push_reply("CONNECT");

    let mut d = driver(transport);
    let err = d
        .execute(&AtCommand::TcpOpen {
            host: "52.22.106.58",
            port: 8090,
        })
        .unwrap_err();

    assert_eq!(err, DriverError::FatalFault);
    assert_eq!(d.system().reboot_count(), 1);
    assert_eq!(d.transport().remaining_replies(), 1);
}

#[test]
fn transport_exhaustion_surfaces_as_error() {
    let mut d = driver(MockTransport::new());
    assert_eq!(
        d.execute(&AtCommand::Reset).unwrap_err(),
        DriverError::Transport(TransportError::ChannelClosed)
    );
}

#[test]
fn verdict_scanning_matches_the_wire_format() {
    let pattern = ReplyPattern::default();

    // Actuate, with trailing protocol noise after the code.
    let mut transport = MockTransport::new();
    transport.push_reply("+IPD,12:xxHANUIDISPRETCODE1CLOSED");
    assert!(driver(transport).await_verdict(&pattern).unwrap());

    // No-actuate.
    let mut transport = MockTransport::new();
    transport.push_reply("+IPD,12:xxHANUIDISPRETCODE0CLOSED");
    assert!(!driver(transport).await_verdict(&pattern).unwrap());

    // Lines not beginning with '+' are retryable noise.
    let mut transport = MockTransport::new();
    transport.push_reply("HANUIDISPRETCODE1CLOSED");
    transport.push_reply("SEND OK");
    transport.push_reply("+IPD,12:xxHANUIDISPRETCODE1CLOSED");
    assert!(driver(transport).await_verdict(&pattern).unwrap());
}

#[test]
fn verdict_pattern_is_configurable() {
    let pattern = ReplyPattern::default()
        .with_marker("SRV")
        .with_actuate("FIRE")
        .with_no_actuate("HOLD");

    let mut transport = MockTransport::new();
    transport.push_reply("+IPD,8:abSRVFIRExyz");
    assert!(driver(transport).await_verdict(&pattern).unwrap());
}

#[test]
fn payload_send_announces_length_in_bytes() {
    let body = b"{\"id\":\"1\",\"temperature\":\"23.50\"}";
    let mut d = driver(MockTransport::new());
    d.send_payload(body).unwrap();

    assert_eq!(
        d.transport().sent_lines(),
        [format!("AT+CIPSEND={}", body.len())]
    );
    assert_eq!(d.transport().sent_raw(), vec![body.to_vec()]);
}
