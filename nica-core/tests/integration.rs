//! Whole-pipeline scenarios driven through `load_from_path` + `Nica`,
//! the way the teacher's `tests/integration.rs` exercises its proxy
//! end to end rather than one module at a time.

use std::io::Write;
use std::net::Ipv4Addr;

use nica_core::gateway::addr::flow_table::*;
use nica_core::gateway::addr::pipeline as reg;
use nica_core::gateway::GatewayStatus;
use nica_core::pipeline::header::{ETHERTYPE_IPV4, PROTO_UDP};
use nica_core::{load_from_path, Nica, PipelineDirection as Direction};
use tempfile::NamedTempFile;

fn udp_frame(src_ip: [u8; 4], dst_ip: [u8; 4], src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; 14 + 20 + 8];
    frame[12..14].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
    frame[14] = 0x45;
    let udp_len = 8 + payload.len() as u16;
    frame[16..18].copy_from_slice(&(20 + udp_len).to_be_bytes());
    frame[23] = PROTO_UDP;
    frame[26..30].copy_from_slice(&src_ip);
    frame[30..34].copy_from_slice(&dst_ip);
    frame[34..36].copy_from_slice(&src_port.to_be_bytes());
    frame[36..38].copy_from_slice(&dst_port.to_be_bytes());
    frame[38..40].copy_from_slice(&udp_len.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    writeln!(file, "{contents}").expect("write temp config");
    file
}

#[test]
fn loads_a_full_config_and_builds_a_runtime() {
    let file = write_config(
        r#"
interface = "eth0"

[[ikernels]]
kind = "threshold"
ikernel_id = 3
threshold_value = 10

[[ikernels]]
kind = "echo"
ikernel_id = 4
"#,
    );

    let config = load_from_path(file.path()).expect("config loads");
    let nica = Nica::new(&config).expect("nica builds from config");

    assert_eq!(nica.ikernel_count(), 2);
    assert!(nica.pipeline_enabled(Direction::HostToNet));
    assert!(nica.pipeline_enabled(Direction::NetToHost));
}

#[test]
fn rejects_duplicate_ikernel_ids() {
    let file = write_config(
        r#"
interface = "eth0"

[[ikernels]]
kind = "echo"
ikernel_id = 1

[[ikernels]]
kind = "threshold"
ikernel_id = 1
"#,
    );

    let err = load_from_path(file.path()).unwrap_err();
    assert!(err.to_string().contains("duplicate ikernel_id"));
}

#[test]
fn non_udp_frame_passes_through_untouched_end_to_end() {
    let file = write_config("interface = \"eth0\"\n");
    let config = load_from_path(file.path()).unwrap();
    let mut nica = Nica::new(&config).unwrap();

    let mut frame = vec![0u8; 14 + 20];
    frame[12..14].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
    frame[14] = 0x45;
    frame[23] = 6; // TCP, not UDP

    nica.ingest(Direction::NetToHost, &frame);
    let out = nica.drain(Direction::NetToHost);

    assert_eq!(out, vec![frame]);
    assert_eq!(nica.counters(Direction::NetToHost).non_udp_passthrough, 1);
}

#[test]
fn flow_hit_configured_via_gateway_routes_into_the_echo_ikernel() {
    let file = write_config(
        r#"
interface = "eth0"

[[ikernels]]
kind = "echo"
ikernel_id = 7
"#,
    );
    let config = load_from_path(file.path()).unwrap();
    let mut nica = Nica::new(&config).unwrap();

    let base = reg::FLOW_TABLE_DATA;
    let src_ip = Ipv4Addr::new(10, 0, 0, 1);
    let dst_ip = Ipv4Addr::new(10, 0, 0, 2);
    assert_eq!(nica.gateway_write(Direction::NetToHost, base + FT_KEY_SADDR, u32::from(src_ip)), GatewayStatus::Done);
    assert_eq!(nica.gateway_write(Direction::NetToHost, base + FT_KEY_DADDR, u32::from(dst_ip)), GatewayStatus::Done);
    assert_eq!(nica.gateway_write(Direction::NetToHost, base + FT_KEY_SPORT, 5000), GatewayStatus::Done);
    assert_eq!(nica.gateway_write(Direction::NetToHost, base + FT_KEY_DPORT, 6000), GatewayStatus::Done);
    assert_eq!(nica.gateway_write(Direction::NetToHost, base + FT_RESULT_ACTION, 2), GatewayStatus::Done);
    assert_eq!(nica.gateway_write(Direction::NetToHost, base + FT_RESULT_IKERNEL_ID, 7), GatewayStatus::Done);
    assert_eq!(nica.gateway_write(Direction::NetToHost, base + FT_ADD_FLOW, 0), GatewayStatus::Done);

    let frame = udp_frame([10, 0, 0, 1], [10, 0, 0, 2], 5000, 6000, b"hello");
    nica.ingest(Direction::NetToHost, &frame);
    let out = nica.drain(Direction::NetToHost);

    assert_eq!(out.len(), 1);
    assert_eq!(nica.steering_counters(Direction::NetToHost).hits, 1);
}

#[test]
fn disabled_pipeline_forces_passthrough_for_every_frame() {
    let file = write_config(
        r#"
interface = "eth0"

[host_to_net]
enabled = false

[[ikernels]]
kind = "echo"
ikernel_id = 1
"#,
    );
    let config = load_from_path(file.path()).unwrap();
    let mut nica = Nica::new(&config).unwrap();
    assert!(!nica.pipeline_enabled(Direction::HostToNet));

    let frame = udp_frame([10, 0, 0, 1], [10, 0, 0, 2], 1, 2, b"x");
    nica.ingest(Direction::HostToNet, &frame);
    nica.drain(Direction::HostToNet);

    assert_eq!(nica.steering_counters(Direction::HostToNet).disabled, 1);
}
