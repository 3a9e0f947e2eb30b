use super::*;
use serde::Deserialize;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Ping {
    n: u32,
}

#[tokio::test]
async fn read_write_frame_roundtrip() {
    let mut buffer = Vec::new();
    write_frame(&mut buffer, 0x10, &Ping { n: 7 }).await.unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let raw = read_frame(&mut cursor).await.unwrap();
    assert_eq!(raw.kind, 0x10);
    assert_eq!(raw.version, WIRE_VERSION);

    let decoded: Ping = decode_payload(&raw).unwrap();
    assert_eq!(decoded, Ping { n: 7 });
}

#[test]
fn encode_frame_lays_out_the_header_before_the_payload() {
    let buf = encode_frame(0x01, &Ping { n: 1 }).unwrap();
    assert_eq!(buf[0], 0x01);
    let version = u16::from_be_bytes([buf[1], buf[2]]);
    assert_eq!(version, WIRE_VERSION);
    let len = u32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]);
    assert_eq!(len as usize, buf.len() - 7);
}

#[tokio::test]
async fn read_frame_rejects_a_length_beyond_the_cap() {
    let mut buf = Vec::new();
    buf.push(0x01u8);
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
    let mut cursor = std::io::Cursor::new(buf);
    let err = read_frame(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
}
