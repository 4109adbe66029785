//! A folder browse cycle against a scripted unit, through the public API:
//! request, selection, ack, count, items, confirm.

use nmea2000_media::{decode, encode::encode_value, well_known::MANUFACTURER_TAG, SessionState};
use serde_json::{json, Value};

fn payload(id: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::from(MANUFACTURER_TAG);
    out.extend_from_slice(&[id, 0x00]);
    out.extend_from_slice(body);
    out
}

fn item(folder_session: u32, item_id: u32, kind: u8, name: &str) -> Vec<u8> {
    let mut body = vec![0x05];
    body.extend_from_slice(&folder_session.to_le_bytes());
    body.extend_from_slice(&item_id.to_le_bytes());
    body.push(kind);
    body.push(name.len() as u8);
    body.extend_from_slice(name.as_bytes());
    payload(17, &body)
}

fn frames(value: Value, state: &SessionState) -> Vec<[u8; 8]> {
    encode_value(&value, state).unwrap().iter().map(|p| p.0).collect()
}

fn status(payload: &[u8], state: &mut SessionState) -> Value {
    decode(payload, state).unwrap().unwrap().to_value().unwrap()
}

#[test]
fn browse_root_of_usb_stick() {
    let mut state = SessionState::new();

    // USB stick inserted and selected
    status(&payload(2, &[0x05, 0x05, 0x00, 0x03, 3, b'U', b'S', b'B']), &mut state);

    assert_eq!(
        frames(json!({ "device": { "media": { "request": "initial" } } }), &state),
        [
            [0xa0, 0x0a, 0xa3, 0x99, 0x0f, 0x00, 0x05, 0x00],
            [0xa1, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff],
        ]
    );

    let selection = status(
        &payload(15, &[0x05, 0, 0, 0, 0, 0x00, 0x07, 0, 0, 0]),
        &mut state,
    );
    assert_eq!(
        selection,
        json!({ "device": { "media": {
            "folderid": 0,
            "foldertype": "root",
            "foldersessionid": 7,
            "rootfolder": true
        } } })
    );

    assert_eq!(
        frames(json!({ "device": { "media": { "ack": true } } }), &state),
        [
            [0xa0, 0x09, 0xa3, 0x99, 0x10, 0x00, 0x05, 0x07],
            [0xa1, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff],
        ]
    );

    status(&payload(16, &[0x05, 2, 0, 0, 0, 0x07, 0, 0, 0]), &mut state);

    // an item from an earlier folder session is dropped
    assert_eq!(decode(&item(6, 9, 4, "stale.mp3"), &mut state).unwrap(), None);

    let first = status(&item(7, 1, 1, "Music"), &mut state);
    assert!(first["device"]["media"].get("listing").is_none());

    let second = status(&item(7, 2, 4, "song.mp3"), &mut state);
    assert_eq!(
        second["device"]["media"]["listing"],
        json!([
            { "id": 1, "name": "Music", "type": "folder" },
            { "id": 2, "name": "song.mp3", "type": "track" },
        ])
    );

    assert_eq!(
        frames(json!({ "device": { "media": { "confirm": true } } }), &state),
        [
            [0xa0, 0x0c, 0xa3, 0x99, 0x12, 0x00, 0x00, 0x00],
            [0xa1, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0xff],
        ]
    );
}

#[test]
fn browse_needs_a_session() {
    let state = SessionState::new();

    assert!(encode_value(&json!({ "device": { "media": { "request": "initial" } } }), &state).is_err());
    assert!(encode_value(&json!({ "device": { "media": { "ack": true } } }), &state).is_err());
}
