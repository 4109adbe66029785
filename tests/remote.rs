use embassy_executor::Executor;
use embassy_futures::block_on;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex, pubsub::PubSubChannel, signal::Signal,
    zerocopy_channel,
};
use embedded_can::Frame as _;
use nmea2000_media::{
    client::{AsyncCan, EventLoop},
    fast_packet,
    well_known::{MANUFACTURER_TAG, MEDIA_COMMAND_PGN, MEDIA_STATUS_PGN},
    Config, Id, MediaController, NmeaFrame, DESTINATION_BROADCAST,
};
use serde_json::json;
use static_cell::StaticCell;

use crate::bus::{FakeCan, Frame};


const STEREO: u8 = 0x0a;

static CAN: PubSubChannel<CriticalSectionRawMutex, Frame, 16, 4, 4> = PubSubChannel::new();
static CONTROLLER: MediaController = MediaController::new();
static VOLUME_SET: Signal<CriticalSectionRawMutex, u8> = Signal::new();

/// Answers zone volume commands the way the unit does: with a volume status
/// for all three zones.
#[embassy_executor::task]
async fn stereo() {
    let mut can = FakeCan::new(&CAN);
    let mut levels = [0u8; 3];

    loop {
        let frame = can.receive().await.unwrap();
        let embedded_can::Id::Extended(raw) = frame.id() else {
            continue;
        };
        let id = Id::from_can_id(raw);
        let data = frame.data();

        if id.pgn() != MEDIA_COMMAND_PGN || id.destination() != STEREO {
            continue;
        }

        // a0 06 a3 99 18 00 <zone> <level>
        if data.len() == 8 && data[0] == 0xa0 && data[4] == 0x18 {
            levels[usize::from(data[6])] = data[7];

            let mut payload = Vec::from(MANUFACTURER_TAG);
            payload.extend_from_slice(&[29, 0x00]);
            payload.extend_from_slice(&levels);

            let status_id = Id::new(3, MEDIA_STATUS_PGN, STEREO, DESTINATION_BROADCAST);
            for packet in fast_packet::Iter::new(&payload, 2) {
                let reply = NmeaFrame::from_fast_packet(status_id, &packet);
                can.send(reply.to_can_frame().unwrap()).await.unwrap();
            }
        }
    }
}

#[embassy_executor::task]
async fn remote() {
    let mut buf = [NmeaFrame::DEFAULT; 4];
    let mut channel = zerocopy_channel::Channel::new(&mut buf);
    let config = Config {
        name: 0x1234_5678,
        device: Some(STEREO),
        ..Config::default()
    };
    let (mut event_loop, mut client) =
        EventLoop::new(config, FakeCan::new(&CAN), &mut channel, &CONTROLLER);

    let queued = client
        .command_value(&json!({ "device": { "zone1": { "volume": 17 } } }))
        .await
        .unwrap();
    assert_eq!(queued, 1);

    loop {
        let doc = event_loop.poll().await.unwrap();

        if doc.device.zone1.and_then(|zone| zone.volume) == Some(17) {
            VOLUME_SET.signal(event_loop.src());
        }
    }
}

#[test]
fn volume_round_trip_over_bus() {
    static EXECUTOR: StaticCell<Executor> = StaticCell::new();

    std::thread::spawn(|| {
        EXECUTOR.init_with(Executor::new).run(|spawner| {
            spawner.must_spawn(stereo());
            spawner.must_spawn(remote());
        });
    });

    let src = block_on(VOLUME_SET.wait());

    assert_eq!(src, nmea2000_media::client::MIN_SRC);
    assert_eq!(CONTROLLER.snapshot().zones[1].volume, Some(17));
    assert_eq!(CONTROLLER.snapshot().zones[0].volume, Some(0));
}
