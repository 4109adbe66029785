#[cfg(feature = "defmt")]
use defmt::{debug, info};
use embassy_futures::select::{select, Either};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    zerocopy_channel::{Channel, Receiver, Sender},
};
use embassy_time::{Duration, Timer};
use embedded_can::Frame;

use crate::{
    command::CommandDocument,
    config::{Addressing, Config},
    decode::DecodeError,
    encode::EncodeError,
    fast_packet::{self, FastPacket},
    id::DESTINATION_BROADCAST,
    status::StatusDocument,
    well_known::{DeviceName, IsoAddressClaim, MEDIA_STATUS_PGN},
    Id, MediaController, Message, NmeaFrame,
};

mod async_can;

pub use async_can::AsyncCan;

pub const ADDRESS_CLAIM_TIMEOUT: Duration = Duration::from_millis(250);
pub const MIN_SRC: u8 = 1;
pub const MAX_SRC: u8 = 253;

/// Tracks our ISO address claim. A claim is announced at startup; if a
/// node with a lower NAME claims the same address we move to the next one
/// and announce again. Commands wait until the last claim has gone
/// unchallenged for [`ADDRESS_CLAIM_TIMEOUT`].
struct AddressClaimState {
    timer: Option<Timer>,
}

impl AddressClaimState {
    const fn new() -> Self {
        Self { timer: None }
    }

    fn is_started(&self) -> bool {
        self.timer.is_some()
    }

    fn restart_timer(&mut self) {
        self.timer = Some(Timer::after(ADDRESS_CLAIM_TIMEOUT));
    }
}

/// Receives status from the unit and transmits queued commands. Nothing
/// happens unless [`EventLoop::poll`] is being awaited.
pub struct EventLoop<'ch, C: AsyncCan> {
    config: Config,
    src: u8,
    can: C,
    address_claim: AddressClaimState,
    rx: Receiver<'ch, CriticalSectionRawMutex, NmeaFrame>,
    reader: fast_packet::Reader,
    controller: &'ch MediaController,
}

pub enum Error<C: AsyncCan> {
    Can(C::Error),
    Decode(DecodeError),
}

impl<C: AsyncCan> core::fmt::Debug for Error<C>
where
    C::Error: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Can(e) => f.debug_tuple("Can").field(e).finish(),
            Self::Decode(e) => f.debug_tuple("Decode").field(e).finish(),
        }
    }
}

/// Queues commands for the [`EventLoop`].
pub struct ClientHandle<'ch> {
    tx: Sender<'ch, CriticalSectionRawMutex, NmeaFrame>,
    controller: &'ch MediaController,
    addressing: Addressing,
}

async fn receive_n2k<C>(mut can: C) -> Result<Option<NmeaFrame>, C::Error>
where
    C: AsyncCan,
{
    let frame = can.receive().await?;

    let id = match frame.id() {
        embedded_can::Id::Extended(extended_id) => Id::from_can_id(extended_id),
        embedded_can::Id::Standard(_) => return Ok(None), // confused
    };

    Ok(heapless::Vec::from_slice(frame.data())
        .ok()
        .map(|data| NmeaFrame::new(id, data)))
}

async fn transmit<C>(mut can: C, frame: &NmeaFrame) -> Result<(), C::Error>
where
    C: AsyncCan,
{
    match frame.to_can_frame() {
        Some(can_frame) => can.send(can_frame).await,
        None => Ok(()),
    }
}

impl<'ch, C: AsyncCan> EventLoop<'ch, C> {
    pub fn new(
        config: Config,
        can: C,
        channel: &'ch mut Channel<'_, CriticalSectionRawMutex, NmeaFrame>,
        controller: &'ch MediaController,
    ) -> (Self, ClientHandle<'ch>) {
        let (tx, rx) = channel.split();

        let event_loop = Self::from_receiver(config, can, rx, controller);
        let handle = ClientHandle {
            tx,
            controller,
            addressing: config.addressing(),
        };

        (event_loop, handle)
    }

    pub fn from_receiver(
        config: Config,
        can: C,
        rx: Receiver<'ch, CriticalSectionRawMutex, NmeaFrame>,
        controller: &'ch MediaController,
    ) -> Self {
        Self {
            config,
            src: MIN_SRC,
            can,
            address_claim: AddressClaimState::new(),
            rx,
            reader: fast_packet::Reader::new(),
            controller,
        }
    }

    /// Our current bus address.
    pub fn src(&self) -> u8 {
        self.src
    }

    fn name(&self) -> DeviceName {
        DeviceName(self.config.name)
    }

    fn incr_src(&mut self) {
        if self.src >= MAX_SRC {
            self.src = MIN_SRC;
        } else {
            self.src += 1;
        }
    }

    async fn handle_system_message(&mut self, frame: &NmeaFrame) -> Result<(), Error<C>> {
        if frame.id.pgn() == IsoAddressClaim::PGN {
            if let Ok(claim) = IsoAddressClaim::decode(&frame.data) {
                self.handle_incoming_address_claim(frame.id.source(), claim)
                    .await
                    .map_err(Error::Can)?;
            }
        }

        Ok(())
    }

    async fn handle_incoming_address_claim(
        &mut self,
        src: u8,
        claim: IsoAddressClaim,
    ) -> Result<(), C::Error> {
        #[cfg(feature = "defmt")]
        info!("Received ISO Address Claim from {}", src);

        if src != self.src || claim.name == self.name() {
            // someone else's address, or our own claim echoed back
            return Ok(());
        }

        if self.name() < claim.name {
            // re-claim address
            #[cfg(feature = "defmt")]
            info!("Reclaiming address {}", src);
            self.send_address_claim().await?;
        } else {
            self.incr_src();
            self.start_address_claim().await?;
        }

        Ok(())
    }

    async fn start_address_claim(&mut self) -> Result<(), C::Error> {
        self.send_address_claim().await?;
        self.address_claim.restart_timer();
        Ok(())
    }

    pub async fn send_address_claim(&mut self) -> Result<(), C::Error> {
        let id = Id::new(6, IsoAddressClaim::PGN, self.src, DESTINATION_BROADCAST);
        let frame = NmeaFrame::from_message(id, &IsoAddressClaim { name: self.name() });
        transmit(&mut self.can, &frame).await
    }

    /// Feed a status frame to the reassembler and decode the payload once it
    /// is complete.
    fn handle_status_frame(&mut self, frame: &NmeaFrame) -> Result<Option<StatusDocument>, DecodeError> {
        if !self.config.accepts(frame.id.source()) {
            return Ok(None);
        }

        match self.reader.read(&FastPacket::from_data(&frame.data)) {
            Some(payload) => self.controller.decode(payload),
            None => Ok(None),
        }
    }

    /// Run the bus until the unit reports something.
    pub async fn poll(&mut self) -> Result<StatusDocument, Error<C>> {
        loop {
            if !self.address_claim.is_started() {
                self.start_address_claim().await.map_err(Error::Can)?;
            }

            let src = self.src;
            let Self {
                can,
                rx,
                address_claim,
                ..
            } = self;

            let send_fut = async {
                // wait for the address claim timer to expire before sending
                if let Some(timer) = &mut address_claim.timer {
                    timer.await;
                }

                rx.receive().await
            };

            let event = select(send_fut, receive_n2k(&mut *can)).await;

            match event {
                Either::First(f) => {
                    f.id.set_source(src);
                    transmit(&mut *can, f).await.map_err(Error::Can)?;

                    #[cfg(feature = "defmt")]
                    debug!("Sent NMEA frame: {:?}", f);

                    rx.receive_done();
                }
                Either::Second(res) => {
                    let Some(f) = res.map_err(Error::Can)? else {
                        continue;
                    };

                    self.handle_system_message(&f).await?;

                    if f.id.pgn() == MEDIA_STATUS_PGN {
                        if let Some(doc) = self.handle_status_frame(&f).map_err(Error::Decode)? {
                            return Ok(doc);
                        }
                    }
                }
            }
        }
    }
}

impl<'a> ClientHandle<'a> {
    pub async fn send(&mut self, frame: NmeaFrame) {
        *self.tx.send().await = frame;
        self.tx.send_done();
    }

    /// Encode a command document and queue its frames, in order. Returns
    /// the number of frames queued; nothing is queued on error.
    pub async fn command(&mut self, doc: &CommandDocument) -> Result<usize, EncodeError> {
        let frames = self.controller.encode(doc, self.addressing)?;
        let count = frames.len();

        for frame in frames {
            self.send(frame).await;
        }

        Ok(count)
    }

    /// Like [`ClientHandle::command`], reading the document from JSON.
    pub async fn command_value(&mut self, value: &serde_json::Value) -> Result<usize, EncodeError> {
        let frames = self.controller.encode_value(value, self.addressing)?;
        let count = frames.len();

        for frame in frames {
            self.send(frame).await;
        }

        Ok(count)
    }

    /// Ask the unit to push its complete status.
    pub async fn request_status(&mut self) -> Result<usize, EncodeError> {
        let mut doc = CommandDocument::default();
        doc.device.refresh = Some(true);
        self.command(&doc).await
    }
}
