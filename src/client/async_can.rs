/// Until the [`embedded-can`] crate supports async, we need to define our own
/// trait. Transports (SocketCAN, SLCAN, USB adapters, log replay) implement
/// it outside this crate.
pub trait AsyncCan {
    type Error;

    type Frame: embedded_can::Frame;

    /// Frames must go out in the order they are sent; fast packet fragments
    /// carry nothing else to put them back together.
    async fn send(&mut self, frame: Self::Frame) -> Result<(), Self::Error>;

    async fn receive(&mut self) -> Result<Self::Frame, Self::Error>;
}

impl<T> AsyncCan for &mut T
where
    T: AsyncCan,
{
    type Error = T::Error;
    type Frame = T::Frame;

    async fn send(&mut self, frame: Self::Frame) -> Result<(), Self::Error> {
        (*self).send(frame).await
    }

    async fn receive(&mut self) -> Result<Self::Frame, Self::Error> {
        (*self).receive().await
    }
}
