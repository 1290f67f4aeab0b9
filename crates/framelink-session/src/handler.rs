use framelink_wire::Frame;

/// Error type a handler may fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Per-request processing hook on the server side.
///
/// Receives the request frames in wire order and returns the response
/// frames, also in order. This is the only place application logic plugs
/// into the server loop; the session layer never interprets frame content.
///
/// An empty response encodes as the close sentinel on the wire and ends
/// the session from the client's point of view.
pub trait Handler {
    fn handle(&mut self, frames: Vec<Frame>) -> std::result::Result<Vec<Frame>, HandlerError>;
}

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: FnMut(Vec<Frame>) -> std::result::Result<Vec<Frame>, HandlerError>,
{
    HandlerFn(f)
}

/// A [`Handler`] backed by a closure. Built with [`handler_fn`].
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: FnMut(Vec<Frame>) -> std::result::Result<Vec<Frame>, HandlerError>,
{
    fn handle(&mut self, frames: Vec<Frame>) -> std::result::Result<Vec<Frame>, HandlerError> {
        (self.0)(frames)
    }
}
