/// A key transition handed to the host input subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Delivered (post-remap) key code.
    pub code: u8,
    pub pressed: bool,
    pub timestamp_ns: u64,
}

/// Receives dispatched key events, in order.
pub trait KeyEventSink {
    fn dispatch(&mut self, event: KeyEvent);
}

impl<F: FnMut(KeyEvent)> KeyEventSink for F {
    fn dispatch(&mut self, event: KeyEvent) {
        self(event)
    }
}

/// Host power management. Receives the "sleep now" request raised by the
/// keyboard's sleep key.
pub trait PowerSink {
    fn sleep_now(&mut self);
}

impl<F: FnMut()> PowerSink for F {
    fn sleep_now(&mut self) {
        self()
    }
}
