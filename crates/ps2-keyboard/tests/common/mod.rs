#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ps2_keyboard::{FakeClock, I8042Model, KeyEvent, KeyboardSession, SessionConfig};

pub const START_NS: u64 = 5_000;

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<KeyEvent>>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<KeyEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn sink(&self) -> impl FnMut(KeyEvent) + 'static {
        let events = self.events.clone();
        move |event| events.borrow_mut().push(event)
    }
}

pub struct Harness {
    pub session: KeyboardSession<I8042Model>,
    pub events: Recorder,
    pub clock: FakeClock,
}

impl Harness {
    pub fn new(config: SessionConfig) -> Self {
        init_tracing();
        let events = Recorder::default();
        let clock = FakeClock::new(START_NS);
        let session = KeyboardSession::new(I8042Model::new(), config, Box::new(events.sink()))
            .unwrap()
            .with_clock(Box::new(clock.clone()));
        Self {
            session,
            events,
            clock,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.session.handle_byte(byte);
            self.clock.advance(1);
        }
    }
}

pub fn press(code: u8, timestamp_ns: u64) -> KeyEvent {
    KeyEvent {
        code,
        pressed: true,
        timestamp_ns,
    }
}

pub fn release(code: u8, timestamp_ns: u64) -> KeyEvent {
    KeyEvent {
        code,
        pressed: false,
        timestamp_ns,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
