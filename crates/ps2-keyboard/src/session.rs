use crate::clock::{Clock, MonotonicClock};
use crate::command_byte::update_command_byte;
use crate::config::SessionConfig;
use crate::controller;
use crate::decoder::{KeyTransition, ScancodeDecoder};
use crate::error::Result;
use crate::key_state::KeyBitVector;
use crate::keymap::{TranslationTable, KEY_COUNT};
use crate::protocol::{CommandByte, LedState, RESPONSE_ACK, RESPONSE_RESEND};
use crate::remap::{KeycodeRemapper, OverlayLatchState, RemapOutcome};
use crate::sink::{KeyEvent, KeyEventSink, PowerSink};
use crate::transport::Ps2Transport;

/// Identity reported to the host input subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_type: u32,
    pub max_key_codes: usize,
    pub vendor_id: u32,
    pub product_id: u32,
    pub manufacturer: &'static str,
    pub product: &'static str,
}

pub const DEVICE_INFO: DeviceInfo = DeviceInfo {
    device_type: 0x1B,
    max_key_codes: KEY_COUNT,
    vendor_id: 0,
    product_id: 0,
    manufacturer: "Generic",
    product: "Generic PS/2 Keyboard",
};

/// Power transitions driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Disable,
    Enable,
}

/// One attached keyboard.
///
/// [`handle_byte`](Self::handle_byte) is the interrupt path: it never blocks,
/// and it is the only mutator of the decoder, key and latch state. Lifecycle
/// methods (`start`, `stop`, `set_power_state`) issue blocking command-byte
/// updates and must run from a context that may block.
pub struct KeyboardSession<T: Ps2Transport> {
    transport: T,
    decoder: ScancodeDecoder,
    keys: KeyBitVector,
    remapper: KeycodeRemapper,
    latch: OverlayLatchState,
    leds: LedState,
    max_command_byte_attempts: u32,
    sink: Box<dyn KeyEventSink>,
    power: Option<Box<dyn PowerSink>>,
    clock: Box<dyn Clock>,
}

impl<T: Ps2Transport> KeyboardSession<T> {
    pub fn new(transport: T, config: SessionConfig, sink: Box<dyn KeyEventSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            decoder: ScancodeDecoder::new(config.remap.swap_alt_meta),
            keys: KeyBitVector::new(),
            remapper: KeycodeRemapper::new(
                TranslationTable::default(),
                config.remap,
                config.overlay,
            ),
            latch: OverlayLatchState::default(),
            leds: LedState::empty(),
            max_command_byte_attempts: config.max_command_byte_attempts,
            sink,
            power: None,
            clock: Box::new(MonotonicClock::new()),
        })
    }

    pub fn with_power_sink(mut self, power: Box<dyn PowerSink>) -> Self {
        self.power = Some(power);
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_translation_table(mut self, table: TranslationTable) -> Self {
        let config = *self.remapper.config();
        let layer = self.remapper.layer().clone();
        self.remapper = KeycodeRemapper::new(table, config, layer);
        self
    }

    pub fn device_info(&self) -> DeviceInfo {
        DEVICE_INFO
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn leds(&self) -> LedState {
        self.leds
    }

    pub fn keys(&self) -> &KeyBitVector {
        &self.keys
    }

    pub fn latch(&self) -> OverlayLatchState {
        self.latch
    }

    /// Brings the keyboard up: LEDs, command byte (clock on, IRQ and
    /// translation enabled), then scan reporting.
    pub fn start(&mut self) -> Result<()> {
        tracing::info!("starting PS/2 keyboard");
        self.enable_device()
    }

    /// Quiesces the keyboard and forgets all key state.
    pub fn stop(&mut self) -> Result<()> {
        tracing::info!("stopping PS/2 keyboard");
        let result = self.disable_device();
        self.reset_input_state();
        result
    }

    pub fn set_power_state(&mut self, action: PowerAction) -> Result<()> {
        tracing::info!(?action, "PS/2 keyboard power transition");
        match action {
            PowerAction::Disable => {
                let result = self.disable_device();
                self.reset_input_state();
                result
            }
            PowerAction::Enable => self.enable_device(),
        }
    }

    fn enable_device(&mut self) -> Result<()> {
        controller::set_leds(&mut self.transport, self.leds);
        update_command_byte(
            &mut self.transport,
            CommandByte::KEYBOARD_IRQ | CommandByte::TRANSLATE,
            CommandByte::DISABLE_KEYBOARD_CLOCK,
            self.max_command_byte_attempts,
        )?;
        controller::set_reporting_enabled(&mut self.transport, true);
        Ok(())
    }

    fn disable_device(&mut self) -> Result<()> {
        controller::set_reporting_enabled(&mut self.transport, false);
        update_command_byte(
            &mut self.transport,
            CommandByte::DISABLE_KEYBOARD_CLOCK,
            CommandByte::KEYBOARD_IRQ,
            self.max_command_byte_attempts,
        )?;
        Ok(())
    }

    fn reset_input_state(&mut self) {
        self.decoder.reset();
        self.keys.clear();
        self.latch.clear();
    }

    pub fn set_alpha_lock_feedback(&mut self, locked: bool) {
        self.set_led(LedState::CAPS_LOCK, locked);
    }

    pub fn set_num_lock_feedback(&mut self, locked: bool) {
        self.set_led(LedState::NUM_LOCK, locked);
    }

    fn set_led(&mut self, led: LedState, on: bool) {
        self.leds.set(led, on);
        controller::set_leds(&mut self.transport, self.leds);
    }

    /// Interrupt path: consumes one byte from the keyboard.
    ///
    /// Returns `true` if the byte completed an accepted key transition (whether
    /// or not the remapper let anything through to the sink).
    pub fn handle_byte(&mut self, byte: u8) -> bool {
        match byte {
            RESPONSE_ACK => {
                tracing::warn!("unexpected acknowledge from PS/2 controller");
                false
            }
            RESPONSE_RESEND => {
                tracing::warn!("unexpected resend request from PS/2 controller");
                false
            }
            _ => self.dispatch_scancode(byte),
        }
    }

    fn dispatch_scancode(&mut self, byte: u8) -> bool {
        let power = self.power.as_deref_mut().map(|p| p as &mut dyn PowerSink);
        let Some(KeyTransition { code, released }) = self.decoder.decode(byte, power) else {
            return false;
        };

        if !self.keys.accept(code, released) {
            tracing::trace!(code, "dropping repeated make");
            return false;
        }

        let pressed = !released;
        let timestamp_ns = self.clock.now_ns();

        match self.remapper.remap(code, pressed, &mut self.latch) {
            RemapOutcome::Emit(code) => self.sink.dispatch(KeyEvent {
                code,
                pressed,
                timestamp_ns,
            }),
            RemapOutcome::EmitMany(codes) => {
                for &code in codes {
                    self.sink.dispatch(KeyEvent {
                        code,
                        pressed,
                        timestamp_ns,
                    });
                }
            }
            RemapOutcome::Suppress => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::i8042::I8042Model;
    use crate::keymap::delivered;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Events = Rc<RefCell<Vec<KeyEvent>>>;

    fn session(config: SessionConfig) -> (KeyboardSession<I8042Model>, Events) {
        let events: Events = Rc::default();
        let sink = events.clone();
        let session = KeyboardSession::new(
            I8042Model::new(),
            config,
            Box::new(move |event: KeyEvent| sink.borrow_mut().push(event)),
        )
        .unwrap()
        .with_clock(Box::new(FakeClock::new(1_000)));
        (session, events)
    }

    #[test]
    fn ack_and_resend_are_dropped() {
        let (mut s, events) = session(SessionConfig::default());
        assert!(!s.handle_byte(RESPONSE_ACK));
        assert!(!s.handle_byte(RESPONSE_RESEND));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn repeated_make_dispatches_once() {
        let (mut s, events) = session(SessionConfig::default());
        assert!(s.handle_byte(0x10));
        assert!(!s.handle_byte(0x10));
        assert!(s.handle_byte(0x90));
        assert_eq!(
            *events.borrow(),
            vec![
                KeyEvent {
                    code: 0x0C,
                    pressed: true,
                    timestamp_ns: 1_000,
                },
                KeyEvent {
                    code: 0x0C,
                    pressed: false,
                    timestamp_ns: 1_000,
                },
            ]
        );
    }

    #[test]
    fn latch_key_is_swallowed_but_counts_as_handled() {
        let config = SessionConfig {
            remap: crate::config::RemapConfig {
                remap_function_keys: true,
                ..Default::default()
            },
            ..SessionConfig::default()
        };
        let (mut s, events) = session(config);
        assert!(!s.handle_byte(0xE0));
        assert!(s.handle_byte(0x52));
        assert!(s.latch().any_held());
        assert!(events.borrow().is_empty());
    }

    /// Advances by one on every read.
    struct TickingClock(Cell<u64>);

    impl Clock for TickingClock {
        fn now_ns(&self) -> u64 {
            let now = self.0.get();
            self.0.set(now + 1);
            now
        }
    }

    #[test]
    fn chord_uses_the_transition_timestamp() {
        let config = SessionConfig {
            remap: crate::config::RemapConfig {
                remap_function_keys: true,
                ..Default::default()
            },
            ..SessionConfig::default()
        };
        let (s, events) = session(config);
        let mut s = s.with_clock(Box::new(TickingClock(Cell::new(0))));
        s.handle_byte(0x3D);
        s.handle_byte(0xBD);
        let stamps: Vec<(u8, u64)> = events
            .borrow()
            .iter()
            .map(|e| (e.code, e.timestamp_ns))
            .collect();
        assert_eq!(
            stamps,
            vec![
                (delivered::RIGHT_CONTROL, 0),
                (delivered::UP_ARROW, 0),
                (delivered::RIGHT_CONTROL, 1),
                (delivered::UP_ARROW, 1),
            ]
        );
    }

    #[test]
    fn led_feedback_updates_shadow_and_device() {
        let (mut s, _events) = session(SessionConfig::default());
        s.set_alpha_lock_feedback(true);
        s.set_num_lock_feedback(true);
        s.set_alpha_lock_feedback(false);
        assert_eq!(s.leds(), LedState::NUM_LOCK);
        assert_eq!(s.transport().leds(), LedState::NUM_LOCK);
    }

    #[test]
    fn translation_table_can_be_replaced() {
        let mut map = [0u8; KEY_COUNT];
        map[0x10] = delivered::F5;
        let (s, events) = session(SessionConfig::default());
        let mut s = s.with_translation_table(TranslationTable::new(map));
        s.handle_byte(0x10);
        assert_eq!(events.borrow()[0].code, delivered::F5);
    }

    #[test]
    fn device_identity() {
        let (s, _events) = session(SessionConfig::default());
        let info = s.device_info();
        assert_eq!(info.device_type, 0x1B);
        assert_eq!(info.max_key_codes, 128);
        assert_eq!(info.product, "Generic PS/2 Keyboard");
    }
}
