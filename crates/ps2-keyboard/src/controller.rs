//! Keyboard commands: indicator LEDs, scan enable, and the probe echo.

use crate::error::{DriverError, Result};
use crate::protocol::{
    LedState, KBD_ECHO, KBD_ENABLE, KBD_SET_DEFAULTS_AND_DISABLE, KBD_SET_LEDS, RESPONSE_ACK,
    RESPONSE_ECHO,
};
use crate::transport::{PortCommand, Ps2Request, Ps2Transport};

/// Pushes `leds` to the keyboard without waiting. Safe from the byte-delivery
/// path.
pub fn set_leds<T: Ps2Transport + ?Sized>(transport: &mut T, leds: LedState) {
    tracing::trace!(leds = leds.bits(), "setting keyboard LEDs");
    transport.submit_async(Ps2Request::from_commands(&[
        PortCommand::WriteData(KBD_SET_LEDS),
        PortCommand::ReadDataAndCompare(RESPONSE_ACK),
        PortCommand::WriteData(leds.bits()),
        PortCommand::ReadDataAndCompare(RESPONSE_ACK),
    ]));
}

/// Starts or stops scan-code reporting without waiting. Disabling also restores
/// the keyboard's defaults and may be repeated freely.
///
/// While reporting is on, key bytes can interleave with command responses; the
/// transport is responsible for sorting them out.
pub fn set_reporting_enabled<T: Ps2Transport + ?Sized>(transport: &mut T, enabled: bool) {
    let command = if enabled {
        KBD_ENABLE
    } else {
        KBD_SET_DEFAULTS_AND_DISABLE
    };
    transport.submit_async(Ps2Request::from_commands(&[
        PortCommand::WriteData(command),
        PortCommand::ReadDataAndCompare(RESPONSE_ACK),
    ]));
}

/// Checks that a keyboard answers the diagnostic echo. Blocking.
///
/// The keyboard must be disabled (but clocked) so stray scan codes cannot be
/// mistaken for the reply.
pub fn probe<T: Ps2Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut request = Ps2Request::from_commands(&[
        PortCommand::WriteData(KBD_ECHO),
        PortCommand::ReadDataAndCompare(RESPONSE_ECHO),
    ]);
    transport.submit_blocking(&mut request)?;
    if !request.is_complete() {
        return Err(DriverError::UnexpectedDeviceResponse {
            expected: RESPONSE_ECHO,
            completed: request.completed(),
        });
    }
    Ok(())
}
