use core::time::Duration;

use esp_idf_hal::gpio::AnyOutputPin;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::{PinState, Pulse, TxRmtDriver, VariableLengthSignal, CHANNEL0};
use esp_idf_hal::sys::EspError;
use esp_idf_hal::units::Hertz;
use led_core::{encode_grb, BitTiming, Error, PixelStrip, Rgb};
use log::info;

use crate::{HardwareError, StripConfig};

// Shortest bit phase is 300 ns; below this the RMT rounds it to nothing.
const MIN_TICK_HZ: u32 = 5_000_000;

#[derive(Clone, Copy)]
struct BitPulses {
    zero: (Pulse, Pulse),
    one: (Pulse, Pulse),
    // Latch is sent as two low halves so the signal stays pair-aligned.
    reset_half: Pulse,
}

impl BitPulses {
    fn new(ticks_hz: Hertz, timing: BitTiming) -> Result<Self, HardwareError> {
        if ticks_hz.0 < MIN_TICK_HZ {
            return Err(HardwareError::Config("RMT resolution too coarse for LED timing"));
        }

        let pulse = |state, ns| {
            Pulse::new_with_duration(ticks_hz, state, &Duration::from_nanos(ns)).map_err(map_rmt_err)
        };

        Ok(Self {
            zero: (pulse(PinState::High, timing.t0h_ns)?, pulse(PinState::Low, timing.t0l_ns)?),
            one: (pulse(PinState::High, timing.t1h_ns)?, pulse(PinState::Low, timing.t1l_ns)?),
            reset_half: pulse(PinState::Low, timing.reset_ns / 2)?,
        })
    }
}

/// WS2812/SK6812 strip on an RMT transmit channel.
pub struct LedStrip {
    tx: TxRmtDriver<'static>,
    pixels: Vec<Rgb>,
    pulses: BitPulses,
}

impl LedStrip {
    pub(super) fn new(channel: CHANNEL0, config: &StripConfig) -> Result<Self, HardwareError> {
        // SAFETY: the data GPIO comes from board settings and no other
        // driver is given the same pin.
        let pin = unsafe { AnyOutputPin::new(config.gpio) };

        let tx_config = TransmitConfig::new().clock_divider(config.clock_divider());
        let tx = TxRmtDriver::new(channel, pin, &tx_config).map_err(map_rmt_err)?;

        let ticks_hz = tx.counter_clock().map_err(map_rmt_err)?;
        let pulses = BitPulses::new(ticks_hz, config.model.timing())?;

        info!(
            "created {} strip with {} LEDs on GPIO{} (RMT tick {} Hz)",
            config.model, config.led_count, config.gpio, ticks_hz.0
        );

        Ok(Self {
            tx,
            pixels: vec![Rgb::BLACK; config.led_count],
            pulses,
        })
    }
}

impl PixelStrip for LedStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) -> led_core::Result<()> {
        let count = self.pixels.len();
        let px = self
            .pixels
            .get_mut(index)
            .ok_or(Error::PixelOutOfRange { index, count })?;
        *px = color;
        Ok(())
    }

    fn clear(&mut self) -> led_core::Result<()> {
        self.pixels.fill(Rgb::BLACK);
        Ok(())
    }

    fn refresh(&mut self) -> led_core::Result<()> {
        let frame = encode_grb(&self.pixels);
        let mut signal = VariableLengthSignal::with_capacity(frame.len() * 16 + 2);

        for byte in frame {
            for bit in (0..8).rev() {
                let (high, low) = if (byte >> bit) & 1 == 1 {
                    self.pulses.one
                } else {
                    self.pulses.zero
                };
                signal.push([&high, &low]).map_err(map_rmt_err)?;
            }
        }

        let reset = self.pulses.reset_half;
        signal.push([&reset, &reset]).map_err(map_rmt_err)?;

        self.tx.start_blocking(&signal).map_err(map_rmt_err)?;
        Ok(())
    }
}

fn map_rmt_err(err: EspError) -> HardwareError {
    log::error!("RMT error: {:?}", err);
    HardwareError::Strip("rmt error")
}
