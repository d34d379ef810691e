//! Driver for MCP4716/4726 single channel 12-bit DAC.
//! Datasheet here: <https://ww1.microchip.com/downloads/en/DeviceDoc/22272C.pdf>

use embedded_hal::blocking::i2c::Write;

/// 7 bit address. The lower three bits are factory programmed, default 000.
const ADDRESS: u8 = 0b1100_000;

pub struct Mcp4726<I> {
    i2c: I,
}

impl<I, E> Mcp4726<I>
where
    I: Write<Error = E>,
{
    pub fn new(i2c: I) -> Self {
        Mcp4726 { i2c }
    }

    /// Drive the output to a 12 bit word.
    ///
    /// Uses the two byte fast write command. The power-down field rides in
    /// the top bits of the high byte; writing it as 00 also brings the
    /// device back out of shutdown.
    pub fn set_voltage(&mut self, word: u16) -> Result<(), E> {
        assert!(word <= 4095);
        debug!("set_voltage: {}", word);

        // [0 0 PD1 PD0 D11 D10 D9 D8], [D7 D6 D5 D4 D3 D2 D1 D0]
        let bytes = &[(word >> 8) as u8, (word & 0xff) as u8];

        self.i2c.write(ADDRESS, bytes)?;

        Ok(())
    }

    /// Shut the output down into high impedance mode.
    ///
    /// PD = 11 disconnects the output driver, so another controller can
    /// take over the analog node until the next voltage write.
    pub fn shutdown(&mut self) -> Result<(), E> {
        info!("shutdown");

        self.i2c.write(ADDRESS, &[0x30, 0x00])?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arrayvec::ArrayVec;

    #[derive(Default)]
    struct RecordingBus {
        writes: ArrayVec<(u8, ArrayVec<u8, 4>), 4>,
    }

    impl Write for RecordingBus {
        type Error = core::convert::Infallible;

        fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
            let mut copy = ArrayVec::new();
            copy.try_extend_from_slice(bytes).unwrap();
            self.writes.push((addr, copy));
            Ok(())
        }
    }

    #[test]
    fn voltage_word_splits_over_two_bytes() {
        let mut dac = Mcp4726::new(RecordingBus::default());
        dac.set_voltage(0x0123).unwrap();

        let (addr, bytes) = &dac.i2c.writes[0];
        assert_eq!(*addr, 0b1100_000);
        assert_eq!(&bytes[..], &[0x01, 0x23]);
    }

    #[test]
    fn full_scale_keeps_power_bits_clear() {
        let mut dac = Mcp4726::new(RecordingBus::default());
        dac.set_voltage(4095).unwrap();

        let (_, bytes) = &dac.i2c.writes[0];
        assert_eq!(&bytes[..], &[0x0f, 0xff]);
    }

    #[test]
    fn shutdown_selects_power_down_mode() {
        let mut dac = Mcp4726::new(RecordingBus::default());
        dac.shutdown().unwrap();

        let (addr, bytes) = &dac.i2c.writes[0];
        assert_eq!(*addr, 0b1100_000);
        assert_eq!(&bytes[..], &[0x30, 0x00]);
    }

    #[test]
    #[should_panic]
    fn rejects_words_over_twelve_bits() {
        let mut dac = Mcp4726::new(RecordingBus::default());
        let _ = dac.set_voltage(4096);
    }
}
