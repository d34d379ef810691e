//! Software two wire bus master.
//!
//! The DAC hangs off two GPIO lines driven open drain; there is no bus
//! peripheral involved. Clock and data semantics are reproduced purely by
//! timed pin toggling, and the bus is write only: the acknowledgment slot
//! is clocked but the answer is never read, so a transfer cannot fail.
//! Implements [`embedded_hal::blocking::i2c::Write`] so the device drivers
//! on top don't care that the bus is made of software.

use core::convert::Infallible;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::i2c::Write;

/// Half of one clock period, in us. ~250 kHz bus clock.
pub const HALF_PERIOD_US: u32 = 2;

/// An open drain bus line.
///
/// `release` lets the pull-up take the line high, `pull_low` drives it to
/// ground. The line must actually be configured open drain at the pad;
/// driving it push-pull high would fight the device during the ack slot.
pub trait OpenDrain {
    fn release(&mut self);
    fn pull_low(&mut self);
}

pub struct BitBangI2c<SCL, SDA, D> {
    scl: SCL,
    sda: SDA,
    delay: D,
}

impl<SCL, SDA, D> BitBangI2c<SCL, SDA, D>
where
    SCL: OpenDrain,
    SDA: OpenDrain,
    D: DelayUs<u32>,
{
    pub fn new(scl: SCL, sda: SDA, delay: D) -> Self {
        BitBangI2c { scl, sda, delay }
    }

    fn wait(&mut self) {
        self.delay.delay_us(HALF_PERIOD_US);
    }

    /// Start condition: data pulled low while the clock is high.
    ///
    /// Both lines are walked high first, so a start works whatever state
    /// the previous transfer left the bus in.
    fn start(&mut self) {
        self.scl.release();
        self.wait();
        self.sda.release();
        self.wait();
        self.sda.pull_low();
        self.wait();
        self.scl.pull_low();
    }

    /// Stop condition: data released high while the clock is high.
    fn stop(&mut self) {
        self.scl.release();
        self.wait();
        self.sda.release();
        self.wait();
    }

    /// Clock out one byte, most significant bit first. SCL is low on entry
    /// and on exit.
    fn write_byte(&mut self, byte: u8) {
        for i in (0..8).rev() {
            if byte & (1 << i) != 0 {
                self.sda.release();
            } else {
                self.sda.pull_low();
            }
            self.wait();
            self.scl.release();
            self.wait();
            self.scl.pull_low();
        }

        // One more clock for the acknowledgment slot. The line is released
        // for the device; what it answers is ignored.
        self.sda.release();
        self.wait();
        self.scl.release();
        self.wait();
        self.scl.pull_low();
    }
}

impl<SCL, SDA, D> Write for BitBangI2c<SCL, SDA, D>
where
    SCL: OpenDrain,
    SDA: OpenDrain,
    D: DelayUs<u32>,
{
    type Error = Infallible;

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Infallible> {
        self.start();
        // 7 bit address up one, low bit clear: a write.
        self.write_byte(addr << 1);
        for b in bytes {
            self.write_byte(*b);
        }
        self.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arrayvec::ArrayVec;
    use core::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Scl(bool),
        Sda(bool),
    }

    type Trace = RefCell<ArrayVec<Event, 256>>;

    struct MockLine<'a> {
        trace: &'a Trace,
        is_scl: bool,
    }

    impl<'a> MockLine<'a> {
        fn record(&self, high: bool) {
            let event = if self.is_scl {
                Event::Scl(high)
            } else {
                Event::Sda(high)
            };
            self.trace.borrow_mut().push(event);
        }
    }

    impl<'a> OpenDrain for MockLine<'a> {
        fn release(&mut self) {
            self.record(true);
        }

        fn pull_low(&mut self) {
            self.record(false);
        }
    }

    struct NoDelay;

    impl DelayUs<u32> for NoDelay {
        fn delay_us(&mut self, _us: u32) {}
    }

    /// Replay a trace the way the device sees it: sample SDA on every SCL
    /// rising edge, watch for SDA falling while SCL is high (start).
    /// Returns the bytes on the wire, ack slots stripped.
    fn decode(trace: &Trace) -> (bool, ArrayVec<u8, 8>) {
        let mut scl = true;
        let mut sda = true;
        let mut started = false;
        let mut bits: u32 = 0;
        let mut current: u16 = 0;
        let mut bytes = ArrayVec::new();

        for event in trace.borrow().iter() {
            match *event {
                Event::Scl(high) => {
                    if high && !scl && started {
                        current = (current << 1) | sda as u16;
                        bits += 1;
                        if bits == 9 {
                            // 8 data bits plus the ack slot; the master
                            // leaves the slot released.
                            assert_eq!(current & 1, 1);
                            bytes.push((current >> 1) as u8);
                            bits = 0;
                            current = 0;
                        }
                    }
                    scl = high;
                }
                Event::Sda(high) => {
                    if scl && !high && sda {
                        started = true;
                    }
                    sda = high;
                }
            }
        }

        (started, bytes)
    }

    fn bus(trace: &Trace) -> BitBangI2c<MockLine<'_>, MockLine<'_>, NoDelay> {
        BitBangI2c::new(
            MockLine {
                trace,
                is_scl: true,
            },
            MockLine {
                trace,
                is_scl: false,
            },
            NoDelay,
        )
    }

    #[test]
    fn frames_an_addressed_write() {
        let trace = Trace::default();
        bus(&trace).write(0x60, &[0x30, 0x00]).unwrap();

        let (started, bytes) = decode(&trace);
        assert!(started);
        // Address up one with the write bit clear, then the payload.
        assert_eq!(&bytes[..], &[0xc0, 0x30, 0x00]);
    }

    #[test]
    fn data_bits_go_out_msb_first() {
        let trace = Trace::default();
        bus(&trace).write(0x01, &[0x80]).unwrap();

        let (_, bytes) = decode(&trace);
        assert_eq!(&bytes[..], &[0x02, 0x80]);
    }

    #[test]
    fn bus_is_left_idle_after_a_write() {
        let trace = Trace::default();
        bus(&trace).write(0x60, &[0x12]).unwrap();

        // Last two master actions are the stop: clock released, then data
        // released while the clock is high.
        let events = trace.borrow();
        assert_eq!(events[events.len() - 2], Event::Scl(true));
        assert_eq!(events[events.len() - 1], Event::Sda(true));
    }
}
