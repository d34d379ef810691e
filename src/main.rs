#![no_std]
#![no_main]

#[macro_use]
extern crate log;

use bsp::hal::ccm;
use bsp::hal::gpio::{Output, GPIO};
use bsp::hal::iomuxc;
use embedded_hal::blocking::delay::DelayUs;
use imxrt_hal::iomuxc::gpio::Pin;
use teensy4_bsp as bsp;

use serialcv::command::{Command, Decoder};
use serialcv::i2c::{BitBangI2c, OpenDrain};
use serialcv::mailbox::ByteMailbox;
use serialcv::mcp4726::Mcp4726;

mod inter;
mod irq;
mod logging;

/// Teensy 4 core clock. Used to turn microseconds into busy wait cycles.
pub const CPU_SPEED: u32 = 600_000_000;

/// Handover slot from the receive interrupt to the main loop.
static RX_BYTE: ByteMailbox = ByteMailbox::new();

/// The serial line idles high; the pull-up holds it there when the host is
/// unplugged, and hysteresis keeps the edge detector quiet on slow
/// transitions.
const SERIAL_PIN_CONFIG: iomuxc::Config = iomuxc::Config::zero()
    .set_hysteresis(iomuxc::Hysteresis::Enabled)
    .set_pull_keep(iomuxc::PullKeep::Enabled)
    .set_pull_keep_select(iomuxc::PullKeepSelect::Pull)
    .set_pullupdown(iomuxc::PullUpDown::Pullup22k);

/// Bus pads are open drain so the DAC can hold the data line during the
/// acknowledgment slot without a fight.
const BUS_PIN_CONFIG: iomuxc::Config = iomuxc::Config::zero()
    .set_open_drain(iomuxc::OpenDrain::Enabled)
    .set_pull_keep(iomuxc::PullKeep::Enabled)
    .set_pull_keep_select(iomuxc::PullKeepSelect::Pull)
    .set_pullupdown(iomuxc::PullUpDown::Pullup22k);

#[cortex_m_rt::entry]
fn main() -> ! {
    assert!(logging::init().is_ok());

    let mut p = bsp::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();
    let mut systick = bsp::SysTick::new(cp.SYST);

    // Wait so we don't miss the first log message, crashes etc.
    systick.delay(1000);

    let mut pins = bsp::t40::into_pins(p.iomuxc);

    iomuxc::configure(&mut pins.p11, SERIAL_PIN_CONFIG);
    let serial_in = GPIO::new(pins.p11);

    iomuxc::configure(&mut pins.p19, BUS_PIN_CONFIG);
    iomuxc::configure(&mut pins.p18, BUS_PIN_CONFIG);
    let scl = Line(GPIO::new(pins.p19).output());
    let sda = Line(GPIO::new(pins.p18).output());

    // The bit clock runs off the 24MHz oscillator divided down to 1MHz, so
    // its load values count microseconds.
    let mut cfg = p.ccm.perclk.configure(
        &mut p.ccm.handle,
        ccm::perclk::PODF::DIVIDE_24,
        ccm::perclk::CLKSEL::OSC,
    );
    let _ = p.pit.clock(&mut cfg);

    irq::setup_serial_rx(serial_in, &RX_BYTE);

    let bus = BitBangI2c::new(scl, sda, CycleDelay);
    let mut dac = Mcp4726::new(bus);

    // Start shut down. Until the host asks for a voltage, the synth stays
    // under control of whatever else drives the CV node.
    dac.shutdown().unwrap();

    info!("listening at {} baud", serialcv::rx::BAUD_RATE);

    let mut decoder = Decoder::new();

    loop {
        match decoder.feed(RX_BYTE.recv()) {
            Some(Command::SetVoltage(word)) => dac.set_voltage(word).unwrap(),
            Some(Command::Shutdown) => dac.shutdown().unwrap(),
            None => (),
        }
    }
}

/// A bus line on a GPIO output pad.
///
/// The pads are configured open drain, so setting the output "high" releases
/// the line to the pull-up rather than driving it.
struct Line<P>(GPIO<P, Output>);

impl<P> OpenDrain for Line<P>
where
    P: Pin,
{
    fn release(&mut self) {
        self.0.set();
    }

    fn pull_low(&mut self) {
        self.0.clear();
    }
}

/// Busy wait delay for pacing the bus.
struct CycleDelay;

impl DelayUs<u32> for CycleDelay {
    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(us * (CPU_SPEED / 1_000_000));
    }
}

#[panic_handler]
fn panic(p: &core::panic::PanicInfo) -> ! {
    error!("{:?}", p);
    loop {}
}
