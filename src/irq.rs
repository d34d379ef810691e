//! Interrupt plumbing for the software serial receiver.
//!
//! Two interrupts cooperate per byte. The falling edge interrupt on the
//! serial pin catches the start bit, then switches itself off and hands
//! over to PIT channel 0, which paces the eight data bit samples. When the
//! byte is complete the timer is parked again and the edge interrupt
//! re-armed for the next start bit. Masking the edge interrupt mid-byte is
//! what keeps the sampler state single-owner: nothing else can touch it
//! until the byte is done.

use bsp::interrupt;
use imxrt_hal::gpio::{Input, GPIO};
use imxrt_ral as ral;
use teensy4_bsp as bsp;

use serialcv::mailbox::ByteMailbox;
use serialcv::rx::{Sampler, BIT_PERIOD_US, FIRST_SAMPLE_US};

use imxrt_hal::gpio::InterruptConfiguration;

// B0_02 - GPIO2_IO02 - ALT5
pub type SerialPin = GPIO<bsp::common::P11, Input>;

static mut INT: Option<(SerialPin, Sampler, &'static ByteMailbox)> = None;

/// Arm the receive interrupts. The PIT must already be clocked (1MHz).
pub fn setup_serial_rx(mut pin: SerialPin, mailbox: &'static ByteMailbox) {
    #[cortex_m_rt::interrupt]
    fn GPIO2_Combined_0_15() {
        cortex_m::interrupt::free(|_cs| {
            let (pin, _, _) = unsafe { INT.as_mut().unwrap() };

            if pin.is_interrupt_status() {
                pin.clear_interrupt_status();

                // Start bit. No more edges until the whole byte is in.
                pin.set_interrupt_enable(false);
                start_bit_clock();
            }
        });
    }

    #[cortex_m_rt::interrupt]
    fn PIT() {
        cortex_m::interrupt::free(|_cs| {
            let (pin, sampler, mailbox) = unsafe { INT.as_mut().unwrap() };

            unsafe { ral::write_reg!(ral::pit, ral::pit::PIT, TFLG0, TIF: 1) };

            if let Some(byte) = sampler.sample(pin.is_set()) {
                mailbox.post(byte);

                stop_bit_clock();

                // A stale edge flag from mid-byte would fire immediately,
                // so clear before re-enabling.
                pin.clear_interrupt_status();
                pin.set_interrupt_enable(true);
            }
        });
    }

    cortex_m::interrupt::free(|_cs| {
        info!("setup serial rx interrupts");

        pin.set_interrupt_configuration(InterruptConfiguration::FallingEdge);
        pin.set_interrupt_enable(true);
        pin.clear_interrupt_status();

        unsafe {
            INT = Some((pin, Sampler::new(), mailbox));
        }

        init_bit_clock();

        unsafe {
            cortex_m::peripheral::NVIC::unmask(bsp::interrupt::GPIO2_Combined_0_15);
            cortex_m::peripheral::NVIC::unmask(bsp::interrupt::PIT);
        }
    });
}

/// One-time PIT channel 0 setup: module on, interrupt on, timer parked.
fn init_bit_clock() {
    unsafe {
        ral::write_reg!(ral::pit, ral::pit::PIT, MCR, MDIS: 0, FRZ: 1);
        ral::write_reg!(ral::pit, ral::pit::PIT, TCTRL0, TIE: 1);
    }
}

/// Start the sample clock from a start bit edge.
///
/// The first expiry lands one and a half bit periods after the edge, in the
/// middle of data bit 0. The reload value is swapped to a whole period
/// right after enabling; the PIT picks it up from the first expiry on.
fn start_bit_clock() {
    unsafe {
        ral::write_reg!(ral::pit, ral::pit::PIT, TFLG0, TIF: 1);
        ral::write_reg!(ral::pit, ral::pit::PIT, LDVAL0, FIRST_SAMPLE_US);
        ral::modify_reg!(ral::pit, ral::pit::PIT, TCTRL0, TEN: 1);
        ral::write_reg!(ral::pit, ral::pit::PIT, LDVAL0, BIT_PERIOD_US);
    }
}

/// Park the sample clock between bytes.
fn stop_bit_clock() {
    unsafe {
        ral::modify_reg!(ral::pit, ral::pit::PIT, TCTRL0, TEN: 0);
        ral::write_reg!(ral::pit, ral::pit::PIT, TFLG0, TIF: 1);
    }
}
