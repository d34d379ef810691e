//! GPIO input interrupt support the HAL does not expose.
//!
//! Edge detection for the serial pin needs the ICR/IMR/ISR registers, which
//! the GPIO HAL keeps to itself, so this drives them through imxrt-ral.

#![allow(dead_code)]

use bsp::hal::gpio::Input;
use imxrt_hal::gpio::GPIO;
use imxrt_hal::iomuxc::{consts::Unsigned, gpio::Pin};
use imxrt_ral as ral;
use imxrt_ral::gpio::{self, RegisterBlock};
use teensy4_bsp as bsp;

pub trait Interrupt {
    fn register_block(&self) -> *const RegisterBlock;
    fn mask(&self) -> u32;
    fn module(&self) -> usize;
    fn set_interrupt_enable(&mut self, enable: bool);
    fn set_interrupt_configuration(&mut self, interrupt_configuration: InterruptConfiguration);
    fn is_interrupt_status(&self) -> bool;
    fn clear_interrupt_status(&mut self);
}

/// Interrupt trigger conditions, as encoded in the ICR registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum InterruptConfiguration {
    LowLevel = 0,
    HighLevel = 1,
    RisingEdge = 2,
    FallingEdge = 3,
}

impl<P> Interrupt for GPIO<P, Input>
where
    P: Pin,
{
    fn register_block(&self) -> *const RegisterBlock {
        const REGISTER_BLOCKS: [*const RegisterBlock; 9] = [
            gpio::GPIO1,
            gpio::GPIO2,
            gpio::GPIO3,
            gpio::GPIO4,
            gpio::GPIO5,
            gpio::GPIO6,
            gpio::GPIO7,
            gpio::GPIO8,
            gpio::GPIO9,
        ];
        REGISTER_BLOCKS[self.module().wrapping_sub(1)]
    }

    fn mask(&self) -> u32 {
        1u32 << <P as Pin>::Offset::USIZE
    }

    fn module(&self) -> usize {
        <P as Pin>::Module::USIZE
    }

    /// Enable (`true`) or disable (`false`) interrupts for this GPIO input.
    fn set_interrupt_enable(&mut self, enable: bool) {
        cortex_m::interrupt::free(|_| unsafe {
            ral::modify_reg!(ral::gpio, self.register_block(), IMR, |imr| if enable {
                imr | self.mask()
            } else {
                imr & !self.mask()
            })
        });
    }

    /// Set the trigger condition for this GPIO input.
    fn set_interrupt_configuration(&mut self, interrupt_configuration: InterruptConfiguration) {
        cortex_m::interrupt::free(|_| unsafe {
            // ICR, not EDGE_SEL, decides the condition; make sure the pin
            // is not stuck in either-edge mode.
            ral::modify_reg!(ral::gpio, self.register_block(), EDGE_SEL, |edge_sel| {
                edge_sel & !self.mask()
            });

            let icr = interrupt_configuration as u32;
            let icr_offset = (<P as Pin>::Offset::USIZE % 16) * 2;
            let icr_modify = |reg| reg & !(0b11 << icr_offset) | (icr << icr_offset);
            if <P as Pin>::Offset::USIZE < 16 {
                ral::modify_reg!(ral::gpio, self.register_block(), ICR1, icr_modify);
            } else {
                ral::modify_reg!(ral::gpio, self.register_block(), ICR2, icr_modify);
            }
        })
    }

    /// Indicates whether this GPIO input triggered an interrupt.
    fn is_interrupt_status(&self) -> bool {
        unsafe { ral::read_reg!(ral::gpio, self.register_block(), ISR) & self.mask() != 0u32 }
    }

    /// Clear the interrupt status flag.
    fn clear_interrupt_status(&mut self) {
        unsafe { ral::write_reg!(ral::gpio, self.register_block(), ISR, self.mask()) }
    }
}
