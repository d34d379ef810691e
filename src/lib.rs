#![cfg_attr(not(test), no_std)]

//! Core logic for the serial to control voltage bridge.
//!
//! This is the hardware independent half of the firmware: the two byte
//! command protocol, the serial bit sampler, the one slot mailbox between
//! interrupt and main loop, and the software two wire bus with the DAC
//! driver on top. The board glue lives in the binary.

#[macro_use]
extern crate log;

pub mod command;
pub mod i2c;
pub mod mailbox;
pub mod mcp4726;
pub mod rx;
