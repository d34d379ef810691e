//! Byte handover between the receive interrupt and the main loop.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// A one slot mailbox. Single producer, single consumer, one byte deep.
///
/// The interrupt side is the only writer of the byte and the only side that
/// raises the ready flag; the main loop is the only side that clears it.
/// Each field is a single atomic width cell, so the pair needs no further
/// locking on a single core.
///
/// There is no backpressure: if a new byte finishes before the previous one
/// was taken, the slot is silently overwritten. The command protocol's
/// resync rule is built around exactly that, so the worst a lost byte can
/// do is delay the next voltage update by one command.
pub struct ByteMailbox {
    byte: AtomicU8,
    ready: AtomicBool,
}

impl ByteMailbox {
    pub const fn new() -> Self {
        ByteMailbox {
            byte: AtomicU8::new(0),
            ready: AtomicBool::new(false),
        }
    }

    /// Publish a freshly assembled byte. Interrupt side.
    pub fn post(&self, byte: u8) {
        self.byte.store(byte, Ordering::Relaxed);
        self.ready.store(true, Ordering::Release);
    }

    /// Take the pending byte, if there is one. Main loop side.
    pub fn take(&self) -> Option<u8> {
        if !self.ready.load(Ordering::Acquire) {
            return None;
        }
        let byte = self.byte.load(Ordering::Relaxed);
        self.ready.store(false, Ordering::Release);
        Some(byte)
    }

    /// Block until the next byte arrives.
    ///
    /// A tight poll on the ready flag. The firmware has nothing else to do
    /// between commands, so the wait is a plain spin, not a yield.
    pub fn recv(&self) -> u8 {
        loop {
            if let Some(byte) = self.take() {
                return byte;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mailbox_has_nothing() {
        let mailbox = ByteMailbox::new();
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn posted_byte_comes_back_once() {
        let mailbox = ByteMailbox::new();
        mailbox.post(0x5a);
        assert_eq!(mailbox.take(), Some(0x5a));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn overrun_keeps_the_newest_byte() {
        let mailbox = ByteMailbox::new();
        mailbox.post(0xaa);
        mailbox.post(0x55);
        assert_eq!(mailbox.take(), Some(0x55));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn recv_returns_a_pending_byte() {
        let mailbox = ByteMailbox::new();
        mailbox.post(0x42);
        assert_eq!(mailbox.recv(), 0x42);
    }
}
