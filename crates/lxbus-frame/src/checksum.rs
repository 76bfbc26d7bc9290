/// Running complement checksum.
///
/// The wire checksum is `!(sum of bytes mod 256)` over id, length, command
/// and params. Header bytes never enter the sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    sum: u8,
}

impl Checksum {
    pub const fn new() -> Self {
        Self { sum: 0 }
    }

    pub fn push(&mut self, byte: u8) {
        self.sum = self.sum.wrapping_add(byte);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// The checksum byte for everything pushed so far.
    pub fn value(&self) -> u8 {
        !self.sum
    }

    pub fn matches(&self, received: u8) -> bool {
        self.value() == received
    }
}

/// Checksum byte for a frame body (id through last param).
pub fn checksum(body: &[u8]) -> u8 {
    let mut acc = Checksum::new();
    acc.extend(body);
    acc.value()
}

/// Whether the last byte of a complete frame is the checksum of
/// bytes `2..len-1`. Frames shorter than the minimum are never valid.
pub fn has_valid_checksum(frame: &[u8]) -> bool {
    if frame.len() < crate::codec::FRAME_OVERHEAD {
        return false;
    }
    let (body, received) = frame.split_at(frame.len() - 1);
    checksum(&body[2..]) == received[0]
}
