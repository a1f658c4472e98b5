use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scan,
    NalHeader,
    SliceHeader,
}

/// Synthesizes presentation time for an Annex-B H.264 elementary stream
/// from a fixed frame rate.
///
/// A frame starts at every coded slice (NAL type 1 or 5) whose
/// `first_mb_in_slice` is zero. Start codes split across payloads are
/// tracked.
#[derive(Debug, Clone)]
pub struct FrameClock {
    fps: u32,
    frames: u64,

    zeros: u8,
    state: ScanState,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            frames: 0,
            zeros: 0,
            state: ScanState::Scan,
        }
    }

    /// Scans `data` and returns how many frames started in it.
    pub fn push(&mut self, data: &[u8]) -> u64 {
        let before = self.frames;
        for &byte in data {
            match self.state {
                ScanState::Scan => {
                    if byte == 0 {
                        self.zeros = self.zeros.saturating_add(1);
                    } else if byte == 1 && self.zeros >= 2 {
                        self.state = ScanState::NalHeader;
                        self.zeros = 0;
                    } else {
                        self.zeros = 0;
                    }
                }
                ScanState::NalHeader => {
                    let nal_type = byte & 0x1f;
                    self.state = if nal_type == 1 || nal_type == 5 {
                        ScanState::SliceHeader
                    } else {
                        ScanState::Scan
                    };
                    self.zeros = u8::from(byte == 0);
                }
                ScanState::SliceHeader => {
                    // ue(v) zero is coded as a single `1` bit
                    if byte & 0x80 != 0 {
                        self.frames += 1;
                    }
                    self.state = ScanState::Scan;
                    self.zeros = u8::from(byte == 0);
                }
            }
        }
        self.frames - before
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Timestamp of the next frame.
    pub fn presentation_time(&self) -> Duration {
        Duration::from_nanos(self.frames * 1_000_000_000 / self.fps as u64)
    }

    pub fn reset(&mut self) {
        self.frames = 0;
        self.zeros = 0;
        self.state = ScanState::Scan;
    }
}
