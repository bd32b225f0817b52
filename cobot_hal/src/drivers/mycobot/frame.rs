//! myCobot serial frame codec.
//!
//! Frame layout:
//!
//! ```text
//! ┌──────┬──────┬─────┬──────┬───────────┬──────┐
//! │ 0xFE │ 0xFE │ len │ code │ data…     │ 0xFA │
//! └──────┴──────┴─────┴──────┴───────────┴──────┘
//!                len = data.len() + 2
//! ```
//!
//! Pose slots travel as big-endian `i16`: joint angles and rotations in
//! centi-degrees, cartesian positions in tenths of a millimetre.

use cobot_common::device::consts::AXIS_COUNT;
use cobot_common::device::types::{Pose, PoseKind};
use thiserror::Error;

/// Frame start byte (sent twice).
pub const HEADER: u8 = 0xFE;

/// Frame end byte.
pub const FOOTER: u8 = 0xFA;

/// Encoded size of a pose payload.
pub const POSE_BYTES: usize = AXIS_COUNT * 2;

/// Largest length byte of any frame in the protocol subset: a cartesian
/// move carries a pose, a speed and a mode byte.
pub const MAX_FRAME_LEN: usize = POSE_BYTES + 4;

/// Command codes used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolCode {
    /// Read the fault register.
    GetErrorInfo = 0x07,
    /// Reset the fault register.
    ClearErrorInfo = 0x08,
    /// Servo power on.
    PowerOn = 0x10,
    /// Servo power off.
    PowerOff = 0x11,
    /// Servo power query.
    IsPowerOn = 0x12,
    /// Read joint angles.
    GetAngles = 0x20,
    /// Command all joint angles.
    SendAngles = 0x22,
    /// Read cartesian coordinates.
    GetCoords = 0x23,
    /// Command all cartesian coordinates.
    SendCoords = 0x25,
    /// Ask whether the arm has reached a pose.
    IsInPosition = 0x2A,
}

impl ProtocolCode {
    /// Whether the controller answers this command with a frame.
    pub const fn expects_reply(self) -> bool {
        matches!(
            self,
            Self::GetErrorInfo
                | Self::IsPowerOn
                | Self::GetAngles
                | Self::GetCoords
                | Self::IsInPosition
        )
    }
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// A pose slot does not fit the wire encoding.
    #[error("slot {slot} value {value} out of wire range")]
    OutOfRange {
        /// Slot index
        slot: usize,
        /// Offending value in user units
        value: i32,
    },

    /// Payload length differs from what the command carries.
    #[error("expected {expected} payload bytes, got {actual}")]
    BadLength {
        /// Expected payload length
        expected: usize,
        /// Received payload length
        actual: usize,
    },

    /// Payload longer than a single length byte can describe.
    #[error("payload of {0} bytes does not fit a frame")]
    TooLong(usize),
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw command code.
    pub code: u8,
    /// Payload bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// True when this frame answers `code`.
    pub fn is(&self, code: ProtocolCode) -> bool {
        self.code == code as u8
    }

    /// First payload byte, for single-byte answers.
    pub fn byte(&self) -> Result<u8, FrameError> {
        self.data.first().copied().ok_or(FrameError::BadLength {
            expected: 1,
            actual: 0,
        })
    }
}

/// Encode one command frame.
pub fn encode(code: ProtocolCode, data: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u8::try_from(data.len() + 2).map_err(|_| FrameError::TooLong(data.len()))?;
    let mut frame = Vec::with_capacity(data.len() + 5);
    frame.extend_from_slice(&[HEADER, HEADER, len, code as u8]);
    frame.extend_from_slice(data);
    frame.push(FOOTER);
    Ok(frame)
}

/// Streaming decoder for inbound bytes.
///
/// Bytes before a double header are discarded. A candidate frame whose
/// length byte is out of range or whose footer is wrong is dropped one byte
/// at a time until the stream resyncs, so a run of three header bytes never
/// reads the third as a length.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Drop any buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Pop the next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            let start = self
                .buf
                .windows(2)
                .position(|w| w[0] == HEADER && w[1] == HEADER);
            let Some(start) = start else {
                // Keep a trailing header byte; its twin may still arrive.
                let keep = usize::from(self.buf.last() == Some(&HEADER));
                let discard = self.buf.len() - keep;
                self.buf.drain(..discard);
                return None;
            };
            self.buf.drain(..start);

            let Some(&len) = self.buf.get(2) else {
                return None;
            };
            let len = usize::from(len);
            if !(2..=MAX_FRAME_LEN).contains(&len) {
                self.buf.drain(..1);
                continue;
            }
            // header(2) + len byte + (code + data) + footer
            let total = 3 + len;
            if self.buf.len() < total {
                return None;
            }
            if self.buf[total - 1] != FOOTER {
                self.buf.drain(..1);
                continue;
            }

            let frame = Frame {
                code: self.buf[3],
                data: self.buf[4..total - 1].to_vec(),
            };
            self.buf.drain(..total);
            return Some(frame);
        }
    }
}

fn slot_scale(kind: PoseKind, slot: usize) -> i32 {
    match kind {
        PoseKind::Angles => 100,
        PoseKind::Coords if slot < 3 => 10,
        PoseKind::Coords => 100,
    }
}

/// Encode a pose into its 12-byte wire form.
pub fn encode_pose(pose: &Pose) -> Result<[u8; POSE_BYTES], FrameError> {
    let mut out = [0u8; POSE_BYTES];
    for (slot, value) in pose.values.iter().enumerate() {
        let raw = value
            .checked_mul(slot_scale(pose.kind, slot))
            .and_then(|v| i16::try_from(v).ok())
            .ok_or(FrameError::OutOfRange {
                slot,
                value: *value,
            })?;
        out[slot * 2..slot * 2 + 2].copy_from_slice(&raw.to_be_bytes());
    }
    Ok(out)
}

/// Decode a 12-byte wire pose, rounding to whole user units.
pub fn decode_pose(kind: PoseKind, data: &[u8]) -> Result<Pose, FrameError> {
    if data.len() != POSE_BYTES {
        return Err(FrameError::BadLength {
            expected: POSE_BYTES,
            actual: data.len(),
        });
    }
    let mut values = [0i32; AXIS_COUNT];
    for (slot, chunk) in data.chunks_exact(2).enumerate() {
        let raw = i32::from(i16::from_be_bytes([chunk[0], chunk[1]]));
        let scale = slot_scale(kind, slot);
        let half = if raw >= 0 { scale / 2 } else { -(scale / 2) };
        values[slot] = (raw + half) / scale;
    }
    Ok(Pose { kind, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_power_on() {
        assert_eq!(
            encode(ProtocolCode::PowerOn, &[]).unwrap(),
            vec![0xFE, 0xFE, 0x02, 0x10, 0xFA]
        );
    }

    #[test]
    fn encode_send_angles_payload() {
        let mut data = encode_pose(&Pose::angles([90, -90, 0, 0, 0, 1])).unwrap().to_vec();
        data.push(50);
        let frame = encode(ProtocolCode::SendAngles, &data).unwrap();

        assert_eq!(&frame[..4], &[0xFE, 0xFE, 15, 0x22]);
        // 90° = 9000 = 0x2328, -90° = -9000 = 0xDCD8
        assert_eq!(&frame[4..8], &[0x23, 0x28, 0xDC, 0xD8]);
        assert_eq!(&frame[14..16], &[0x00, 0x64]);
        assert_eq!(frame[16], 50);
        assert_eq!(*frame.last().unwrap(), FOOTER);
    }

    #[test]
    fn coords_use_mixed_scale() {
        let bytes = encode_pose(&Pose::coords([150, -20, 300, 180, 0, -180])).unwrap();
        assert_eq!(i16::from_be_bytes([bytes[0], bytes[1]]), 1500);
        assert_eq!(i16::from_be_bytes([bytes[2], bytes[3]]), -200);
        assert_eq!(i16::from_be_bytes([bytes[6], bytes[7]]), 18000);
        assert_eq!(decode_pose(PoseKind::Coords, &bytes).unwrap().values, [150, -20, 300, 180, 0, -180]);
    }

    #[test]
    fn out_of_range_slot_rejected() {
        let result = encode_pose(&Pose::angles([0, 0, 400, 0, 0, 0]));
        assert_eq!(result, Err(FrameError::OutOfRange { slot: 2, value: 400 }));
    }

    #[test]
    fn decode_pose_rounds_half_away_from_zero() {
        let mut data = [0u8; POSE_BYTES];
        data[0..2].copy_from_slice(&1050i16.to_be_bytes());
        data[2..4].copy_from_slice(&(-1050i16).to_be_bytes());
        data[4..6].copy_from_slice(&1049i16.to_be_bytes());
        let pose = decode_pose(PoseKind::Angles, &data).unwrap();
        assert_eq!(&pose.values[..3], &[11, -11, 10]);
    }

    #[test]
    fn decode_pose_length_checked() {
        assert_eq!(
            decode_pose(PoseKind::Angles, &[0; 4]),
            Err(FrameError::BadLength { expected: 12, actual: 4 })
        );
    }

    #[test]
    fn decoder_skips_noise_and_waits_for_partial_frames() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0x00, 0x13, 0xFE, 0xFE, 0x03, 0x12]);
        assert_eq!(decoder.next_frame(), None);

        decoder.push(&[0x01, 0xFA, 0xFE]);
        let frame = decoder.next_frame().unwrap();
        assert!(frame.is(ProtocolCode::IsPowerOn));
        assert_eq!(frame.byte(), Ok(1));

        // Trailing lone header byte is kept for the next frame.
        decoder.push(&[0xFE, 0x02, 0x08, 0xFA]);
        assert!(decoder.next_frame().unwrap().is(ProtocolCode::ClearErrorInfo));
        assert_eq!(decoder.next_frame(), None);
    }

    #[test]
    fn decoder_resyncs_after_bad_footer() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0xFE, 0xFE, 0x03, 0x07, 0x05, 0x00]);
        decoder.push(&[0xFE, 0xFE, 0x03, 0x07, 0x05, 0xFA]);
        let frame = decoder.next_frame().unwrap();
        assert!(frame.is(ProtocolCode::GetErrorInfo));
        assert_eq!(frame.data, vec![0x05]);
    }

    #[test]
    fn decoder_skips_stray_header_byte() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0xFE, 0xFE, 0xFE, 0x03, 0x12, 0x01, 0xFA]);
        let frame = decoder.next_frame().unwrap();
        assert!(frame.is(ProtocolCode::IsPowerOn));
        assert_eq!(frame.byte(), Ok(1));
        assert_eq!(decoder.next_frame(), None);
    }

    #[test]
    fn decoder_resyncs_on_impossible_length() {
        let mut decoder = FrameDecoder::new();
        // A length of 0x40 would otherwise wait for 67 bytes.
        decoder.push(&[0xFE, 0xFE, 0x40, 0x00]);
        decoder.push(&[0xFE, 0xFE, 0x03, 0x07, 0x00, 0xFA]);
        let frame = decoder.next_frame().unwrap();
        assert!(frame.is(ProtocolCode::GetErrorInfo));
        assert_eq!(frame.data, vec![0x00]);
    }

    #[test]
    fn decoder_accepts_largest_frame() {
        let data = [0u8; MAX_FRAME_LEN - 2];
        let mut decoder = FrameDecoder::new();
        decoder.push(&encode(ProtocolCode::SendCoords, &data).unwrap());
        assert_eq!(decoder.next_frame().unwrap().data.len(), MAX_FRAME_LEN - 2);
    }

    #[test]
    fn reply_expectations() {
        assert!(ProtocolCode::GetAngles.expects_reply());
        assert!(ProtocolCode::IsInPosition.expects_reply());
        assert!(!ProtocolCode::SendCoords.expects_reply());
        assert!(!ProtocolCode::PowerOn.expects_reply());
    }
}
