//! myCobot driver over a serial link.
//!
//! Request/response over the frame codec in [`super::frame`]. Blocking moves
//! send the target once and then poll "is in position" until the arm
//! reports arrival or the settle timeout elapses.

use super::frame::{self, Frame, FrameDecoder, FrameError, ProtocolCode};
use cobot_common::device::config::DeviceConfig;
use cobot_common::device::driver::{DeviceDriver, DeviceError};
use cobot_common::device::types::{ErrorCode, Pose, PoseKind};
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Read timeout of a single port read.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound on waiting for the answer to one request.
const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

/// Speed range accepted by the controller.
const MAX_SPEED: i32 = 100;

/// myCobot driver implementing the DeviceDriver trait.
pub struct MyCobotDriver {
    name: &'static str,
    version: &'static str,
    port: Option<Box<dyn SerialPort>>,
    decoder: FrameDecoder,
    reply_timeout: Duration,
    settle_timeout: Duration,
    poll_interval: Duration,
}

fn link_error(e: FrameError) -> DeviceError {
    DeviceError::CommunicationError(e.to_string())
}

impl MyCobotDriver {
    /// Create a new, unconnected driver instance.
    pub fn new() -> Self {
        Self {
            name: super::DRIVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            port: None,
            decoder: FrameDecoder::new(),
            reply_timeout: REPLY_TIMEOUT,
            settle_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
        }
    }

    fn send(&mut self, code: ProtocolCode, data: &[u8]) -> Result<(), DeviceError> {
        let bytes = frame::encode(code, data).map_err(link_error)?;
        let port = self.port.as_mut().ok_or(DeviceError::NotInitialized)?;
        // Anything still buffered belongs to an earlier exchange.
        self.decoder.clear();
        port.write_all(&bytes)
            .and_then(|_| port.flush())
            .map_err(|e| DeviceError::CommunicationError(format!("write {code:?}: {e}")))
    }

    fn request(&mut self, code: ProtocolCode, data: &[u8]) -> Result<Frame, DeviceError> {
        debug_assert!(code.expects_reply());
        self.send(code, data)?;

        let deadline = Instant::now() + self.reply_timeout;
        let mut chunk = [0u8; 64];
        loop {
            while let Some(frame) = self.decoder.next_frame() {
                if frame.is(code) {
                    return Ok(frame);
                }
                debug!("Discarding unsolicited frame 0x{:02X}", frame.code);
            }
            if Instant::now() >= deadline {
                return Err(DeviceError::Timeout(format!("no reply to {code:?}")));
            }
            let port = self.port.as_mut().ok_or(DeviceError::NotInitialized)?;
            match port.read(&mut chunk) {
                Ok(n) => self.decoder.push(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => {
                    return Err(DeviceError::CommunicationError(format!("read {code:?}: {e}")));
                }
            }
        }
    }

    fn request_byte(&mut self, code: ProtocolCode, data: &[u8]) -> Result<u8, DeviceError> {
        self.request(code, data)?.byte().map_err(link_error)
    }

    fn is_in_position(&mut self, target: &Pose) -> Result<bool, DeviceError> {
        let mut data = frame::encode_pose(target).map_err(link_error)?.to_vec();
        data.push(match target.kind {
            PoseKind::Angles => 0,
            PoseKind::Coords => 1,
        });
        match self.request_byte(ProtocolCode::IsInPosition, &data)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DeviceError::CommunicationError(format!(
                "unexpected in-position answer {other}"
            ))),
        }
    }
}

impl Default for MyCobotDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDriver for MyCobotDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &DeviceConfig) -> Result<(), DeviceError> {
        info!(
            "Opening myCobot link on {} at {} baud",
            config.serial_port, config.baud_rate
        );
        let port = serialport::new(config.serial_port.as_str(), config.baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| {
                DeviceError::InitFailed(format!("cannot open {}: {e}", config.serial_port))
            })?;
        self.port = Some(port);
        self.settle_timeout = config.settle_timeout();
        self.poll_interval = config.poll_interval();
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), DeviceError> {
        if self.port.take().is_some() {
            info!("myCobot link closed");
        }
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), DeviceError> {
        self.send(ProtocolCode::PowerOn, &[])
    }

    fn power_off(&mut self) -> Result<(), DeviceError> {
        self.send(ProtocolCode::PowerOff, &[])
    }

    fn is_powered_on(&mut self) -> Result<bool, DeviceError> {
        Ok(self.request_byte(ProtocolCode::IsPowerOn, &[])? == 1)
    }

    fn get_pose(&mut self, kind: PoseKind) -> Result<Pose, DeviceError> {
        let code = match kind {
            PoseKind::Angles => ProtocolCode::GetAngles,
            PoseKind::Coords => ProtocolCode::GetCoords,
        };
        let reply = self.request(code, &[])?;
        frame::decode_pose(kind, &reply.data).map_err(link_error)
    }

    fn move_blocking(&mut self, target: &Pose, feed_rate: i32) -> Result<(), DeviceError> {
        let speed = feed_rate.clamp(1, MAX_SPEED) as u8;
        let mut data = frame::encode_pose(target).map_err(link_error)?.to_vec();
        data.push(speed);
        let code = match target.kind {
            PoseKind::Angles => ProtocolCode::SendAngles,
            PoseKind::Coords => {
                // Joint-interpolated cartesian move.
                data.push(0);
                ProtocolCode::SendCoords
            }
        };
        self.send(code, &data)?;
        debug!("Sent {} at speed {}", target, speed);

        let started = Instant::now();
        loop {
            std::thread::sleep(self.poll_interval);
            if self.is_in_position(target)? {
                debug!("Settled at {} after {:?}", target, started.elapsed());
                return Ok(());
            }
            if started.elapsed() >= self.settle_timeout {
                warn!("Move to {} did not settle within {:?}", target, self.settle_timeout);
                return Err(DeviceError::Timeout(format!(
                    "move to {target} did not settle within {:?}",
                    self.settle_timeout
                )));
            }
        }
    }

    fn get_error_code(&mut self) -> Result<ErrorCode, DeviceError> {
        Ok(ErrorCode::from(self.request_byte(ProtocolCode::GetErrorInfo, &[])?))
    }

    fn clear_error_code(&mut self) -> Result<(), DeviceError> {
        self.send(ProtocolCode::ClearErrorInfo, &[])
    }
}
