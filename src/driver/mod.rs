//! # Driver Engine
//!
//! The engine loop that owns all protocol state and talks to the base
//! controller: read available bytes, feed the framer, dispatch decoded
//! frames, integrate odometry, then always send the current motion
//! command.
//!
//! All mutable protocol state (framer, sensor records, odometry, command
//! encoder input) is owned by the single worker running [`Driver::run`].
//! Everything other threads need goes through the [`DriverHandle`]:
//! snapshot accessors backed by mutex-guarded copies the worker refreshes
//! after each frame, a single-slot motion command the worker reads once
//! per iteration, and an event channel carrying payload-free
//! notifications.

pub mod events;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BaseBridgeError, Result};
use crate::odometry::{Odometry, OdometrySnapshot, Wheel, WheelState};
use crate::protocol::command::Command;
use crate::protocol::dispatcher::dispatch;
use crate::protocol::encoder::{derive_velocity, encode_command, encode_velocity_command};
use crate::protocol::framer::Framer;
use crate::protocol::sensors::{SensorCache, SensorKind};
use crate::serial::SerialPortIO;
use crate::telemetry::TelemetryLogger;
use events::DriverEvent;

/// Scratch buffer size for one serial read
const READ_BUFFER_LEN: usize = 256;

/// Event channel capacity; slow consumers lag rather than block the worker
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Queued generic commands awaiting the worker
const COMMAND_QUEUE_CAPACITY: usize = 16;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Constructed, worker not yet running
    Idle,
    /// Worker loop active
    Running,
    /// Worker loop exited; terminal until a new driver is built
    Stopped,
}

impl DriverState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

/// Current outbound motion command: reference speed (mm/s) and turn
/// radius (mm, 0 = straight, ±1 = rotate in place)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandState {
    pub speed: i16,
    pub radius: i16,
}

/// State shared between the worker and its handles
struct Shared {
    command: Mutex<CommandState>,
    sensors: Mutex<SensorCache>,
    odometry: Mutex<OdometrySnapshot>,
    enabled: AtomicBool,
    shutdown: AtomicBool,
    state: AtomicU8,
}

/// The engine worker; owns the port and all protocol state
pub struct Driver {
    port: Box<dyn SerialPortIO>,
    framer: Framer,
    cache: SensorCache,
    odometry: Odometry,
    telemetry: Option<TelemetryLogger>,
    shared: Arc<Shared>,
    events: broadcast::Sender<DriverEvent>,
    commands: mpsc::Receiver<Command>,
    read_timeout: Duration,
}

/// Cloneable handle for controlling the driver from other tasks/threads
#[derive(Clone)]
pub struct DriverHandle {
    shared: Arc<Shared>,
    events: broadcast::Sender<DriverEvent>,
    commands: mpsc::Sender<Command>,
    wheelbase: f64,
}

impl Driver {
    /// Build a driver and its handle from validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration does not validate or the
    /// telemetry log directory cannot be created; the engine never starts
    /// in that case.
    pub fn new(config: &Config, port: Box<dyn SerialPortIO>) -> Result<(Self, DriverHandle)> {
        config.validate()?;

        let telemetry = if config.telemetry.enabled {
            Some(TelemetryLogger::new(&config.telemetry)?)
        } else {
            None
        };

        let shared = Arc::new(Shared {
            command: Mutex::new(CommandState::default()),
            sensors: Mutex::new(SensorCache::default()),
            odometry: Mutex::new(OdometrySnapshot::default()),
            enabled: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            state: AtomicU8::new(0),
        });
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

        let driver = Self {
            port,
            framer: Framer::new(),
            cache: SensorCache::default(),
            odometry: Odometry::new(config.base.wheelbase, config.base.wheel_radius),
            telemetry,
            shared: Arc::clone(&shared),
            events: event_tx.clone(),
            commands: command_rx,
            read_timeout: Duration::from_millis(config.serial.timeout_ms),
        };
        let handle = DriverHandle {
            shared,
            events: event_tx,
            commands: command_tx,
            wheelbase: config.base.wheelbase,
        };
        Ok((driver, handle))
    }

    /// Run the engine loop until the handle requests shutdown
    ///
    /// One iteration: read (bounded by the transport timeout), feed the
    /// framer, process completed frames, drain queued generic commands,
    /// then always send the current motion command. A zero-byte read is a
    /// transient condition; the loop simply tries again. On shutdown one
    /// final zero-velocity command is sent before returning.
    pub async fn run(mut self) {
        self.shared.state.store(1, Ordering::SeqCst);
        self.shared.enabled.store(true, Ordering::SeqCst);
        info!("driver loop started");

        let mut buf = [0u8; READ_BUFFER_LEN];
        while !self.shared.shutdown.load(Ordering::SeqCst) {
            self.iterate(&mut buf).await;
        }

        // Graceful stop: leave the base commanded to zero motion
        self.write_frame(&encode_velocity_command(0, 0)).await;
        self.shared.enabled.store(false, Ordering::SeqCst);
        self.shared.state.store(2, Ordering::SeqCst);
        info!("driver loop stopped");
    }

    async fn iterate(&mut self, buf: &mut [u8]) {
        let wanted = self.framer.bytes_wanted().min(buf.len());
        match timeout(self.read_timeout, self.port.read(&mut buf[..wanted])).await {
            Ok(Ok(0)) | Err(_) => {
                warn!("no serial data in");
            }
            Ok(Ok(n)) => {
                let frames = self.framer.update(&buf[..n]);
                for frame in frames {
                    self.process_frame(&frame);
                }
            }
            Ok(Err(e)) => {
                warn!("serial read failed: {}", e);
            }
        }

        while let Ok(command) = self.commands.try_recv() {
            self.send_generic(&command).await;
        }

        self.send_motion().await;
    }

    /// Dispatch one validated frame and fan out its notifications
    ///
    /// `frame` is the framer output: length byte + payload + checksum.
    fn process_frame(&mut self, frame: &[u8]) {
        let updated = dispatch(&frame[1..], &mut self.cache);
        if updated.is_empty() {
            return;
        }

        let core_updated = updated.contains(&SensorKind::Core);
        if core_updated {
            self.odometry.update(&self.cache.core);
            *self.shared.odometry.lock().unwrap() = self.odometry.snapshot();
        }
        *self.shared.sensors.lock().unwrap() = self.cache.clone();

        if core_updated {
            if let Some(telemetry) = self.telemetry.as_mut() {
                if let Err(e) = telemetry.log(&self.cache.core, &self.odometry.snapshot()) {
                    warn!("telemetry write failed: {}", e);
                }
            }
        }

        // Notification order follows ascending header id, not arrival order
        for kind in &updated {
            let _ = self.events.send(DriverEvent::Sensor(*kind));
            if *kind == SensorKind::Core {
                let _ = self.events.send(DriverEvent::Odometry);
            }
        }
    }

    /// Encode and send a queued tagged command as its own frame
    async fn send_generic(&mut self, command: &Command) {
        match encode_command(command) {
            Ok(frame) => {
                self.write_frame(&frame).await;
                // An issued base-control command becomes the new motion
                // reference, keeping later velocity commands consistent
                if let Some((speed, radius)) = command.as_base_control() {
                    *self.shared.command.lock().unwrap() = CommandState { speed, radius };
                    let _ = self.events.send(DriverEvent::CommandChanged);
                }
            }
            Err(e) => {
                // The handle pre-validates, so this is unexpected
                warn!("command serialise failed: {}", e);
            }
        }
    }

    /// Send the current motion command; zero motion while disabled
    async fn send_motion(&mut self) {
        let command = if self.shared.enabled.load(Ordering::SeqCst) {
            *self.shared.command.lock().unwrap()
        } else {
            CommandState::default()
        };
        self.write_frame(&encode_velocity_command(command.speed, command.radius))
            .await;
    }

    async fn write_frame(&mut self, frame: &[u8]) {
        if let Err(e) = self.port.write_all(frame).await {
            warn!("serial write failed: {}", e);
            return;
        }
        if let Err(e) = self.port.flush().await {
            warn!("serial flush failed: {}", e);
        }
        debug!("sent frame ({} bytes)", frame.len());
    }
}

impl DriverHandle {
    /// Request a body twist; converted to the wire speed/radius pair
    ///
    /// * `linear` - forward velocity in m/s
    /// * `angular` - rotational velocity in rad/s (positive = left)
    pub fn set_velocity(&self, linear: f64, angular: f64) {
        let (speed, radius) = derive_velocity(linear, angular, self.wheelbase);
        *self.shared.command.lock().unwrap() = CommandState { speed, radius };
        let _ = self.events.send(DriverEvent::CommandChanged);
    }

    /// Queue a tagged command for the worker to send as its own frame
    ///
    /// # Errors
    ///
    /// Returns the serializer's error for commands that cannot be encoded
    /// (nothing is queued or sent), or a queue-full error when the worker
    /// is not draining.
    pub fn send_command(&self, command: Command) -> Result<()> {
        // Surface serializer failures to the caller, not the worker log
        encode_command(&command)?;
        self.commands
            .try_send(command)
            .map_err(|_| BaseBridgeError::Protocol("command queue full".to_string()))
    }

    /// Re-enable motion after a `stop`
    pub fn resume(&self) {
        self.shared.enabled.store(true, Ordering::SeqCst);
        let _ = self.events.send(DriverEvent::CommandChanged);
    }

    /// Command zero motion and disable; the loop keeps polling but only
    /// ever sends zero-motion frames until `resume`
    pub fn stop(&self) {
        *self.shared.command.lock().unwrap() = CommandState::default();
        self.shared.enabled.store(false, Ordering::SeqCst);
        let _ = self.events.send(DriverEvent::CommandChanged);
    }

    /// End the engine loop; takes effect between iterations
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
    }

    /// Whether motion commands are currently passed through
    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    /// Engine lifecycle state
    pub fn state(&self) -> DriverState {
        DriverState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    /// Subscribe to driver notifications
    pub fn subscribe(&self) -> broadcast::Receiver<DriverEvent> {
        self.events.subscribe()
    }

    /// Latest completed sensor records (copy, never a mid-decode alias)
    pub fn sensors(&self) -> SensorCache {
        self.shared.sensors.lock().unwrap().clone()
    }

    /// Latest odometry accumulators
    pub fn odometry(&self) -> OdometrySnapshot {
        *self.shared.odometry.lock().unwrap()
    }

    /// Position and last computed velocity of one wheel, selected by name
    pub fn wheel_state(&self, wheel: Wheel) -> WheelState {
        let snapshot = self.odometry();
        match wheel {
            Wheel::Left => snapshot.left,
            Wheel::Right => snapshot.right,
        }
    }

    /// The motion command the worker will send next iteration
    pub fn command_state(&self) -> CommandState {
        *self.shared.command.lock().unwrap()
    }
}
