use chrono::{DateTime, Local};
use gilrs::{Event, EventType, GamepadId, Gilrs};
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::router::{PadInfo, PadInput, PadMode, PadRouter};

// Raw controller event with chrono timestamps
#[derive(Debug, Clone, PartialEq)]
pub enum RawControllerEvent {
    Button {
        code: i32,
        state: ButtonState,
        timestamp: DateTime<Local>,
    },
    Stick {
        stick: JoystickType,
        x: f32,
        y: f32,
        timestamp: DateTime<Local>,
    },
    Trigger {
        trigger: TriggerType,
        value: f32,
        timestamp: DateTime<Local>,
    },
    Disconnected {
        timestamp: DateTime<Local>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoystickType {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerType {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollectorSettings {
    pub joystick_deadzone: f32,
    pub poll_interval_us: u64,
    /// Physical pad to forward in single mode
    pub gamepad_index: Option<usize>,
    pub pad_mode: PadMode,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
            poll_interval_us: 100,
            gamepad_index: None,
            pad_mode: PadMode::Single,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Event channel closed")]
    ChannelClosed,
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    gilrs: Gilrs,

    // Adopted physical pads and their stick state
    router: PadRouter<GamepadId>,

    settings: CollectorSettings,

    event_sender: mpsc::Sender<RawControllerEvent>,

    cancel: CancellationToken,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        event_sender: mpsc::Sender<RawControllerEvent>,
        cancel: CancellationToken,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        let router = PadRouter::new(settings.pad_mode, settings.joystick_deadzone);
        Ok(Self::new(gilrs, router, settings, event_sender, cancel))
    }

    /// Adopts the physical pads already connected and starts collecting
    pub fn initialize(mut self) -> EventCollector<Collecting> {
        let gamepads: Vec<(GamepadId, PadInfo)> = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, PadInfo::from_gamepad(&gamepad)))
            .collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for one");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, pad)) in gamepads.iter().enumerate() {
                info!("  [{}] ID: {}, Name: {} ({})", idx, id, pad.name, pad.os_name);
            }
        }

        for (id, role) in self
            .router
            .adopt_initial(&gamepads, self.settings.gamepad_index)
        {
            info!("Forwarding gamepad {} as {:?}", id, role);
        }

        if !self.router.is_complete() {
            warn!(
                "Waiting for gamepads to complete {:?} mode",
                self.router.mode()
            );
        }

        self.transition()
    }
}

impl EventCollector<Collecting> {
    /// Pulls one gilrs event, returns whether there was one
    pub fn collect_next_event(&mut self) -> Result<bool, CollectorError> {
        let Some(Event { id, event, .. }) = self.gilrs.next_event() else {
            return Ok(false);
        };

        let raw_event = match event {
            EventType::Connected => {
                self.on_connected(id);
                None
            }
            EventType::Disconnected => {
                let lost = self.router.disconnected(id, Local::now());
                if lost.is_some() {
                    warn!("Forwarded gamepad {} disconnected", id);
                }
                lost
            }
            other => PadInput::from_event(other)
                .and_then(|input| self.router.input(id, input, Local::now())),
        };

        if let Some(raw_event) = raw_event {
            forward_event(&self.event_sender, raw_event)?;
        }

        Ok(true)
    }

    pub fn run_collection_loop(&mut self) -> Result<(), CollectorError> {
        info!("Starting Event Collector loop");

        let poll_interval = Duration::from_micros(self.settings.poll_interval_us);
        let mut event_count = 0u64;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);

        while !self.cancel.is_cancelled() {
            match self.collect_next_event() {
                Ok(true) => event_count += 1,
                Ok(false) => std::thread::sleep(poll_interval),
                Err(CollectorError::ChannelClosed) => {
                    info!("Event channel closed, stopping collector");
                    return Ok(());
                }
                Err(e) => error!("Error collecting event: {}", e),
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                debug!(
                    "Event Collector stats: {} events in last {} seconds",
                    event_count,
                    log_interval.num_seconds()
                );
                event_count = 0;
                last_log_time = now;
            }
        }

        info!("Event Collector cancelled");
        Ok(())
    }

    fn on_connected(&mut self, id: GamepadId) {
        let pad = PadInfo::from_gamepad(&self.gilrs.gamepad(id));
        info!("Gamepad connected: {} ({}), {}", pad.name, pad.os_name, id);

        if let Some(role) = self.router.connected(id, &pad) {
            info!("Forwarding gamepad {} as {:?}", id, role);
        }
    }
}

/// Queues one event without blocking the gilrs thread
///
/// A full queue drops the event; only a closed queue is an error.
pub fn forward_event(
    sender: &mpsc::Sender<RawControllerEvent>,
    event: RawControllerEvent,
) -> Result<(), CollectorError> {
    match sender.try_send(event) {
        Ok(()) => Ok(()),
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!("Event queue full, dropping {:?}", dropped);
            Ok(())
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(CollectorError::ChannelClosed),
    }
}

// Rescales the value to the range outside the deadzone
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

/// Runs the collector on the blocking pool
pub struct CollectorHandle {
    task: JoinHandle<()>,
}

impl CollectorHandle {
    /// Starts collecting; resolves once gilrs is up or failed to start
    pub async fn spawn(
        settings: Option<CollectorSettings>,
        event_sender: mpsc::Sender<RawControllerEvent>,
        cancel: CancellationToken,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);
        let (ready_tx, ready_rx) = oneshot::channel();

        // gilrs stays on the thread that created it
        let task = tokio::task::spawn_blocking(move || {
            let collector = match EventCollector::<Initializing>::create(settings, event_sender, cancel) {
                Ok(collector) => collector,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let mut collecting = collector.initialize();
            let _ = ready_tx.send(Ok(()));

            if let Err(e) = collecting.run_collection_loop() {
                error!("Collector task terminated with error: {}", e);
            }
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                info!("Event Collector successfully started");
                Ok(Self { task })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CollectorError::InitializationError(
                "collector exited before reporting readiness".to_string(),
            )),
        }
    }

    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("Collector task panicked: {}", e);
        }
    }
}
