//! Playback session orchestration.
//!
//! A session walks `Idle -> Loading -> Playing -> FadingOut -> Done`, or ends in
//! `Error` when the audio cannot be loaded or the output device fails.
//! While playing, the audio output runs on its own thread and the frame loop is
//! paced by a [`FrameClock`]; the two are not re-synchronized.

pub mod clock;
pub mod fade;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use vogsync_control::{dispatch_all, StatsSnapshot, ZoneCommand, ZoneDispatch};
use vogsync_core::{
    detector_for, render, AnimationState, AudioSource, Features, FrameAnalyzer, ParameterStore,
    PlayerConfig, VisualMode,
};

use crate::audio_output::AudioOutput;
use crate::error::{Result, SessionError};

pub use clock::FrameClock;
pub use fade::DIM;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Loading = 1,
    Playing = 2,
    FadingOut = 3,
    Done = 4,
    Error = 5,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Loading,
            2 => SessionState::Playing,
            3 => SessionState::FadingOut,
            4 => SessionState::Done,
            5 => SessionState::Error,
            _ => SessionState::Idle,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Playing => "playing",
            SessionState::FadingOut => "fading-out",
            SessionState::Done => "done",
            SessionState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// Frames analyzed, rendered and dispatched
    pub frames: u64,
    /// Frames that fell back to neutral features
    pub degraded_frames: u64,
    /// Ended by [`StopHandle::stop`]
    pub stopped: bool,
    pub state: SessionState,
    /// Dispatcher counters at the end of the session
    pub dispatch: StatsSnapshot,
}

/// Stops the session in progress within one frame period
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        info!("Stop requested");
        self.tx.send_replace(true);
    }
}

/// Clears the running flag when a session ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs playback sessions against one set of controllers.
///
/// Sessions run one at a time; a second concurrent [`Orchestrator::render`] is
/// rejected with [`SessionError::Busy`]. The parameter store and the stop handle
/// may be used from anywhere while a session runs.
pub struct Orchestrator {
    config: PlayerConfig,
    params: Arc<ParameterStore>,
    dispatcher: Arc<dyn ZoneDispatch>,
    output: Arc<dyn AudioOutput>,
    state: Arc<AtomicU8>,
    running: AtomicBool,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl Orchestrator {
    pub fn new(
        config: PlayerConfig,
        params: Arc<ParameterStore>,
        dispatcher: Arc<dyn ZoneDispatch>,
        output: Arc<dyn AudioOutput>,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            config,
            params,
            dispatcher,
            output,
            state: Arc::new(AtomicU8::new(SessionState::Idle as u8)),
            running: AtomicBool::new(false),
            stop_tx: Arc::new(stop_tx),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    fn set_state(&self, state: SessionState) {
        let previous = SessionState::from_u8(self.state.swap(state as u8, Ordering::AcqRel));
        debug!("Session state: {} -> {}", previous, state);
    }

    fn fail(&self, error: SessionError) -> Result<SessionReport> {
        warn!("Session failed: {}", error);
        self.set_state(SessionState::Error);
        Err(error)
    }

    /// Play `source` while driving the controllers with `mode`.
    ///
    /// Returns after the fade-out tail, or after the off commands when stopped.
    /// Controller failures never end a session.
    pub async fn render(
        &self,
        source: &dyn AudioSource,
        mode: VisualMode,
    ) -> Result<SessionReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected {}: a session is already running", source.describe());
            return Err(SessionError::Busy);
        }
        let _running = RunningGuard(&self.running);

        // A stop issued before this session does not apply to it
        self.stop_tx.send_replace(false);
        let mut stop_rx = self.stop_tx.subscribe();

        self.set_state(SessionState::Loading);
        info!("Loading {}", source.describe());

        let audio = match source.load() {
            Ok(audio) => audio,
            Err(error) => {
                return self.fail(SessionError::Load {
                    source_name: source.describe(),
                    error,
                })
            }
        };

        let sample_rate = audio.sample_rate();
        let frame_len = self.config.frame_len(sample_rate);
        if frame_len == 0 {
            return self.fail(SessionError::InvalidFrameLength {
                sample_rate,
                frame_ms: self.config.frame_ms,
            });
        }

        let endpoints: Vec<String> = self
            .config
            .controllers
            .iter()
            .take(self.config.active_zones())
            .cloned()
            .collect();
        let zone_count = endpoints.len();

        let mut analyzer = FrameAnalyzer::new(frame_len, sample_rate);
        let mut detector = detector_for(self.config.onset_detection, frame_len, sample_rate);
        let mut animation = AnimationState::new(mode);
        let dt = self.config.frame_period().as_secs_f32();

        let playback = match self.output.start(&audio) {
            Ok(handle) => handle,
            Err(error) => return self.fail(error),
        };

        self.set_state(SessionState::Playing);
        info!(
            "Playing {:.2}s in {} mode: {} zone(s), {} samples/frame, detector {}, output {}",
            audio.duration_secs(),
            mode,
            zone_count,
            frame_len,
            detector.name(),
            self.output.name()
        );

        let samples = audio.samples();
        let mut clock = FrameClock::new(self.config.frame_period());
        let mut last_brightness = vec![0u8; zone_count];
        let mut frames = 0u64;
        let mut degraded_frames = 0u64;
        let mut stopped = false;
        let mut idx = 0usize;

        while idx + frame_len < samples.len() {
            if *stop_rx.borrow_and_update() {
                stopped = true;
                break;
            }
            if let Some(message) = playback.take_error() {
                playback.release();
                return self.fail(SessionError::AudioOutput(message));
            }

            let frame = &samples[idx..idx + frame_len];
            idx += frame_len;

            let live = self.params.snapshot();
            let (features, degraded) = match analyzer.analyze(frame, live.color_shift) {
                Ok(features) => {
                    let onset = detector.onset(frame);
                    (features.with_detection(onset, detector.pitch(frame)), false)
                }
                Err(e) => {
                    debug!("Frame {} degraded to neutral features: {}", frames, e);
                    (Features::neutral(sample_rate, live.color_shift), true)
                }
            };

            animation.advance(dt, &features, sample_rate, &live);

            let commands: Vec<ZoneCommand> = endpoints
                .iter()
                .enumerate()
                .map(|(zone, endpoint)| {
                    let value = render::compute(
                        zone,
                        zone_count,
                        &animation,
                        &live,
                        features.onset_strength,
                        features.color,
                    );
                    last_brightness[zone] = value.brightness;
                    ZoneCommand::new(endpoint.clone(), value.brightness, value.color)
                })
                .collect();

            // A stalled controller must not hold up a stop; pending sends are dropped
            let sent = tokio::select! {
                _ = dispatch_all(self.dispatcher.as_ref(), &commands) => true,
                _ = stop_rx.changed() => false,
            };
            if !sent {
                stopped = true;
                break;
            }
            frames += 1;
            if degraded {
                degraded_frames += 1;
            }

            tokio::select! {
                _ = clock.tick() => {}
                // Checked at the top of the loop
                _ = stop_rx.changed() => {}
            }
        }

        if !stopped && *stop_rx.borrow_and_update() {
            stopped = true;
        }

        if stopped {
            info!("Stopped after {} frame(s), switching zones off", frames);
            let off_commands = fade::off_commands(&endpoints);
            let off = dispatch_all(self.dispatcher.as_ref(), &off_commands);
            if tokio::time::timeout(self.config.frame_period(), off).await.is_err() {
                debug!("Off commands still pending after one frame, dropped");
            }
        } else {
            self.set_state(SessionState::FadingOut);
            info!("Fading out after {} frame(s)", frames);
            let factors = fade::fade_factors(self.config.fade_steps);
            let step_count = factors.len();
            for (step, factor) in factors.into_iter().enumerate() {
                dispatch_all(
                    self.dispatcher.as_ref(),
                    &fade::fade_step(&endpoints, &last_brightness, factor),
                )
                .await;
                if step + 1 < step_count {
                    tokio::time::sleep(self.config.fade_interval()).await;
                }
            }
        }

        playback.release();
        self.set_state(SessionState::Done);

        let report = SessionReport {
            frames,
            degraded_frames,
            stopped,
            state: SessionState::Done,
            dispatch: self.dispatcher.stats(),
        };
        info!(
            "Playback complete: {} frame(s), {} degraded, {} sent, {} dropped, {} late tick(s)",
            report.frames,
            report.degraded_frames,
            report.dispatch.sent,
            report.dispatch.failed,
            clock.late_ticks()
        );
        Ok(report)
    }
}
