//! Blur pulse played on every viewpoint change.
//!
//! The pulse eases a shader parameter from its minimum to a peak and back.
//! It is a cooperative task: [`TransitionPulse::tick`] resumes it once per
//! frame and a new [`TransitionPulse::trigger`] replaces whatever run was in
//! flight.

use serde::{Deserialize, Serialize};

/// Receives named scalar parameters (a material's shader uniforms).
pub trait ParameterSink {
    fn set_float(&mut self, name: &str, value: f32);
}

impl<F: FnMut(&str, f32)> ParameterSink for F {
    fn set_float(&mut self, name: &str, value: f32) {
        self(name, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseSettings {
    /// Shader property written on every step.
    pub parameter: String,
    pub min_sigma: f32,
    pub peak_sigma: f32,
    /// Seconds spent easing from `min_sigma` to `peak_sigma`.
    pub up_time: f32,
    /// Seconds spent easing back down.
    pub down_time: f32,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            parameter: "_Sigma".to_owned(),
            min_sigma: 0.001,
            peak_sigma: 1.0,
            up_time: 0.12,
            down_time: 0.18,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
struct Timeline {
    phase: Phase,
    /// Normalized progress through the current phase.
    t: f32,
}

/// Cubic ease between `from` and `to`; `t` is clamped to [0, 1].
pub fn smoothstep(from: f32, to: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let t = (t * t * (3.0 - 2.0 * t)).min(1.0);
    to * t + from * (1.0 - t)
}

pub struct TransitionPulse {
    settings: PulseSettings,
    sink: Box<dyn ParameterSink>,
    value: f32,
    timeline: Option<Timeline>,
}

impl std::fmt::Debug for TransitionPulse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionPulse")
            .field("settings", &self.settings)
            .field("value", &self.value)
            .field("timeline", &self.timeline)
            .finish_non_exhaustive()
    }
}

impl TransitionPulse {
    /// Wires the pulse to its parameter sink and writes the resting value.
    pub fn new(settings: PulseSettings, sink: Box<dyn ParameterSink>) -> Self {
        let mut pulse = Self {
            value: settings.min_sigma,
            settings,
            sink,
            timeline: None,
        };
        pulse.write(pulse.settings.min_sigma);
        pulse
    }

    pub fn settings(&self) -> &PulseSettings {
        &self.settings
    }

    /// Last value written to the sink.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.timeline.is_some()
    }

    /// Cancels any run in flight and starts over from the minimum.
    pub fn trigger(&mut self) {
        if self.timeline.is_some() {
            log::trace!("Pulse restarted mid-run at sigma={:.3}", self.value);
        }
        self.timeline = Some(Timeline {
            phase: Phase::Up,
            t: 0.0,
        });
        self.resume(0.0);
    }

    /// Advances the running timeline by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.resume(dt);
    }

    fn resume(&mut self, dt: f32) {
        while let Some(mut timeline) = self.timeline {
            let (from, to, duration) = match timeline.phase {
                Phase::Up => (
                    self.settings.min_sigma,
                    self.settings.peak_sigma,
                    self.settings.up_time,
                ),
                Phase::Down => (
                    self.settings.peak_sigma,
                    self.settings.min_sigma,
                    self.settings.down_time,
                ),
            };

            if duration <= 0.0 {
                self.write(to);
                self.timeline = next_phase(timeline.phase);
                continue;
            }

            timeline.t += dt / duration;
            if timeline.t >= 1.0 {
                self.write(to);
                self.timeline = next_phase(timeline.phase);
            } else {
                self.write(smoothstep(from, to, timeline.t));
                self.timeline = Some(timeline);
            }
            return;
        }
    }

    fn write(&mut self, value: f32) {
        self.value = value;
        self.sink.set_float(&self.settings.parameter, value);
    }
}

fn next_phase(phase: Phase) -> Option<Timeline> {
    match phase {
        Phase::Up => Some(Timeline {
            phase: Phase::Down,
            t: 0.0,
        }),
        Phase::Down => None,
    }
}
