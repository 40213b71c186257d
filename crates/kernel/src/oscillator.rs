use orbitwalk_common::OscillatorConfig;
use std::f32::consts::TAU;

/// Sine phase accumulator producing a vertical offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    phase: f32,
    step: f32,
    amplitude: f32,
}

impl Oscillator {
    /// New oscillator at phase zero.
    pub fn new(config: &OscillatorConfig) -> Self {
        Self {
            phase: 0.0,
            step: config.step,
            amplitude: config.amplitude,
        }
    }

    /// Current phase in radians, always in [0, 2π).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Peak offset.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Offset at the current phase.
    pub fn offset(&self) -> f32 {
        self.phase.sin() * self.amplitude
    }

    /// Advance by one step; a phase that completes the cycle restarts at zero.
    ///
    /// A phase that lands outside `[0, 2π)` for any other reason, such as a
    /// negative or NaN step, also restarts at zero.
    pub fn advance(&mut self) {
        self.phase += self.step;
        if !(0.0..TAU).contains(&self.phase) {
            self.phase = 0.0;
        }
    }

    /// Offset at the current phase, then advance.
    pub fn sample(&mut self) -> f32 {
        let offset = self.offset();
        self.advance();
        offset
    }

    /// Back to phase zero, so the next sample is zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
