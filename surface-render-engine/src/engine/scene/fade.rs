//! Time-based opacity ramp used by grid planes and tick labels.
use bevy::prelude::*;
use constants::surface::FADE_RATE_PER_SECOND;

/// Opacity animation that restarts from zero whenever its owner moves.
///
/// The ramp is an explicit task owned by the component: `restart` cancels any
/// ramp in flight and schedules a new one, and the ramp stops itself once the
/// opacity saturates.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FadeIn {
    opacity: f32,
    running: bool,
    rate: f32,
}

impl Default for FadeIn {
    fn default() -> Self {
        Self::new(FADE_RATE_PER_SECOND)
    }
}

impl FadeIn {
    /// Starts a ramp from zero.
    pub fn new(rate: f32) -> Self {
        Self {
            opacity: 0.0,
            running: true,
            rate: rate.max(0.0),
        }
    }

    /// Fully visible, no ramp scheduled.
    pub fn visible() -> Self {
        Self {
            opacity: 1.0,
            running: false,
            rate: FADE_RATE_PER_SECOND,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Drop back to zero and ramp up again.
    pub fn restart(&mut self) {
        self.opacity = 0.0;
        self.running = true;
    }

    /// Advance by `dt`. Returns true while the opacity changed this tick.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.running {
            return false;
        }
        if self.rate == 0.0 {
            self.opacity = 1.0;
        } else {
            self.opacity = (self.opacity + self.rate * dt.max(0.0)).min(1.0);
        }
        if self.opacity >= 1.0 {
            self.running = false;
        }
        true
    }
}

/// Ticks every running fade. Idle fades are not touched so change detection
/// stays quiet once they saturate.
pub fn advance_fades(time: Res<Time>, mut fades: Query<&mut FadeIn>) {
    let dt = time.delta_secs();
    for mut fade in fades.iter_mut() {
        if fade.is_running() {
            fade.advance(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramps_to_one_then_stops() {
        let mut fade = FadeIn::new(1.0);
        assert_eq!(fade.opacity(), 0.0);
        assert!(fade.advance(0.25));
        assert!((fade.opacity() - 0.25).abs() < 1e-6);
        fade.advance(1.0);
        assert_eq!(fade.opacity(), 1.0);
        assert!(!fade.is_running());
        assert!(!fade.advance(0.5));
    }

    #[test]
    fn restart_cancels_ramp_in_flight() {
        let mut fade = FadeIn::new(1.0);
        fade.advance(0.6);
        fade.restart();
        assert_eq!(fade.opacity(), 0.0);
        fade.advance(0.3);
        assert!((fade.opacity() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut fade = FadeIn::new(1.0);
        fade.advance(-1.0);
        assert_eq!(fade.opacity(), 0.0);
        assert!(fade.is_running());
    }
}
