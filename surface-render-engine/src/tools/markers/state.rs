//! Marker state per surface and the notifications sent to the host.
use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use constants::surface::MARKER_TEXT_DECIMALS;
use serde::{Deserialize, Serialize};

use super::double_click::{ClickOutcome, DoubleClickDetector};

/// Which marker behaviours a surface enables.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[require(SurfaceMarkers)]
#[serde(default)]
pub struct MarkerFlags {
    /// Follow the pointer while it is over the surface.
    pub continuous: bool,
    /// Pin a marker on double click.
    pub double_click: bool,
    /// Draw the hit-test proxy as a wireframe.
    pub show_hitbox: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Continuous,
    Click,
}

/// Position (plot space) and visibility of one marker. Hiding keeps the position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerState {
    position: Vec3,
    visible: bool,
}

impl MarkerState {
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns true when the position actually moved.
    pub fn set_position(&mut self, position: Vec3) -> bool {
        if self.position == position {
            return false;
        }
        self.position = position;
        true
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

/// Both markers of a surface plus the pointer bookkeeping that drives them.
#[derive(Component, Debug, Clone, Default)]
pub struct SurfaceMarkers {
    pub continuous: MarkerState,
    pub click: MarkerState,
    detector: DoubleClickDetector,
    hovered: bool,
}

impl SurfaceMarkers {
    pub fn get(&self, kind: MarkerKind) -> &MarkerState {
        match kind {
            MarkerKind::Continuous => &self.continuous,
            MarkerKind::Click => &self.click,
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_armed(&self) -> bool {
        self.detector.is_armed()
    }

    /// Pointer over the surface at `point`. Returns the new continuous
    /// position when it moved.
    pub fn pointer_over(&mut self, point: Vec3) -> Option<Vec3> {
        self.hovered = true;
        self.continuous.show();
        self.continuous.set_position(point).then_some(point)
    }

    pub fn pointer_left(&mut self) {
        self.hovered = false;
        self.continuous.hide();
    }

    /// Primary press over the surface at `point`, `now` since app start.
    /// Returns the pinned position on a confirmed double click.
    pub fn press(&mut self, point: Vec3, now: std::time::Duration) -> Option<Vec3> {
        match self.detector.press(now) {
            ClickOutcome::Confirmed => {
                self.click.show();
                self.click.set_position(point);
                Some(point)
            }
            ClickOutcome::Armed => None,
        }
    }

    /// Let a stale first click lapse.
    pub fn tick(&mut self, now: std::time::Duration) {
        self.detector.poll(now);
    }

    /// Close the pinned marker; its position is kept.
    pub fn dismiss(&mut self) {
        self.click.hide();
    }

    /// Forget a first click that has not been followed up yet.
    pub fn cancel_pending_click(&mut self) {
        self.detector.cancel();
    }

    /// Drop transient pointer state when behaviours are switched off.
    pub fn disable(&mut self, flags: &MarkerFlags) {
        if !flags.continuous {
            self.pointer_left();
        }
        if !flags.double_click {
            self.cancel_pending_click();
        }
    }
}

/// Sent whenever a marker position updates, not only on pin.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct MarkerPositionChanged {
    pub surface: Entity,
    pub kind: MarkerKind,
    /// Plot-space position.
    pub position: Vec3,
}

/// Sent when the pinned marker is closed from its label.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerDismissed {
    pub surface: Entity,
}

/// Host-supplied label text for a marker at plot-space `(x, y)`.
#[derive(Component, Clone)]
pub struct MarkerTextFormatter(pub Arc<dyn Fn(f32, f32) -> String + Send + Sync>);

impl MarkerTextFormatter {
    pub fn new(f: impl Fn(f32, f32) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for MarkerTextFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MarkerTextFormatter")
    }
}

/// Label text: the host formatter if present, else z rounded to three decimals.
pub fn marker_text(formatter: Option<&MarkerTextFormatter>, position: Vec3) -> String {
    match formatter {
        Some(formatter) => (formatter.0)(position.x, position.y),
        None => {
            let factor = 10f64.powi(MARKER_TEXT_DECIMALS);
            let z = (position.z as f64 * factor).round() / factor;
            let z = if z == 0.0 { 0.0 } else { z };
            format!("{z}")
        }
    }
}
