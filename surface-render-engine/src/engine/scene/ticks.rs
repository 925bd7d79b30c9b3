use bevy::prelude::*;
use constants::surface::FAR_EDGE_TICK_FRACTION;

use crate::engine::math::{Axis, Domain, Interval, Mapping};

/// Round half towards positive infinity.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Integer tick bounds and increment. A negative increment means "divide by -inc",
/// which keeps sub-unit steps free of accumulated float error.
fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(f64, f64, f64)> {
    let step = (stop - start) / count.max(0.0);
    if !step.is_finite() || step <= 0.0 {
        return None;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let inv = 10f64.powf(-power) / factor;
        i1 = round_half_up(start * inv);
        i2 = round_half_up(stop * inv);
        if i1 / inv < start {
            i1 += 1.0;
        }
        if i2 / inv > stop {
            i2 -= 1.0;
        }
        inc = -inv;
    } else {
        inc = 10f64.powf(power) * factor;
        i1 = round_half_up(start / inc);
        i2 = round_half_up(stop / inc);
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    Some((i1, i2, inc))
}

/// Round-number ticks (1, 2 or 5 times a power of ten) covering `[lo, hi]`,
/// aiming for roughly `count` of them.
///
/// Empty for invalid intervals, non-positive counts, or absurd tick counts.
pub fn nice_ticks(domain: Interval, count: f64) -> Vec<f64> {
    const MAX_TICKS: f64 = 10_000.0;

    if !domain.is_valid() || !(count > 0.0) || !count.is_finite() {
        return Vec::new();
    }
    let Some((i1, i2, inc)) = tick_spec(domain.lo, domain.hi, count) else {
        return Vec::new();
    };
    if !(i2 >= i1) || i2 - i1 + 1.0 > MAX_TICKS {
        return Vec::new();
    }

    let n = (i2 - i1) as usize + 1;
    (0..n)
        .map(|k| {
            let i = i1 + k as f64;
            if inc < 0.0 { i / -inc } else { i * inc }
        })
        .collect()
}

/// Which ticks an axis keeps around the cube edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisTickPolicy {
    /// Drop the first tick; it sits on the axis line already drawn at the grid origin.
    pub drop_origin: bool,
    /// Drop a trailing tick crowding the far edge.
    pub trim_far_edge: bool,
}

impl AxisTickPolicy {
    pub fn for_axis(axis: Axis) -> Self {
        match axis {
            Axis::X | Axis::Y => Self {
                drop_origin: true,
                trim_far_edge: true,
            },
            Axis::Z => Self {
                drop_origin: false,
                trim_far_edge: false,
            },
        }
    }
}

/// Ticks of one axis: raw domain values and their positions along `[0, scale]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisTicks {
    pub raw: Vec<f64>,
    pub scaled: Vec<f32>,
}

impl AxisTicks {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.raw.iter().copied().zip(self.scaled.iter().copied())
    }
}

/// Ticks for one axis. The requested count grows with the rendered length so
/// tick density on screen stays constant as the scale changes.
pub fn axis_ticks(
    domain: Interval,
    scale: f32,
    ticks_per_unit: f32,
    policy: AxisTickPolicy,
) -> AxisTicks {
    let count = ticks_per_unit as f64 * scale as f64;
    let mut raw = nice_ticks(domain, count);

    if policy.drop_origin && !raw.is_empty() {
        raw.remove(0);
    }
    if policy.trim_far_edge {
        if let Some(&last) = raw.last() {
            // Measured from `lo`, so domains that do not start at zero trim the same way.
            if (last - domain.lo) / domain.length() > FAR_EDGE_TICK_FRACTION {
                raw.pop();
            }
        }
    }

    let mapping = Mapping::new(domain, Interval::new(0.0, scale as f64));
    let scaled = raw.iter().map(|&v| mapping.apply(v) as f32).collect();
    AxisTicks { raw, scaled }
}

/// Tick sets of all three axes for a plot frame.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct PlotTicks {
    pub x: AxisTicks,
    pub y: AxisTicks,
    pub z: AxisTicks,
}

impl PlotTicks {
    pub fn compute(domain: &Domain, scale: Vec3, ticks_per_unit: f32) -> Self {
        let for_axis = |axis: Axis| {
            axis_ticks(
                domain.axis(axis),
                axis.component(scale),
                ticks_per_unit,
                AxisTickPolicy::for_axis(axis),
            )
        };
        Self {
            x: for_axis(Axis::X),
            y: for_axis(Axis::Y),
            z: for_axis(Axis::Z),
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisTicks {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

/// Shortest decimal form of a tick value.
pub fn format_tick(value: f64) -> String {
    // Avoid printing "-0".
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value}")
}
