/// Target upper bound on proxy mesh vertex grid size (x * y) for pointer hit-testing.
pub const PROXY_MAX_CELLS: usize = 2000;

/// Smallest cap the depth sampler accepts; a 2x2 grid is the smallest valid mesh.
pub const MIN_SAMPLE_CELLS: usize = 4;

/// Desired ticks per unit of rendered axis length.
pub const DEFAULT_TICKS_PER_UNIT: f32 = 15.0;

/// A trailing x/y tick past this fraction of the axis span is dropped.
pub const FAR_EDGE_TICK_FRACTION: f64 = 0.975;

/// Second press within this window confirms a double click.
pub const DOUBLE_CLICK_WINDOW_MS: u64 = 500;

/// Grid and label opacity gained per second while fading in.
pub const FADE_RATE_PER_SECOND: f32 = 1.0;

/// Fraction of the viewport height (from the bottom) the marker label aims for.
pub const LABEL_TARGET_SCREEN_FRACTION: f32 = 0.7;

/// Length of the sampled marker stick in world units.
pub const LABEL_STICK_LENGTH: f32 = 1.0;

/// Upper bound on the solved label height, in stick lengths.
pub const LABEL_MAX_HEIGHT: f32 = 8.0;

/// Marker text falls back to z rounded to this many decimals.
pub const MARKER_TEXT_DECIMALS: i32 = 3;

/// Scale components are clamped to at least this value.
pub const MIN_AXIS_SCALE: f32 = 1e-4;
