//! Height of a marker label above its marker so the label lands near a target
//! screen height whatever the camera distance and pitch.
//!
//! The label hangs on a vertical stick above the marker. Under perspective a
//! point moving along a line projects to screen y as a linear-fractional
//! function of the line parameter, `y(t) = (a + b t) / (1 + c t)`. Three samples
//! at `t = 0, 0.5, 1` pin down `a, b, c`, which is then inverted for the target.
use bevy::prelude::*;
use constants::surface::{LABEL_MAX_HEIGHT, LABEL_TARGET_SCREEN_FRACTION};

/// Fit `y(t) = (a + b t) / (1 + c t)` through samples at `t = 0, 0.5, 1` and
/// solve `y(t) = target`. `None` when the fit is degenerate.
pub fn solve_linear_fractional(samples: [f32; 3], target: f32) -> Option<f32> {
    let [y0, y1, y2] = samples;
    let a = y0;
    let c = (y0 + y2 - 2.0 * y1) / (y1 - y2);
    let b = y2 * (1.0 + c) - a;
    let t = (target - a) / (b - c * target);
    t.is_finite().then_some(t)
}

/// Bisection on a sampled projection. Assumes screen y increases with `t`,
/// which holds while the camera is not looking straight down the stick.
pub fn bisect_height(project: impl Fn(f32) -> Option<f32>, target: f32, max_height: f32) -> f32 {
    const ITERATIONS: usize = 40;

    let (mut lo, mut hi) = (0.0_f32, max_height);
    // Pull the top back in front of the camera.
    for _ in 0..ITERATIONS {
        if project(hi).is_some() || hi <= f32::EPSILON {
            break;
        }
        hi *= 0.5;
    }

    match (project(lo), project(hi)) {
        (Some(y), _) if y >= target => return lo,
        (_, Some(y)) if y <= target => return hi,
        (None, _) | (_, None) => return lo,
        _ => {}
    }

    for _ in 0..ITERATIONS {
        let mid = 0.5 * (lo + hi);
        match project(mid) {
            Some(y) if y < target => lo = mid,
            Some(_) => hi = mid,
            None => break,
        }
    }
    0.5 * (lo + hi)
}

/// Label height in stick lengths, clamped to `[0, max_height]`.
///
/// `project(t)` gives the screen fraction (0 bottom, 1 top) of the stick point
/// at parameter `t`. Falls back to bisection when the closed form degenerates.
/// A stick seen end-on does not move on screen, so the label stays at the
/// marker.
pub fn label_height(project: impl Fn(f32) -> Option<f32>, target: f32, max_height: f32) -> f32 {
    const FLAT_SPREAD: f32 = 1e-6;

    let samples = [project(0.0), project(0.5), project(1.0)];
    let solved = match samples {
        [Some(y0), Some(y1), Some(y2)] => {
            let spread = y0.max(y1).max(y2) - y0.min(y1).min(y2);
            if spread <= FLAT_SPREAD {
                return 0.0;
            }
            solve_linear_fractional([y0, y1, y2], target)
        }
        _ => None,
    };

    // A root on the far side of the projection pole is not on screen.
    match solved.map(|t| t.clamp(0.0, max_height)) {
        Some(t) if project(t).is_some() => t,
        _ => bisect_height(&project, target, max_height).clamp(0.0, max_height),
    }
}

/// Screen fraction from the bottom of the viewport for a world point.
pub fn screen_fraction(camera: &Camera, camera_transform: &GlobalTransform, world: Vec3) -> Option<f32> {
    let ndc = camera.world_to_ndc(camera_transform, world)?;
    // Behind the camera the projection mirrors; treat as unusable.
    if ndc.z < 0.0 || ndc.z > 1.0 {
        return None;
    }
    Some(0.5 * (ndc.y + 1.0))
}

/// Label height for a marker at `base` with the stick along `up` (world space).
pub fn marker_label_height(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    base: Vec3,
    up: Vec3,
) -> f32 {
    label_height(
        |t| screen_fraction(camera, camera_transform, base + up * t),
        LABEL_TARGET_SCREEN_FRACTION,
        LABEL_MAX_HEIGHT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pinhole projection of a vertical stick seen from `eye`, looking along +x
    /// tilted by `pitch`.
    fn pinhole(eye: Vec3, base: Vec3, pitch: f32, focal: f32) -> impl Fn(f32) -> Option<f32> {
        let forward = Vec3::new(pitch.cos(), 0.0, pitch.sin());
        let up = Vec3::new(-pitch.sin(), 0.0, pitch.cos());
        move |t: f32| {
            let p = base + Vec3::Z * t - eye;
            let depth = p.dot(forward);
            (depth > 0.0).then(|| 0.5 + focal * p.dot(up) / depth)
        }
    }

    #[test]
    fn closed_form_is_exact_for_perspective() {
        let project = pinhole(Vec3::new(0.0, 0.0, 0.5), Vec3::new(3.0, 0.0, 0.0), -0.3, 0.8);
        let t = label_height(&project, 0.7, 8.0);
        let y = project(t).unwrap();
        assert!((y - 0.7).abs() < 1e-4);
    }

    #[test]
    fn closed_form_matches_bisection() {
        for (eye, base) in [
            (Vec3::new(0.0, 0.0, 2.0), Vec3::new(4.0, 0.0, 0.0)),
            (Vec3::new(-1.0, 0.0, 1.5), Vec3::new(2.0, 0.0, 0.3)),
        ] {
            let project = pinhole(eye, base, -0.3, 0.6);
            let fitted = label_height(&project, 0.7, 8.0);
            let reference = bisect_height(&project, 0.7, 8.0);
            assert!(
                (fitted - reference).abs() < 1e-3,
                "fitted {fitted} vs reference {reference}"
            );
        }
    }

    #[test]
    fn marker_above_target_stays_on_marker() {
        // Stick base already projects above the target fraction.
        let project = pinhole(Vec3::new(0.0, 0.0, -3.0), Vec3::new(2.0, 0.0, 0.0), 0.0, 0.8);
        assert_eq!(label_height(&project, 0.7, 8.0), 0.0);
    }

    #[test]
    fn degenerate_samples_have_no_closed_form() {
        // Constant projection: y1 == y2.
        assert!(solve_linear_fractional([0.5, 0.5, 0.5], 0.7).is_none());
    }

    #[test]
    fn unprojectable_stick_gives_zero() {
        assert_eq!(label_height(|_| None, 0.7, 8.0), 0.0);
    }

    #[test]
    fn end_on_stick_keeps_label_at_marker() {
        assert_eq!(label_height(|_| Some(0.3), 0.7, 8.0), 0.0);
        assert_eq!(label_height(|_| Some(0.9), 0.7, 8.0), 0.0);
    }
}
