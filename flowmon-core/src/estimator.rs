//! Volumetric flow through a partly full circular pipe.
//!
//! The wetted cross-section is found by integrating the half-chord width
//! `w(x) = sqrt(r² - (x - r)²)` from the pipe floor up to the liquid depth.
//! That integral covers one side of the chord, so the full area is twice it.

use crate::error::{FlowmonError, Result};
use flowmon_utils::numbers::round_to;

/// Cubic inches to US gallons
pub const CUBIC_INCHES_TO_GALLONS: f64 = 0.004329;

pub const INCHES_PER_FOOT: f64 = 12.0;

pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Flow values are reported to this many decimals.
pub const FLOW_DECIMALS: i32 = 3;

/// Quadrature tolerance relative to the squared radius, the scale of the area.
const QUADRATURE_TOLERANCE: f64 = 1e-10;
const QUADRATURE_MAX_DEPTH: u32 = 30;

/// Half the chord length of a circle of `radius` at height `x` above its lowest point.
pub fn half_chord(x: f64, radius: f64) -> f64 {
    let offset = x - radius;
    // rounding at x = 0 or x = 2r can push the radicand a hair below zero
    (radius * radius - offset * offset).max(0.0).sqrt()
}

/// Area (square inches) under the half-chord from the pipe floor to `depth`.
pub fn half_wetted_area(depth: f64, radius: f64) -> f64 {
    adaptive_simpson(
        |x| half_chord(x, radius),
        0.0,
        depth,
        QUADRATURE_TOLERANCE * radius * radius,
    )
}

/// Wetted cross-sectional area (square inches) of a circular pipe filled to `depth`.
pub fn wetted_area(depth: f64, radius: f64) -> f64 {
    2.0 * half_wetted_area(depth, radius)
}

/// Flow in US gallons/minute for a liquid `depth` (inches) moving at
/// `velocity` (feet/sec) through a pipe of `radius` (inches), rounded to
/// three decimals.
///
/// Depths outside `[0, 2 * radius]` have no cross-section and are rejected.
pub fn flow_rate(depth: f64, velocity: f64, radius: f64) -> Result<f64> {
    let diameter = 2.0 * radius;
    if !depth.is_finite() || depth < 0.0 || depth > diameter {
        return Err(FlowmonError::Geometry { depth, diameter });
    }
    let area = wetted_area(depth, radius);
    let inches_per_second = velocity * INCHES_PER_FOOT;
    let gallons_per_minute =
        area * inches_per_second * CUBIC_INCHES_TO_GALLONS * SECONDS_PER_MINUTE;
    Ok(round_to(gallons_per_minute, FLOW_DECIMALS))
}

/// Integrate `f` over `[a, b]` with adaptive Simpson's rule.
///
/// Intervals are bisected until the Simpson estimates of the two halves agree
/// with the whole to within `tolerance` (scaled down at each level) or the
/// recursion limit is reached.
pub fn adaptive_simpson<F>(f: F, a: f64, b: f64, tolerance: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return 0.0;
    }
    let fa = f(a);
    let fb = f(b);
    let m = (a + b) / 2.0;
    let fm = f(m);
    let whole = simpson(a, b, fa, fm, fb);
    refine(&f, a, b, fa, fm, fb, whole, tolerance, QUADRATURE_MAX_DEPTH)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn refine<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tolerance: f64,
    depth: u32,
) -> f64
where
    F: Fn(f64) -> f64,
{
    let m = (a + b) / 2.0;
    let lm = (a + m) / 2.0;
    let rm = (m + b) / 2.0;
    let flm = f(lm);
    let frm = f(rm);
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;
    if depth == 0 || delta.abs() <= 15.0 * tolerance {
        return left + right + delta / 15.0;
    }
    refine(f, a, m, fa, flm, fm, left, tolerance / 2.0, depth - 1)
        + refine(f, m, b, fm, frm, fb, right, tolerance / 2.0, depth - 1)
}
