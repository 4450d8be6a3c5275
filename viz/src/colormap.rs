//! The "hot" colour map: black through red and yellow to white.
//!
//! Breakpoints follow matplotlib's `hot` so figures match what astronomers
//! expect from the usual quick-look tools.

use plotters::style::RGBColor;

const RED_END: f64 = 0.365079;
const GREEN_END: f64 = 0.746032;
const RED_START_LEVEL: f64 = 0.0416;

/// Linear ramp from `floor` at `start` to 1 at `end`, clamped outside.
fn ramp(t: f64, start: f64, end: f64, floor: f64) -> f64 {
    if t <= start {
        floor
    } else if t >= end {
        1.0
    } else {
        floor + (1.0 - floor) * (t - start) / (end - start)
    }
}

fn to_byte(channel: f64) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Colour at position `t` in [0, 1]; values outside are clamped and NaN maps to 0.
pub fn hot(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    RGBColor(
        to_byte(ramp(t, 0.0, RED_END, RED_START_LEVEL)),
        to_byte(ramp(t, RED_END, GREEN_END, 0.0)),
        to_byte(ramp(t, GREEN_END, 1.0, 0.0)),
    )
}

/// Colour of `value` on a linear scale from `min` to `max`.
pub fn hot_scaled(value: f64, min: f64, max: f64) -> RGBColor {
    if max > min {
        hot((value - min) / (max - min))
    } else {
        hot(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hot_endpoints() {
        assert_eq!(hot(0.0), RGBColor(11, 0, 0));
        assert_eq!(hot(1.0), RGBColor(255, 255, 255));
        assert_eq!(hot(-3.0), hot(0.0));
        assert_eq!(hot(f64::NAN), hot(0.0));
    }

    #[test]
    fn test_hot_breakpoints() {
        assert_eq!(hot(RED_END), RGBColor(255, 0, 0));
        assert_eq!(hot(GREEN_END), RGBColor(255, 255, 0));
    }

    #[test]
    fn test_hot_is_monotonic() {
        let colors: Vec<RGBColor> = (0..=100).map(|i| hot(i as f64 / 100.0)).collect();
        for pair in colors.windows(2) {
            assert!(pair[1].0 >= pair[0].0);
            assert!(pair[1].1 >= pair[0].1);
            assert!(pair[1].2 >= pair[0].2);
        }
    }

    #[test]
    fn test_hot_scaled_flat_range() {
        assert_eq!(hot_scaled(2.0, 2.0, 2.0), RGBColor(255, 255, 255));
        assert_eq!(hot_scaled(5.0, 0.0, 10.0), hot(0.5));
    }
}
