use std::{f64::consts::PI, fmt};

use serde::{Deserialize, Serialize};

const BACK_OVERSHOOT: f64 = 1.70158;
const ELASTIC_PERIOD: f64 = (2.0 * PI) / 3.0;

/// Shape of an easing curve, expressed as its "in" form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    Linear,
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Back,
    Elastic,
    Bounce,
}

/// Which end(s) of the transition the curve is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
    InOut,
    OutIn,
}

/// A resolved easing function. Resolution from a name never fails: anything
/// unrecognised becomes [`Easing::LINEAR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Easing {
    pub curve: Curve,
    pub direction: Direction,
}

impl Default for Easing {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl Easing {
    pub const LINEAR: Easing = Easing {
        curve: Curve::Linear,
        direction: Direction::In,
    };

    pub const fn new(curve: Curve, direction: Direction) -> Self {
        Self { curve, direction }
    }

    /// Resolves an easing name such as `outQuad`, `easeInOutSine`,
    /// `in-out-bounce` or the bare power names `in`, `out`, `inOut`, `outIn`.
    ///
    /// Matching ignores case, `-`/`_` separators and an optional `ease` prefix.
    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let rest = normalized.strip_prefix("ease").unwrap_or(&normalized);

        if rest.is_empty() || rest == "linear" || rest == "none" {
            return Self::LINEAR;
        }

        // Longest prefixes first so `inout` is not read as `in` + `out...`.
        let (direction, curve_name) = if let Some(c) = rest.strip_prefix("inout") {
            (Direction::InOut, c)
        } else if let Some(c) = rest.strip_prefix("outin") {
            (Direction::OutIn, c)
        } else if let Some(c) = rest.strip_prefix("in") {
            (Direction::In, c)
        } else if let Some(c) = rest.strip_prefix("out") {
            (Direction::Out, c)
        } else {
            return Self::LINEAR;
        };

        let curve = match curve_name {
            "" | "power" | "quad" | "quadratic" => Curve::Quad,
            "cubic" => Curve::Cubic,
            "quart" | "quartic" => Curve::Quart,
            "quint" | "quintic" => Curve::Quint,
            "sine" => Curve::Sine,
            "expo" | "exponential" => Curve::Expo,
            "circ" | "circular" => Curve::Circ,
            "back" => Curve::Back,
            "elastic" => Curve::Elastic,
            "bounce" => Curve::Bounce,
            _ => return Self::LINEAR,
        };

        Self::new(curve, direction)
    }

    /// Applies the easing to normalised progress `t`. Input is clamped to
    /// `[0, 1]`; `Back` and `Elastic` may overshoot the output range.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if self.curve == Curve::Linear {
            return t;
        }

        let eased_in = |x: f64| ease_in(self.curve, x);
        let eased_out = |x: f64| 1.0 - ease_in(self.curve, 1.0 - x);

        match self.direction {
            Direction::In => eased_in(t),
            Direction::Out => eased_out(t),
            Direction::InOut => {
                if t < 0.5 {
                    eased_in(2.0 * t) / 2.0
                } else {
                    1.0 - eased_in(2.0 - 2.0 * t) / 2.0
                }
            }
            Direction::OutIn => {
                if t < 0.5 {
                    eased_out(2.0 * t) / 2.0
                } else {
                    0.5 + eased_in(2.0 * t - 1.0) / 2.0
                }
            }
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.curve == Curve::Linear {
            return f.write_str("linear");
        }
        let direction = match self.direction {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::InOut => "inOut",
            Direction::OutIn => "outIn",
        };
        let curve = match self.curve {
            Curve::Linear => "",
            Curve::Quad => "Quad",
            Curve::Cubic => "Cubic",
            Curve::Quart => "Quart",
            Curve::Quint => "Quint",
            Curve::Sine => "Sine",
            Curve::Expo => "Expo",
            Curve::Circ => "Circ",
            Curve::Back => "Back",
            Curve::Elastic => "Elastic",
            Curve::Bounce => "Bounce",
        };
        write!(f, "{direction}{curve}")
    }
}

/// Evaluates the easing called `name` at `t`. Unknown or empty names behave
/// as `linear`.
pub fn evaluate(name: &str, t: f64) -> f64 {
    Easing::from_name(name).apply(t)
}

fn ease_in(curve: Curve, t: f64) -> f64 {
    match curve {
        Curve::Linear => t,
        Curve::Quad => t * t,
        Curve::Cubic => t * t * t,
        Curve::Quart => t.powi(4),
        Curve::Quint => t.powi(5),
        Curve::Sine => 1.0 - (t * PI / 2.0).cos(),
        Curve::Expo => {
            if t <= 0.0 {
                0.0
            } else {
                2f64.powf(10.0 * t - 10.0)
            }
        }
        Curve::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
        Curve::Back => (BACK_OVERSHOOT + 1.0) * t * t * t - BACK_OVERSHOOT * t * t,
        Curve::Elastic => {
            if t <= 0.0 {
                0.0
            } else if t >= 1.0 {
                1.0
            } else {
                -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_PERIOD).sin()
            }
        }
        Curve::Bounce => 1.0 - bounce_out(1.0 - t),
    }
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;

    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CURVES: [Curve; 11] = [
        Curve::Linear,
        Curve::Quad,
        Curve::Cubic,
        Curve::Quart,
        Curve::Quint,
        Curve::Sine,
        Curve::Expo,
        Curve::Circ,
        Curve::Back,
        Curve::Elastic,
        Curve::Bounce,
    ];
    const ALL_DIRECTIONS: [Direction; 4] = [
        Direction::In,
        Direction::Out,
        Direction::InOut,
        Direction::OutIn,
    ];

    #[test]
    fn unknown_and_empty_names_are_linear() {
        for name in ["", "linear", "wobble", "inSpaghetti", "out-of-order"] {
            assert_eq!(Easing::from_name(name), Easing::LINEAR, "{name}");
            assert_eq!(evaluate(name, 0.37), 0.37);
        }
    }

    #[test]
    fn resolves_common_spellings() {
        let expected = Easing::new(Curve::Quad, Direction::Out);
        for name in ["outQuad", "easeOutQuad", "out-quad", "OUT_QUAD"] {
            assert_eq!(Easing::from_name(name), expected, "{name}");
        }
        assert_eq!(
            Easing::from_name("inOutSine"),
            Easing::new(Curve::Sine, Direction::InOut)
        );
        assert_eq!(
            Easing::from_name("outInBounce"),
            Easing::new(Curve::Bounce, Direction::OutIn)
        );
        assert_eq!(Easing::from_name("in"), Easing::new(Curve::Quad, Direction::In));
    }

    #[test]
    fn display_round_trips_through_from_name() {
        for curve in ALL_CURVES {
            for direction in ALL_DIRECTIONS {
                let easing = Easing::new(curve, direction);
                let resolved = Easing::from_name(&easing.to_string());
                if curve == Curve::Linear {
                    assert_eq!(resolved, Easing::LINEAR);
                } else {
                    assert_eq!(resolved, easing);
                }
            }
        }
    }

    #[test]
    fn every_curve_hits_its_endpoints() {
        for curve in ALL_CURVES {
            for direction in ALL_DIRECTIONS {
                let easing = Easing::new(curve, direction);
                assert!(easing.apply(0.0).abs() < 1e-9, "{easing} at 0");
                assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{easing} at 1");
            }
        }
    }

    #[test]
    fn symmetric_directions_pass_through_midpoint() {
        for curve in ALL_CURVES {
            for direction in [Direction::InOut, Direction::OutIn] {
                let easing = Easing::new(curve, direction);
                assert!((easing.apply(0.5) - 0.5).abs() < 1e-9, "{easing}");
            }
        }
    }

    #[test]
    fn out_quad_reference_value() {
        assert!((evaluate("outQuad", 0.5) - 0.75).abs() < 1e-12);
        assert!((evaluate("inCubic", 0.5) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn out_mirrors_in() {
        for curve in ALL_CURVES {
            let ease_in = Easing::new(curve, Direction::In);
            let ease_out = Easing::new(curve, Direction::Out);
            for t in [0.1, 0.3, 0.5, 0.8] {
                let mirrored = 1.0 - ease_in.apply(1.0 - t);
                assert!((ease_out.apply(t) - mirrored).abs() < 1e-12, "{ease_out} at {t}");
            }
        }
    }

    #[test]
    fn back_overshoots_below_zero() {
        let easing = Easing::new(Curve::Back, Direction::In);
        assert!(easing.apply(0.2) < 0.0);
    }

    #[test]
    fn clamps_out_of_range_progress() {
        let easing = Easing::new(Curve::Cubic, Direction::Out);
        assert_eq!(easing.apply(-3.0), 0.0);
        assert_eq!(easing.apply(7.0), 1.0);
        assert_eq!(easing.apply(f64::NAN), 0.0);
    }
}
