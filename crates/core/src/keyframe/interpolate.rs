use crate::{color, Result, SyncFrameError};

use super::{Keyframe, KeyframeValue};

/// Resolves the value of a keyframe group at `time`.
///
/// `group` must be sorted ascending by time with ties kept in insertion
/// order, as produced by [`super::KeyframeGroup`]. Returns `None` for an empty
/// group. When the bounding pair cannot be blended (unparseable colour,
/// mixed kinds) the earlier keyframe's value is held.
pub fn evaluate(group: &[Keyframe], time: f64) -> Option<KeyframeValue> {
    match try_interpolate(group, time) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(%err, time, "holding previous keyframe value");
            bounding_pair(group, time).map(|(prev, _)| prev.value().clone())
        }
    }
}

/// Like [`evaluate`] but surfaces blend failures instead of recovering.
pub fn try_interpolate(group: &[Keyframe], time: f64) -> Result<Option<KeyframeValue>> {
    let Some(first) = group.first() else {
        return Ok(None);
    };
    let time = if time.is_nan() { 0.0 } else { time };

    // Index of the first keyframe strictly after `time`. Among keyframes that
    // share a timestamp the last inserted one sits last, so it wins.
    let idx = group.partition_point(|k| k.time() <= time);
    if idx == 0 {
        return Ok(Some(first.value().clone()));
    }
    if idx == group.len() {
        return Ok(group.last().map(|k| k.value().clone()));
    }

    let prev = &group[idx - 1];
    let next = &group[idx];
    let span = next.time() - prev.time();
    let t = (time - prev.time()) / span;
    let eased = next.easing().apply(t);

    blend(prev.value(), next.value(), eased).map(Some)
}

fn bounding_pair(group: &[Keyframe], time: f64) -> Option<(&Keyframe, &Keyframe)> {
    let idx = group.partition_point(|k| k.time() <= time);
    if idx == 0 {
        return group.first().map(|k| (k, k));
    }
    if idx == group.len() {
        return group.last().map(|k| (k, k));
    }
    Some((&group[idx - 1], &group[idx]))
}

fn blend(prev: &KeyframeValue, next: &KeyframeValue, t: f64) -> Result<KeyframeValue> {
    let value = match (prev, next) {
        (KeyframeValue::Number(a), KeyframeValue::Number(b)) => {
            KeyframeValue::Number(lerp(*a, *b, t))
        }
        (KeyframeValue::Vector(a), KeyframeValue::Vector(b)) => KeyframeValue::Vector([
            lerp(a[0], b[0], t),
            lerp(a[1], b[1], t),
            lerp(a[2], b[2], t),
        ]),
        // Categorical: hold until the next keyframe's time is reached.
        (KeyframeValue::Bool(_), KeyframeValue::Bool(_))
        | (KeyframeValue::Discrete(_), KeyframeValue::Discrete(_)) => prev.clone(),
        (KeyframeValue::Color(a), KeyframeValue::Color(b)) => {
            KeyframeValue::Color(color::blend(a, b, t)?)
        }
        (a, b) => {
            return Err(SyncFrameError::malformed(format!(
                "cannot blend {} into {}",
                a.kind(),
                b.kind()
            )))
        }
    };
    Ok(value)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Property;

    fn number(time: f64, value: f64, ease: &str) -> Keyframe {
        Keyframe::new("cube", Property::PositionX, time, KeyframeValue::Number(value))
            .unwrap()
            .with_ease(ease)
    }

    fn clip(time: f64, name: &str) -> Keyframe {
        Keyframe::new(
            "dancer",
            Property::ActiveAnimation,
            time,
            KeyframeValue::Discrete(name.into()),
        )
        .unwrap()
    }

    fn color(time: f64, value: &str) -> Keyframe {
        Keyframe::new(
            "light",
            Property::MaterialColor,
            time,
            KeyframeValue::Color(value.into()),
        )
        .unwrap()
    }

    fn as_number(value: Option<KeyframeValue>) -> f64 {
        value.and_then(|v| v.as_number()).expect("numeric value")
    }

    #[test]
    fn empty_group_contributes_nothing() {
        assert_eq!(evaluate(&[], 1.0), None);
    }

    #[test]
    fn holds_first_and_last_values_outside_the_range() {
        let group = [number(2.0, 10.0, "linear"), number(4.0, 20.0, "linear")];
        for t in [0.0, 1.0, 2.0] {
            assert_eq!(as_number(evaluate(&group, t)), 10.0);
        }
        for t in [4.0, 5.0, 1e9] {
            assert_eq!(as_number(evaluate(&group, t)), 20.0);
        }
    }

    #[test]
    fn single_keyframe_is_constant() {
        let group = [number(3.0, 7.0, "inOutElastic")];
        for t in [0.0, 3.0, 3.5, 100.0] {
            assert_eq!(as_number(evaluate(&group, t)), 7.0);
        }
    }

    #[test]
    fn linear_midpoint() {
        let group = [number(0.0, 0.0, "linear"), number(10.0, 100.0, "linear")];
        assert_eq!(as_number(evaluate(&group, 5.0)), 50.0);
    }

    #[test]
    fn incoming_keyframe_easing_governs_the_segment() {
        let group = [
            number(0.0, 0.0, "inCubic"),
            number(10.0, 100.0, "outQuad"),
        ];
        assert!((as_number(evaluate(&group, 5.0)) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn picks_the_tightest_bounding_pair() {
        let group: Vec<_> = (0..100)
            .map(|i| number(i as f64, (i * 10) as f64, "linear"))
            .collect();
        assert!((as_number(evaluate(&group, 42.5)) - 425.0).abs() < 1e-9);
        assert_eq!(as_number(evaluate(&group, 42.0)), 420.0);
    }

    #[test]
    fn vectors_blend_component_wise() {
        let vector = |time, value| {
            Keyframe::new("cube", Property::Position, time, KeyframeValue::Vector(value)).unwrap()
        };
        let a = vector(0.0, [0.0, 10.0, -4.0]);
        let b = vector(2.0, [2.0, 20.0, 4.0]);
        let value = evaluate(&[a, b], 1.0).and_then(|v| v.as_vector()).unwrap();
        assert_eq!(value, [1.0, 15.0, 0.0]);
    }

    #[test]
    fn discrete_values_hold_then_snap() {
        let group = [clip(0.0, "clipA"), clip(5.0, "clipB")];
        assert_eq!(evaluate(&group, 2.5), Some(KeyframeValue::Discrete("clipA".into())));
        assert_eq!(evaluate(&group, 4.999), Some(KeyframeValue::Discrete("clipA".into())));
        assert_eq!(evaluate(&group, 5.0), Some(KeyframeValue::Discrete("clipB".into())));
    }

    #[test]
    fn booleans_hold_then_snap() {
        let on = Keyframe::new("cube", Property::Visible, 0.0, KeyframeValue::Bool(true)).unwrap();
        let off =
            Keyframe::new("cube", Property::Visible, 1.0, KeyframeValue::Bool(false)).unwrap();
        let group = [on, off];
        assert_eq!(evaluate(&group, 0.99), Some(KeyframeValue::Bool(true)));
        assert_eq!(evaluate(&group, 1.0), Some(KeyframeValue::Bool(false)));
    }

    #[test]
    fn colours_wrap_hue_the_short_way() {
        let group = [color(0.0, "#ff004d"), color(1.0, "#ff4d00")];
        assert_eq!(evaluate(&group, 0.5), Some(KeyframeValue::Color("#ff0000".into())));
    }

    #[test]
    fn unparseable_colour_holds_previous_value() {
        let group = [color(0.0, "#102030"), color(1.0, "chartreuse-ish")];
        assert_eq!(evaluate(&group, 0.5), Some(KeyframeValue::Color("#102030".into())));
        assert!(try_interpolate(&group, 0.5).is_err());
    }

    #[test]
    fn mixed_kinds_hold_previous_value() {
        let group = [number(0.0, 1.0, "linear"), color(1.0, "#ffffff")];
        assert_eq!(evaluate(&group, 0.5), Some(KeyframeValue::Number(1.0)));
    }

    #[test]
    fn bounding_pair_clamps_to_the_nearest_end() {
        let group = [
            number(1.0, 0.0, "linear"),
            number(2.0, 1.0, "linear"),
            number(3.0, 2.0, "linear"),
        ];
        let ids = |pair: Option<(&Keyframe, &Keyframe)>| pair.map(|(a, b)| (a.id(), b.id()));

        assert_eq!(ids(bounding_pair(&group, 0.5)), Some((group[0].id(), group[0].id())));
        assert_eq!(ids(bounding_pair(&group, 1.5)), Some((group[0].id(), group[1].id())));
        assert_eq!(ids(bounding_pair(&group, 9.0)), Some((group[2].id(), group[2].id())));
        assert_eq!(ids(bounding_pair(&[], 1.0)), None);
    }

    #[test]
    fn duplicate_timestamps_resolve_to_the_last_inserted() {
        let group = [
            number(0.0, 0.0, "linear"),
            number(5.0, 1.0, "linear"),
            number(5.0, 2.0, "linear"),
            number(10.0, 3.0, "linear"),
        ];
        assert_eq!(as_number(evaluate(&group, 5.0)), 2.0);
        assert!((as_number(evaluate(&group, 7.5)) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let group = [number(0.0, 3.0, "inOutBack"), number(1.3, -8.0, "outBounce")];
        let first = evaluate(&group, 0.731);
        for _ in 0..10 {
            assert_eq!(evaluate(&group, 0.731), first);
        }
    }
}
