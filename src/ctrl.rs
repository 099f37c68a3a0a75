//! Control patterns and related items.
//!
//! A control pattern's values are maps of named parameters destined for an
//! external scheduler or synth. Controls from separate patterns are unioned
//! with [`Pattern::merge_extend`].

use crate::{atom, Pattern, Rational};

/// A pattern value type that allows for representing a set of labelled controls.
pub type Controls = std::collections::BTreeMap<String, Value>;

pub const SOUND: &str = "sound";
pub const NOTE: &str = "note";
pub const GAIN: &str = "gain";
pub const PAN: &str = "pan";

/// The set of possible control value types.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Value {
    String(String),
    F64(f64),
    Rational(Rational),
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::F64(f)
    }
}

impl From<Rational> for Value {
    fn from(r: Rational) -> Self {
        Self::Rational(r)
    }
}

/// Given a pattern of sound names, produce a control pattern of `"sound"` events.
pub fn sound<P>(pattern: P) -> impl Pattern<Value = Controls>
where
    P: 'static + Pattern,
    P::Value: Clone + Into<String>,
{
    control(SOUND, pattern.map(|s: P::Value| Value::String(s.into())))
}

/// Given a pattern of note values, produce a control pattern of `"note"` events.
pub fn note<P>(pattern: P) -> impl Pattern<Value = Controls>
where
    P: 'static + Pattern<Value = f64>,
{
    control(NOTE, pattern.map(Value::F64))
}

/// Given a pattern of amplitudes, produce a control pattern of `"gain"` events.
pub fn gain<P>(pattern: P) -> impl Pattern<Value = Controls>
where
    P: 'static + Pattern<Value = f64>,
{
    control(GAIN, pattern.map(Value::F64))
}

/// Given a pattern of stereo positions, produce a control pattern of `"pan"` events.
pub fn pan<P>(pattern: P) -> impl Pattern<Value = Controls>
where
    P: 'static + Pattern<Value = f64>,
{
    control(PAN, pattern.map(Value::F64))
}

/// Label every value of the pattern with the given control name.
pub fn control<P>(name: &'static str, pattern: P) -> impl Pattern<Value = Controls>
where
    P: 'static + Pattern<Value = Value>,
{
    let f = move |v: Value| std::iter::once((name.to_string(), v)).collect();
    pattern.app(atom(f))
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{from_list, span, wave};

    #[test]
    fn test_sound() {
        let p = sound(from_list(["bd", "sn"]));
        let mut cycle = p.query(span!(0 / 1, 1 / 1));
        let ev = cycle.next().unwrap();
        assert_eq!(ev.span.active, span!(0 / 1, 1 / 2));
        assert_eq!(ev.value[SOUND], Value::String("bd".into()));
        let ev = cycle.next().unwrap();
        assert_eq!(ev.value[SOUND], Value::String("sn".into()));
        assert!(cycle.next().is_none());
    }

    #[test]
    fn test_merge_extend() {
        let p = sound(atom("hello")).merge_extend(note(atom(4.0)));
        let mut cycle = p.query(span!(0 / 1, 1 / 1));
        let mut expected = Controls::new();
        expected.insert(SOUND.to_string(), Value::String("hello".into()));
        expected.insert(NOTE.to_string(), Value::F64(4.0));
        assert_eq!(cycle.next().unwrap().value, expected);
        assert!(cycle.next().is_none());
    }

    #[test]
    fn test_merge_extend_signal() {
        // A continuous control merged onto a discrete one keeps the
        // discrete structure and samples the signal per event.
        let p = sound(from_list(["bd", "sn"])).merge_extend(pan(wave::saw()));
        let values: Vec<_> = p.query(span!(0 / 1, 1 / 1)).map(|ev| ev.value).collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0][PAN], Value::F64(0.0));
        assert_eq!(values[1][PAN], Value::F64(0.5));
        assert_eq!(values[1][SOUND], Value::String("sn".into()));
    }
}
