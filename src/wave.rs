//! Continuous waveform and envelope signals.
//!
//! Each is a [`signal`]: querying any span yields a single event whose value
//! samples the waveform at the span's start, and whose whole is absent.
//! All waveforms are unipolar (`0..=1`); use [`Pattern::polar`] for the
//! `-1..=1` range.

use crate::{append, cycle_pos, signal, DynPattern, Pattern, Rational, ToF64Lossy};
use std::f64::consts::{FRAC_PI_2, TAU};

/// A sine wave, one period per cycle.
pub fn sine() -> impl Pattern<Value = f64> {
    signal(|t: Rational| (f64::sin(t.to_f64_lossy() * TAU) + 1.0) / 2.0)
}

/// A quarter-cycle-late [`sine`].
pub fn cosine() -> DynPattern<f64> {
    sine().rotr(Rational::new(1, 4))
}

/// A sawtooth rising from 0 to 1 over each cycle.
pub fn saw() -> impl Pattern<Value = f64> {
    signal(|t: Rational| cycle_pos(t).to_f64_lossy())
}

/// A sawtooth in the range -1..=1.
pub fn saw2() -> impl Pattern<Value = f64> {
    saw().polar()
}

/// A triangle wave: a rising cycle followed by a falling one.
pub fn tri() -> DynPattern<f64> {
    append(saw(), saw().rev())
}

/// A square wave: 0 for the first half of each cycle, 1 for the second.
pub fn square() -> impl Pattern<Value = f64> {
    signal(|t: Rational| (cycle_pos(t) * 2).floor().to_f64_lossy())
}

/// A one-shot linear rise over the first cycle, holding at 1 thereafter.
pub fn env_l() -> impl Pattern<Value = f64> {
    signal(|t: Rational| clamp_unit(t).to_f64_lossy())
}

/// A one-shot linear fall over the first cycle, holding at 0 thereafter.
pub fn env_lr() -> impl Pattern<Value = f64> {
    signal(|t: Rational| 1.0 - clamp_unit(t).to_f64_lossy())
}

/// An equal-power fade-out over the first cycle.
pub fn env_eq() -> impl Pattern<Value = f64> {
    signal(|t: Rational| {
        let x = 1.0 - clamp_unit(t).to_f64_lossy();
        f64::sqrt(f64::sin(FRAC_PI_2 * x))
    })
}

/// An equal-power fade-in over the first cycle.
pub fn env_eqr() -> impl Pattern<Value = f64> {
    signal(|t: Rational| {
        let x = 1.0 - clamp_unit(t).to_f64_lossy();
        f64::sqrt(f64::cos(FRAC_PI_2 * x))
    })
}

fn clamp_unit(t: Rational) -> Rational {
    t.clamp(Rational::from(0), Rational::from(1))
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{span, Span};

    fn sample<P: Pattern<Value = f64>>(p: &P, t: Rational) -> f64 {
        p.query(Span::instant(t)).next().unwrap().value
    }

    #[test]
    fn test_signal_event_shape() {
        let q = span!(1 / 4, 3 / 4);
        let mut es = sine().query(q);
        let ev = es.next().unwrap();
        assert_eq!(ev.span.active, q);
        assert_eq!(ev.span.whole, None);
        assert!(es.next().is_none());
        // Reversed spans yield nothing.
        assert!(sine().query(span!(3 / 4, 1 / 4)).next().is_none());
    }

    #[test]
    fn test_sine() {
        assert!((sample(&sine(), Rational::from(0)) - 0.5).abs() < 1e-9);
        assert!((sample(&sine(), Rational::new(1, 4)) - 1.0).abs() < 1e-9);
        assert!((sample(&sine(), Rational::new(3, 4)) - 0.0).abs() < 1e-9);
        // One period per cycle.
        let a = sample(&sine(), Rational::new(1, 8));
        let b = sample(&sine(), Rational::new(9, 8));
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_is_late_sine() {
        let p = cosine();
        assert!((sample(&p, Rational::new(1, 4)) - 0.5).abs() < 1e-9);
        assert!((sample(&p, Rational::new(1, 2)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_saw() {
        assert_eq!(sample(&saw(), Rational::from(0)), 0.0);
        assert_eq!(sample(&saw(), Rational::new(1, 2)), 0.5);
        // Repeats each cycle, including negative time.
        assert_eq!(
            sample(&saw(), Rational::new(1, 4)),
            sample(&saw(), Rational::new(-3, 4)),
        );
        assert_eq!(
            sample(&saw(), Rational::new(1, 2)),
            sample(&saw(), Rational::new(-1, 2)),
        );
    }

    #[test]
    fn test_saw2() {
        assert_eq!(sample(&saw2(), Rational::from(0)), -1.0);
        assert_eq!(sample(&saw2(), Rational::new(1, 2)), 0.0);
        assert_eq!(sample(&saw2(), Rational::new(3, 4)), 0.5);
    }

    #[test]
    fn test_tri() {
        let p = tri();
        // Rising in even cycles, falling in odd.
        assert_eq!(sample(&p, Rational::new(1, 4)), 0.25);
        assert_eq!(sample(&p, Rational::new(7, 4)), 0.25);
        assert_eq!(sample(&p, Rational::new(9, 4)), 0.25);
    }

    #[test]
    fn test_square() {
        assert_eq!(sample(&square(), Rational::from(0)), 0.0);
        assert_eq!(sample(&square(), Rational::new(1, 4)), 0.0);
        assert_eq!(sample(&square(), Rational::new(1, 2)), 1.0);
        assert_eq!(sample(&square(), Rational::new(3, 4)), 1.0);
        assert_eq!(sample(&square(), Rational::new(5, 4)), 0.0);
    }

    #[test]
    fn test_env_l() {
        assert_eq!(sample(&env_l(), Rational::new(-1, 2)), 0.0);
        assert_eq!(sample(&env_l(), Rational::new(1, 2)), 0.5);
        assert_eq!(sample(&env_l(), Rational::from(3)), 1.0);
        assert_eq!(sample(&env_lr(), Rational::new(1, 2)), 0.5);
        assert_eq!(sample(&env_lr(), Rational::from(3)), 0.0);
    }

    #[test]
    fn test_env_eq() {
        // Fade-out: full at the origin, silent after one cycle.
        assert!((sample(&env_eq(), Rational::from(0)) - 1.0).abs() < 1e-9);
        assert!(sample(&env_eq(), Rational::from(1)).abs() < 1e-9);
        // Fade-in: silent at the origin, full after one cycle.
        assert!(sample(&env_eqr(), Rational::from(0)).abs() < 1e-9);
        assert!((sample(&env_eqr(), Rational::from(1)) - 1.0).abs() < 1e-9);
        // Equal power: the two cross at equal amplitude.
        let half = Rational::new(1, 2);
        let in_ = sample(&env_eq(), half);
        let out = sample(&env_eqr(), half);
        assert!((in_ - out).abs() < 1e-9);
    }
}
