//! Arithmetic and value-selection operators between patterns.
//!
//! Each operation comes in three structural flavours, differing only in
//! whose events shape the result:
//!
//! - the plain form (e.g. [`Ops::add`]) takes structure from both sides,
//!   emitting an event per intersection of active spans;
//! - the `_left` form keeps the left pattern's events, sampling the right
//!   at each of their onsets;
//! - the `_right` form is the mirror image.
//!
//! [`Ops::keep`] and [`Ops::replace`] select one side's value outright while
//! still combining structure, useful for overriding values on an existing
//! timing skeleton.

use crate::{DynPattern, Pattern};
use std::ops::{Add, Div, Mul, Rem, Sub};

/// Binary operators over pairs of patterns, in the three structural flavours.
///
/// Implemented for every [`Pattern`]; the arithmetic forms require the value
/// types to support the corresponding `std::ops` operator.
pub trait Ops: Pattern {
    fn add<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Add<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with(other, |a, b| a + b)
    }

    fn add_left<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Add<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_left(other, |a, b| a + b)
    }

    fn add_right<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Add<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_right(other, |a, b| a + b)
    }

    fn sub<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Sub<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with(other, |a, b| a - b)
    }

    fn sub_left<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Sub<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_left(other, |a, b| a - b)
    }

    fn sub_right<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Sub<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_right(other, |a, b| a - b)
    }

    fn mul<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Mul<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with(other, |a, b| a * b)
    }

    fn mul_left<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Mul<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_left(other, |a, b| a * b)
    }

    fn mul_right<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Mul<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_right(other, |a, b| a * b)
    }

    fn div<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Div<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with(other, |a, b| a / b)
    }

    fn div_left<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Div<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_left(other, |a, b| a / b)
    }

    fn div_right<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Div<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_right(other, |a, b| a / b)
    }

    fn rem<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Rem<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with(other, |a, b| a % b)
    }

    fn rem_left<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Rem<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_left(other, |a, b| a % b)
    }

    fn rem_right<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Rem<P::Value, Output = Self::Value>,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_right(other, |a, b| a % b)
    }

    /// Keep `self`'s values, combining structure with `other`.
    fn keep<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with(other, |a, _b| a)
    }

    fn keep_left<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_left(other, |a, _b| a)
    }

    fn keep_right<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_right(other, |a, _b| a)
    }

    /// Take `other`'s values, combining structure with `self`.
    fn replace<P>(self, other: P) -> DynPattern<P::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with(other, |_a, b| b)
    }

    fn replace_left<P>(self, other: P) -> DynPattern<P::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_left(other, |_a, b| b)
    }

    fn replace_right<P>(self, other: P) -> DynPattern<P::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern,
        P::Value: Clone,
    {
        self.merge_with_right(other, |_a, b| b)
    }
}

impl<P: Pattern> Ops for P {}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{atom, from_list, span, Span};

    fn spans<P: Pattern>(p: &P, span: Span) -> Vec<(P::Value, Span, Option<Span>)> {
        p.query(span)
            .map(|ev| (ev.value, ev.span.active, ev.span.whole))
            .collect()
    }

    #[test]
    fn test_add_structures() {
        // Both sides: an event per intersection.
        let p = from_list([1, 2]).add(atom(10));
        let es = spans(&p, span!(0 / 1, 1 / 1));
        assert_eq!(
            es,
            vec![
                (11, span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
                (12, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
            ]
        );
        // Left: one event per left event, the right sampled at each onset.
        let p = atom(1).add_left(from_list([10, 20]));
        let es = spans(&p, span!(0 / 1, 1 / 1));
        assert_eq!(es, vec![(11, span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1)))]);
        // Right: the mirror image.
        let p = atom(1).add_right(from_list([10, 20]));
        let es = spans(&p, span!(0 / 1, 1 / 1));
        assert_eq!(
            es,
            vec![
                (11, span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
                (21, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
            ]
        );
    }

    #[test]
    fn test_sub_mul_div_rem() {
        let q = span!(0 / 1, 1 / 1);
        let values = |p: DynPattern<i64>| -> Vec<i64> {
            p.query(q).map(|ev| ev.value).collect()
        };
        assert_eq!(values(from_list([10, 20]).sub(atom(1))), vec![9, 19]);
        assert_eq!(values(from_list([3, 5]).mul(atom(2))), vec![6, 10]);
        assert_eq!(values(from_list([10, 21]).div(atom(2))), vec![5, 10]);
        assert_eq!(values(from_list([10, 21]).rem(atom(4))), vec![2, 1]);
        assert_eq!(values(from_list([10, 20]).sub_left(atom(1))), vec![9, 19]);
        assert_eq!(values(atom(3).mul_right(from_list([2, 4]))), vec![6, 12]);
    }

    #[test]
    fn test_keep_replace() {
        let q = span!(0 / 1, 1 / 1);
        // Values from the left, structure intersected.
        let p = from_list([1, 2]).keep(atom(10));
        let es = spans(&p, q);
        assert_eq!(
            es,
            vec![
                (1, span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
                (2, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
            ]
        );
        // Values from the right over the left's timing skeleton.
        let p = from_list([1, 2]).replace_left(atom(10));
        let es = spans(&p, q);
        assert_eq!(
            es,
            vec![
                (10, span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
                (10, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
            ]
        );
        // Structure from the right, values from the left's sounding events.
        let p = from_list([1, 2]).keep_right(atom(10));
        let es = spans(&p, q);
        assert_eq!(es, vec![(1, span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1)))]);
    }

    #[test]
    fn test_rational_values() {
        use crate::Rational;
        let q = span!(0 / 1, 1 / 1);
        let p = from_list([Rational::new(1, 2), Rational::new(1, 3)])
            .add(atom(Rational::new(1, 6)));
        let values: Vec<_> = p.query(q).map(|ev| ev.value).collect();
        assert_eq!(values, vec![Rational::new(2, 3), Rational::new(1, 2)]);
    }
}
