//! The `Span` type and the rational time algebra.

use crate::Rational;
use std::fmt;

/// A shorthand macro for constructing spans from rationals, e.g. `span!(0/1, 3/1)`.
#[macro_export]
macro_rules! span {
    ($n1:literal/$d1:literal, $n2:literal/$d2:literal) => {{
        span!($n1 / $d1, $crate::Rational::new_raw($n2, $d2))
    }};
    ($n1:literal/$d1:literal, $r2:expr) => {{
        span!($crate::Rational::new_raw($n1, $d1), $r2)
    }};
    ($r1:expr, $n2:literal/$d2:literal) => {{
        span!($r1, $crate::Rational::new_raw($n2, $d2))
    }};
    ($r1:expr, $r2:expr) => {{
        $crate::Span::new($r1, $r2)
    }};
    ($n:literal / $d:literal) => {{
        span!($crate::Rational::new_raw($n, $d))
    }};
    ($r:expr) => {{
        $crate::Span::instant($r)
    }};
}

/// The start of the cycle containing `t`: the greatest integer at or below it.
pub fn sam(t: Rational) -> Rational {
    t.floor()
}

/// The start of the cycle following the one containing `t`.
pub fn next_sam(t: Rational) -> Rational {
    sam(t) + 1
}

/// The position of `t` within its cycle, in `0..1`.
pub fn cycle_pos(t: Rational) -> Rational {
    t - sam(t)
}

/// A half-open rational range `[start, end)` over a single dimension.
///
/// A span is *zero-width* when `start == end` and invalid for events when
/// `start > end` (queries over such spans produce nothing).
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Span {
    pub start: Rational,
    pub end: Rational,
}

impl Span {
    pub fn new(start: Rational, end: Rational) -> Self {
        Span { start, end }
    }

    pub fn instant(start @ end: Rational) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> Rational {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Partition the span at cycle boundaries.
    ///
    /// Yields one sub-span per cycle touched, each wholly inside its cycle.
    /// Empty (including zero-width) spans yield nothing.
    pub fn cycles(self) -> impl Iterator<Item = Self> {
        let Span { mut start, end } = self;
        std::iter::from_fn(move || {
            if start >= end {
                None
            } else if start >= end.floor() {
                let span = Span { start, end };
                start = end;
                Some(span)
            } else {
                let this_end = start.floor() + 1;
                let span = Span {
                    start,
                    end: this_end,
                };
                start = this_end;
                Some(span)
            }
        })
    }

    /// Like [`Span::cycles`], but a zero-width span yields itself once.
    ///
    /// Zero-width queries ask "what is sounding at this instant" and must
    /// not be discarded by per-cycle splitting.
    pub fn cycles_zw(self) -> impl Iterator<Item = Self> {
        let mut zero_width = (self.start == self.end).then_some(self);
        let mut rest = self.cycles();
        std::iter::from_fn(move || zero_width.take().or_else(|| rest.next()))
    }

    /// The whole cycles `(n, n+1)` that intersect the span.
    pub fn whole_cycles(self) -> impl Iterator<Item = Self> {
        let mut n = self.start.floor();
        let end = self.end.ceil();
        std::iter::from_fn(move || {
            if n >= end {
                None
            } else {
                let span = Span::new(n, n + 1);
                n = n + 1;
                Some(span)
            }
        })
    }

    pub fn map(self, f: impl Fn(Rational) -> Rational) -> Self {
        span!(f(self.start), f(self.end))
    }

    /// Apply `f` to both points in coordinates relative to the start's sam.
    pub fn map_cycle(self, f: impl Fn(Rational) -> Rational) -> Self {
        let c = sam(self.start);
        self.map(|t| c + f(t - c))
    }

    /// Reflect the span about the point `m`, swapping start and end.
    pub fn mirror(self, m: Rational) -> Self {
        Span::new(m + m - self.end, m + m - self.start)
    }

    /// Checks if point lies within the span exclusively.
    pub fn contains(&self, point: Rational) -> bool {
        self.start <= point && point < self.end
    }

    /// The intersecting span between `self` and `other`.
    ///
    /// NOTE: `None` unless the intersection has positive width.
    pub fn intersect(self, other: Self) -> Option<Self> {
        let start = std::cmp::max(self.start, other.start);
        let end = std::cmp::min(self.end, other.end);
        if end <= start {
            None
        } else {
            Some(Span { start, end })
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Span({}, {})", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

#[test]
fn test_span_macro() {
    assert_eq!(
        span!(0 / 1, 1 / 1),
        Span::new(Rational::new(0, 1), Rational::new(1, 1))
    );
    assert_eq!(
        span!(Rational::new(1, 1), 4 / 1),
        span!(1 / 1, Rational::new(4, 1)),
    );
}

#[test]
fn test_sam() {
    assert_eq!(sam(Rational::new(7, 2)), Rational::from(3));
    assert_eq!(sam(Rational::new(-1, 2)), Rational::from(-1));
    assert_eq!(next_sam(Rational::new(7, 2)), Rational::from(4));
    assert_eq!(cycle_pos(Rational::new(7, 2)), Rational::new(1, 2));
    assert_eq!(cycle_pos(Rational::new(-1, 4)), Rational::new(3, 4));
}

#[test]
fn test_span_cycles() {
    let cycles: Vec<_> = span!(1 / 2, 5 / 2).cycles().collect();
    assert_eq!(
        cycles,
        vec![span!(1 / 2, 1 / 1), span!(1 / 1, 2 / 1), span!(2 / 1, 5 / 2)]
    );
    // Reversed and zero-width spans partition to nothing.
    assert_eq!(span!(1 / 1, 0 / 1).cycles().count(), 0);
    assert_eq!(span!(1 / 2, 1 / 2).cycles().count(), 0);
}

#[test]
fn test_span_cycles_zw() {
    // Zero width survives, everything else behaves as `cycles`.
    let zw: Vec<_> = span!(1 / 2, 1 / 2).cycles_zw().collect();
    assert_eq!(zw, vec![span!(1 / 2, 1 / 2)]);
    let cycles: Vec<_> = span!(0 / 1, 2 / 1).cycles_zw().collect();
    assert_eq!(cycles, vec![span!(0 / 1, 1 / 1), span!(1 / 1, 2 / 1)]);
    assert_eq!(span!(1 / 1, 0 / 1).cycles_zw().count(), 0);
}

#[test]
fn test_whole_cycles() {
    let wholes: Vec<_> = span!(1 / 2, 5 / 2).whole_cycles().collect();
    assert_eq!(
        wholes,
        vec![span!(0 / 1, 1 / 1), span!(1 / 1, 2 / 1), span!(2 / 1, 3 / 1)]
    );
    let wholes: Vec<_> = span!(1 / 4, 1 / 4).whole_cycles().collect();
    assert_eq!(wholes, vec![span!(0 / 1, 1 / 1)]);
}

#[test]
fn test_mirror() {
    let m = Rational::new(1, 2);
    assert_eq!(span!(0 / 1, 1 / 4).mirror(m), span!(3 / 4, 1 / 1));
    assert_eq!(span!(0 / 1, 1 / 1).mirror(m), span!(0 / 1, 1 / 1));
    let m = Rational::from(2);
    assert_eq!(span!(1 / 1, 3 / 2).mirror(m), span!(5 / 2, 3 / 1));
}

#[test]
fn test_map_cycle() {
    // Points map relative to the sam of the span's start.
    let doubled = span!(5 / 2, 11 / 4).map_cycle(|t| t * 2);
    assert_eq!(doubled, span!(3 / 1, 7 / 2));
}

#[test]
fn test_span_len_contains() {
    let s = span!(1 / 4, 3 / 4);
    assert_eq!(s.len(), Rational::new(1, 2));
    assert!(!s.is_empty());
    assert!(s.contains(Rational::new(1, 4)));
    assert!(s.contains(Rational::new(1, 2)));
    // The end is exclusive.
    assert!(!s.contains(Rational::new(3, 4)));
    assert!(span!(1 / 4, 1 / 4).is_empty());
}

#[test]
fn test_span_fmt() {
    for n in 0..10 {
        let a = Rational::new(n, 10);
        let b = Rational::new(n + 1, 10);
        let span = span!(a, b);
        println!("{:?} | {}", span, span);
    }
}

#[test]
fn test_span_intersect() {
    assert_eq!(
        span!(0 / 1, 3 / 4).intersect(span!(1 / 4, 1 / 1)),
        Some(span!(1 / 4, 3 / 4))
    );
    assert_eq!(span!(0 / 1, 1 / 4).intersect(span!(3 / 4, 1 / 1)), None);
    // Zero-width intersections do not count.
    assert_eq!(span!(0 / 1, 1 / 2).intersect(span!(1 / 2, 1 / 1)), None);
}
