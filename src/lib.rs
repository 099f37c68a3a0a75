#![doc = include_str!("../README.md")]

use num_rational::Rational64;
pub use span::{cycle_pos, next_sam, sam, Span};
use std::{
    fmt,
    ops::{Add, Mul, Sub},
    sync::Arc,
};

pub mod ctrl;
pub mod ops;
mod span;
pub mod wave;

pub mod prelude {
    pub use crate::{
        append, atom, cat,
        ctrl::{self, note, sound, Controls},
        cycle_pos, fast_append, fastcat, filter_just, from_list, from_maybes, inner_join, join,
        next_sam,
        ops::Ops,
        outer_join, overlay, sam, signal, silence, slowcat, span, squeeze_join, stack, steady,
        temporal_param, temporal_param2, temporal_param3, timecat,
        wave::{cosine, env_eq, env_eqr, env_l, env_lr, saw, saw2, sine, square, tri},
        DynPattern, Event, Pattern, Rational, Span,
    };
}

/// A composable abstraction for patterns over cyclic, rational time.
///
/// A [`Pattern`] is any type that may be [queried][`Pattern::query`] with a
/// [`Span`] to produce a sequence of [`Event<Self::Value>`]s. All composition
/// wraps the query function; patterns themselves are immutable values.
pub trait Pattern {
    /// The type of the values emitted in the pattern's events.
    type Value;
    /// An iterator yielding the events occurring within a query's span.
    type Events: Iterator<Item = Event<Self::Value>>;

    /// Query the pattern for events within the given span.
    ///
    /// # Example
    ///
    /// ```rust
    /// use weft::{atom, span, wave, Pattern};
    ///
    /// let pattern = atom("hello");
    /// let mut events = pattern.query(span!(0/1, 1/1));
    /// assert_eq!(events.next().unwrap().value, "hello");
    /// assert_eq!(events.next(), None);
    ///
    /// let pattern = wave::saw();
    /// assert_eq!(pattern.query(span!(1/2)).next().unwrap().value, 0.5);
    /// ```
    fn query(&self, span: Span) -> Self::Events;

    /// Query the pattern for events within a single cycle, (i.e. `span!(0/1, 1/1)`).
    fn query_cycle(&self) -> Self::Events {
        self.query(span!(0 / 1, 1 / 1))
    }

    /// Convert the pattern to a trait object behind an [`Arc`] and dynamically
    /// box queries in order to represent the pattern with a known, sized type.
    ///
    /// This is useful for storing multiple patterns within a single
    /// collection, or passing patterns between threads, etc.
    fn into_dyn(self) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        DynPattern::new(self)
    }

    /// Map the values produced by pattern queries with the given function.
    fn map<T, F>(self, map: F) -> MapValues<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Value) -> T,
    {
        let pattern = self;
        let map = Arc::new(map);
        MapValues { pattern, map }
    }

    /// Map the start and end points of the pattern's query spans.
    fn map_query_points<F>(self, map: F) -> MapQueryPoints<Self, F>
    where
        Self: Sized,
        F: Fn(Rational) -> Rational,
    {
        let pattern = self;
        MapQueryPoints { pattern, map }
    }

    /// Map the active and whole span start and end points of events produced by pattern
    /// queries with the given function. Useful for mapping time.
    fn map_event_points<F>(self, map: F) -> MapEventPoints<Self, F>
    where
        Self: Sized,
        F: Fn(Rational) -> Rational,
    {
        let pattern = self;
        let map = Arc::new(map);
        MapEventPoints { pattern, map }
    }

    /// Map the events produced by pattern queries with the given function.
    fn map_events<F, T>(self, map: F) -> MapEvents<Self, F>
    where
        Self: Sized,
        F: Fn(Event<Self::Value>) -> Event<T>,
    {
        let pattern = self;
        let map = Arc::new(map);
        MapEvents { pattern, map }
    }

    /// Map the events iterator produced by the pattern queries with the given function.
    fn map_events_iter<E, F, T>(self, map: F) -> MapEventsIter<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Events) -> E,
        E: Iterator<Item = Event<T>>,
    {
        let pattern = self;
        MapEventsIter { pattern, map }
    }

    /// Drop events whose value fails the given predicate.
    fn filter_values<F>(self, pred: F) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        F: 'static + Fn(&Self::Value) -> bool,
    {
        let pattern = self;
        let pred = Arc::new(pred);
        let filtered = move |span: Span| {
            let pred = pred.clone();
            pattern.query(span).filter(move |ev| pred(&ev.value))
        };
        filtered.into_dyn()
    }

    /// Speed the pattern up by the given rate, fitting `rate` cycles of the
    /// original into each cycle of the result.
    ///
    /// A rate of zero produces [`silence`]; a negative rate plays the
    /// speed-adjusted pattern [reversed][`Pattern::rev`].
    fn fast(self, rate: Rational) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        if rate == Rational::from(0) {
            silence().into_dyn()
        } else if rate < Rational::from(0) {
            self.fast(-rate).rev()
        } else {
            self.map_query_points(move |t| t * rate)
                .map_event_points(move |t| t / rate)
                .into_dyn()
        }
    }

    /// Slow the pattern down by the given rate: one cycle of the original
    /// stretches over `rate` cycles of the result.
    fn slow(self, rate: Rational) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        if rate == Rational::from(0) {
            silence().into_dyn()
        } else {
            self.fast(rate.recip())
        }
    }

    /// An alias for [`Pattern::fast`].
    fn density(self, rate: Rational) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        self.fast(rate)
    }

    /// An alias for [`Pattern::slow`].
    fn sparsity(self, rate: Rational) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        self.slow(rate)
    }

    /// Rotate the pattern earlier in time by the given number of cycles.
    fn rotl(self, amount: Rational) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        self.map_query_points(move |t| t + amount)
            .map_event_points(move |t| t - amount)
            .into_dyn()
    }

    /// Rotate the pattern later in time by the given number of cycles.
    fn rotr(self, amount: Rational) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        self.rotl(-amount)
    }

    /// Reverse the pattern within each cycle.
    ///
    /// Each cycle's slice of the query is reflected about the cycle midpoint,
    /// served, and the resulting events reflected back. An event's whole is
    /// carried through by swapping the gaps either side of its active span,
    /// since the endpoints of a reflected whole trade places.
    fn rev(self) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        let pattern = self.into_dyn();
        let reversed = move |span: Span| {
            let pattern = pattern.clone();
            span.cycles_zw().flat_map(move |cycle| {
                let mid = sam(cycle.start) + Rational::new(1, 2);
                let query = cycle.mirror(mid);
                pattern.query(query).map(move |ev| {
                    let active = ev.span.active;
                    let gaps = ev
                        .span
                        .whole
                        .map(|w| (active.start - w.start, w.end - active.end));
                    let active = active.mirror(mid);
                    let whole =
                        gaps.map(|(pre, post)| Span::new(active.start - post, active.end + pre));
                    Event::new(ev.value, active, whole)
                })
            })
        };
        reversed.into_dyn()
    }

    /// Play the given slice of the pattern's cycle stretched to fill each
    /// whole cycle of the result.
    ///
    /// Degenerate windows produce [`silence`].
    fn zoom(self, window: Span) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        let w_start = window.start;
        let w_len = window.len();
        if w_len <= Rational::from(0) {
            return silence().into_dyn();
        }
        let pattern = self.into_dyn();
        let zoomed = move |span: Span| {
            let pattern = pattern.clone();
            span.cycles_zw().flat_map(move |cycle| {
                let query = cycle.map_cycle(|t| w_start + t * w_len);
                pattern
                    .query(query)
                    .map(move |ev| ev.map_spans(|sp| sp.map_cycle(|t| (t - w_start) / w_len)))
            })
        };
        zoomed.into_dyn()
    }

    /// Squeeze each cycle's content into the first `1/rate` of the cycle,
    /// leaving the remainder silent.
    ///
    /// Rates below one are clamped to one; a rate of zero (or less) produces
    /// [`silence`].
    fn fast_gap(self, rate: Rational) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        if rate <= Rational::from(0) {
            return silence().into_dyn();
        }
        let rate = std::cmp::max(rate, Rational::from(1));
        let pattern = self.into_dyn();
        let gapped = move |span: Span| {
            let pattern = pattern.clone();
            span.cycles_zw().flat_map(move |cycle| {
                let query = cycle.map_cycle(|t| std::cmp::min(Rational::from(1), t * rate));
                // A query that collapses onto the next cycle start lies
                // entirely within the gap.
                let degenerate = query.start == next_sam(cycle.start);
                (!degenerate)
                    .then(|| {
                        pattern
                            .query(query)
                            .map(move |ev| ev.map_spans(|sp| sp.map_cycle(|t| t / rate)))
                    })
                    .into_iter()
                    .flatten()
            })
        };
        gapped.into_dyn()
    }

    /// Play the pattern within the given sub-span of each cycle.
    ///
    /// The window must sit within the unit cycle and have positive width,
    /// otherwise the result is [`silence`].
    fn compress(self, window: Span) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        let Span { start, end } = window;
        if start >= end || start < Rational::from(0) || end > Rational::from(1) {
            return silence().into_dyn();
        }
        self.fast_gap(window.len().recip()).rotr(start)
    }

    /// Partition every query at cycle boundaries before serving it.
    ///
    /// Transformers whose behaviour depends on which cycle a query falls in
    /// only see single-cycle (or zero-width) spans through this wrapper.
    fn split_queries(self) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
    {
        let pattern = self.into_dyn();
        let split = move |span: Span| {
            let pattern = pattern.clone();
            span.cycles_zw().flat_map(move |cycle| pattern.query(cycle))
        };
        split.into_dyn()
    }

    /// Apply `f` to the pattern, but only on cycles whose number passes `test`.
    fn when<T, F>(self, test: T, f: F) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        T: 'static + Fn(i64) -> bool,
        F: FnOnce(DynPattern<Self::Value>) -> DynPattern<Self::Value>,
    {
        let pattern = self.into_dyn();
        let transformed = f(pattern.clone());
        let test = Arc::new(test);
        let routed = move |span: Span| {
            let pattern = pattern.clone();
            let transformed = transformed.clone();
            let test = test.clone();
            span.cycles_zw().flat_map(move |cycle| {
                if test(cycle.start.floor().to_integer()) {
                    transformed.query(cycle)
                } else {
                    pattern.query(cycle)
                }
            })
        };
        routed.into_dyn()
    }

    /// Like [`Pattern::when`], but `test` receives the rational start time of
    /// each per-cycle sub-query rather than the cycle number.
    fn when_t<T, F>(self, test: T, f: F) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        T: 'static + Fn(Rational) -> bool,
        F: FnOnce(DynPattern<Self::Value>) -> DynPattern<Self::Value>,
    {
        let pattern = self.into_dyn();
        let transformed = f(pattern.clone());
        let test = Arc::new(test);
        let routed = move |span: Span| {
            let pattern = pattern.clone();
            let transformed = transformed.clone();
            let test = test.clone();
            span.cycles_zw().flat_map(move |cycle| {
                if test(cycle.start) {
                    transformed.query(cycle)
                } else {
                    pattern.query(cycle)
                }
            })
        };
        routed.into_dyn()
    }

    /// Apply the given pattern of functions to `self`, both sides providing
    /// structure.
    ///
    /// Each of `self`'s events is paired with every function event overlapping
    /// its active span; the output's active and whole spans are the
    /// intersections of the two sides'. An event whose counterpart has no
    /// whole (a signal) keeps no whole either.
    fn app<P, F, B>(self, apply: P) -> DynPattern<B>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern<Value = F>,
        F: Fn(Self::Value) -> B,
    {
        let pattern = self;
        let apply = Arc::new(apply);
        let applied = move |span: Span| {
            let apply = apply.clone();
            pattern.query(span).flat_map(move |ev| {
                apply
                    .query(ev.span.active)
                    .filter_map(move |ef| {
                        let active = ev.span.active.intersect(ef.span.active)?;
                        let whole = match (ev.span.whole, ef.span.whole) {
                            (Some(w), Some(fw)) => Some(w.intersect(fw)?),
                            _ => None,
                        };
                        let value = (ef.value)(ev.value.clone());
                        Some(Event::new(value, active, whole))
                    })
            })
        };
        applied.into_dyn()
    }

    /// Apply the given pattern of functions to `self`, with structure from
    /// `self` alone.
    ///
    /// For each of `self`'s events the function pattern is queried at the
    /// event's onset (a zero-width span); one output is emitted per function
    /// sounding there, carrying `self`'s spans unchanged. A signal's onset is
    /// the start of its active span.
    fn appl<P, F, B>(self, apply: P) -> DynPattern<B>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern<Value = F>,
        F: Fn(Self::Value) -> B,
    {
        let pattern = self;
        let apply = Arc::new(apply);
        let applied = move |span: Span| {
            let apply = apply.clone();
            pattern.query(span).flat_map(move |ev| {
                let onset = ev.span.whole_or_active().start;
                apply.query(Span::instant(onset)).map(move |ef| {
                    let value = (ef.value)(ev.value.clone());
                    Event::new(value, ev.span.active, ev.span.whole)
                })
            })
        };
        applied.into_dyn()
    }

    /// Apply the given pattern of functions to `self`, with structure from
    /// the function pattern alone.
    ///
    /// The mirror image of [`Pattern::appl`]: `self` is queried at the onset
    /// of each function event, and outputs carry the function event's spans.
    fn appr<P, F, B>(self, apply: P) -> DynPattern<B>
    where
        Self: 'static + Sized,
        P: 'static + Pattern<Value = F>,
        F: Fn(Self::Value) -> B,
    {
        let pattern = Arc::new(self);
        let applied = move |span: Span| {
            let pattern = pattern.clone();
            apply.query(span).flat_map(move |ef| {
                let onset = ef.span.whole_or_active().start;
                pattern.query(Span::instant(onset)).map(move |ev| {
                    let value = (ef.value)(ev.value);
                    Event::new(value, ef.span.active, ef.span.whole)
                })
            })
        };
        applied.into_dyn()
    }

    /// Bind each value to a new pattern and flatten via [`join`].
    fn bind<F, Q>(self, f: F) -> DynPattern<Q::Value>
    where
        Self: 'static + Sized,
        F: 'static + Fn(Self::Value) -> Q,
        Q: 'static + Pattern,
    {
        join(self.map(f)).into_dyn()
    }

    /// Merge the given pattern by calling the given function for each value at
    /// each active span intersection.
    fn merge_with<P, F, T>(self, other: P, merge: F) -> DynPattern<T>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern,
        P::Value: Clone,
        F: 'static + Fn(Self::Value, P::Value) -> T,
    {
        let merge = Arc::new(merge);
        let apply = other.map(move |o: P::Value| {
            let f = merge.clone();
            move |s: Self::Value| (*f)(s, o.clone())
        });
        self.app(apply)
    }

    /// As [`Pattern::merge_with`], but the structure comes from `self` alone.
    fn merge_with_left<P, F, T>(self, other: P, merge: F) -> DynPattern<T>
    where
        Self: 'static + Sized,
        Self::Value: Clone,
        P: 'static + Pattern,
        P::Value: Clone,
        F: 'static + Fn(Self::Value, P::Value) -> T,
    {
        let merge = Arc::new(merge);
        let apply = other.map(move |o: P::Value| {
            let f = merge.clone();
            move |s: Self::Value| (*f)(s, o.clone())
        });
        self.appl(apply)
    }

    /// As [`Pattern::merge_with`], but the structure comes from `other` alone.
    fn merge_with_right<P, F, T>(self, other: P, merge: F) -> DynPattern<T>
    where
        Self: 'static + Sized,
        P: 'static + Pattern,
        P::Value: Clone,
        F: 'static + Fn(Self::Value, P::Value) -> T,
    {
        let merge = Arc::new(merge);
        let apply = other.map(move |o: P::Value| {
            let f = merge.clone();
            move |s: Self::Value| (*f)(s, o.clone())
        });
        self.appr(apply)
    }

    /// Merge the given pattern by calling `Extend<P::Value>` for each value at
    /// intersections of active spans.
    ///
    /// Useful for applying one control pattern to another and producing the
    /// union between values.
    fn merge_extend<P>(self, other: P) -> DynPattern<Self::Value>
    where
        Self: 'static + Sized,
        Self::Value: Clone + Extend<<P::Value as IntoIterator>::Item>,
        P: 'static + Pattern,
        P::Value: Clone + IntoIterator,
    {
        self.merge_with(other, |mut s, o| {
            s.extend(o);
            s
        })
    }

    /// Assuming a pattern of values in the range 0 to 1, produces a pattern in the range -1 to 1.
    fn polar(self) -> MapValues<Self, fn(Self::Value) -> Self::Value>
    where
        Self: Sized,
        Self::Value: Polar,
    {
        self.map(Polar::polar)
    }

    /// Return a wrapper providing a `fmt::Debug` implementation for the pattern.
    ///
    /// Formats events resulting from a query to the given span.
    fn debug_span(&self, span: Span) -> PatternDebug<Self::Value, Self::Events>
    where
        Self: Sized,
    {
        let pattern = self;
        PatternDebug { pattern, span }
    }

    /// Return a wrapper providing a `fmt::Debug` implementation for the pattern.
    ///
    /// Formats events resulting from a query for a single cycle.
    fn debug(&self) -> PatternDebug<Self::Value, Self::Events>
    where
        Self: Sized,
    {
        self.debug_span(span!(0 / 1, 1 / 1))
    }
}

/// Types that can be sampled with a rational to produce a value.
///
/// Useful for representing continuous functions.
pub trait Sample {
    /// The type of value returned when sampled.
    type Value;
    /// Sample `self` with `rational` to produce a value.
    fn sample(&self, rational: Rational) -> Self::Value;
}

/// Types that can represent a polar value.
pub trait Polar:
    Sized + One + Add<Output = Self> + Mul<Output = Self> + Sub<Output = Self>
{
    /// Assuming `self` is a value in the range `0..=1`, produces the polar
    /// representation (`-1..=1`).
    fn polar(self) -> Self {
        self * (Self::ONE + Self::ONE) - Self::ONE
    }
}

/// Types that can represent the value `1`.
pub trait One {
    const ONE: Self;
}

/// Types convertible to a lossy representation of the same value.
pub trait ToF64Lossy {
    /// Convert to a lossy representation of the same value.
    fn to_f64_lossy(self) -> f64;
}

// ----------------------------------------------------------------------------

/// The rational value type used throughout the library to represent a point
/// along the cyclic timeline.
pub type Rational = Rational64;

/// A dynamic representation of a [`Pattern`].
///
/// Useful for storing or sending patterns, at the cost of boxing queried
/// events and allocating the inner [`Pattern`] behind an ARC.
pub struct DynPattern<T>(Arc<dyn Pattern<Value = T, Events = BoxEvents<T>>>);

/// A dynamic representation of a pattern's associated events iterator.
pub struct BoxEvents<T>(Box<dyn Iterator<Item = Event<T>>>);

/// A type providing a [`std::fmt::Debug`] implementation for types implementing [`Pattern`].
pub struct PatternDebug<'p, V, E> {
    pattern: &'p dyn Pattern<Value = V, Events = E>,
    span: Span,
}

/// An event yielded by a pattern query, see [`Pattern::query`].
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Event<T> {
    /// The span of the event (both "active" and "whole" parts).
    pub span: EventSpan,
    /// The value associated with the event.
    pub value: T,
}

/// The span associated with a single event.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EventSpan {
    /// The span within which the active part is relevant.
    /// Also referred to as the event "structure".
    /// This is only relevant to patterns of discrete events.
    /// Patterns of continuous values (i.e. signals) will always have a `whole` of `None`.
    pub whole: Option<Span>,
    /// The span over which the event's value is active.
    pub active: Span,
}

/// See the [`signal`] pattern constructor.
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct Signal<S>(S);

/// See [`Pattern::map_events`].
#[derive(Debug)]
pub struct MapEvents<P, F> {
    pattern: P,
    map: Arc<F>,
}

/// See [`Pattern::map`].
#[derive(Debug)]
pub struct MapValues<P, F> {
    pattern: P,
    map: Arc<F>,
}

/// See [`Pattern::map_query_points`].
#[derive(Debug)]
pub struct MapQueryPoints<P, F> {
    pattern: P,
    map: F,
}

/// See [`Pattern::map_event_points`].
#[derive(Debug)]
pub struct MapEventPoints<P, F> {
    pattern: P,
    map: Arc<F>,
}

/// See [`Pattern::map_events_iter`].
#[derive(Debug)]
pub struct MapEventsIter<P, F> {
    pattern: P,
    map: F,
}

/// The [`Pattern::Events`] type for [`MapEvents`].
#[derive(Debug)]
pub struct EventsMap<I, F> {
    events: I,
    map: Arc<F>,
}

/// The [`Pattern::Events`] type for [`MapValues`].
#[derive(Debug)]
pub struct EventsMapValues<I, F> {
    events: I,
    map: Arc<F>,
}

/// The [`Pattern::Events`] type for [`MapEventPoints`].
#[derive(Debug)]
pub struct EventsMapPoints<I, F> {
    events: I,
    map: Arc<F>,
}

// ----------------------------------------------------------------------------

impl<T> Event<T> {
    pub fn new(value: T, active: Span, whole: Option<Span>) -> Self {
        let span = EventSpan::new(active, whole);
        Self { span, value }
    }

    pub fn map<U>(self, map: impl FnOnce(T) -> U) -> Event<U> {
        let Event { span, value } = self;
        let value = map(value);
        Event::new(value, span.active, span.whole)
    }

    pub fn map_spans(self, map: impl Fn(Span) -> Span) -> Self {
        let active = map(self.span.active);
        let whole = self.span.whole.map(&map);
        let value = self.value;
        Self::new(value, active, whole)
    }

    pub fn map_points(self, map: impl Fn(Rational) -> Rational) -> Self {
        self.map_spans(|span| span.map(&map))
    }
}

impl EventSpan {
    pub fn new(active: Span, whole: Option<Span>) -> Self {
        EventSpan { active, whole }
    }

    pub fn intersect(self, other: Self) -> Option<Self> {
        self.active.intersect(other.active).map(|active| {
            let whole = self
                .whole
                .and_then(|sw| other.whole.and_then(|ow| sw.intersect(ow)));
            Self { whole, active }
        })
    }

    pub fn whole_or_active(&self) -> Span {
        self.whole.unwrap_or(self.active)
    }
}

impl<T> BoxEvents<T> {
    fn new<E>(es: E) -> Self
    where
        E: 'static + Iterator<Item = Event<T>>,
    {
        Self(Box::new(es) as Box<_>)
    }
}

impl<T> DynPattern<T> {
    fn new<P>(pattern: P) -> Self
    where
        P: 'static + Pattern<Value = T>,
        T: 'static,
    {
        let arc = Arc::new(pattern.map_events_iter(BoxEvents::new))
            as Arc<dyn Pattern<Value = T, Events = BoxEvents<T>>>;
        DynPattern(arc)
    }
}

// ----------------------------------------------------------------------------

impl<F, I, T> Pattern for F
where
    F: Fn(Span) -> I,
    I: Iterator<Item = Event<T>>,
{
    type Value = T;
    type Events = I;
    fn query(&self, span: Span) -> Self::Events {
        (*self)(span)
    }
}

impl<T> Pattern for DynPattern<T> {
    type Value = T;
    type Events = BoxEvents<T>;
    fn query(&self, span: Span) -> Self::Events {
        self.0.query(span)
    }
}

impl<S: Sample> Pattern for Signal<S> {
    type Value = S::Value;
    type Events = std::option::IntoIter<Event<Self::Value>>;
    fn query(&self, active @ Span { start, end }: Span) -> Self::Events {
        let Signal(sample) = self;
        let event = (start <= end).then(|| {
            let value = sample.sample(start);
            let whole = None;
            Event::new(value, active, whole)
        });
        event.into_iter()
    }
}

impl<P, F, T> Pattern for MapValues<P, F>
where
    P: Pattern,
    F: Fn(P::Value) -> T,
{
    type Value = T;
    type Events = EventsMapValues<P::Events, F>;
    fn query(&self, span: Span) -> Self::Events {
        let Self { pattern, map } = self;
        let events = pattern.query(span);
        let map = map.clone();
        EventsMapValues { events, map }
    }
}

impl<P, F> Pattern for MapQueryPoints<P, F>
where
    P: Pattern,
    F: Fn(Rational) -> Rational,
{
    type Value = P::Value;
    type Events = P::Events;
    fn query(&self, span: Span) -> Self::Events {
        let span = span.map(&self.map);
        self.pattern.query(span)
    }
}

impl<P, F> Pattern for MapEventPoints<P, F>
where
    P: Pattern,
    F: Fn(Rational) -> Rational,
{
    type Value = P::Value;
    type Events = EventsMapPoints<P::Events, F>;
    fn query(&self, span: Span) -> Self::Events {
        let Self { pattern, map } = self;
        let events = pattern.query(span);
        let map = map.clone();
        EventsMapPoints { events, map }
    }
}

impl<P, F, T> Pattern for MapEvents<P, F>
where
    P: Pattern,
    F: Fn(Event<P::Value>) -> Event<T>,
{
    type Value = T;
    type Events = EventsMap<P::Events, F>;
    fn query(&self, span: Span) -> Self::Events {
        let events = self.pattern.query(span);
        let map = self.map.clone();
        EventsMap { events, map }
    }
}

impl<P, F, E, T> Pattern for MapEventsIter<P, F>
where
    P: Pattern,
    F: Fn(P::Events) -> E,
    E: Iterator<Item = Event<T>>,
{
    type Value = T;
    type Events = E;
    fn query(&self, span: Span) -> Self::Events {
        let Self { pattern, map } = self;
        let events = pattern.query(span);
        map(events)
    }
}

impl<I, F, T, U> Iterator for EventsMap<I, F>
where
    I: Iterator<Item = Event<T>>,
    F: Fn(Event<T>) -> Event<U>,
{
    type Item = Event<U>;
    fn next(&mut self) -> Option<Self::Item> {
        self.events.next().map(&*self.map)
    }
}

impl<I, F, T, U> Iterator for EventsMapValues<I, F>
where
    I: Iterator<Item = Event<T>>,
    F: Fn(T) -> U,
{
    type Item = Event<U>;
    fn next(&mut self) -> Option<Self::Item> {
        self.events.next().map(|ev| ev.map(&*self.map))
    }
}

impl<I, F, T> Iterator for EventsMapPoints<I, F>
where
    I: Iterator<Item = Event<T>>,
    F: Fn(Rational) -> Rational,
{
    type Item = Event<T>;
    fn next(&mut self) -> Option<Self::Item> {
        self.events.next().map(|ev| ev.map_points(&*self.map))
    }
}

impl<T> Iterator for BoxEvents<T> {
    type Item = Event<T>;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl<F, T> Sample for F
where
    F: Fn(Rational) -> T,
{
    type Value = T;
    fn sample(&self, r: Rational) -> Self::Value {
        (*self)(r)
    }
}

impl<T> Polar for T where T: One + Add<Output = Self> + Mul<Output = Self> + Sub<Output = Self> {}

impl One for Rational {
    const ONE: Self = Rational::new_raw(1, 1);
}

impl One for f64 {
    const ONE: Self = 1.0;
}

impl<T> Clone for DynPattern<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl ToF64Lossy for Rational {
    fn to_f64_lossy(self) -> f64 {
        *self.numer() as f64 / *self.denom() as f64
    }
}

impl<T> fmt::Debug for Event<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut d = f.debug_struct("Event");
        if let Some(whole) = self.span.whole {
            d.field("whole", &whole);
        }
        d.field("active", &self.span.active)
            .field("value", &self.value)
            .finish()
    }
}

impl<'p, V, E> fmt::Debug for PatternDebug<'p, V, E>
where
    E: Iterator<Item = Event<V>>,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let events = self.pattern.query(self.span);
        f.debug_list().entries(events).finish()
    }
}

impl<V> fmt::Debug for DynPattern<V>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.debug().fmt(f)
    }
}

// ----------------------------------------------------------------------------

/// A pattern that, when queried, produces a single event sampled from the
/// given function at the start of the query span.
///
/// Signal events have no whole: a continuous value has no onset.
pub fn signal<S: Sample>(sample: S) -> impl Pattern<Value = S::Value> {
    Signal(sample)
}

/// When queried, always returns a single event with a clone of the given value.
pub fn steady<T: Clone>(t: T) -> impl Pattern<Value = T> {
    signal(move |_| t.clone())
}

/// When queried, always produces an empty event iterator.
pub fn silence<T>() -> impl Pattern<Value = T> {
    |_| std::iter::empty()
}

/// Repeats a given discrete value once per cycle.
///
/// Each event's whole is the full cycle containing it; its active span is
/// that cycle's slice of the query. Zero-width queries yield the value
/// sounding at that instant with a zero-width active span.
pub fn atom<T: Clone>(t: T) -> impl Pattern<Value = T> {
    move |span: Span| {
        let t = t.clone();
        span.cycles_zw().map(move |active| {
            let start = active.start.floor();
            let end = start + 1;
            let whole = Some(Span { start, end });
            let value = t.clone();
            Event::new(value, active, whole)
        })
    }
}

/// The union of the two patterns: every query is served by both, events of
/// `a` preceding events of `b`.
pub fn overlay<A, B>(a: A, b: B) -> impl Pattern<Value = A::Value>
where
    A: Pattern,
    B: Pattern<Value = A::Value>,
{
    move |span: Span| a.query(span).chain(b.query(span))
}

/// Combine the patterns into a single "stacked" pattern, where each query
/// is equivalent to querying each of the inner patterns and concatenating their
/// produced events.
pub fn stack<I>(patterns: I) -> impl Pattern<Value = <I::Item as Pattern>::Value>
where
    I: IntoIterator,
    I::Item: Pattern,
{
    let patterns: Arc<[I::Item]> = patterns.into_iter().collect();
    move |span: Span| {
        let ps = patterns.clone();
        (0..ps.len()).flat_map(move |ix| ps[ix].query(span))
    }
}

/// Concatenate the given sequence of patterns cycle-by-cycle.
///
/// Cycle `c` of the result is served by `patterns[c mod n]`, re-based so
/// that it plays its own cycle `(c - i) / n` there: each pattern contributes
/// one full cycle of its own per `n` cycles of the result.
///
/// `cat` of nothing is [`silence`].
pub fn cat<I>(patterns: I) -> DynPattern<<I::Item as Pattern>::Value>
where
    I: IntoIterator,
    I::Item: 'static + Pattern,
{
    let patterns: Arc<[I::Item]> = patterns.into_iter().collect();
    if patterns.is_empty() {
        return silence().into_dyn();
    }
    let n = i64::try_from(patterns.len()).expect("pattern count out of range");
    let catted = move |span: Span| {
        let ps = patterns.clone();
        span.cycles_zw().flat_map(move |cycle| {
            let c = cycle.start.floor().to_integer();
            let i = c.rem_euclid(n);
            let offset = Rational::from(c - (c - i) / n);
            let query = cycle.map(|t| t - offset);
            let ix = usize::try_from(i).expect("failed to cast index to usize");
            ps[ix]
                .query(query)
                .map(move |ev| ev.map_points(move |t| t + offset))
        })
    };
    catted.into_dyn()
}

/// An alias for [`cat`]: the concatenation runs each pattern a whole cycle
/// at a time, so the result is `n` times "slower" than its parts.
pub fn slowcat<I>(patterns: I) -> DynPattern<<I::Item as Pattern>::Value>
where
    I: IntoIterator,
    I::Item: 'static + Pattern,
{
    cat(patterns)
}

/// Concatenate the given sequence of patterns into a single pattern so that
/// all patterns fit to a single cycle.
pub fn fastcat<I>(patterns: I) -> DynPattern<<I::Item as Pattern>::Value>
where
    I: IntoIterator,
    I::Item: 'static + Pattern,
    I::IntoIter: ExactSizeIterator,
{
    let patterns = patterns.into_iter();
    let n = i64::try_from(patterns.len()).expect("pattern count out of range");
    cat(patterns).fast(Rational::from_integer(n))
}

/// Alternate between whole cycles of `a` and whole cycles of `b`.
pub fn append<A, B>(a: A, b: B) -> DynPattern<A::Value>
where
    A: 'static + Pattern,
    B: 'static + Pattern<Value = A::Value>,
{
    cat([a.into_dyn(), b.into_dyn()])
}

/// Play a cycle of `a` then a cycle of `b`, squeezed into a single cycle.
pub fn fast_append<A, B>(a: A, b: B) -> DynPattern<A::Value>
where
    A: 'static + Pattern,
    B: 'static + Pattern<Value = A::Value>,
{
    fastcat([a.into_dyn(), b.into_dyn()])
}

/// Like [`fastcat`] but allows the user to provide proportionate sizes for
/// each pattern: each slot plays one cycle of its pattern compressed into
/// its share of the cycle.
pub fn timecat<I, P>(patterns: I) -> DynPattern<P::Value>
where
    I: IntoIterator<Item = (Rational, P)>,
    P: 'static + Pattern,
{
    let weighted: Vec<(Rational, P)> = patterns.into_iter().collect();
    let total = weighted
        .iter()
        .fold(Rational::from(0), |acc, (w, _)| acc + *w);
    if total <= Rational::from(0) {
        return silence().into_dyn();
    }
    let mut start = Rational::from(0);
    let mut slots = Vec::with_capacity(weighted.len());
    for (w, p) in weighted {
        let end = start + w / total;
        slots.push(p.compress(Span::new(start, end)));
        start = end;
    }
    stack(slots).into_dyn()
}

/// A pattern playing each of the given values in order within a single cycle.
pub fn from_list<T>(values: impl IntoIterator<Item = T>) -> DynPattern<T>
where
    T: 'static + Clone,
{
    let atoms: Vec<DynPattern<T>> = values.into_iter().map(|v| atom(v).into_dyn()).collect();
    fastcat(atoms)
}

/// Like [`from_list`], but `None` slots contribute silence rather than an event.
pub fn from_maybes<T>(values: impl IntoIterator<Item = Option<T>>) -> DynPattern<T>
where
    T: 'static + Clone,
{
    let slots: Vec<DynPattern<T>> = values
        .into_iter()
        .map(|v| match v {
            Some(v) => atom(v).into_dyn(),
            None => silence().into_dyn(),
        })
        .collect();
    fastcat(slots)
}

/// Joins a pattern of patterns into a single pattern.
///
/// 1. When queried, get the events from the outer pattern.
/// 2. Query the inner pattern using the active of the outer.
/// 3. For each inner event, set the whole and active to be the intersection of
/// the outer whole and part respectively.
/// 4. Concatenate all the events together (discarding whole/parts that don't intersect).
pub fn join<P: Pattern>(pp: impl Pattern<Value = P>) -> impl Pattern<Value = P::Value> {
    move |span: Span| {
        pp.query(span).flat_map(move |o_ev: Event<P>| {
            o_ev.value.query(o_ev.span.active).filter_map(move |i_ev| {
                o_ev.span.intersect(i_ev.span).map(|span| {
                    let value = i_ev.value;
                    Event { span, value }
                })
            })
        })
    }
}

/// Similar to `join`, but the structure only comes from the inner pattern.
pub fn inner_join<P: Pattern>(pp: impl Pattern<Value = P>) -> impl Pattern<Value = P::Value> {
    move |q_span: Span| {
        pp.query(q_span).flat_map(move |o_ev: Event<P>| {
            o_ev.value.query(o_ev.span.active).filter_map(move |i_ev| {
                let whole = i_ev.span.whole;
                q_span.intersect(i_ev.span.active).map(|active| {
                    let span = EventSpan { whole, active };
                    let value = i_ev.value;
                    Event { span, value }
                })
            })
        })
    }
}

/// Similar to `join`, but the structure only comes from the outer pattern.
pub fn outer_join<P: Pattern>(pp: impl Pattern<Value = P>) -> impl Pattern<Value = P::Value> {
    move |q_span: Span| {
        pp.query(q_span).flat_map(move |o_ev: Event<P>| {
            let i_q_span = Span::instant(o_ev.span.whole_or_active().start);
            o_ev.value.query(i_q_span).filter_map(move |i_ev| {
                let whole = o_ev.span.whole;
                q_span.intersect(o_ev.span.active).map(|active| {
                    let span = EventSpan { whole, active };
                    let value = i_ev.value;
                    Event { span, value }
                })
            })
        })
    }
}

/// Like [`join`], but each inner pattern is first squeezed into its outer
/// event's whole, so exactly one of its cycles plays there.
pub fn squeeze_join<P>(pp: impl Pattern<Value = P>) -> impl Pattern<Value = P::Value>
where
    P: 'static + Pattern,
{
    move |span: Span| {
        pp.query(span).flat_map(move |o_ev: Event<P>| {
            let o_span = o_ev.span;
            let inner = squeeze(o_span.whole_or_active(), o_ev.value);
            inner.query(o_span.active).filter_map(move |i_ev| {
                o_span.intersect(i_ev.span).map(|span| {
                    let value = i_ev.value;
                    Event { span, value }
                })
            })
        })
    }
}

/// Fit one cycle of the pattern into the given span of absolute time, the
/// way [`Pattern::compress`] fits one into a sub-span of the unit cycle.
fn squeeze<P: 'static + Pattern>(dst: Span, pattern: P) -> DynPattern<P::Value> {
    if dst.is_empty() {
        return silence().into_dyn();
    }
    pattern.fast_gap(dst.len().recip()).rotr(dst.start)
}

/// Lift a parameterised pattern operation to take its parameter from a
/// pattern.
///
/// The parameter pattern provides the outer structure: at each of its events
/// the operation is applied with that event's value and the result queried
/// within, as per [`join`].
pub fn temporal_param<A, B: 'static, C: 'static, F>(
    f: F,
    params: impl 'static + Pattern<Value = A>,
    pattern: DynPattern<B>,
) -> DynPattern<C>
where
    F: 'static + Fn(A, DynPattern<B>) -> DynPattern<C>,
{
    join(params.map(move |a| f(a, pattern.clone()))).into_dyn()
}

/// As [`temporal_param`], for operations taking two parameters.
pub fn temporal_param2<A, B, C: 'static, D: 'static, F>(
    f: F,
    params_a: impl 'static + Pattern<Value = A>,
    params_b: impl 'static + Pattern<Value = B>,
    pattern: DynPattern<C>,
) -> DynPattern<D>
where
    A: 'static + Clone,
    B: 'static + Clone,
    F: 'static + Fn(A, B, DynPattern<C>) -> DynPattern<D>,
{
    let pairs = params_a.merge_with(params_b, |a, b| (a, b));
    join(pairs.map(move |(a, b)| f(a, b, pattern.clone()))).into_dyn()
}

/// As [`temporal_param`], for operations taking three parameters.
pub fn temporal_param3<A, B, C, D: 'static, E: 'static, F>(
    f: F,
    params_a: impl 'static + Pattern<Value = A>,
    params_b: impl 'static + Pattern<Value = B>,
    params_c: impl 'static + Pattern<Value = C>,
    pattern: DynPattern<D>,
) -> DynPattern<E>
where
    A: 'static + Clone,
    B: 'static + Clone,
    C: 'static + Clone,
    F: 'static + Fn(A, B, C, DynPattern<D>) -> DynPattern<E>,
{
    let pairs = params_a.merge_with(params_b, |a, b| (a, b));
    let triples = pairs.merge_with(params_c, |(a, b), c| (a, b, c));
    join(triples.map(move |(a, b, c)| f(a, b, c, pattern.clone()))).into_dyn()
}

/// Unwrap a pattern of optional values, dropping the `None` events.
pub fn filter_just<P, T>(pattern: P) -> impl Pattern<Value = T>
where
    P: Pattern<Value = Option<T>>,
{
    move |span: Span| {
        pattern.query(span).filter_map(|ev| {
            let Event { span, value } = ev;
            value.map(|value| Event { span, value })
        })
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
fn collect<P: Pattern>(p: &P, span: Span) -> Vec<Event<P::Value>> {
    p.query(span).collect()
}

#[cfg(test)]
fn spans<P: Pattern>(p: &P, span: Span) -> Vec<(P::Value, Span, Option<Span>)> {
    p.query(span)
        .map(|ev| (ev.value, ev.span.active, ev.span.whole))
        .collect()
}

#[test]
fn test_invariants() {
    let patterns: Vec<DynPattern<i64>> = vec![
        silence().into_dyn(),
        atom(1).into_dyn(),
        from_list([1, 2, 3]),
        from_maybes([Some(1), None, Some(3)]),
        atom(1).fast(3.into()),
        atom(1).slow(Rational::new(3, 2)),
        from_list([1, 2]).rev(),
        from_list([1, 2, 3, 4]).rotl(Rational::new(1, 3)),
        from_list([1, 2, 3]).zoom(span!(1 / 4, 3 / 4)),
        from_list([1, 2]).fast_gap(3.into()),
        atom(7).compress(span!(1 / 4, 2 / 3)),
        stack([atom(1).into_dyn(), from_list([2, 3])]).into_dyn(),
        cat([atom(1).into_dyn(), from_list([2, 3])]),
        append(atom(1), atom(2)),
    ];
    let queries = [
        span!(0 / 1, 1 / 1),
        span!(1 / 2, 2 / 1),
        span!(-3 / 2, -1 / 4),
        span!(1 / 3, 1 / 3),
        span!(5 / 1, 15 / 2),
    ];
    for p in &patterns {
        for &q in &queries {
            for ev in p.query(q) {
                let active = ev.span.active;
                assert!(q.start <= active.start && active.end <= q.end);
                if let Some(whole) = ev.span.whole {
                    assert!(whole.start <= active.start && active.end <= whole.end);
                }
            }
        }
    }
}

#[test]
fn test_silence() {
    let max = 10;
    for n in 0..=max {
        let i = span!(Rational::new(n, max));
        assert!(silence::<Rational>().query(i).next().is_none());
    }
    assert!(silence::<i64>().query(span!(0 / 1, 100 / 1)).next().is_none());
}

#[test]
fn test_atom() {
    let span = span!(0 / 1, 3 / 1);
    let pattern = atom("hello");
    let mut values = pattern.query(span).map(|ev| ev.value);
    assert_eq!(Some("hello"), values.next());
    assert_eq!(Some("hello"), values.next());
    assert_eq!(Some("hello"), values.next());
    assert_eq!(None, values.next());
}

#[test]
fn test_atom_whole() {
    let span = span!(0 / 1, 7 / 2);
    let pattern = atom("hello");
    let mut events = pattern.query(span);
    {
        let mut values = events.by_ref().map(|ev| ev.value);
        assert_eq!(Some("hello"), values.next());
        assert_eq!(Some("hello"), values.next());
        assert_eq!(Some("hello"), values.next());
    }
    let event = events.next().unwrap();
    let active = span!(3 / 1, 7 / 2);
    let whole = Some(span!(3 / 1, 4 / 1));
    assert_eq!(active, event.span.active);
    assert_eq!(whole, event.span.whole);
    assert_eq!(None, events.next());
}

#[test]
fn test_atom_part_mid_cycle() {
    // A query starting mid-cycle sees a partial active within a full whole.
    let es = spans(&atom(42), span!(1 / 2, 2 / 1));
    assert_eq!(
        es,
        vec![
            (42, span!(1 / 2, 1 / 1), Some(span!(0 / 1, 1 / 1))),
            (42, span!(1 / 1, 2 / 1), Some(span!(1 / 1, 2 / 1))),
        ]
    );
}

#[test]
fn test_atom_instant() {
    // Zero-width queries answer "what sounds at this instant".
    let es = spans(&atom("x"), span!(1 / 4, 1 / 4));
    assert_eq!(
        es,
        vec![("x", span!(1 / 4, 1 / 4), Some(span!(0 / 1, 1 / 1)))]
    );
    // Reversed spans produce nothing.
    assert!(atom("x").query(span!(1 / 1, 0 / 1)).next().is_none());
}

#[test]
fn test_functor_identity() {
    let p = from_list([1, 2, 3]);
    let q = span!(0 / 1, 2 / 1);
    assert_eq!(collect(&p.clone().map(|v| v), q), collect(&p, q));
}

#[test]
fn test_functor_composition() {
    let p = || from_list([1, 2, 3]);
    let q = span!(-1 / 2, 3 / 2);
    let composed = p().map(|v| (v + 1) * 2);
    let chained = p().map(|v| v + 1).map(|v| v * 2);
    assert_eq!(collect(&composed, q), collect(&chained, q));
}

#[test]
fn test_overlay() {
    let q = span!(0 / 1, 1 / 1);
    // Silence is the identity on either side.
    let p = overlay(atom("a"), silence());
    assert_eq!(spans(&p, q), spans(&atom("a"), q));
    let p = overlay(silence(), atom("a"));
    assert_eq!(spans(&p, q), spans(&atom("a"), q));
    // Events of the left operand precede those of the right.
    let p = overlay(atom("a"), atom("b"));
    let values: Vec<_> = p.query(q).map(|ev| ev.value).collect();
    assert_eq!(values, vec!["a", "b"]);
    // Associativity.
    let l = overlay(overlay(atom(1), atom(2)), atom(3));
    let r = overlay(atom(1), overlay(atom(2), atom(3)));
    assert_eq!(collect(&l, q), collect(&r, q));
}

#[test]
fn test_stack() {
    let p = stack([atom("a").into_dyn(), from_list(["b", "c"])]);
    let values: Vec<_> = p.query_cycle().map(|ev| ev.value).collect();
    assert_eq!(values, vec!["a", "b", "c"]);
}

#[test]
fn test_cat_rebases_cycles() {
    // Each pattern plays its *own* next cycle when its turn comes around:
    // an identity-valued signal reveals the re-based query time.
    let p = cat([signal(|t: Rational| t).into_dyn(), silence().into_dyn()]);
    let es = spans(&p, span!(2 / 1, 3 / 1));
    assert_eq!(es, vec![(Rational::from(1), span!(2 / 1, 3 / 1), None)]);
    let es = spans(&p, span!(4 / 1, 5 / 1));
    assert_eq!(es, vec![(Rational::from(2), span!(4 / 1, 5 / 1), None)]);
}

#[test]
fn test_cat_cycle_multiset() {
    // Over n cycles, `cat` contains one time-shifted cycle of each pattern.
    let a = from_list([1, 2]);
    let b = from_list([3, 4, 5]);
    let catted = cat([a.clone(), b.clone()]);
    let mut expected = collect(&a, span!(0 / 1, 1 / 1));
    expected.extend(
        b.query(span!(0 / 1, 1 / 1))
            .map(|ev| ev.map_points(|t| t + 1)),
    );
    assert_eq!(collect(&catted, span!(0 / 1, 2 / 1)), expected);
}

#[test]
fn test_cat_empty() {
    let p = cat(Vec::<DynPattern<i64>>::new());
    assert!(p.query(span!(0 / 1, 10 / 1)).next().is_none());
}

#[test]
fn test_slowcat() {
    let a = atom("a");
    let b = atom("b");
    let cat = slowcat([a.into_dyn(), b.into_dyn()]);
    let span = span!(0 / 1, 5 / 2);
    let mut es = cat
        .query(span)
        .map(|ev| (ev.value, ev.span.active, ev.span.whole));
    assert_eq!(
        Some(("a", span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1)))),
        es.next()
    );
    assert_eq!(
        Some(("b", span!(1 / 1, 2 / 1), Some(span!(1 / 1, 2 / 1)))),
        es.next()
    );
    assert_eq!(
        Some(("a", span!(2 / 1, 5 / 2), Some(span!(2 / 1, 3 / 1)))),
        es.next()
    );
    assert_eq!(None, es.next());
}

#[test]
fn test_fastcat() {
    let a = atom("a");
    let b = atom("b");
    let cat = fastcat([a.into_dyn(), b.into_dyn()]);
    let span = span!(0 / 1, 5 / 4);
    let mut es = cat
        .query(span)
        .map(|ev| (ev.value, ev.span.active, ev.span.whole));
    assert_eq!(
        Some(("a", span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2)))),
        es.next()
    );
    assert_eq!(
        Some(("b", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1)))),
        es.next()
    );
    assert_eq!(
        Some(("a", span!(1 / 1, 5 / 4), Some(span!(1 / 1, 3 / 2)))),
        es.next()
    );
    assert_eq!(None, es.next());
}

#[test]
fn test_fastcat_thirds() {
    let p = fastcat([atom("a").into_dyn(), atom("b").into_dyn(), atom("c").into_dyn()]);
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(0 / 1, 1 / 3), Some(span!(0 / 1, 1 / 3))),
            ("b", span!(1 / 3, 2 / 3), Some(span!(1 / 3, 2 / 3))),
            ("c", span!(2 / 3, 1 / 1), Some(span!(2 / 3, 1 / 1))),
        ]
    );
}

#[test]
fn test_append() {
    let p = append(atom("a"), atom("b"));
    let values: Vec<_> = p.query(span!(0 / 1, 4 / 1)).map(|ev| ev.value).collect();
    assert_eq!(values, vec!["a", "b", "a", "b"]);
    let p = fast_append(atom("a"), atom("b"));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            ("b", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_timecat() {
    let p = timecat([
        (Rational::from(1), atom("a")),
        (Rational::from(3), atom("b")),
    ]);
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(0 / 1, 1 / 4), Some(span!(0 / 1, 1 / 4))),
            ("b", span!(1 / 4, 1 / 1), Some(span!(1 / 4, 1 / 1))),
        ]
    );
}

#[test]
fn test_from_list() {
    let p = from_list(["a", "b"]);
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            ("b", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_from_maybes() {
    let p = from_maybes([Some("a"), None, Some("c")]);
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(0 / 1, 1 / 3), Some(span!(0 / 1, 1 / 3))),
            ("c", span!(2 / 3, 1 / 1), Some(span!(2 / 3, 1 / 1))),
        ]
    );
}

#[test]
fn test_fast() {
    let p = atom("x").fast(2.into());
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("x", span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            ("x", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_fast_compose() {
    let q = span!(0 / 1, 3 / 1);
    let composed = atom(1).fast(2.into()).fast(3.into());
    let direct = atom(1).fast(6.into());
    assert_eq!(collect(&composed, q), collect(&direct, q));
}

#[test]
fn test_fast_zero_is_silence() {
    let p = from_list([1, 2, 3]).fast(0.into());
    assert!(p.query(span!(0 / 1, 10 / 1)).next().is_none());
}

#[test]
fn test_fast_negative_reverses() {
    let q = span!(0 / 1, 2 / 1);
    let negated = from_list([1, 2]).fast(Rational::from(-1));
    let reversed = from_list([1, 2]).rev();
    assert_eq!(collect(&negated, q), collect(&reversed, q));
}

#[test]
fn test_slow_is_inverse_rate_fast() {
    let q = span!(0 / 1, 4 / 1);
    let slowed = from_list([1, 2]).slow(2.into());
    let fasted = from_list([1, 2]).fast(Rational::new(1, 2));
    assert_eq!(collect(&slowed, q), collect(&fasted, q));
    // One cycle of the original stretches over two of the result.
    let es = spans(&from_list([1, 2]).slow(2.into()), span!(0 / 1, 2 / 1));
    assert_eq!(
        es,
        vec![
            (1, span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1))),
            (2, span!(1 / 1, 2 / 1), Some(span!(1 / 1, 2 / 1))),
        ]
    );
    assert!(atom(1).slow(0.into()).query_cycle().next().is_none());
}

#[test]
fn test_density_sparsity_aliases() {
    let q = span!(0 / 1, 2 / 1);
    assert_eq!(
        collect(&atom(1).density(3.into()), q),
        collect(&atom(1).fast(3.into()), q),
    );
    assert_eq!(
        collect(&atom(1).sparsity(2.into()), q),
        collect(&atom(1).slow(2.into()), q),
    );
}

#[test]
fn test_rotl() {
    let p = atom("x").rotl(Rational::new(1, 4));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("x", span!(0 / 1, 3 / 4), Some(span!(-1 / 4, 3 / 4))),
            ("x", span!(3 / 4, 1 / 1), Some(span!(3 / 4, 7 / 4))),
        ]
    );
}

#[test]
fn test_rot_compose_and_invert() {
    let q = span!(0 / 1, 2 / 1);
    let t = Rational::new(1, 3);
    let u = Rational::new(1, 4);
    let composed = from_list([1, 2]).rotl(t).rotl(u);
    let direct = from_list([1, 2]).rotl(t + u);
    assert_eq!(collect(&composed, q), collect(&direct, q));
    let round_trip = from_list([1, 2]).rotl(t).rotr(t);
    assert_eq!(collect(&round_trip, q), collect(&from_list([1, 2]), q));
}

#[test]
fn test_rev() {
    let p = fastcat([atom("a").into_dyn(), atom("b").into_dyn()]).rev();
    let mut es: Vec<_> = spans(&p, span!(0 / 1, 1 / 1));
    es.sort_by_key(|&(_, active, _)| active);
    assert_eq!(
        es,
        vec![
            ("b", span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            ("a", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_rev_partial_whole() {
    // An event occupying a sub-span of the cycle keeps its length and
    // lands mirrored about the cycle midpoint.
    let p = atom("x").compress(span!(0 / 1, 1 / 4)).rev();
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(es, vec![("x", span!(3 / 4, 1 / 1), Some(span!(3 / 4, 1 / 1)))]);
}

#[test]
fn test_rev_involution() {
    let q = span!(0 / 1, 2 / 1);
    let p = || from_list([1, 2, 3]);
    let mut twice = collect(&p().rev().rev(), q);
    twice.sort_by_key(|ev| ev.span);
    assert_eq!(twice, collect(&p(), q));
}

#[test]
fn test_rev_across_cycles() {
    // Mirroring is local to each cycle, whatever the query alignment.
    let p = from_list([1, 2]).rev();
    let mut es = spans(&p, span!(1 / 2, 3 / 2));
    es.sort_by_key(|&(_, active, _)| active);
    assert_eq!(
        es,
        vec![
            (1, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
            (2, span!(1 / 1, 3 / 2), Some(span!(1 / 1, 3 / 2))),
        ]
    );
}

#[test]
fn test_zoom() {
    // Zooming the middle half stretches elements 2 and 3 over the cycle.
    let p = from_list([1, 2, 3, 4]).zoom(span!(1 / 4, 3 / 4));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            (2, span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            (3, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
    // The same within every cycle.
    let es = spans(&p, span!(1 / 1, 2 / 1));
    assert_eq!(
        es,
        vec![
            (2, span!(1 / 1, 3 / 2), Some(span!(1 / 1, 3 / 2))),
            (3, span!(3 / 2, 2 / 1), Some(span!(3 / 2, 2 / 1))),
        ]
    );
    // Degenerate windows are silent.
    assert!(atom(1)
        .zoom(span!(1 / 2, 1 / 2))
        .query_cycle()
        .next()
        .is_none());
    assert!(atom(1)
        .zoom(span!(3 / 4, 1 / 4))
        .query_cycle()
        .next()
        .is_none());
}

#[test]
fn test_fast_gap() {
    let p = fastcat([atom("a").into_dyn(), atom("b").into_dyn()]).fast_gap(2.into());
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(0 / 1, 1 / 4), Some(span!(0 / 1, 1 / 4))),
            ("b", span!(1 / 4, 1 / 2), Some(span!(1 / 4, 1 / 2))),
        ]
    );
    // The remainder of the cycle is a gap.
    assert!(p.query(span!(1 / 2, 1 / 1)).next().is_none());
    // Queries overlapping the squeezed region see only the overlap.
    let es = spans(&p, span!(1 / 4, 3 / 4));
    assert_eq!(
        es,
        vec![("b", span!(1 / 4, 1 / 2), Some(span!(1 / 4, 1 / 2)))]
    );
    // Unlike `fast`, the gap repeats per cycle rather than the content.
    let es = spans(&p, span!(1 / 1, 2 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(1 / 1, 5 / 4), Some(span!(1 / 1, 5 / 4))),
            ("b", span!(5 / 4, 3 / 2), Some(span!(5 / 4, 3 / 2))),
        ]
    );
}

#[test]
fn test_fast_gap_degenerate_rates() {
    assert!(atom(1).fast_gap(0.into()).query_cycle().next().is_none());
    // Rates below one clamp to one.
    let q = span!(0 / 1, 2 / 1);
    assert_eq!(
        collect(&atom(1).fast_gap(Rational::new(1, 2)), q),
        collect(&atom(1), q),
    );
}

#[test]
fn test_compress() {
    let p = atom("x").compress(span!(1 / 4, 3 / 4));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(es, vec![("x", span!(1 / 4, 3 / 4), Some(span!(1 / 4, 3 / 4)))]);
    // Sub-spans of the window are served proportionally.
    let p = from_list(["a", "b"]).compress(span!(1 / 2, 1 / 1));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(1 / 2, 3 / 4), Some(span!(1 / 2, 3 / 4))),
            ("b", span!(3 / 4, 1 / 1), Some(span!(3 / 4, 1 / 1))),
        ]
    );
}

#[test]
fn test_compress_whole_cycle_is_identity() {
    let q = span!(-1 / 1, 2 / 1);
    let p = || from_list([1, 2, 3]);
    assert_eq!(collect(&p().compress(span!(0 / 1, 1 / 1)), q), collect(&p(), q));
}

#[test]
fn test_compress_invalid_windows() {
    let windows = [
        span!(3 / 4, 1 / 4),
        span!(1 / 2, 1 / 2),
        span!(-1 / 4, 1 / 2),
        span!(1 / 2, 5 / 4),
    ];
    for w in windows {
        assert!(atom(1).compress(w).query_cycle().next().is_none());
    }
}

#[test]
fn test_split_queries() {
    // A raw query function that answers any span with a single event.
    let monolith = |span: Span| std::iter::once(Event::new((), span, Some(span)));
    let q = span!(0 / 1, 2 / 1);
    assert_eq!(collect(&monolith, q).len(), 1);
    let split = monolith.split_queries();
    let es = spans(&split, q);
    assert_eq!(
        es,
        vec![
            ((), span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1))),
            ((), span!(1 / 1, 2 / 1), Some(span!(1 / 1, 2 / 1))),
        ]
    );
}

#[test]
fn test_when() {
    let p = atom("x").when(|cycle| cycle % 2 == 0, |p| p.fast(2.into()));
    let es = spans(&p, span!(0 / 1, 2 / 1));
    assert_eq!(
        es,
        vec![
            ("x", span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            ("x", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
            ("x", span!(1 / 1, 2 / 1), Some(span!(1 / 1, 2 / 1))),
        ]
    );
}

#[test]
fn test_when_t() {
    let threshold = Rational::from(1);
    let p = atom("x").when_t(move |t| t >= threshold, |p| p.fast(2.into()));
    let es = spans(&p, span!(0 / 1, 2 / 1));
    assert_eq!(
        es,
        vec![
            ("x", span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1))),
            ("x", span!(1 / 1, 3 / 2), Some(span!(1 / 1, 3 / 2))),
            ("x", span!(3 / 2, 2 / 1), Some(span!(3 / 2, 2 / 1))),
        ]
    );
}

#[test]
fn test_app() {
    let p = atom(10).app(atom(|v: i64| v + 1));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(es, vec![(11, span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1)))]);
}

#[test]
fn test_app_intersects_structure() {
    let a = atom(1.0).fast(2.into());
    let b = atom(|v: f64| v + 2.0).fast(3.into());
    let p = a.app(b);
    let v: Vec<_> = p.query(span!(0 / 1, 1 / 1)).collect();
    // a              a
    // b         b         b
    // 0/1       1/3  1/2  2/3       1/1
    let s0 = span!(0 / 1, 1 / 3);
    let s1 = span!(1 / 3, 1 / 2);
    let s2 = span!(1 / 2, 2 / 3);
    let s3 = span!(2 / 3, 1 / 1);
    assert_eq!(v[0], Event::new(3.0, s0, Some(s0)));
    assert_eq!(v[1], Event::new(3.0, s1, Some(s1)));
    assert_eq!(v[2], Event::new(3.0, s2, Some(s2)));
    assert_eq!(v[3], Event::new(3.0, s3, Some(s3)));
    assert_eq!(v.len(), 4);
}

#[cfg(test)]
fn add10(v: i64) -> i64 {
    v + 10
}

#[cfg(test)]
fn add100(v: i64) -> i64 {
    v + 100
}

#[test]
fn test_appl_structure_from_values() {
    // One output per value event, sampling the function at each onset.
    let fns = from_list([add10 as fn(i64) -> i64, add100]);
    let p = atom(1).appl(fns);
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(es, vec![(11, span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1)))]);
    // Both value events see the single function sounding at their onsets.
    let p = from_list([1, 2]).appl(atom(add10 as fn(i64) -> i64));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            (11, span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            (12, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_appr_structure_from_functions() {
    let fns = from_list([add10 as fn(i64) -> i64, add100]);
    let p = atom(1).appr(fns);
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            (11, span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            (101, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_bind() {
    // The inner patterns play at their own tempo; each outer event exposes
    // its slice of the bound pattern's cycle.
    let p = from_list([1, 3]).bind(|n| from_list([n, n + 1]));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            (1, span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            (4, span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_join() {
    let pp = |active @ whole: Span| {
        std::iter::once(Event::new(from_list([1.0, 1.0]), active, Some(whole)))
    };
    let p = join(pp);
    let mut q = p.query(span!(0 / 1, 2 / 1));
    let q0 = span!(0 / 1, 1 / 2);
    let q1 = span!(1 / 2, 1 / 1);
    let q2 = span!(1 / 1, 3 / 2);
    let q3 = span!(3 / 2, 2 / 1);
    assert_eq!(q.next(), Some(Event::new(1.0, q0, Some(q0))));
    assert_eq!(q.next(), Some(Event::new(1.0, q1, Some(q1))));
    assert_eq!(q.next(), Some(Event::new(1.0, q2, Some(q2))));
    assert_eq!(q.next(), Some(Event::new(1.0, q3, Some(q3))));
    assert_eq!(q.next(), None);
}

#[test]
fn test_inner_join() {
    // The inner pattern's own wholes survive the join.
    let pp = atom(from_list(["a", "b"]));
    let p = inner_join(pp);
    let es = spans(&p, span!(1 / 4, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(1 / 4, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            ("b", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_outer_join() {
    // Only the value sounding at the outer onset plays, for the outer whole.
    let pp = atom(from_list(["a", "b"]));
    let p = outer_join(pp);
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(es, vec![("a", span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1)))]);
}

#[test]
fn test_squeeze_join() {
    let pp = fastcat([
        atom(from_list(["a", "b"])).into_dyn(),
        atom(from_list(["c"])).into_dyn(),
    ]);
    let p = squeeze_join(pp);
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(0 / 1, 1 / 4), Some(span!(0 / 1, 1 / 4))),
            ("b", span!(1 / 4, 1 / 2), Some(span!(1 / 4, 1 / 2))),
            ("c", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_temporal_param() {
    // A pattern of rates drives `fast`, changing per half-cycle.
    let rates = from_list([Rational::from(1), Rational::from(2)]);
    let p = temporal_param(|rate, p: DynPattern<&str>| p.fast(rate), rates, atom("x").into_dyn());
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("x", span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            ("x", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_temporal_param2() {
    let rates = atom(Rational::from(2));
    let amounts = atom(Rational::from(0));
    let p = temporal_param2(
        |rate, amount, p: DynPattern<&str>| p.fast(rate).rotl(amount),
        rates,
        amounts,
        atom("x").into_dyn(),
    );
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("x", span!(0 / 1, 1 / 2), Some(span!(0 / 1, 1 / 2))),
            ("x", span!(1 / 2, 1 / 1), Some(span!(1 / 2, 1 / 1))),
        ]
    );
}

#[test]
fn test_temporal_param3() {
    let p = temporal_param3(
        |r, a, b, p: DynPattern<i64>| p.fast(r).rotl(a).rotl(b),
        atom(Rational::from(1)),
        atom(Rational::from(0)),
        atom(Rational::from(0)),
        atom(5).into_dyn(),
    );
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(es, vec![(5, span!(0 / 1, 1 / 1), Some(span!(0 / 1, 1 / 1)))]);
}

#[test]
fn test_filter_values() {
    let p = from_list([1, 2, 3, 4]).filter_values(|v| v % 2 == 0);
    let values: Vec<_> = p.query_cycle().map(|ev| ev.value).collect();
    assert_eq!(values, vec![2, 4]);
}

#[test]
fn test_filter_just() {
    let p = filter_just(from_list([Some("a"), None, Some("c")]));
    let es = spans(&p, span!(0 / 1, 1 / 1));
    assert_eq!(
        es,
        vec![
            ("a", span!(0 / 1, 1 / 3), Some(span!(0 / 1, 1 / 3))),
            ("c", span!(2 / 3, 1 / 1), Some(span!(2 / 3, 1 / 1))),
        ]
    );
}

#[test]
fn test_steady() {
    let max = 10;
    for n in 0..=max {
        let i = span!(Rational::new(n, max));
        let v = steady("hello").query(i).map(|ev| ev.value).next().unwrap();
        assert_eq!(v, "hello");
    }
}

#[test]
fn test_dyn_pattern() {
    let _patterns: Vec<DynPattern<_>> = vec![
        wave::saw().into_dyn(),
        wave::saw2().into_dyn(),
        silence().into_dyn(),
        steady(1.0).into_dyn(),
        atom(0.0).into_dyn(),
    ];
}

#[test]
fn test_debug() {
    let p = atom("hello");
    println!("{:?}", p.debug());
    println!("{:?}", p.debug_span(span!(2 / 1, 7 / 2)));
    println!("{:?}", from_list([1, 2, 3]));
}
