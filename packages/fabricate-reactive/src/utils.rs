//! Small helpers layered on top of the core primitives: [`MaybeDyn`], [`Trackable`], and [`on`].

use std::rc::Rc;

use crate::root::untrack;
use crate::signals::{ReadSignal, Signal};

/// Either a plain value or a reactive accessor for one, for APIs that want to accept both without
/// forcing callers to wrap a constant in a signal.
#[derive(Clone)]
pub enum MaybeDyn<T> {
    Static(T),
    Dynamic(Rc<dyn Fn() -> T>),
}

impl<T: Clone + 'static> MaybeDyn<T> {
    /// Reads the current value, tracking it as a dependency if it is [`MaybeDyn::Dynamic`].
    pub fn get(&self) -> T {
        match self {
            MaybeDyn::Static(v) => v.clone(),
            MaybeDyn::Dynamic(f) => f(),
        }
    }
}

impl<T> From<T> for MaybeDyn<T> {
    fn from(value: T) -> Self {
        MaybeDyn::Static(value)
    }
}

impl<T: Clone + 'static> From<ReadSignal<T>> for MaybeDyn<T> {
    fn from(signal: ReadSignal<T>) -> Self {
        MaybeDyn::Dynamic(Rc::new(move || signal.get()))
    }
}

impl<T: Clone + 'static> From<Signal<T>> for MaybeDyn<T> {
    fn from(signal: Signal<T>) -> Self {
        MaybeDyn::Dynamic(Rc::new(move || signal.get()))
    }
}

/// Something that can be registered as a dependency of the current computation without reading
/// its value, so that [`on`] can build effects/memos with an explicit dependency list.
pub trait Trackable {
    fn track(&self);
}

impl<T: 'static> Trackable for ReadSignal<T> {
    fn track(&self) {
        ReadSignal::track(*self);
    }
}

impl<T: 'static> Trackable for Signal<T> {
    fn track(&self) {
        Signal::track(*self);
    }
}

impl<A: Trackable> Trackable for (A,) {
    fn track(&self) {
        self.0.track();
    }
}

macro_rules! impl_trackable_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Trackable),+> Trackable for ($($name,)+) {
            fn track(&self) {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                $($name.track();)+
            }
        }
    };
}

impl_trackable_for_tuple!(A, B);
impl_trackable_for_tuple!(A, B, C);
impl_trackable_for_tuple!(A, B, C, D);
impl_trackable_for_tuple!(A, B, C, D, E);
impl_trackable_for_tuple!(A, B, C, D, E, F);
impl_trackable_for_tuple!(A, B, C, D, E, F, G);
impl_trackable_for_tuple!(A, B, C, D, E, F, G, H);

/// Wraps `f` so that only `deps` are tracked, regardless of what `f` itself reads. Pass the
/// result to [`create_effect`](crate::create_effect) or [`create_memo`](crate::create_memo) for
/// an effect/memo with an explicit dependency list instead of the usual automatic one.
///
/// # Example
/// ```
/// # use fabricate_reactive::*;
/// # let root = create_root(|| {
/// let a = create_signal(1);
/// let b = create_signal(100);
/// let runs = create_signal(0);
/// create_effect(on(a, move || {
///     b.get(); // read, but not tracked: only `a` re-triggers this effect
///     runs.set(runs.get_untracked() + 1);
/// }));
/// assert_eq!(runs.get_untracked(), 1);
/// b.set(200);
/// assert_eq!(runs.get_untracked(), 1);
/// a.set(2);
/// assert_eq!(runs.get_untracked(), 2);
/// # });
/// # root.dispose();
/// ```
pub fn on<D: Trackable + 'static, T>(deps: D, mut f: impl FnMut() -> T + 'static) -> impl FnMut() -> T {
    move || {
        deps.track();
        untrack(&mut f)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn maybe_dyn_static_and_dynamic() {
        let root = create_root(|| {
            let constant: MaybeDyn<i32> = 5.into();
            assert_eq!(constant.get(), 5);

            let s = create_signal(1);
            let dynamic: MaybeDyn<i32> = s.into();
            assert_eq!(dynamic.get(), 1);
            s.set(9);
            assert_eq!(dynamic.get(), 9);
        });
        root.dispose();
    }

    #[test]
    fn on_limits_tracked_dependencies() {
        let root = create_root(|| {
            let a = create_signal(1);
            let b = create_signal(100);
            let runs = create_signal(0);
            create_effect(on(a, move || {
                b.get_untracked();
                runs.set(runs.get_untracked() + 1);
            }));
            assert_eq!(runs.get_untracked(), 1);
            b.set(200);
            assert_eq!(runs.get_untracked(), 1);
            a.set(2);
            assert_eq!(runs.get_untracked(), 2);
        });
        root.dispose();
    }
}
