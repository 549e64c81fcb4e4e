//! [`create_effect`]: a computation run purely for its side effects.

use crate::memos::create_selector_with;

/// Runs `f` once immediately, then again every time one of the signals it read changes.
///
/// An effect is a memo whose result nobody reads: it is implemented as exactly that, discarding
/// the computed `()` and treating every run as unchanged since it has no dependents of its own.
///
/// # Example
/// ```
/// # use fabricate_reactive::*;
/// # let root = create_root(|| {
/// let count = create_signal(0);
/// let seen = create_signal(0);
/// create_effect(move || seen.set_silent(count.get()));
/// assert_eq!(seen.get_untracked(), 0);
/// count.set(5);
/// assert_eq!(seen.get_untracked(), 5);
/// # });
/// # root.dispose();
/// ```
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_effect(mut f: impl FnMut() + 'static) {
    create_selector_with(move || f(), |_, _| true);
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn effect_runs_immediately_and_on_change() {
        let root = create_root(|| {
            let a = create_signal(1);
            let runs = create_signal(0);
            create_effect(move || {
                a.get();
                runs.set(runs.get_untracked() + 1);
            });
            assert_eq!(runs.get_untracked(), 1);
            a.set(2);
            assert_eq!(runs.get_untracked(), 2);
        });
        root.dispose();
    }

    #[test]
    fn effect_recreates_dependencies_each_run() {
        let root = create_root(|| {
            let cond = create_signal(true);
            let a = create_signal(1);
            let b = create_signal(100);
            let runs = create_signal(0);
            create_effect(move || {
                runs.set(runs.get_untracked() + 1);
                if cond.get() {
                    a.get();
                } else {
                    b.get();
                }
            });
            assert_eq!(runs.get_untracked(), 1);
            cond.set(false); // switches dependency from a to b
            assert_eq!(runs.get_untracked(), 2);
            a.set(2); // no longer a dependency
            assert_eq!(runs.get_untracked(), 2);
            b.set(200);
            assert_eq!(runs.get_untracked(), 3);
        });
        root.dispose();
    }

    #[test]
    fn outer_effects_run_before_inner_ones_are_recreated() {
        let root = create_root(|| {
            let trigger = create_signal(0);
            let outer_runs = create_signal(0);
            create_effect(move || {
                trigger.get();
                outer_runs.set(outer_runs.get_untracked() + 1);
                create_effect(|| {});
            });
            assert_eq!(outer_runs.get_untracked(), 1);
            trigger.set(1);
            assert_eq!(outer_runs.get_untracked(), 2);
        });
        root.dispose();
    }
}
