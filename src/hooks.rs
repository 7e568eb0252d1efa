use gloo_timers::callback::{Interval, Timeout};
use yew::prelude::*;

/// Run `task` once on mount and then every `period_ms` until unmount.
///
/// The interval is owned by the effect, so dropping the component cancels it.
#[hook]
pub fn use_interval_task<F>(period_ms: u32, task: F)
where
    F: Fn() + 'static,
{
    let task = use_memo((), move |_| task);
    use_effect_with(period_ms, move |&period_ms| {
        (*task)();
        let interval = Interval::new(period_ms, move || (*task)());
        move || drop(interval)
    });
}

/// Wrap `target` so it only fires after `delay_ms` without a new emit.
///
/// Each emit replaces (and thereby cancels) the pending timeout. A pending
/// timeout is cancelled when the component unmounts.
#[hook]
pub fn use_debounced<T: 'static>(delay_ms: u32, target: Callback<T>) -> Callback<T> {
    let timer = use_mut_ref(|| None::<Timeout>);

    {
        let timer = timer.clone();
        use_effect_with((), move |_| {
            move || {
                timer.borrow_mut().take();
            }
        });
    }

    Callback::from(move |value: T| {
        let target = target.clone();
        let handle = Timeout::new(delay_ms, move || target.emit(value));
        // Cancel any existing timer by replacing it
        *timer.borrow_mut() = Some(handle);
    })
}
