//! Conversion of resolver panics into errors.
//!
//! Executors catch panics in resolvers so one bad field cannot take down the
//! whole response. [`recover_to_error`] turns the caught payload into an
//! `internal` [`GqlError`] at panic level, which the
//! [`ErrorPresenter`](crate::ErrorPresenter) then logs through the sink's
//! DPanic path like any other error.
//!
//! The stack trace becomes the internal message, so it ends up in the logs
//! and never in the response. [`catch_panic`] records the trace from a panic
//! hook, while the panicking frames are still on the stack. A payload caught
//! some other way only gets the trace of the point of recovery.
//!
//! # Example
//!
//! ```rust
//! use gqlerr::{ErrorPresenter, RequestContext, TracingSink, catch_panic};
//!
//! let presenter = ErrorPresenter::new(TracingSink::new());
//! let ctx = RequestContext::background();
//!
//! let result = catch_panic(&ctx, || -> u32 { panic!("Panic! At The Disco") });
//! let response = presenter.present(&ctx, result.err()).unwrap();
//! assert_eq!(response.message, "internal error");
//! ```

use crate::{BoxError, Field, GqlError, RequestContext};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, UnwindSafe};
use std::sync::Once;

/// Key of the field holding the panic payload.
pub const RECOVER_KEY: &str = "recover";

thread_local! {
    // Number of `catch_panic` calls active on this thread
    static CATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
    // Trace recorded by the hook for the most recent panic
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static TRACE_HOOK: Once = Once::new();

/// Chain a hook in front of the current one that records the trace of panics
/// raised inside `catch_panic`. Installed once per process.
fn install_trace_hook() {
    TRACE_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CATCH_DEPTH.try_with(Cell::get).unwrap_or(0) > 0 {
                let trace = Backtrace::force_capture().to_string();
                let _ = PANIC_TRACE.try_with(|slot| *slot.borrow_mut() = Some(trace));
            }
            previous(info);
        }));
    });
}

fn take_panic_trace() -> Option<String> {
    PANIC_TRACE.try_with(RefCell::take).ok().flatten()
}

/// Convert a caught panic payload into an error for the presenter.
///
/// Uses the trace recorded at the panic site by [`catch_panic`] when there
/// is one, otherwise captures the current stack trace. The trace becomes the
/// internal message and the payload is recorded under `recover`. This is the
/// only place errors are raised to panic level implicitly.
pub fn recover_to_error(ctx: &RequestContext, payload: Box<dyn Any + Send>) -> BoxError {
    let trace = take_panic_trace().unwrap_or_else(|| Backtrace::force_capture().to_string());
    let err = GqlError::internal(ctx, trace, [Field::string(RECOVER_KEY, panic_message(&*payload))])
        .at_panic();
    Box::new(err)
}

/// String form of a panic payload.
///
/// `panic!` with a literal produces a `&'static str`, with format args a
/// `String`; anything else (from `panic_any`) can't be rendered.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return (*s).to_owned();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    String::from("Box<dyn Any>")
}

/// Run `f`, converting a panic into an error with [`recover_to_error`].
///
/// The first call chains a hook in front of the installed panic hook, which
/// records the stack at the panic site. The previous hook still runs, so the
/// panic is also reported there. A hook set after that first call replaces
/// the recording one and traces fall back to the point of recovery.
pub fn catch_panic<F, T>(ctx: &RequestContext, f: F) -> Result<T, BoxError>
where
    F: FnOnce() -> T + UnwindSafe,
{
    install_trace_hook();
    take_panic_trace();

    CATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(f);
    CATCH_DEPTH.with(|depth| depth.set(depth.get() - 1));

    match result {
        Ok(value) => {
            take_panic_trace();
            Ok(value)
        }
        Err(payload) => Err(recover_to_error(ctx, payload)),
    }
}
