#[cfg(feature = "tracing")]
macro_rules! lwtrace {
    ($($tt:tt)*) => {
        tracing::trace!(target: "livewindow", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! lwtrace {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! lwdebug {
    ($($tt:tt)*) => {
        tracing::debug!(target: "livewindow", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! lwdebug {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! lwwarn {
    ($($tt:tt)*) => {
        tracing::warn!(target: "livewindow", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! lwwarn {
    ($($tt:tt)*) => {};
}
