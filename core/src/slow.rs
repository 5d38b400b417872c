//! Macros that do run-time safety checks. These can be disabled, but this increases
//! the risk of unsafe behavior.

/// `assert!` that is exists only if `"no-slow-safety-checks"` feature is not enabled.
#[cfg(not(feature = "no-slow-safety-checks"))]
#[macro_export]
macro_rules! kiln_slow_assert {
    ($($arg:tt)*) => {
        assert!($($arg)*);
    }
}

/// `assert_eq!` that is exists only if `"no-slow-safety-checks"` feature is not enabled.
#[cfg(not(feature = "no-slow-safety-checks"))]
#[macro_export]
macro_rules! kiln_slow_assert_eq {
    ($($arg:tt)*) => {
        assert_eq!($($arg)*);
    }
}

/// `assert!` that is exists only if `"no-slow-safety-checks"` feature is not enabled.
#[cfg(feature = "no-slow-safety-checks")]
#[macro_export]
macro_rules! kiln_slow_assert {
    ($($tt:tt)*) => {};
}

/// `assert_eq!` that is exists only if `"no-slow-safety-checks"` feature is not enabled.
#[cfg(feature = "no-slow-safety-checks")]
#[macro_export]
macro_rules! kiln_slow_assert_eq {
    ($($tt:tt)*) => {};
}

/// Resolve into input AST if slow safety checks are enabled.
#[cfg(not(feature = "no-slow-safety-checks"))]
#[macro_export]
macro_rules! kiln_with_slow_safety_checks {
    ($($tt:tt)*) => { $($tt)* };
}

/// Resolve into input AST if slow safety checks are enabled.
#[cfg(feature = "no-slow-safety-checks")]
#[macro_export]
macro_rules! kiln_with_slow_safety_checks {
    ($($tt:tt)*) => {};
}
