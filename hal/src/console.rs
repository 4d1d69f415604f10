//! Debug console abstraction
//!
//! The console is the retargeted serial output a board brings up for
//! human-readable logging. Writers are line oriented and infallible from the
//! caller's point of view: a lost console line never changes node behavior.

use core::fmt;

/// Line-oriented text sink shared between interrupt and thread level.
pub trait Console: Sync {
    /// Write one formatted line; the implementation appends the line ending.
    fn write_line(&self, args: fmt::Arguments<'_>);
}

impl<C: Console + ?Sized> Console for &C {
    fn write_line(&self, args: fmt::Arguments<'_>) {
        (**self).write_line(args)
    }
}

/// Writes a formatted line to a [`Console`].
#[macro_export]
macro_rules! console_line {
    ($console:expr, $($arg:tt)*) => {
        $crate::console::Console::write_line(&$console, format_args!($($arg)*))
    };
}
