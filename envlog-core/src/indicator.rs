//! Status light: palette, hardware seam and the blink patterns used to
//! report storage trouble.

use crate::error::StorageErrorClass;

/// Indicator palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Off,
    Red,
    Green,
    Yellow,
    Blue,
    Aqua,
    Purple,
}

impl Color {
    /// Full-scale RGB value. Drivers apply their own brightness.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Color::Off => [0, 0, 0],
            Color::Red => [255, 0, 0],
            Color::Green => [0, 255, 0],
            Color::Yellow => [255, 150, 0],
            Color::Blue => [0, 0, 255],
            Color::Aqua => [0, 255, 255],
            Color::Purple => [180, 0, 255],
        }
    }
}

/// Single-pixel light.
///
/// Implementations swallow hardware faults: the light is diagnostic only.
pub trait Indicator {
    /// Show a color immediately.
    fn set(&mut self, color: Color);
}

/// Blocking delay.
pub trait Delay {
    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Color and half-period of a blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    /// Color shown during the on phase.
    pub color: Color,

    /// Duration of each on and off phase, in milliseconds.
    pub period_ms: u32,
}

/// Mapping from storage error class to blink pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassTable {
    pub read_only: BlinkPattern,
    pub out_of_space: BlinkPattern,
    pub default: BlinkPattern,
}

impl ErrorClassTable {
    /// The device's table.
    pub const fn standard() -> Self {
        Self {
            read_only: BlinkPattern {
                color: Color::Red,
                period_ms: 100,
            },
            out_of_space: BlinkPattern {
                color: Color::Red,
                period_ms: 500,
            },
            default: BlinkPattern {
                color: Color::Red,
                period_ms: 300,
            },
        }
    }

    /// Look up the pattern for an error class.
    pub fn pattern(&self, class: StorageErrorClass) -> BlinkPattern {
        match class {
            StorageErrorClass::ReadOnlyFilesystem => self.read_only,
            StorageErrorClass::OutOfSpace => self.out_of_space,
            StorageErrorClass::Other => self.default,
        }
    }
}

impl Default for ErrorClassTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Boot flash duration.
pub const BOOT_FLASH_MS: u32 = 300;

/// Write success flash duration.
pub const SUCCESS_FLASH_MS: u32 = 100;

/// Indicator paired with the delay that paces it.
pub struct StatusSignal<I, D> {
    indicator: I,
    delay: D,
}

impl<I: Indicator, D: Delay> StatusSignal<I, D> {
    /// Create a status signal.
    pub fn new(indicator: I, delay: D) -> Self {
        Self { indicator, delay }
    }

    /// Show a color until the next call.
    pub fn set(&mut self, color: Color) {
        self.indicator.set(color);
    }

    /// Block without touching the light.
    pub fn pause(&mut self, ms: u32) {
        if ms > 0 {
            self.delay.delay_ms(ms);
        }
    }

    /// Show a color for `ms`, then switch off.
    pub fn flash(&mut self, color: Color, ms: u32) {
        self.indicator.set(color);
        self.pause(ms);
        self.indicator.set(Color::Off);
    }

    /// One on/off cycle of a blink pattern.
    pub fn blink_once(&mut self, pattern: BlinkPattern) {
        self.flash(pattern.color, pattern.period_ms);
        self.pause(pattern.period_ms);
    }

    /// Blink a pattern until power is removed.
    pub fn blink_forever(&mut self, pattern: BlinkPattern) -> ! {
        loop {
            self.blink_once(pattern);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Indicator or delay event, in call order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Event {
        Set(Color),
        Wait(u32),
    }

    pub(crate) type Trace = Rc<RefCell<Vec<Event>>>;

    /// Indicator recording into a shared trace.
    pub(crate) struct RecordingIndicator(pub(crate) Trace);

    impl Indicator for RecordingIndicator {
        fn set(&mut self, color: Color) {
            self.0.borrow_mut().push(Event::Set(color));
        }
    }

    /// Delay recording into a shared trace instead of sleeping.
    pub(crate) struct RecordingDelay(pub(crate) Trace);

    impl Delay for RecordingDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.0.borrow_mut().push(Event::Wait(ms));
        }
    }

    pub(crate) fn recording_signal() -> (StatusSignal<RecordingIndicator, RecordingDelay>, Trace) {
        let trace = Trace::default();
        let signal = StatusSignal::new(
            RecordingIndicator(Rc::clone(&trace)),
            RecordingDelay(Rc::clone(&trace)),
        );
        (signal, trace)
    }

    #[test]
    fn flash_sets_waits_and_clears() {
        let (mut signal, trace) = recording_signal();
        signal.flash(Color::Green, SUCCESS_FLASH_MS);
        assert_eq!(
            *trace.borrow(),
            [Event::Set(Color::Green), Event::Wait(100), Event::Set(Color::Off)]
        );
    }

    #[test]
    fn blink_once_holds_both_phases() {
        let (mut signal, trace) = recording_signal();
        signal.blink_once(ErrorClassTable::standard().out_of_space);
        assert_eq!(
            *trace.borrow(),
            [
                Event::Set(Color::Red),
                Event::Wait(500),
                Event::Set(Color::Off),
                Event::Wait(500)
            ]
        );
    }

    #[test]
    fn zero_pause_does_not_touch_delay() {
        let (mut signal, trace) = recording_signal();
        signal.pause(0);
        assert!(trace.borrow().is_empty());
    }

    #[test]
    fn table_maps_classes_to_patterns() {
        let table = ErrorClassTable::standard();
        assert_eq!(table.pattern(StorageErrorClass::OutOfSpace).period_ms, 500);
        assert_eq!(table.pattern(StorageErrorClass::ReadOnlyFilesystem).period_ms, 100);
        assert_eq!(table.pattern(StorageErrorClass::Other).period_ms, 300);
        assert!(
            [
                StorageErrorClass::OutOfSpace,
                StorageErrorClass::ReadOnlyFilesystem,
                StorageErrorClass::Other
            ]
            .iter()
            .all(|class| table.pattern(*class).color == Color::Red)
        );
    }

    #[test]
    fn off_is_dark() {
        assert_eq!(Color::Off.rgb(), [0, 0, 0]);
    }
}
