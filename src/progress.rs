//! Injectable progress reporting for long extraction passes.
//!
//! Progress is an observability side channel only; swapping reporters never
//! changes extraction behavior.

use std::io::Write;

const BAR_LENGTH: usize = 50;
const BAR_FILL: char = '\u{2588}';

/// Receives a monotonic counter advancing from 0 to the total item count.
/// An abandoned pass simply stops advancing; the next pass begins again at 0.
pub trait ProgressReporter {
    fn begin(&mut self, label: &str, total: usize);
    fn advance(&mut self, current: usize, total: usize);
}

/// Draws an in-place terminal bar, one redraw per advance.
#[derive(Debug, Default)]
pub struct TerminalProgressBar {
    label: String,
}

impl ProgressReporter for TerminalProgressBar {
    fn begin(&mut self, label: &str, total: usize) {
        self.label = label.to_string();
        self.advance(0, total);
    }

    fn advance(&mut self, current: usize, total: usize) {
        let safe_total = total.max(1);
        let clamped = current.min(safe_total);
        let percent = 100.0 * clamped as f64 / safe_total as f64;
        print!(
            "\r{} |{}| {percent:.1}% Complete",
            self.label,
            render_bar(current, total, BAR_LENGTH)
        );
        let _ = std::io::stdout().flush();
        if current >= total {
            println!();
        }
    }
}

/// No-op reporter so tests can drive extraction without terminal output.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct SilentProgress;

#[cfg(test)]
impl ProgressReporter for SilentProgress {
    fn begin(&mut self, _label: &str, _total: usize) {}

    fn advance(&mut self, _current: usize, _total: usize) {}
}

fn render_bar(current: usize, total: usize, length: usize) -> String {
    let total = total.max(1);
    let current = current.min(total);
    let filled = length * current / total;
    let mut bar = String::with_capacity(length);
    for _ in 0..filled {
        bar.push(BAR_FILL);
    }
    for _ in filled..length {
        bar.push('-');
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::render_bar;

    #[test]
    fn test_bar_is_empty_at_zero() {
        assert_eq!(render_bar(0, 10, 4), "----");
    }

    #[test]
    fn test_bar_fills_proportionally() {
        assert_eq!(render_bar(5, 10, 4), "\u{2588}\u{2588}--");
    }

    #[test]
    fn test_bar_is_full_at_total() {
        assert_eq!(render_bar(10, 10, 4), "\u{2588}\u{2588}\u{2588}\u{2588}");
    }

    #[test]
    fn test_overshoot_clamps_to_full() {
        assert_eq!(render_bar(12, 10, 4), "\u{2588}\u{2588}\u{2588}\u{2588}");
    }

    #[test]
    fn test_zero_total_does_not_divide_by_zero() {
        assert_eq!(render_bar(0, 0, 4), "----");
    }
}
