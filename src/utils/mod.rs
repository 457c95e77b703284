use std::time::{Duration, Instant};
use tracing::info;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("⏱  Finished: {} (took {:.2?})", self.label, self.elapsed());
    }
}

/// Signed percentage with two decimals: `+1.23%`, `-0.50%`.
pub fn fmt_pct(v: f64) -> String {
    format!("{v:+.2}%")
}

/// Shorten to `max` characters, marking the cut with an ellipsis.
pub fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_pct() {
        assert_eq!(fmt_pct(1.234), "+1.23%");
        assert_eq!(fmt_pct(-0.5), "-0.50%");
        assert_eq!(fmt_pct(0.0), "+0.00%");
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("Technology", 20), "Technology");
        assert_eq!(ellipsize("Consumer Discretionary", 12), "Consumer Di…");
        assert_eq!(ellipsize("abc", 3), "abc");
    }
}
