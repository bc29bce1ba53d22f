use console::style;

#[derive(Debug, Clone, Copy, Default)]
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", style("✓").green(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    /// Pipeline stage line; stdout stays free for the report itself
    pub fn progress(&self, message: &str) {
        eprintln!("{} {}", style("›").cyan(), style(message).dim());
    }
}
