//! Monkey count and its on-screen text

/// Number of monkeys welded this round
#[derive(Debug, Clone, Default)]
pub struct Score {
    count: u32,
    text: String,
}

impl Score {
    pub fn new() -> Self {
        let mut score = Self::default();
        score.reset();
        score
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.text = "0".to_string();
    }

    /// Count one more weld, returning the new total
    pub fn increment(&mut self) -> u32 {
        self.count += 1;
        self.text = self.count.to_string();
        self.count
    }

    /// Switch the text to the end-of-round summary
    pub fn finalize(&mut self) {
        self.text = format!("YOU HAD {} MONKEYS ON THE TREE!", self.count);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Text shown on the HUD, or the summary after [`Score::finalize`]
    pub fn text(&self) -> &str {
        &self.text
    }
}
