//! Narration text segmentation.
//!
//! Splits narration into speakable chunks bounded by a maximum weighted
//! length, preferring to break at punctuation. ASCII letters and digits count
//! half as much as other characters so mixed CJK/Latin text is budgeted by
//! approximate speaking time rather than codepoint count.

/// Splits narration text into speakable chunks.
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    max_weight: f64,
}

/// Default maximum weighted length per chunk.
pub const DEFAULT_MAX_WEIGHT: f64 = 20.0;

/// Weight of one character: ASCII alphanumerics 0.5, everything else 1.0.
fn char_weight(c: char) -> f64 {
    if c.is_ascii_alphanumeric() {
        0.5
    } else {
        1.0
    }
}

/// Weighted length of a string.
pub fn weighted_len(text: &str) -> f64 {
    text.chars().map(char_weight).sum()
}

/// Sentence/clause enders that terminate a first-pass unit.
fn is_sentence_break(c: char) -> bool {
    matches!(c, '。' | '．' | '.' | '!' | '！' | '?' | '？' | ';' | '；' | '\n')
}

/// Second-pass punctuation weight; higher weights are preferred cut points.
fn punct_weight(c: char) -> Option<u32> {
    match c {
        '。' | '．' | '.' | '!' | '！' | '?' | '？' => Some(4),
        ';' | '；' => Some(3),
        ',' | '，' | '、' => Some(2),
        ' ' | '\n' => Some(1),
        _ => None,
    }
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WEIGHT)
    }
}

impl TextSegmenter {
    /// Create a segmenter with the given maximum weighted length.
    pub fn new(max_weight: f64) -> Self {
        Self { max_weight }
    }

    /// Split narration text into ordered speakable chunks.
    ///
    /// Empty input yields an empty vec. A unit with no qualifying punctuation
    /// in the search window is emitted whole even when over-long.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for unit in first_pass(text) {
            self.split_long(&unit, &mut out);
        }
        out
    }

    /// Re-split an over-long unit at the best punctuation in the window
    /// `[0.8 * max, 1.5 * max]` (weighted positions), recursively.
    fn split_long(&self, unit: &str, out: &mut Vec<String>) {
        let mut rest = unit.trim().to_string();

        loop {
            if rest.is_empty() {
                return;
            }
            if weighted_len(&rest) <= self.max_weight {
                out.push(rest);
                return;
            }

            match self.find_cut(&rest) {
                Some(byte_idx) => {
                    let (head, tail) = rest.split_at(byte_idx);
                    // The cut index points at the punctuation glyph; strip it.
                    let mut tail_chars = tail.chars();
                    tail_chars.next();
                    let head = head.trim();
                    if !head.is_empty() {
                        // A cut near 150% can leave a head that is itself
                        // over-long with a weaker cut point inside it.
                        self.split_long(head, out);
                    }
                    rest = tail_chars.as_str().trim().to_string();
                }
                None => {
                    // Escape hatch: no punctuation in the window.
                    out.push(rest);
                    return;
                }
            }
        }
    }

    /// Find the byte index of the best cut punctuation, scanning forward from
    /// 80% to 150% of the maximum weighted length.
    fn find_cut(&self, text: &str) -> Option<usize> {
        let lo = 0.8 * self.max_weight;
        let hi = 1.5 * self.max_weight;

        let mut cum = 0.0;
        let mut best: Option<(u32, usize)> = None;

        for (idx, c) in text.char_indices() {
            cum += char_weight(c);
            if cum > hi {
                break;
            }
            if cum < lo {
                continue;
            }
            if let Some(w) = punct_weight(c) {
                match best {
                    Some((bw, _)) if bw >= w => {}
                    _ => best = Some((w, idx)),
                }
            }
        }

        best.map(|(_, idx)| idx)
    }
}

/// First pass: split on sentence/clause enders, stripping the trailing glyph.
fn first_pass(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut buf = String::new();

    for c in text.chars() {
        if is_sentence_break(c) {
            let unit = buf.trim();
            if !unit.is_empty() {
                units.push(unit.to_string());
            }
            buf.clear();
        } else {
            buf.push(c);
        }
    }

    let unit = buf.trim();
    if !unit.is_empty() {
        units.push(unit.to_string());
    }

    units
}
