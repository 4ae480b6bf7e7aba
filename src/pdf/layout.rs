use crate::fonts::TextMeasure;

/// One word placed on a line; `x_offset` is relative to the line start.
#[derive(Clone, Debug, PartialEq)]
pub struct WordChunk {
    pub text: String,
    pub x_offset: f32,
    pub width: f32,
}

/// Greedy word wrap. Words are never split: a word wider than `max_width`
/// sits alone on its own line.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    max_width: f32,
    font: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if font.text_width(&candidate, font_size) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Spread the slack of a line evenly over its word gaps so the last word ends
/// at `available_width`. Lines whose natural width already exceeds the
/// available width keep single spaces; a lone word stays at offset 0.
pub fn justify_words<S: AsRef<str>>(
    words: &[S],
    font_size: f32,
    available_width: f32,
    font: &dyn TextMeasure,
) -> Vec<WordChunk> {
    let space_w = font.space_width(font_size);
    let widths: Vec<f32> = words
        .iter()
        .map(|w| font.text_width(w.as_ref(), font_size))
        .collect();

    let gap_count = words.len().saturating_sub(1);
    let natural: f32 = widths.iter().sum::<f32>() + gap_count as f32 * space_w;
    let extra = (available_width - natural).max(0.0);
    let extra_per_gap = extra / gap_count.max(1) as f32;

    let mut chunks = Vec::with_capacity(words.len());
    let mut x = 0.0f32;
    for (i, (word, &width)) in words.iter().zip(&widths).enumerate() {
        if i > 0 {
            x += space_w + extra_per_gap;
        }
        chunks.push(WordChunk {
            text: word.as_ref().to_string(),
            x_offset: x,
            width,
        });
        x += width;
    }
    chunks
}
