//! Pure FFmpeg filter-string builders used by the compositor.

/// Default fade applied to narration clips and cross-fades, in seconds.
pub const AUDIO_FADE: f64 = 0.2;

/// Escape text for use inside a drawtext filter.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\\\\\'"),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            _ => out.push(c),
        }
    }
    out
}

/// Scale and crop an input to fully cover the canvas.
pub fn cover_canvas(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
        w = width,
        h = height
    )
}

/// Scale an input to fit inside a box, preserving aspect ratio.
pub fn fit_box(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease",
        w = width,
        h = height
    )
}

/// Build a drawtext filter.
///
/// `x` and `y` may be FFmpeg expressions (e.g. `(w-text_w)/2`).
pub fn drawtext(
    text: &str,
    x: &str,
    y: &str,
    font_size: u32,
    color: &str,
    start: f64,
    end: f64,
) -> String {
    format!(
        "drawtext=text='{}':x={}:y={}:fontsize={}:fontcolor={}:borderw=2:bordercolor=black@0.6:enable='between(t,{:.4},{:.4})'",
        escape_drawtext(text),
        x,
        y,
        font_size,
        color,
        start,
        end
    )
}

/// Fade-in/out plus placement for one narration clip.
///
/// The clip is faded at both ends, delayed to its placement start and padded
/// with trailing silence so every narration stream spans the full mix.
pub fn narration_chain(input_index: usize, duration: f64, start: f64, label: &str) -> String {
    let fade_out_start = (duration - AUDIO_FADE).max(0.0);
    let delay_ms = (start * 1000.0).round() as u64;
    format!(
        "[{i}:a]afade=t=in:st=0:d={fade:.2},afade=t=out:st={fo:.4}:d={fade:.2},adelay={d}|{d},apad[{label}]",
        i = input_index,
        fade = AUDIO_FADE,
        fo = fade_out_start,
        d = delay_ms,
        label = label
    )
}

/// Background-music bed: trim the (pre-looped) input to the exact mix length,
/// reduce gain and fade out at the end.
pub fn bgm_chain(input_index: usize, total: f64, gain: f32, label: &str) -> String {
    let fade_start = (total - 2.0).max(0.0);
    format!(
        "[{i}:a]atrim=0:{total:.4},asetpts=PTS-STARTPTS,volume={gain},afade=t=out:st={fs:.4}:d=2[{label}]",
        i = input_index,
        total = total,
        gain = gain,
        fs = fade_start,
        label = label
    )
}

/// Mix the given labelled audio streams and trim to the final duration.
pub fn amix(labels: &[String], total: f64, out_label: &str) -> String {
    let inputs: String = labels.iter().map(|l| format!("[{}]", l)).collect();
    format!(
        "{inputs}amix=inputs={n}:normalize=0,atrim=0:{total:.4}[{out}]",
        inputs = inputs,
        n = labels.len(),
        total = total,
        out = out_label
    )
}

/// Silent stereo source for jobs without bgm and without narration overlap.
pub fn silence(total: f64, label: &str) -> String {
    format!(
        "anullsrc=channel_layout=stereo:sample_rate=44100,atrim=0:{:.4}[{}]",
        total, label
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("10:30"), "10\\:30");
        assert_eq!(escape_drawtext("100%"), "100\\%");
        assert!(escape_drawtext("it's").contains("\\'"));
    }

    #[test]
    fn test_cover_canvas_dimensions() {
        let filter = cover_canvas(1080, 1920);
        assert!(filter.contains("scale=1080:1920"));
        assert!(filter.contains("crop=1080:1920"));
    }

    #[test]
    fn test_narration_chain_places_clip() {
        let chain = narration_chain(2, 3.5, 0.5, "n0");
        assert!(chain.starts_with("[2:a]"));
        assert!(chain.contains("adelay=500|500"));
        assert!(chain.contains("afade=t=out:st=3.3000"));
        assert!(chain.ends_with("[n0]"));
    }

    #[test]
    fn test_bgm_chain_trims_to_total() {
        let chain = bgm_chain(3, 42.0, 0.1, "bgm");
        assert!(chain.contains("atrim=0:42.0000"));
        assert!(chain.contains("volume=0.1"));
        assert!(chain.contains("afade=t=out:st=40.0000"));
    }

    #[test]
    fn test_amix_collects_labels() {
        let mix = amix(&["n0".to_string(), "n1".to_string(), "bgm".to_string()], 30.0, "a");
        assert!(mix.starts_with("[n0][n1][bgm]amix=inputs=3"));
        assert!(mix.ends_with("[a]"));
    }

    #[test]
    fn test_drawtext_enable_window() {
        let d = drawtext("第一幕", "(w-text_w)/2", "1600", 56, "white", 0.5, 4.2);
        assert!(d.contains("between(t,0.5000,4.2000)"));
        assert!(d.contains("fontsize=56"));
    }
}
