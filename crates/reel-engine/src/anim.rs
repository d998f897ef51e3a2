//! Per-frame animation primitives.
//!
//! Each primitive is an explicit struct holding its construction parameters,
//! with pure sampling methods of the elapsed time `t`. Sampling is valid for
//! any `t`, including before the start and after the end, so every primitive
//! can be unit-tested point-wise. Primitives also emit their FFmpeg
//! expression fragments as pure string builders for the compositor.

use reel_models::PlayerPanel;

/// Quadratic ease-out: fast start, settled landing.
pub fn ease_out_quad(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    1.0 - (1.0 - x) * (1.0 - x)
}

/// sRGB color with linear interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Linear interpolation between two colors.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb(ch(self.0, other.0), ch(self.1, other.1), ch(self.2, other.2))
    }

    /// `0xRRGGBB` form used in FFmpeg color arguments.
    pub fn to_hex(self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Fly-in from an off-screen point to a final position with ease-out.
#[derive(Debug, Clone, Copy)]
pub struct DealIn {
    pub start: f64,
    pub duration: f64,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl DealIn {
    /// Position at time `t`; held at `from` before start and at `to` after
    /// `start + duration`.
    pub fn position(&self, t: f64) -> (f64, f64) {
        if t <= self.start {
            return self.from;
        }
        if t >= self.start + self.duration {
            return self.to;
        }
        let p = ease_out_quad((t - self.start) / self.duration);
        (
            self.from.0 + (self.to.0 - self.from.0) * p,
            self.from.1 + (self.to.1 - self.from.1) * p,
        )
    }

    /// FFmpeg overlay expression for one axis.
    fn axis_expr(&self, from: f64, to: f64) -> String {
        format!(
            "if(lt(t,{s:.4}),{a:.1},if(gt(t,{e:.4}),{b:.1},{a:.1}+({b:.1}-{a:.1})*(1-pow(1-(t-{s:.4})/{d:.4},2))))",
            s = self.start,
            e = self.start + self.duration,
            d = self.duration,
            a = from,
            b = to
        )
    }

    /// FFmpeg overlay `x` expression.
    pub fn x_expr(&self) -> String {
        self.axis_expr(self.from.0, self.to.0)
    }

    /// FFmpeg overlay `y` expression.
    pub fn y_expr(&self) -> String {
        self.axis_expr(self.from.1, self.to.1)
    }
}

/// Character-by-character text reveal.
#[derive(Debug, Clone)]
pub struct Typewriter {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl Typewriter {
    /// Number of characters revealed at time `t`.
    pub fn revealed(&self, t: f64) -> usize {
        let len = self.text.chars().count();
        if len == 0 || self.duration <= 0.0 {
            return len;
        }
        let p = ((t - self.start) / self.duration).clamp(0.0, 1.0);
        (len as f64 * p).floor() as usize
    }

    /// The visible prefix at time `t`, cut on a character boundary.
    pub fn visible(&self, t: f64) -> &str {
        let n = self.revealed(t);
        match self.text.char_indices().nth(n) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }

    /// Time at which the `i`-th character (0-based) becomes visible.
    pub fn reveal_time(&self, i: usize) -> f64 {
        let len = self.text.chars().count().max(1);
        self.start + self.duration * (i + 1) as f64 / len as f64
    }
}

/// Horizontal wipe: the revealed width grows linearly to the full width.
#[derive(Debug, Clone, Copy)]
pub struct WipeReveal {
    pub start: f64,
    pub duration: f64,
    pub width: u32,
}

impl WipeReveal {
    /// Revealed pixel width at time `t`; full width after the duration.
    pub fn revealed_width(&self, t: f64) -> u32 {
        let p = ((t - self.start) / self.duration).clamp(0.0, 1.0);
        (f64::from(self.width) * p).floor() as u32
    }

    /// FFmpeg crop-width expression implementing the wipe mask.
    pub fn width_expr(&self) -> String {
        format!(
            "max(floor(iw*clip((t-{s:.4})/{d:.4},0,1)),1)",
            s = self.start,
            d = self.duration
        )
    }
}

/// Staggered left/right progress-bar fill with color interpolation.
#[derive(Debug, Clone)]
pub struct BarFill {
    /// Fill animation length of one row
    pub row_duration: f64,
    /// Stagger between consecutive rows
    pub row_interval: f64,
    /// Pixel width of a fully filled side
    pub full_width: f64,
    /// Fill color at progress 0
    pub light: Rgb,
    /// Fill color at progress 1
    pub dark: Rgb,
    /// Label color while the row is animating
    pub highlight: Rgb,
    /// Label color once the row has settled
    pub neutral: Rgb,
}

impl BarFill {
    /// Fill progress of row `row` at time `t`, relative to `start`.
    pub fn progress(&self, row: usize, start: f64, t: f64) -> f64 {
        let row_start = start + row as f64 * self.row_interval;
        ((t - row_start) / self.row_duration).clamp(0.0, 1.0)
    }

    /// Left/right fill widths for the given values at `progress`.
    ///
    /// The larger side reaches the full width; the smaller side's width holds
    /// the value ratio at every progress point. Equal values fill both sides
    /// fully.
    pub fn widths(&self, left: f64, right: f64, progress: f64) -> (f64, f64) {
        let max = left.max(right);
        let (lr, rr) = if max <= 0.0 || (left - right).abs() < f64::EPSILON {
            (1.0, 1.0)
        } else {
            (left / max, right / max)
        };
        (
            self.full_width * lr * progress,
            self.full_width * rr * progress,
        )
    }

    /// Fill color at `progress`: light at 0, dark at 1.
    pub fn fill_color(&self, progress: f64) -> Rgb {
        self.light.lerp(self.dark, progress)
    }

    /// Label color: highlight while animating, neutral exactly from
    /// progress 1 on.
    pub fn label_color(&self, progress: f64) -> Rgb {
        if progress >= 1.0 {
            self.neutral
        } else {
            self.highlight
        }
    }
}

/// Band kind inside a bottom data panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    Name,
    Draft,
    KeyMetric,
    Stats,
}

/// One horizontally centred band of a data panel.
#[derive(Debug, Clone)]
pub struct PanelBand {
    pub kind: BandKind,
    pub text: String,
    /// Vertical offset of the band's top edge
    pub y: u32,
    /// Outlined bold rendering for emphasis
    pub emphasis: bool,
}

/// Static bottom data panel: stacked fixed-height centred bands.
#[derive(Debug, Clone, Copy)]
pub struct DataPanel {
    /// Top edge of the first band
    pub top: u32,
    /// Height of each band
    pub band_height: u32,
}

impl DataPanel {
    /// Lay out a player's bands in fixed order; absent fields are skipped
    /// without leaving holes.
    pub fn bands(&self, player: &PlayerPanel) -> Vec<PanelBand> {
        let mut bands = Vec::new();
        let mut y = self.top;
        let mut push = |kind: BandKind, text: String, emphasis: bool, y: &mut u32| {
            bands.push(PanelBand {
                kind,
                text,
                y: *y,
                emphasis,
            });
            *y += self.band_height;
        };

        push(BandKind::Name, player.name.clone(), false, &mut y);
        if let Some(draft) = &player.draft {
            push(BandKind::Draft, draft.clone(), false, &mut y);
        }
        if let Some(metric) = &player.key_metric {
            push(BandKind::KeyMetric, metric.clone(), true, &mut y);
        }
        for stat in &player.stats {
            push(BandKind::Stats, stat.clone(), false, &mut y);
        }
        bands
    }
}

/// Slow zoom applied to the opening image.
#[derive(Debug, Clone, Copy)]
pub struct PanZoom {
    pub duration: f64,
    pub zoom_from: f64,
    pub zoom_to: f64,
}

impl PanZoom {
    /// Zoom factor at time `t`, held at the endpoints.
    pub fn zoom_at(&self, t: f64) -> f64 {
        let p = (t / self.duration).clamp(0.0, 1.0);
        self.zoom_from + (self.zoom_to - self.zoom_from) * p
    }

    /// FFmpeg `zoompan` filter centred on the frame.
    pub fn filter(&self, fps: u32, width: u32, height: u32) -> String {
        let frames = (self.duration * f64::from(fps)).ceil() as u64;
        let step = (self.zoom_to - self.zoom_from) / frames.max(1) as f64;
        format!(
            "zoompan=z='min(max(zoom,{z0})+{step:.6},{z1})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d={frames}:s={w}x{h}:fps={fps}",
            z0 = self.zoom_from,
            z1 = self.zoom_to,
            step = step,
            frames = frames,
            w = width,
            h = height,
            fps = fps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_quad_endpoints() {
        assert_eq!(ease_out_quad(0.0), 0.0);
        assert_eq!(ease_out_quad(1.0), 1.0);
        assert_eq!(ease_out_quad(-1.0), 0.0);
        assert_eq!(ease_out_quad(2.0), 1.0);
        assert!((ease_out_quad(0.5) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_deal_in_clamps_and_is_continuous() {
        let deal = DealIn {
            start: 1.0,
            duration: 0.5,
            from: (-400.0, 800.0),
            to: (100.0, 800.0),
        };

        assert_eq!(deal.position(0.0), (-400.0, 800.0));
        assert_eq!(deal.position(10.0), (100.0, 800.0));

        // Continuity at both boundaries.
        let eps = 1e-6;
        let at_start = deal.position(1.0 + eps);
        assert!((at_start.0 - (-400.0)).abs() < 0.01);
        let at_end = deal.position(1.5 - eps);
        assert!((at_end.0 - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_deal_in_expr_shape() {
        let deal = DealIn {
            start: 0.5,
            duration: 0.4,
            from: (-200.0, 0.0),
            to: (40.0, 0.0),
        };
        let x = deal.x_expr();
        assert!(x.contains("lt(t,0.5000)"));
        assert!(x.contains("pow"));
    }

    #[test]
    fn test_typewriter_reveal() {
        let tw = Typewriter {
            start: 1.0,
            duration: 2.0,
            text: "最佳新秀".to_string(),
        };
        assert_eq!(tw.visible(0.0), "");
        assert_eq!(tw.visible(2.0), "最佳");
        assert_eq!(tw.visible(5.0), "最佳新秀");
        assert!((tw.reveal_time(3) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_typewriter_holds_after_completion() {
        let tw = Typewriter {
            start: 0.0,
            duration: 1.0,
            text: "abc".to_string(),
        };
        assert_eq!(tw.revealed(1.0), 3);
        assert_eq!(tw.revealed(100.0), 3);
    }

    #[test]
    fn test_wipe_reveal_widths() {
        let wipe = WipeReveal {
            start: 0.0,
            duration: 2.0,
            width: 600,
        };
        assert_eq!(wipe.revealed_width(-1.0), 0);
        assert_eq!(wipe.revealed_width(1.0), 300);
        assert_eq!(wipe.revealed_width(2.0), 600);
        assert_eq!(wipe.revealed_width(50.0), 600);
        assert!(wipe.width_expr().contains("clip"));
    }

    fn bar_fixture() -> BarFill {
        BarFill {
            row_duration: 1.0,
            row_interval: 0.4,
            full_width: 500.0,
            light: Rgb(0xFF, 0xD7, 0x00),
            dark: Rgb(0xB8, 0x86, 0x0B),
            highlight: Rgb(0xFF, 0xFF, 0xFF),
            neutral: Rgb(0x99, 0x99, 0x99),
        }
    }

    #[test]
    fn test_bar_fill_equal_values_both_full() {
        let bar = bar_fixture();
        let (l, r) = bar.widths(25.0, 25.0, 1.0);
        assert!((l - 500.0).abs() < 1e-9);
        assert!((r - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_bar_fill_ratio_holds_at_every_progress() {
        let bar = bar_fixture();
        for progress in [0.25, 0.5, 0.75, 1.0] {
            let (l, r) = bar.widths(30.0, 20.0, progress);
            assert!((l - 500.0 * progress).abs() < 1e-9);
            assert!((r / l - 20.0 / 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bar_fill_rows_stagger() {
        let bar = bar_fixture();
        assert_eq!(bar.progress(0, 0.0, 0.0), 0.0);
        assert!((bar.progress(0, 0.0, 0.5) - 0.5).abs() < 1e-9);
        // Row 2 starts 0.8s later.
        assert_eq!(bar.progress(2, 0.0, 0.8), 0.0);
        assert!((bar.progress(2, 0.0, 1.8) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bar_label_color_flips_exactly_at_completion() {
        let bar = bar_fixture();
        assert_eq!(bar.label_color(0.999), bar.highlight);
        assert_eq!(bar.label_color(1.0), bar.neutral);
    }

    #[test]
    fn test_color_lerp_endpoints() {
        let a = Rgb(0, 0, 0);
        let b = Rgb(255, 255, 255);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb(128, 128, 128));
        assert_eq!(b.to_hex(), "0xFFFFFF");
    }

    #[test]
    fn test_data_panel_band_order_and_emphasis() {
        let player = PlayerPanel {
            name: "Luka".to_string(),
            portrait: None,
            draft: Some("2018 R1 P3".to_string()),
            key_metric: Some("27.1 PPG".to_string()),
            stats: vec!["8.0 RPG".to_string(), "8.6 APG".to_string()],
        };
        let panel = DataPanel {
            top: 1200,
            band_height: 90,
        };
        let bands = panel.bands(&player);
        assert_eq!(bands.len(), 5);
        assert_eq!(bands[0].kind, BandKind::Name);
        assert_eq!(bands[2].kind, BandKind::KeyMetric);
        assert!(bands[2].emphasis);
        assert_eq!(bands[1].y, 1290);
        assert_eq!(bands[4].y, 1560);
    }

    #[test]
    fn test_pan_zoom_holds_at_end() {
        let pz = PanZoom {
            duration: 5.0,
            zoom_from: 1.0,
            zoom_to: 1.2,
        };
        assert!((pz.zoom_at(0.0) - 1.0).abs() < 1e-9);
        assert!((pz.zoom_at(2.5) - 1.1).abs() < 1e-9);
        assert!((pz.zoom_at(99.0) - 1.2).abs() < 1e-9);
        assert!(pz.filter(30, 1080, 1920).contains("zoompan"));
    }
}
