//! Two-player comparison template (landscape).

use async_trait::async_trait;
use reel_models::{CompareCard, TemplateKind};
use tracing::info;

use crate::anim::{BarFill, DataPanel, DealIn, Rgb, Typewriter, WipeReveal};
use crate::error::{EngineError, EngineResult};
use crate::graph::{ImagePosition, LayerContent, RenderGraph};
use crate::subtitle::SubtitleLayout;
use crate::templates::{
    finish_render, narrate_block, scene_progress, EngineContext, RenderOutput, RenderRun,
    VideoTemplate, OPENING_CHECKPOINT,
};
use crate::timeline::AudioTimeline;

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;
const FPS: u32 = 30;

const TITLE_FONT_SIZE: u32 = 72;
const TITLE_Y: f32 = 80.0;
const TITLE_REVEAL: f64 = 1.2;

const SUBTITLE_FONT_SIZE: u32 = 48;
const SUBTITLE_BASELINE_Y: f32 = 960.0;
const SUBTITLE_LINE_SPACING: f32 = 12.0;

const PORTRAIT_FIT_WIDTH: u32 = 340;
const PORTRAIT_Y: f64 = 200.0;
const PORTRAIT_LEFT_X: f64 = 160.0;
const PORTRAIT_RIGHT_X: f64 = 1420.0;
const DEAL_DURATION: f64 = 0.5;

const PANEL_TOP: u32 = 620;
const PANEL_BAND_HEIGHT: u32 = 64;
const PANEL_FONT_SIZE: u32 = 40;
const PANEL_LEFT_CENTER: &str = "330-text_w/2";
const PANEL_RIGHT_CENTER: &str = "1590-text_w/2";

const BAR_CENTER_X: f64 = 960.0;
const BAR_GAP: f64 = 40.0;
const BAR_TOP_Y: f64 = 260.0;
const BAR_ROW_STEP: f64 = 96.0;
const BAR_HEIGHT: u32 = 36;
const BAR_FULL_WIDTH: f64 = 380.0;
const BAR_ROW_DURATION: f64 = 0.8;
const BAR_ROW_INTERVAL: f64 = 0.4;

const BAR_LIGHT: Rgb = Rgb(0xFF, 0xD7, 0x66);
const BAR_DARK: Rgb = Rgb(0xC8, 0x96, 0x0C);
const LABEL_HIGHLIGHT: &str = "white";
const LABEL_NEUTRAL: &str = "0x999999";

/// Landscape data card: portraits fly in, stat bars fill with a stagger.
pub struct PlayerCompareTemplate;

#[async_trait]
impl VideoTemplate for PlayerCompareTemplate {
    fn kind(&self) -> TemplateKind {
        TemplateKind::PlayerCompare
    }

    async fn process(&self, ctx: &EngineContext, run: &RenderRun) -> EngineResult<RenderOutput> {
        let params = &run.params;
        let background = ctx.assets.get(&params.background).await?;
        let mut graph = RenderGraph::new(WIDTH, HEIGHT, FPS, background.path);
        let mut timeline = AudioTimeline::new();
        let layout = SubtitleLayout::new(
            ctx.metrics.as_ref(),
            SUBTITLE_FONT_SIZE as f32,
            SUBTITLE_LINE_SPACING,
        );

        graph.push_sticky_layer(
            0.0,
            LayerContent::Typewriter {
                anim: Typewriter {
                    start: 0.0,
                    duration: TITLE_REVEAL,
                    text: params.title.clone(),
                },
                x_expr: "(w-text_w)/2".to_string(),
                y: TITLE_Y,
                font_size: TITLE_FONT_SIZE,
                color: "white".to_string(),
            },
        );

        narrate_block(
            ctx,
            run,
            &mut timeline,
            &mut graph,
            &layout,
            &params.opening.narration,
            SUBTITLE_BASELINE_Y,
            SUBTITLE_FONT_SIZE,
        )
        .await?;
        ctx.progress.set(&run.job_id, OPENING_CHECKPOINT).await;
        info!(job_id = %run.job_id, opening_end = timeline.duration(), "opening block placed");

        let total_scenes = params.scenes.len();
        for (scene_index, scene) in params.scenes.iter().enumerate() {
            let card = scene.compare.as_ref().ok_or_else(|| {
                EngineError::invalid_params(format!(
                    "scene {} has no comparison card",
                    scene_index + 1
                ))
            })?;
            let scene_start = timeline.duration();

            narrate_block(
                ctx,
                run,
                &mut timeline,
                &mut graph,
                &layout,
                &scene.narration,
                SUBTITLE_BASELINE_Y,
                SUBTITLE_FONT_SIZE,
            )
            .await?;
            let scene_end = timeline.duration();

            self.push_card_layers(ctx, &mut graph, card, scene_start, scene_end)
                .await?;

            ctx.progress
                .set(&run.job_id, scene_progress(scene_index + 1, total_scenes))
                .await;
        }

        finish_render(ctx, run, graph, timeline).await
    }
}

impl PlayerCompareTemplate {
    /// Build one comparison card: portraits, data panels and stat bars.
    async fn push_card_layers(
        &self,
        ctx: &EngineContext,
        graph: &mut RenderGraph,
        card: &CompareCard,
        start: f64,
        end: f64,
    ) -> EngineResult<()> {
        let window = end - start;

        // Portraits fly in from their own screen edge.
        let sides = [
            (&card.left, PORTRAIT_LEFT_X, -(PORTRAIT_FIT_WIDTH as f64)),
            (&card.right, PORTRAIT_RIGHT_X, f64::from(WIDTH)),
        ];
        for (player, x, off_x) in sides {
            if let Some(portrait) = &player.portrait {
                let image = ctx.assets.get(portrait).await?;
                graph.push_layer(
                    start,
                    window,
                    LayerContent::Image {
                        path: image.path,
                        fit_width: PORTRAIT_FIT_WIDTH,
                        pos: ImagePosition::DealIn(DealIn {
                            start,
                            duration: DEAL_DURATION,
                            from: (off_x, PORTRAIT_Y),
                            to: (x, PORTRAIT_Y),
                        }),
                    },
                );
            }
        }

        // Bottom data panels, one band per line, key metric emphasised.
        let panel = DataPanel {
            top: PANEL_TOP,
            band_height: PANEL_BAND_HEIGHT,
        };
        for (player, x_expr) in [
            (&card.left, PANEL_LEFT_CENTER),
            (&card.right, PANEL_RIGHT_CENTER),
        ] {
            for band in panel.bands(player) {
                graph.push_layer(
                    start,
                    window,
                    LayerContent::Text {
                        text: band.text,
                        x_expr: x_expr.to_string(),
                        y: band.y as f32,
                        font_size: if band.emphasis {
                            PANEL_FONT_SIZE + 10
                        } else {
                            PANEL_FONT_SIZE
                        },
                        color: if band.emphasis { "gold" } else { "white" }.to_string(),
                    },
                );
            }
        }

        // Stat rows: staggered bar fills with flipping label colors.
        let bars = BarFill {
            row_duration: BAR_ROW_DURATION,
            row_interval: BAR_ROW_INTERVAL,
            full_width: BAR_FULL_WIDTH,
            light: BAR_LIGHT,
            dark: BAR_DARK,
            highlight: Rgb(0xFF, 0xFF, 0xFF),
            neutral: Rgb(0x99, 0x99, 0x99),
        };
        for (row_index, row) in card.rows.iter().enumerate() {
            let y = BAR_TOP_Y + row_index as f64 * BAR_ROW_STEP;
            let row_start = start + row_index as f64 * BAR_ROW_INTERVAL;
            let row_end = row_start + BAR_ROW_DURATION;
            let (left_w, right_w) = bars.widths(row.left, row.right, 1.0);
            let fill = bars.fill_color(1.0);

            for (width, x) in [
                (left_w, BAR_CENTER_X - BAR_GAP / 2.0 - left_w),
                (right_w, BAR_CENTER_X + BAR_GAP / 2.0),
            ] {
                if width < 1.0 {
                    continue;
                }
                graph.push_layer(
                    start,
                    window,
                    LayerContent::Wipe {
                        color: fill,
                        width: width.round() as u32,
                        height: BAR_HEIGHT,
                        x,
                        y,
                        reveal: WipeReveal {
                            start: row_start,
                            duration: BAR_ROW_DURATION,
                            width: width.round() as u32,
                        },
                    },
                );
            }

            // Label highlighted while the row animates, neutral once settled.
            let label_y = y as f32 - 6.0;
            for (color, from, to) in [
                (LABEL_HIGHLIGHT, row_start, row_end),
                (LABEL_NEUTRAL, row_end, end),
            ] {
                if to <= from {
                    continue;
                }
                graph.push_layer(
                    from,
                    to - from,
                    LayerContent::Text {
                        text: row.label.clone(),
                        x_expr: "(w-text_w)/2".to_string(),
                        y: label_y,
                        font_size: PANEL_FONT_SIZE,
                        color: color.to_string(),
                    },
                );
            }

            for (value, x_expr) in [
                (row.left, format!("{:.0}-text_w", BAR_CENTER_X - BAR_GAP / 2.0 - BAR_FULL_WIDTH - 20.0)),
                (row.right, format!("{:.0}", BAR_CENTER_X + BAR_GAP / 2.0 + BAR_FULL_WIDTH + 20.0)),
            ] {
                graph.push_layer(
                    row_end,
                    (end - row_end).max(0.0),
                    LayerContent::Text {
                        text: trim_number(value),
                        x_expr,
                        y: label_y,
                        font_size: PANEL_FONT_SIZE,
                        color: "white".to_string(),
                    },
                );
            }
        }

        Ok(())
    }
}

/// Render a stat value without a trailing `.0`.
fn trim_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.1}", value)
    }
}
