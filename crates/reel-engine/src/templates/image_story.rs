//! Narrated image-sequence template (portrait).

use async_trait::async_trait;
use reel_models::TemplateKind;
use tracing::info;

use crate::anim::{DealIn, PanZoom, Typewriter};
use crate::error::EngineResult;
use crate::graph::{ImagePosition, LayerContent, RenderGraph};
use crate::subtitle::SubtitleLayout;
use crate::templates::{
    finish_render, narrate_block, scene_progress, EngineContext, RenderOutput, RenderRun,
    VideoTemplate, OPENING_CHECKPOINT,
};
use crate::timeline::AudioTimeline;

const WIDTH: u32 = 1080;
const HEIGHT: u32 = 1920;
const FPS: u32 = 30;

const TITLE_FONT_SIZE: u32 = 84;
const TITLE_Y: f32 = 180.0;
const TITLE_REVEAL: f64 = 1.2;

const SUBTITLE_FONT_SIZE: u32 = 56;
const SUBTITLE_BASELINE_Y: f32 = 1480.0;
const SUBTITLE_LINE_SPACING: f32 = 14.0;

const CAPTION_FONT_SIZE: u32 = 64;
const CAPTION_Y: f32 = 320.0;

const IMAGE_FIT_WIDTH: u32 = 900;
const IMAGE_LEFT_X: f64 = 90.0;
const IMAGE_TOP_Y: f64 = 420.0;
const IMAGE_ROW_STEP: f64 = 540.0;
const DEAL_DURATION: f64 = 0.5;
const DEAL_STAGGER: f64 = 0.35;

const OPENING_ZOOM: f64 = 1.15;

/// Vertical image story: pan/zoom opening, fly-in scene images, subtitles.
pub struct ImageStoryTemplate;

#[async_trait]
impl VideoTemplate for ImageStoryTemplate {
    fn kind(&self) -> TemplateKind {
        TemplateKind::ImageStory
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

        // Opening: title typewriter, optional pan/zoom image, narration.
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

        let opening_image = match &params.opening.image {
            Some(id) => Some(ctx.assets.get(id).await?),
            None => None,
        };

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
        let opening_end = timeline.duration();

        if let Some(image) = opening_image {
            graph.push_layer(
                0.0,
                opening_end,
                LayerContent::PanZoom {
                    path: image.path,
                    zoom: PanZoom {
                        duration: opening_end,
                        zoom_from: 1.0,
                        zoom_to: OPENING_ZOOM,
                    },
                },
            );
        }

        ctx.progress.set(&run.job_id, OPENING_CHECKPOINT).await;
        info!(job_id = %run.job_id, opening_end, "opening block placed");

        // Content scenes, in declared order.
        let total_scenes = params.scenes.len();
        for (scene_index, scene) in params.scenes.iter().enumerate() {
            let scene_start = timeline.duration();

            // Resolve scene assets before narrating so a missing image fails
            // the job without wasted synthesis calls.
            let mut images = Vec::with_capacity(scene.images.len());
            for id in &scene.images {
                images.push(ctx.assets.get(id).await?);
            }

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

            for (i, image) in images.into_iter().enumerate() {
                let y = IMAGE_TOP_Y + i as f64 * IMAGE_ROW_STEP;
                let deal_start = scene_start + i as f64 * DEAL_STAGGER;
                graph.push_layer(
                    scene_start,
                    scene_end - scene_start,
                    LayerContent::Image {
                        path: image.path,
                        fit_width: IMAGE_FIT_WIDTH,
                        pos: ImagePosition::DealIn(DealIn {
                            start: deal_start,
                            duration: DEAL_DURATION,
                            from: (-(IMAGE_FIT_WIDTH as f64), y),
                            to: (IMAGE_LEFT_X, y),
                        }),
                    },
                );
            }

            if let Some(caption) = &scene.caption {
                graph.push_layer(
                    scene_start,
                    scene_end - scene_start,
                    LayerContent::Text {
                        text: caption.clone(),
                        x_expr: "(w-text_w)/2".to_string(),
                        y: CAPTION_Y,
                        font_size: CAPTION_FONT_SIZE,
                        color: "white".to_string(),
                    },
                );
            }

            ctx.progress
                .set(&run.job_id, scene_progress(scene_index + 1, total_scenes))
                .await;
        }

        finish_render(ctx, run, graph, timeline).await
    }
}
