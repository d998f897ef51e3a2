//! Render graph lowering and encoding.
//!
//! The FFmpeg compositor lowers a [`RenderGraph`] into a single FFmpeg
//! invocation: one filter graph covering all overlays, text, wipes and the
//! audio mix. Command construction is pure so the lowering can be tested
//! without spawning FFmpeg.

use std::path::Path;

use async_trait::async_trait;
use reel_media::{extract_cover, filters, FfmpegCommand, FfmpegRunner};
use tracing::{debug, info};

use crate::anim::{Rgb, WipeReveal};
use crate::error::{EngineError, EngineResult};
use crate::graph::{ImagePosition, LayerContent, RenderGraph};

const VIDEO_CRF: u8 = 20;
const VIDEO_PRESET: &str = "medium";
const AUDIO_BITRATE: &str = "192k";

/// Encodes a render graph to a video file.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Render `graph` to `output`; returns the output size in bytes.
    async fn render(&self, graph: &RenderGraph, output: &Path) -> EngineResult<u64>;

    /// Extract a still cover image from a rendered video.
    async fn cover(&self, video: &Path, output: &Path) -> EngineResult<()>;
}

/// FFmpeg-backed compositor.
#[derive(Debug, Clone)]
pub struct FfmpegCompositor {
    timeout_secs: u64,
}

impl Default for FfmpegCompositor {
    fn default() -> Self {
        Self { timeout_secs: 1800 }
    }
}

impl FfmpegCompositor {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Lower a render graph into one FFmpeg command. Pure.
    pub fn build_command(graph: &RenderGraph, output: &Path) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(output);
        let mut chains: Vec<String> = Vec::new();

        let bg = cmd.input_with_args(
            &graph.background,
            ["-loop", "1", "-t", &format!("{:.3}", graph.duration)],
        );
        chains.push(format!(
            "[{bg}:v]{}[base]",
            filters::cover_canvas(graph.width, graph.height)
        ));

        let mut current = "base".to_string();
        for (k, layer) in graph.layers.iter().enumerate() {
            if layer.duration <= 0.0 {
                continue;
            }
            let next = format!("v{}", k);
            match &layer.content {
                LayerContent::Image { path, fit_width, pos } => {
                    let idx = cmd.input_with_args(
                        path,
                        ["-loop", "1", "-t", &format!("{:.3}", graph.duration)],
                    );
                    let scaled = format!("img{}", k);
                    chains.push(format!(
                        "[{idx}:v]{}[{scaled}]",
                        filters::fit_box(*fit_width, graph.height)
                    ));
                    let (x, y) = match pos {
                        ImagePosition::Static { x, y } => {
                            (format!("{:.1}", x), format!("{:.1}", y))
                        }
                        ImagePosition::DealIn(deal) => {
                            (format!("'{}'", deal.x_expr()), format!("'{}'", deal.y_expr()))
                        }
                    };
                    chains.push(format!(
                        "[{current}][{scaled}]overlay=x={x}:y={y}:enable='between(t,{:.4},{:.4})'[{next}]",
                        layer.start,
                        layer.end()
                    ));
                }
                LayerContent::PanZoom { path, zoom } => {
                    let idx = cmd.input_with_args(
                        path,
                        ["-loop", "1", "-t", &format!("{:.3}", layer.duration)],
                    );
                    let zoomed = format!("pz{}", k);
                    chains.push(format!(
                        "[{idx}:v]{},{}[{zoomed}]",
                        filters::cover_canvas(graph.width, graph.height),
                        zoom.filter(graph.fps, graph.width, graph.height)
                    ));
                    chains.push(format!(
                        "[{current}][{zoomed}]overlay=x=0:y=0:enable='between(t,{:.4},{:.4})'[{next}]",
                        layer.start,
                        layer.end()
                    ));
                }
                LayerContent::Text {
                    text,
                    x_expr,
                    y,
                    font_size,
                    color,
                } => {
                    chains.push(format!(
                        "[{current}]{}[{next}]",
                        filters::drawtext(
                            text,
                            x_expr,
                            &format!("{:.1}", y),
                            *font_size,
                            color,
                            layer.start,
                            layer.end()
                        )
                    ));
                }
                LayerContent::Typewriter {
                    anim,
                    x_expr,
                    y,
                    font_size,
                    color,
                } => {
                    // One drawtext per growing prefix, each enabled for its
                    // reveal slice.
                    let mut draws = Vec::new();
                    let chars: Vec<char> = anim.text.chars().collect();
                    for i in 0..chars.len() {
                        let prefix: String = chars[..=i].iter().collect();
                        let from = anim.reveal_time(i);
                        let to = if i + 1 < chars.len() {
                            anim.reveal_time(i + 1)
                        } else {
                            layer.end()
                        };
                        draws.push(filters::drawtext(
                            &prefix,
                            x_expr,
                            &format!("{:.1}", y),
                            *font_size,
                            color,
                            from,
                            to,
                        ));
                    }
                    chains.push(format!("[{current}]{}[{next}]", draws.join(",")));
                }
                LayerContent::Wipe {
                    color,
                    width,
                    height,
                    x,
                    y,
                    reveal,
                } => {
                    let band = format!("wipe{}", k);
                    chains.push(wipe_band_chain(
                        *color,
                        *width,
                        *height,
                        graph.duration,
                        reveal,
                        &band,
                    ));
                    chains.push(format!(
                        "[{current}][{band}]overlay=x={x:.1}:y={y:.1}:enable='between(t,{:.4},{:.4})'[{next}]",
                        layer.start,
                        layer.end()
                    ));
                }
            }
            current = next;
        }

        chains.push(format!("[{current}]format=yuv420p[vout]"));

        // Audio mix: placed narration streams plus the optional bgm bed.
        let mut audio_labels = Vec::new();
        for (n, seg) in graph.audio.narration.iter().enumerate() {
            let idx = cmd.input(&seg.audio);
            let label = format!("n{}", n);
            chains.push(filters::narration_chain(idx, seg.duration, seg.start, &label));
            audio_labels.push(label);
        }
        if let Some(bgm) = &graph.audio.bgm {
            let idx = cmd.input_with_args(
                &bgm.path,
                ["-stream_loop", &bgm.plan.extra_loops().to_string()],
            );
            chains.push(filters::bgm_chain(idx, bgm.plan.total, bgm.plan.gain, "bgm"));
            audio_labels.push("bgm".to_string());
        }
        if audio_labels.is_empty() {
            chains.push(filters::silence(graph.duration, "aout"));
        } else {
            chains.push(filters::amix(&audio_labels, graph.duration, "aout"));
        }

        cmd.filter_complex(chains.join(";"))
            .map("[vout]")
            .map("[aout]")
            .video_codec("libx264")
            .crf(VIDEO_CRF)
            .preset(VIDEO_PRESET)
            .fps(graph.fps)
            .audio_codec("aac")
            .output_arg("-b:a")
            .output_arg(AUDIO_BITRATE)
            .duration(graph.duration)
    }
}

/// Colored band revealed left to right via a per-pixel time-based alpha mask.
fn wipe_band_chain(
    color: Rgb,
    width: u32,
    height: u32,
    source_duration: f64,
    reveal: &WipeReveal,
    label: &str,
) -> String {
    format!(
        "color=c={hex}:s={w}x{h}:d={dur:.3},format=yuva444p,\
         geq=lum='lum(X,Y)':cb='cb(X,Y)':cr='cr(X,Y)':\
         a='if(lte(X,W*clip((T-{s:.4})/{d:.4},0,1)),255,0)'[{label}]",
        hex = color.to_hex(),
        w = width,
        h = height,
        dur = source_duration,
        s = reveal.start,
        d = reveal.duration,
        label = label
    )
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn render(&self, graph: &RenderGraph, output: &Path) -> EngineResult<u64> {
        if graph.duration <= 0.0 {
            return Err(EngineError::composition_failed(
                "render graph has no duration",
            ));
        }

        let cmd = Self::build_command(graph, output);
        info!(
            output = %output.display(),
            duration = graph.duration,
            layers = graph.layers.len(),
            "encoding render graph"
        );

        FfmpegRunner::new()
            .with_timeout(self.timeout_secs)
            .run_with_progress(&cmd, |p| {
                debug!(out_time_ms = p.out_time_ms, speed = p.speed, "encoding");
            })
            .await?;

        let size = tokio::fs::metadata(output).await?.len();
        Ok(size)
    }

    async fn cover(&self, video: &Path, output: &Path) -> EngineResult<()> {
        extract_cover(video, output).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{DealIn, PanZoom};
    use crate::graph::{BgmTrack, ImagePosition};
    use crate::timeline::{BgmPlan, NarrationSegment};
    use std::path::PathBuf;

    fn sample_graph() -> RenderGraph {
        let mut graph = RenderGraph::new(1080, 1920, 30, PathBuf::from("bg.jpg"));
        graph.push_layer(
            0.0,
            5.0,
            LayerContent::PanZoom {
                path: PathBuf::from("open.jpg"),
                zoom: PanZoom {
                    duration: 5.0,
                    zoom_from: 1.0,
                    zoom_to: 1.15,
                },
            },
        );
        graph.push_layer(
            5.0,
            6.0,
            LayerContent::Image {
                path: PathBuf::from("scene1.jpg"),
                fit_width: 900,
                pos: ImagePosition::DealIn(DealIn {
                    start: 5.0,
                    duration: 0.5,
                    from: (-900.0, 400.0),
                    to: (90.0, 400.0),
                }),
            },
        );
        graph.audio.narration.push(NarrationSegment {
            text: "开场".to_string(),
            audio: PathBuf::from("tts-0.mp3"),
            duration: 3.0,
            start: 0.5,
        });
        graph.audio.bgm = Some(BgmTrack {
            path: PathBuf::from("bed.mp3"),
            plan: BgmPlan::cover(4.0, 11.0, 0.12).unwrap(),
        });
        graph.seal(11.0);
        graph
    }

    #[test]
    fn test_lowering_orders_inputs_and_maps_streams() {
        let graph = sample_graph();
        let cmd = FfmpegCompositor::build_command(&graph, Path::new("out.mp4"));
        let args = cmd.build_args();

        // Background is the first input; bgm carries its loop count.
        let first_i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[first_i + 1], "bg.jpg");
        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        assert_eq!(args[loop_pos + 1], "2");

        assert!(args.contains(&"[vout]".to_string()));
        assert!(args.contains(&"[aout]".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_filter_graph_carries_animation_expressions() {
        let graph = sample_graph();
        let cmd = FfmpegCompositor::build_command(&graph, Path::new("out.mp4"));
        let args = cmd.build_args();
        let fc_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let fc = &args[fc_pos + 1];

        assert!(fc.contains("zoompan"));
        assert!(fc.contains("pow(1-(t-5.0000)/0.5000,2)"));
        assert!(fc.contains("amix=inputs=2"));
        assert!(fc.contains("adelay=500|500"));
        assert!(fc.contains("atrim=0:11.0000"));
    }

    #[test]
    fn test_silent_graph_gets_a_silence_source() {
        let mut graph = RenderGraph::new(1080, 1920, 30, PathBuf::from("bg.jpg"));
        graph.seal(5.0);
        let cmd = FfmpegCompositor::build_command(&graph, Path::new("out.mp4"));
        let args = cmd.build_args();
        let fc_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        assert!(args[fc_pos + 1].contains("anullsrc"));
    }

    #[test]
    fn test_wipe_lowering_builds_time_mask() {
        let mut graph = RenderGraph::new(1920, 1080, 30, PathBuf::from("bg.jpg"));
        graph.push_layer(
            1.0,
            4.0,
            LayerContent::Wipe {
                color: Rgb(0xFF, 0xD7, 0x00),
                width: 500,
                height: 40,
                x: 200.0,
                y: 600.0,
                reveal: WipeReveal {
                    start: 1.0,
                    duration: 0.8,
                    width: 500,
                },
            },
        );
        graph.seal(6.0);
        let cmd = FfmpegCompositor::build_command(&graph, Path::new("out.mp4"));
        let args = cmd.build_args();
        let fc_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let fc = &args[fc_pos + 1];
        assert!(fc.contains("color=c=0xFFD700:s=500x40"));
        assert!(fc.contains("clip((T-1.0000)/0.8000,0,1)"));
    }

    #[test]
    fn test_typewriter_lowering_emits_prefix_slices() {
        let mut graph = RenderGraph::new(1080, 1920, 30, PathBuf::from("bg.jpg"));
        graph.push_layer(
            0.0,
            4.0,
            LayerContent::Typewriter {
                anim: crate::anim::Typewriter {
                    start: 0.0,
                    duration: 1.0,
                    text: "冠军".to_string(),
                },
                x_expr: "(w-text_w)/2".to_string(),
                y: 900.0,
                font_size: 72,
                color: "white".to_string(),
            },
        );
        graph.seal(4.0);
        let cmd = FfmpegCompositor::build_command(&graph, Path::new("out.mp4"));
        let args = cmd.build_args();
        let fc_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let fc = &args[fc_pos + 1];
        assert_eq!(fc.matches("drawtext").count(), 2);
        assert!(fc.contains("text='冠'"));
        assert!(fc.contains("text='冠军'"));
    }
}
