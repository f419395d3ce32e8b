use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rallycut::{
    Detection, DetectionOptions, FfmpegCommandExporter, FfmpegLogLevel, NON_RALLY_PREFIX,
    ProgressCallback, ProgressInfo, RALLY_PREFIX, RallySegment, SegmentExporter,
    SegmenterOptions, StreamCopyExporter, VideoSource,
};

const CLI_AFTER_HELP: &str = "Examples:\n  rallycut match.mp4\n  rallycut match.mp4 --export --out-dir clips --progress\n  rallycut match.mp4 --motion-thresh 18 --min-motion-frames 10 --json\n  rallycut trim match.mp4 --start 1:05 --end 1:20\n  rallycut trim-non-rally match.mp4 --out-dir breaks\n  rallycut completions zsh > _rallycut";

#[derive(Debug, Parser)]
#[command(
    name = "rallycut",
    version,
    about = "Detect rallies in a badminton match video and export them as clips",
    after_help = CLI_AFTER_HELP,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video path.
    #[arg(required = true)]
    video: Option<PathBuf>,

    #[command(flatten)]
    detect: DetectArgs,

    #[command(flatten)]
    output: ExportArgs,

    /// Export each detected rally as a clip.
    #[arg(long)]
    export: bool,

    /// File name prefix for exported rally clips.
    #[arg(long, default_value = RALLY_PREFIX)]
    prefix: String,

    /// Print the detection result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while analysing the video.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing clips.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true, default_value = "error")]
    log_level: String,
}

#[derive(Debug, Args, Clone)]
struct DetectArgs {
    /// Frame difference above which a frame counts as motion.
    #[arg(long = "motion-thresh", alias = "motion_thresh", default_value_t = 25.0)]
    motion_thresh: f64,

    /// Consecutive motion frames needed to mark a rally start.
    #[arg(long = "min-motion-frames", alias = "min_motion_frames", default_value_t = 15)]
    min_motion_frames: u64,

    /// Minimum rally duration in seconds.
    #[arg(long = "min-rally-length", alias = "min_rally_length", default_value_t = 2.0)]
    min_rally_length: f64,

    /// Downscale frames to this width before scoring (faster, approximate).
    #[arg(long)]
    analysis_width: Option<u32>,
}

#[derive(Debug, Args, Clone)]
struct ExportArgs {
    /// Directory that exported clips are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Copy packets in-process instead of running the ffmpeg program.
    #[arg(long)]
    in_process: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export a single interval as manual_trim_000.mp4.
    #[command(
        about = "Export one chosen interval",
        after_help = "Examples:\n  rallycut trim match.mp4 --start 12.5 --end 20\n  rallycut trim match.mp4 --start 00:01:05 --end 00:01:20"
    )]
    Trim {
        /// Input video path.
        video: PathBuf,
        /// Start time (seconds, MM:SS, or HH:MM:SS).
        #[arg(long)]
        start: String,
        /// End time (seconds, MM:SS, or HH:MM:SS).
        #[arg(long)]
        end: String,
        #[command(flatten)]
        output: ExportArgs,
    },

    /// Detect rallies and export the sections between them.
    #[command(about = "Export the non-rally sections")]
    TrimNonRally {
        /// Input video path.
        video: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
        #[command(flatten)]
        output: ExportArgs,
        /// File name prefix for exported clips.
        #[arg(long, default_value = NON_RALLY_PREFIX)]
        prefix: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_timecode(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Ok(seconds);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0_u64, minutes.parse::<u64>()?, seconds.parse::<f64>()?),
        [hours, minutes, seconds] => (
            hours.parse::<u64>()?,
            minutes.parse::<u64>()?,
            seconds.parse::<f64>()?,
        ),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let level: FfmpegLogLevel = global.log_level.parse()?;
    rallycut::set_ffmpeg_log_level(level);
    Ok(())
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} frames {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

fn detection_options(
    detect: &DetectArgs,
    global: &GlobalOptions,
) -> Result<(DetectionOptions, Option<Arc<BarProgress>>), Box<dyn std::error::Error>> {
    let segmenter = SegmenterOptions::new()
        .motion_threshold(detect.motion_thresh)
        .min_motion_frames(detect.min_motion_frames)
        .min_rally_length(detect.min_rally_length);

    let mut options = DetectionOptions::new().with_segmenter(segmenter);
    if let Some(width) = detect.analysis_width {
        options = options.with_analysis_width(width);
    }

    let progress = if global.progress {
        let progress = Arc::new(BarProgress::new()?);
        options = options.with_progress(progress.clone()).with_batch_size(25);
        Some(progress)
    } else {
        None
    };

    Ok((options, progress))
}

fn run_detection(
    video: &Path,
    detect: &DetectArgs,
    global: &GlobalOptions,
) -> Result<Detection, Box<dyn std::error::Error>> {
    let (options, progress) = detection_options(detect, global)?;
    let detection = VideoSource::open(video)?.detect_rallies(&options)?;
    if let Some(progress) = progress {
        progress.bar.finish_and_clear();
    }
    Ok(detection)
}

fn build_exporter(output: &ExportArgs, global: &GlobalOptions) -> Box<dyn SegmentExporter> {
    if output.in_process {
        Box::new(
            StreamCopyExporter::new()
                .output_directory(&output.out_dir)
                .overwrite(global.overwrite),
        )
    } else {
        Box::new(
            FfmpegCommandExporter::new()
                .output_directory(&output.out_dir)
                .overwrite(global.overwrite),
        )
    }
}

fn report_saved(written: &[PathBuf]) {
    for path in written {
        eprintln!("{} {}", "saved".green().bold(), path.display());
    }
}

fn print_segments(label: &str, segments: &[RallySegment]) {
    for segment in segments {
        println!("{label}: {:.2} - {:.2} seconds", segment.start(), segment.end());
    }
}

fn detection_json(detection: &Detection) -> serde_json::Value {
    serde_json::json!({
        "video": detection.path.display().to_string(),
        "fps": detection.metadata.frames_per_second,
        "fps_reported": detection.metadata.reported_frames_per_second.is_some(),
        "duration_seconds": detection.metadata.duration.as_secs_f64(),
        "transitions": detection.transitions,
        "rallies": detection
            .rallies
            .iter()
            .map(|rally| serde_json::json!({
                "start": rally.start(),
                "end": rally.end(),
                "duration": rally.duration(),
            }))
            .collect::<Vec<_>>(),
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Some(Commands::Trim {
            video,
            start,
            end,
            output,
        }) => {
            let exporter = build_exporter(&output, &cli.global);
            let written = rallycut::export_manual_trim(
                exporter.as_ref(),
                &video,
                parse_timecode(&start)?,
                parse_timecode(&end)?,
            )?;
            report_saved(&[written]);
        }
        Some(Commands::TrimNonRally {
            video,
            detect,
            output,
            prefix,
        }) => {
            let detection = run_detection(&video, &detect, &cli.global)?;
            let breaks = detection.non_rally_segments();
            if breaks.is_empty() {
                eprintln!("{}", "No sections to trim".yellow());
                return Ok(());
            }
            print_segments("Non-rally", &breaks);
            let written = build_exporter(&output, &cli.global).export(&video, &breaks, &prefix)?;
            report_saved(&written);
        }
        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "rallycut", &mut std::io::stdout());
        }
        None => {
            let video = cli.video.ok_or("missing <VIDEO> argument")?;
            let detection = run_detection(&video, &cli.detect, &cli.global)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&detection_json(&detection))?);
            } else {
                print_segments("Rally", &detection.rallies);
                if detection.rallies.is_empty() {
                    eprintln!("{}", "No rallies detected".yellow());
                }
            }

            if cli.export {
                let written = build_exporter(&cli.output, &cli.global).export(
                    &video,
                    &detection.rallies,
                    &cli.prefix,
                )?;
                report_saved(&written);
            }
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, parse_timecode};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_timecode_formats() {
        assert_eq!(parse_timecode("75").unwrap(), 75.0);
        assert_eq!(parse_timecode("01:15").unwrap(), 75.0);
        assert_eq!(parse_timecode("00:01:15.5").unwrap(), 75.5);
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
    }

    #[test]
    fn detection_defaults() {
        let cli = Cli::try_parse_from(["rallycut", "match.mp4"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.detect.motion_thresh, 25.0);
        assert_eq!(cli.detect.min_motion_frames, 15);
        assert_eq!(cli.detect.min_rally_length, 2.0);
        assert_eq!(cli.prefix, "rally");
        assert!(!cli.export);
    }

    #[test]
    fn underscore_aliases_are_accepted() {
        let cli = Cli::try_parse_from([
            "rallycut",
            "match.mp4",
            "--export",
            "--motion_thresh",
            "18.5",
            "--min_motion_frames",
            "10",
            "--min_rally_length",
            "3",
        ])
        .unwrap();
        assert!(cli.export);
        assert_eq!(cli.detect.motion_thresh, 18.5);
        assert_eq!(cli.detect.min_motion_frames, 10);
        assert_eq!(cli.detect.min_rally_length, 3.0);
    }

    #[test]
    fn video_is_required_without_subcommand() {
        assert!(Cli::try_parse_from(["rallycut"]).is_err());
    }

    #[test]
    fn trim_subcommand() {
        let cli = Cli::try_parse_from([
            "rallycut", "trim", "match.mp4", "--start", "1.0", "--end", "4.0",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Trim { start, end, .. }) => {
                assert_eq!(start, "1.0");
                assert_eq!(end, "4.0");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn trim_non_rally_uses_trimmed_prefix() {
        let cli = Cli::try_parse_from(["rallycut", "trim-non-rally", "match.mp4"]).unwrap();
        match cli.command {
            Some(Commands::TrimNonRally { prefix, .. }) => assert_eq!(prefix, "trimmed"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
