//! # chord-cli
//!
//! Command-line driver for `chord-core`. It decodes WAV files (or, with the
//! `live` feature, the default microphone), feeds fixed-size blocks to a
//! session and prints the recognised chords as notation lines.

#[cfg(feature = "live")]
mod audio;
mod render;
mod replay;
mod wav;

use anyhow::{Context, Result};
use chord_core::layout::{DEFAULT_LINE_MARGIN, DEFAULT_SYMBOL_SPACING, max_per_line};
use chord_core::{AnalysisConfig, AnalysisMode, Session};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use render::RunExport;

#[derive(Debug, Parser)]
#[command(name = "chord-cli", version, about = "Chord recognition and notation from audio")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recognise chords in a WAV file and print them as notation lines.
    Analyze {
        input: PathBuf,
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Write segments and notation lines to this JSON file.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print a single-note tuner readout for every block of a WAV file.
    Tune {
        input: PathBuf,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Recognise chords from the default input device.
    #[cfg(feature = "live")]
    Listen {
        /// How long to listen for.
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Spectral,
    Autocorrelation,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Spectral => AnalysisMode::Spectral,
            ModeArg::Autocorrelation => AnalysisMode::Autocorrelation,
        }
    }
}

#[derive(Debug, Args)]
struct AnalysisArgs {
    /// JSON file with analysis settings; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Beats per minute used for durations.
    #[arg(long)]
    tempo: Option<f64>,
    /// Width available to one notation line, in the renderer's units.
    #[arg(long, default_value_t = 800.0)]
    width: f32,
    /// Samples between consecutive blocks. Defaults to half a block.
    #[arg(long)]
    hop: Option<usize>,
}

impl AnalysisArgs {
    fn load_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(tempo) = self.tempo {
            config.tempo_bpm = tempo;
        }
        config.validate()?;
        Ok(config)
    }

    fn hop(&self, config: &AnalysisConfig) -> usize {
        let block_len = match config.mode {
            AnalysisMode::Spectral => config.fft_size,
            AnalysisMode::Autocorrelation => config.frame_size,
        };
        self.hop.unwrap_or(block_len / 2).max(1)
    }

    fn per_line(&self) -> usize {
        max_per_line(self.width, DEFAULT_SYMBOL_SPACING, DEFAULT_LINE_MARGIN)
    }
}

fn load_config_file(path: &Path) -> Result<AnalysisConfig> {
    let json_string = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let config = serde_json::from_str(&json_string).with_context(|| format!("invalid config in {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze { input, analysis, json } => analyze(&input, &analysis, json.as_deref()),
        Command::Tune { input, analysis } => tune(&input, &analysis),
        #[cfg(feature = "live")]
        Command::Listen { seconds, analysis } => listen(seconds, &analysis),
    }
}

fn analyze(input: &Path, args: &AnalysisArgs, json: Option<&Path>) -> Result<()> {
    let config = args.load_config()?;
    let hop = args.hop(&config);
    let tempo_bpm = config.tempo_bpm;
    let audio = wav::load_wav(input)?;

    let mut session = Session::new(config)?;
    replay::replay(&mut session, &audio, hop)?;

    let lines = session.notation_lines(args.per_line(), None);
    print!("{}", render::format_segments(session.history()));
    println!();
    print!("{}", render::format_lines(&lines));

    if let Some(path) = json {
        let export = RunExport {
            tempo_bpm,
            segments: session.history(),
            lines: &lines,
        };
        render::save_export(&export, path)?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn tune(input: &Path, args: &AnalysisArgs) -> Result<()> {
    let mut config = args.load_config()?;
    // Single-note readout is autocorrelation unless the user asked otherwise.
    if args.mode.is_none() {
        config.mode = AnalysisMode::Autocorrelation;
    }
    let hop = args.hop(&config);
    let audio = wav::load_wav(input)?;

    let mut session = Session::new(config)?;
    for report in replay::replay(&mut session, &audio, hop)? {
        println!("{}", render::format_tuner(&report));
    }
    Ok(())
}

#[cfg(feature = "live")]
fn listen(seconds: f64, args: &AnalysisArgs) -> Result<()> {
    let config = args.load_config()?;
    let mut session = Session::new(config)?;

    audio::listen(&mut session, seconds, |session, report| {
        if !report.history_changed() {
            return;
        }
        if let Some(segment) = session.history().last() {
            println!("{:8.3}s  {}", segment.start_time, segment.label);
        }
    })?;

    print!("{}", render::format_lines(&session.notation_lines(args.per_line(), None)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from(["chord-cli", "analyze", "in.wav", "--mode", "autocorrelation", "--tempo", "90"]);
        let Command::Analyze { analysis, .. } = cli.command else {
            panic!("expected analyze");
        };
        let config = analysis.load_config().unwrap();
        assert_eq!(config.mode, AnalysisMode::Autocorrelation);
        assert_eq!(config.tempo_bpm, 90.0);
        assert_eq!(analysis.hop(&config), config.frame_size / 2);
    }

    #[test]
    fn config_file_is_merged_with_defaults() {
        let path = std::env::temp_dir().join("chord-cli-config-test.json");
        fs::write(&path, r#"{ "tempo_bpm": 72.0, "max_fundamentals": 4 }"#).unwrap();
        let config = load_config_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.tempo_bpm, 72.0);
        assert_eq!(config.max_fundamentals, 4);
        assert_eq!(config.fft_size, AnalysisConfig::default().fft_size);
    }

    #[test]
    fn default_width_fits_several_entries() {
        let cli = Cli::parse_from(["chord-cli", "tune", "in.wav"]);
        let Command::Tune { analysis, .. } = cli.command else {
            panic!("expected tune");
        };
        assert_eq!(analysis.per_line(), 9);
    }
}
