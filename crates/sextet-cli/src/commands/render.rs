//! Offline rendering command.

use crate::params;
use crate::wav::write_float_wav;
use anyhow::{Context, bail};
use clap::Args;
use sextet_config::EngineConfig;
use sextet_synth::{ChorusMode, PolyMode, SynthEngine};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Engine config file (defaults to the user config, then built-ins)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// MIDI note numbers, comma separated
    #[arg(long, value_delimiter = ',', default_value = "60,64,67")]
    notes: Vec<u8>,

    /// Note-on velocity (0-1)
    #[arg(long, default_value = "0.8")]
    velocity: f32,

    /// Seconds each note is held
    #[arg(long, default_value = "1.0")]
    hold: f32,

    /// Seconds rendered after the last note-off
    #[arg(long, default_value = "1.0")]
    tail: f32,

    /// Stagger note starts by this many seconds instead of a chord
    #[arg(long, value_name = "SECS")]
    arpeggio: Option<f32>,

    /// Ensemble mode
    #[arg(long, value_parser = parse_chorus_arg)]
    chorus: Option<ChorusMode>,

    /// Voice assignment (overrides the config file)
    #[arg(long, value_parser = parse_poly_mode_arg)]
    poly_mode: Option<PolyMode>,

    /// Set a synthesis parameter (repeatable, see `sextet params`)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

fn parse_chorus_arg(value: &str) -> Result<ChorusMode, String> {
    params::parse_chorus(value).ok_or_else(|| format!("'{value}' (expected off|i|ii|both)"))
}

fn parse_poly_mode_arg(value: &str) -> Result<PolyMode, String> {
    params::parse_poly_mode(value)
        .ok_or_else(|| format!("'{value}' (expected poly1|poly2|unison)"))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NoteEvent {
    On(u8),
    Off(u8),
}

/// Note events sorted by frame. Note-offs sort before note-ons at the same
/// frame so a repeated note restarts cleanly.
fn schedule(
    notes: &[u8],
    sample_rate: f32,
    hold: f32,
    arpeggio: Option<f32>,
) -> Vec<(usize, NoteEvent)> {
    let hold_frames = (hold * sample_rate).round() as usize;
    let step_frames = arpeggio.map_or(0, |s| (s * sample_rate).round() as usize);

    let mut events: Vec<(usize, NoteEvent)> = notes
        .iter()
        .enumerate()
        .flat_map(|(i, &note)| {
            let on = i * step_frames;
            [(on, NoteEvent::On(note)), (on + hold_frames, NoteEvent::Off(note))]
        })
        .collect();
    events.sort_by_key(|&(frame, event)| (frame, matches!(event, NoteEvent::On(_))));
    events
}

/// Render the schedule, returning one buffer per channel.
fn render_schedule(
    engine: &mut SynthEngine,
    events: &[(usize, NoteEvent)],
    total_frames: usize,
    velocity: f32,
    channel_count: usize,
) -> Vec<Vec<f32>> {
    let mut buffers = vec![vec![0.0f32; total_frames]; channel_count];
    let mut position = 0;
    let mut pending = events.iter().peekable();

    while position < total_frames {
        while let Some(&&(frame, event)) = pending.peek() {
            if frame > position {
                break;
            }
            match event {
                NoteEvent::On(note) => engine.note_on(note, velocity),
                NoteEvent::Off(note) => engine.note_off(note, 0.0),
            }
            pending.next();
        }

        let next_event = pending.peek().map_or(total_frames, |&&(frame, _)| frame);
        let len = next_event.min(total_frames) - position;
        let mut channels: Vec<&mut [f32]> =
            buffers.iter_mut().map(Vec::as_mut_slice).collect();
        engine.render_next_block(&mut channels, position, len);
        position += len;
    }

    buffers
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.notes.is_empty() {
        bail!("no notes to render");
    }
    if let Some(&note) = args.notes.iter().find(|&&n| n > 127) {
        bail!("note {note} is outside 0-127");
    }
    if !(0.0..=1.0).contains(&args.velocity) {
        bail!("velocity {} is outside 0-1", args.velocity);
    }
    if !(args.hold >= 0.0 && args.tail >= 0.0 && args.arpeggio.unwrap_or(0.0) >= 0.0) {
        bail!("durations must be non-negative");
    }

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::load_or_default()?,
    };

    let mut synth_params = config.initial_params();
    if let Some(chorus) = args.chorus {
        synth_params.chorus = chorus;
    }
    if let Some(mode) = args.poly_mode {
        synth_params.poly_mode = mode;
    }
    for assignment in &args.set {
        params::apply(&mut synth_params, assignment)?;
    }

    let mut engine = config.build_engine()?;
    engine.set_params(synth_params);

    let sample_rate = config.sample_rate as f32;
    let events = schedule(&args.notes, sample_rate, args.hold, args.arpeggio);
    let last_event = events.last().map_or(0, |&(frame, _)| frame);
    let total_frames = last_event + (args.tail * sample_rate).round() as usize;

    println!("Rendering {} note(s) to {}...", args.notes.len(), args.output.display());
    tracing::info!(
        sample_rate = config.sample_rate,
        channels = config.channels,
        frames = total_frames,
        poly_mode = ?synth_params.poly_mode,
        chorus = ?synth_params.chorus,
        "render"
    );

    let buffers = render_schedule(
        &mut engine,
        &events,
        total_frames,
        args.velocity,
        usize::from(config.channels),
    );

    let peak = buffers
        .iter()
        .flatten()
        .fold(0.0f32, |m, s| m.max(s.abs()));
    let channels: Vec<&[f32]> = buffers.iter().map(Vec::as_slice).collect();
    write_float_wav(&args.output, &channels, config.sample_rate)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {:.2}s ({} frames, peak {:.3}) to {}",
        total_frames as f32 / sample_rate,
        total_frames,
        peak,
        args.output.display()
    );
    Ok(())
}
