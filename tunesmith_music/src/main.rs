// tunesmith melody generator: CLI entry point.
//
// Generates a melody with bass and drum accompaniment and writes it to MIDI.
// No oracle ships with the crate, so the CLI runs the service in demo mode;
// normalization params are still loaded so the output matches what a
// model-backed deployment would configure.
//
// Usage:
//   cargo run -p tunesmith_music -- [output.mid] [--tempo BPM] [--genre NAME]
//     [--bars N] [--seed N] [--temperature T] [--params PATH]
//
// Genres: pop, rock, jazz, classical (anything else plays as pop)

use std::path::Path;
use tunesmith_music::config::NormalizationParams;
use tunesmith_music::{MelodyRequest, MelodyService};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("melody.mid");
    let defaults = MelodyRequest::default();
    let request = MelodyRequest {
        tempo: parse_flag(&args, "--tempo").unwrap_or(defaults.tempo),
        genre: parse_flag(&args, "--genre").unwrap_or(defaults.genre),
        bars: parse_flag(&args, "--bars").unwrap_or(defaults.bars),
        temperature: parse_flag(&args, "--temperature").unwrap_or(defaults.temperature),
        seed: parse_flag(&args, "--seed"),
    }
    .clamped();
    let params_path: String = parse_flag(&args, "--params")
        .unwrap_or_else(|| "models/normalization_params.json".to_string());

    println!("=== tunesmith melody generator ===");
    println!("Output: {}", output_path);
    println!("Genre: {}", request.genre);
    println!("Tempo: {} BPM", request.tempo);
    println!("Bars: {}", request.bars);
    if let Some(s) = request.seed {
        println!("Seed: {}", s);
    }
    println!();

    println!("[1/3] Loading normalization params...");
    let params = NormalizationParams::load_or_default(Path::new(&params_path));
    println!(
        "  MAX_STEP={:.4} MAX_DURATION={:.4} VOCAB_SIZE={}",
        params.max_step, params.max_duration, params.vocab_size
    );

    println!("[2/3] Generating melody...");
    let mut service = MelodyService::new(None, params);
    let response = service.generate_melody(&request);
    let fallback = response.notes.iter().filter(|n| n.is_fallback()).count();
    println!(
        "  {} notes ({} from the demo generator)",
        response.notes.len(),
        fallback
    );

    println!("[3/3] Writing MIDI to {}...", output_path);
    if response.midi.is_empty() {
        eprintln!("  Error: score composition failed, nothing written");
        std::process::exit(1);
    }
    match std::fs::write(output_path, &response.midi) {
        Ok(()) => {
            let duration_seconds = response
                .notes
                .iter()
                .map(|n| n.span(response.tempo).end)
                .fold(0.0, f64::max);
            println!(
                "  Done! {} bytes, melody length {:.1}s",
                response.midi.len(),
                duration_seconds
            );
        }
        Err(e) => {
            eprintln!("  Error writing MIDI: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    println!("Play with: timidity {} (or any MIDI player)", output_path);
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
