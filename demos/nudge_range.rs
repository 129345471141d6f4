//! Shift a range of fixations in a recording's data directory.
//!
//! Usage: nudge_range <offline_data dir> <first id>-<last id> <dx> <dy>

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use fixcorr::{
    CorrectorOptions, FixationCorrector, FixationRange, RecordStore, SliderRange, WriteOptions,
    FIXATIONS, FIXATION_TOPIC,
};

fn main() {
    let (dir, range, dx, dy) = get_args_or_exit();

    let start_load = Instant::now();
    let store = match RecordStore::load(&dir, FIXATIONS) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("failed to load fixations: {}", e);
            std::process::exit(1);
        }
    };
    let duration_load = start_load.elapsed();

    // accept any offset, not just what the sliders allow
    let slider = SliderRange { min: -1.0, max: 1.0, step: 0.0 };
    let mut corrector = FixationCorrector::new(CorrectorOptions::default().slider(slider));
    corrector.set_pending_x(dx);
    corrector.set_pending_y(dy);
    let count = store.entries().iter().filter(|e| e.topic == FIXATION_TOPIC).count();
    corrector.apply_to_range(range, count);

    let start_write = Instant::now();
    if let Err(e) = corrector.commit_to_storage(&dir, &WriteOptions::default()) {
        eprintln!("failed to write fixations: {}", e);
        std::process::exit(1);
    }
    let duration_write = start_write.elapsed();

    println!(
        "Moved {} fixations by ({}, {}); loaded in {:?}, wrote in {:?}.",
        corrector.ledger().len(),
        dx,
        dy,
        duration_load,
        duration_write
    );
}

fn get_args_or_exit() -> (PathBuf, FixationRange, f64, f64) {
    let mut args = env::args().skip(1);

    let dir = match args.next().map(PathBuf::from) {
        Some(ref p) if p.is_dir() => p.to_owned(),
        _ => {
            eprintln!("Please supply a recording's data directory");
            std::process::exit(1);
        }
    };
    let range = match args.next().map(|s| s.parse::<FixationRange>()) {
        Some(Ok(range)) => range,
        _ => {
            eprintln!("Please supply a range of fixation ids, like '10-25'");
            std::process::exit(1);
        }
    };
    let mut offset = || match args.next().map(|s| s.parse::<f64>()) {
        Some(Ok(value)) => value,
        _ => {
            eprintln!("Please supply a horizontal and vertical offset");
            std::process::exit(1);
        }
    };
    let dx = offset();
    let dy = offset();

    (dir, range, dx, dy)
}
