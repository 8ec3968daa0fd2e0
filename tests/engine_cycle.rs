use screenmatch::capture::memory::{BlitBackend, DuplicationBackend, SharedDisplay};
use screenmatch::image::OwnedBgra;
use screenmatch::{
    CycleRunner, FrameSource, MatchEngine, SearchRegion, Settings, SharedState, Template,
};
use std::sync::Arc;
use std::time::Duration;

fn frame_with_block(
    width: usize,
    height: usize,
    bx: usize,
    by: usize,
    side: usize,
    bgra: [u8; 4],
) -> Vec<u8> {
    let mut frame = vec![0u8; width * height * 4];
    for chunk in frame.chunks_exact_mut(4) {
        chunk[3] = 255;
    }
    for y in 0..side {
        for x in 0..side {
            let base = ((by + y) * width + (bx + x)) * 4;
            frame[base..base + 4].copy_from_slice(&bgra);
        }
    }
    frame
}

fn fixture(
    frame: Vec<u8>,
    width: usize,
    height: usize,
    settings: Settings,
) -> (
    Arc<SharedState>,
    SharedDisplay,
    MatchEngine<DuplicationBackend, BlitBackend>,
) {
    let display = SharedDisplay::new(OwnedBgra::from_vec(frame, width, height).unwrap());
    let source = FrameSource::new(
        DuplicationBackend::new(display.clone()),
        BlitBackend::new(display.clone()),
    );
    let state = SharedState::new(settings);
    let engine = MatchEngine::new(Arc::clone(&state), source, (width, height));
    (state, display, engine)
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.tolerance = 5;
    settings.early_pixel_count = u32::MAX;
    settings.use_pyramid_search = false;
    settings.enable_learning = false;
    settings
}

#[test]
fn match_list_is_replaced_when_display_changes() {
    let bgra = [100, 100, 100, 255];
    let (state, display, mut engine) =
        fixture(frame_with_block(60, 60, 10, 10, 20, bgra), 60, 60, test_settings());
    state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 60, 60, "screen"));

    engine.run_cycle().unwrap();
    assert_eq!(state.matches().len(), 1);

    // Block disappears: the next cycle publishes an empty list, not a merge.
    display.present(
        OwnedBgra::from_vec(frame_with_block(60, 60, 10, 10, 20, [0, 0, 0, 255]), 60, 60).unwrap(),
    );
    engine.run_cycle().unwrap();
    assert!(state.matches().is_empty());
}

#[test]
fn reader_snapshot_survives_replacement() {
    let bgra = [100, 100, 100, 255];
    let (state, display, mut engine) =
        fixture(frame_with_block(60, 60, 10, 10, 20, bgra), 60, 60, test_settings());
    state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 60, 60, "screen"));

    engine.run_cycle().unwrap();
    let held = state.matches();
    assert_eq!(held.len(), 1);

    display.present(
        OwnedBgra::from_vec(frame_with_block(60, 60, 10, 10, 20, [0, 0, 0, 255]), 60, 60).unwrap(),
    );
    engine.run_cycle().unwrap();

    // The held snapshot still shows the old cycle's result.
    assert_eq!(held.len(), 1);
    assert!(state.matches().is_empty());
}

#[test]
fn no_active_work_publishes_empty_list() {
    let (state, _display, mut engine) =
        fixture(vec![0u8; 60 * 60 * 4], 60, 60, test_settings());
    // No templates, no regions.
    assert_eq!(engine.run_cycle().unwrap(), 0);
    assert!(state.matches().is_empty());
    assert_eq!(state.telemetry().cycles, 1);
}

#[test]
fn learning_records_hits_and_round_trips() {
    let bgra = [100, 100, 100, 255];
    let mut settings = test_settings();
    settings.enable_learning = true;

    let (state, _display, mut engine) =
        fixture(frame_with_block(60, 60, 10, 10, 20, bgra), 60, 60, settings);
    state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 60, 60, "screen"));

    for _ in 0..3 {
        engine.run_cycle().unwrap();
    }

    let snapshot = state.stats_snapshot();
    assert_eq!(snapshot.templates.len(), 1);
    assert_eq!(snapshot.templates[0].hit_count, 3);
    // Center of the 20x20 block at (10,10).
    assert_eq!(snapshot.templates[0].avg_x, 20);
    assert_eq!(snapshot.templates[0].avg_y, 20);

    let json = snapshot.to_json().unwrap();
    let restored: screenmatch::StatsSnapshot = serde_json::from_str(&json).unwrap();
    state.restore_stats(&restored);
    assert_eq!(state.stats_snapshot().templates[0].hit_count, 3);
}

#[test]
fn csv_export_lists_each_template() {
    let bgra = [100, 100, 100, 255];
    let mut settings = test_settings();
    settings.enable_learning = true;

    let (state, _display, mut engine) =
        fixture(frame_with_block(60, 60, 10, 10, 20, bgra), 60, 60, settings);
    state
        .add_template(Template::solid(20, bgra, "hit").unwrap())
        .unwrap();
    state
        .add_template(Template::solid(20, [200, 200, 200, 255], "miss").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 60, 60, "screen"));
    engine.run_cycle().unwrap();

    let csv = state.export_stats_csv();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Template,HitCount,AvgX,AvgY,Probability");
    assert!(lines[1].starts_with("hit,1,20,20"));
    assert!(lines[2].starts_with("miss,0,0,0"));
}

#[test]
fn pyramid_mode_scans_tiny_templates_exhaustively() {
    let bgra = [100, 100, 100, 255];
    let mut settings = test_settings();
    settings.use_pyramid_search = true;

    // A 1x1 template has no half-resolution form; the cycle must still
    // complete, scanning it at full resolution instead.
    let (state, _display, mut engine) =
        fixture(frame_with_block(60, 60, 10, 10, 20, bgra), 60, 60, settings);
    state
        .add_template(Template::solid(1, bgra, "dot").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 60, 60, "screen"));

    assert_eq!(engine.run_cycle().unwrap(), 1);
    let matches = state.matches();
    assert_eq!((matches[0].x, matches[0].y), (10, 10));
    assert_eq!(matches[0].score, 0.0);
}

#[test]
fn round_robin_rotates_through_matches() {
    let bgra = [100, 100, 100, 255];
    let mut frame = frame_with_block(120, 60, 10, 10, 20, bgra);
    // Second block far to the right.
    for y in 0..20 {
        for x in 0..20 {
            let base = ((10 + y) * 120 + (80 + x)) * 4;
            frame[base..base + 4].copy_from_slice(&bgra);
        }
    }

    let (state, _display, mut engine) = fixture(frame, 120, 60, test_settings());
    state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 60, 60, "left"));
    state.add_region(SearchRegion::new(60, 0, 60, 60, "right"));

    engine.run_cycle().unwrap();
    assert_eq!(state.matches().len(), 2);

    let first = state.next_match().unwrap();
    let second = state.next_match().unwrap();
    let third = state.next_match().unwrap();
    assert_ne!(first.region_name, second.region_name);
    assert_eq!(first.region_name, third.region_name);
}

#[test]
fn runner_stops_cooperatively() {
    let bgra = [100, 100, 100, 255];
    let (state, _display, engine) =
        fixture(frame_with_block(60, 60, 10, 10, 20, bgra), 60, 60, test_settings());
    state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 60, 60, "screen"));

    let runner = CycleRunner::spawn(engine, Duration::from_millis(1)).unwrap();
    while state.telemetry().cycles == 0 {
        std::thread::sleep(Duration::from_millis(1));
    }
    runner.join().unwrap();

    // The final cycle published before the thread exited.
    let cycles = state.telemetry().cycles;
    assert!(cycles >= 1);
    assert_eq!(state.matches().len(), 1);

    // No further cycles run after join.
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(state.telemetry().cycles, cycles);
}

#[test]
fn settings_changes_apply_at_cycle_boundaries() {
    let bgra = [100, 100, 100, 255];
    let (state, _display, mut engine) =
        fixture(frame_with_block(60, 60, 10, 10, 20, bgra), 60, 60, test_settings());
    state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 60, 60, "screen"));

    engine.run_cycle().unwrap();
    assert_eq!(state.matches().len(), 1);

    // Tolerance zero means nothing is strictly below it.
    state.apply_settings([("Tolerance", "0")]);
    engine.run_cycle().unwrap();
    assert!(state.matches().is_empty());
}
