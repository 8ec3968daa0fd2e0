use screenmatch::capture::memory::{BlitBackend, DuplicationBackend, SharedDisplay};
use screenmatch::image::{BgraView, OwnedBgra};
use screenmatch::kernel::ScoreParams;
use screenmatch::search::{exhaustive, pyramid};
use screenmatch::{
    FrameSource, MatchEngine, SearchRegion, Settings, SharedState, SimdWidth, Template,
};
use std::sync::Arc;

/// Frame of opaque black with a solid block pasted at `(bx, by)`.
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

#[test]
fn exhaustive_finds_exact_block() {
    // 40x40 region, 20x20 uniform block at (10,10), tolerance 5, early
    // rejection disabled: exactly one zero-score placement at (10,10).
    let bgra = [100, 100, 100, 255];
    let frame = frame_with_block(40, 40, 10, 10, 20, bgra);
    let view = BgraView::from_slice(&frame, 40, 40).unwrap();
    let tpl = Template::solid(20, bgra, "block").unwrap();

    let best = exhaustive::scan_full(view, &tpl, ScoreParams::exhaustive(5), SimdWidth::Lanes8)
        .unwrap();
    assert_eq!((best.x, best.y), (10, 10));
    assert_eq!(best.score, 0.0);
}

#[test]
fn pyramid_agrees_with_exhaustive_on_clear_match() {
    let bgra = [100, 100, 100, 255];
    let frame = frame_with_block(40, 40, 10, 10, 20, bgra);
    let view = BgraView::from_slice(&frame, 40, 40).unwrap();
    let tpl = Template::solid(20, bgra, "block").unwrap();
    let params = ScoreParams::exhaustive(5);

    let full = exhaustive::scan_full(view, &tpl, params, SimdWidth::Lanes8).unwrap();
    let tpl_half = pyramid::downsample_template(&tpl).unwrap();
    let coarse = pyramid::search(view, &tpl, tpl_half.view(), params, SimdWidth::Lanes8)
        .unwrap()
        .unwrap();

    assert_eq!((coarse.x, coarse.y), (full.x, full.y));
    assert_eq!(coarse.score, full.score);
}

#[test]
fn tie_break_selects_first_in_scan_order() {
    // Uniform frame equal to the template: every placement scores zero.
    let bgra = [50, 60, 70, 255];
    let mut frame = vec![0u8; 30 * 30 * 4];
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&bgra);
    }
    let view = BgraView::from_slice(&frame, 30, 30).unwrap();
    let tpl = Template::solid(10, bgra, "tie").unwrap();

    let best = exhaustive::scan_full(view, &tpl, ScoreParams::exhaustive(5), SimdWidth::Lanes8)
        .unwrap();
    assert_eq!((best.x, best.y), (0, 0));
}

#[test]
fn no_match_above_tolerance() {
    let frame = frame_with_block(40, 40, 10, 10, 20, [100, 100, 100, 255]);
    let view = BgraView::from_slice(&frame, 40, 40).unwrap();
    // 8 per-byte units away from everything in the frame interior block and
    // far from the black surround.
    let tpl = Template::solid(20, [200, 200, 200, 255], "far").unwrap();

    let params = ScoreParams::exhaustive(5);
    let best = exhaustive::scan_full(view, &tpl, params, SimdWidth::Lanes8);
    if let Some(b) = best {
        assert!(b.score >= 5.0);
    }
}

fn engine_fixture(
    frame: Vec<u8>,
    width: usize,
    height: usize,
    settings: Settings,
) -> (Arc<SharedState>, MatchEngine<DuplicationBackend, BlitBackend>) {
    let display = SharedDisplay::new(OwnedBgra::from_vec(frame, width, height).unwrap());
    let source = FrameSource::new(
        DuplicationBackend::new(display.clone()),
        BlitBackend::new(display),
    );
    let state = SharedState::new(settings);
    let engine = MatchEngine::new(Arc::clone(&state), source, (width, height));
    (state, engine)
}

#[test]
fn engine_reports_match_center_in_display_coordinates() {
    let bgra = [100, 100, 100, 255];
    let frame = frame_with_block(80, 80, 30, 30, 20, bgra);

    let mut settings = Settings::default();
    settings.tolerance = 5;
    settings.early_pixel_count = u32::MAX;
    settings.use_pyramid_search = false;
    settings.enable_learning = false;

    let (state, mut engine) = engine_fixture(frame, 80, 80, settings);
    state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    // Region offset (20,20): block top-left is at (10,10) inside it.
    state.add_region(SearchRegion::new(20, 20, 40, 40, "window"));

    let count = engine.run_cycle().unwrap();
    assert_eq!(count, 1);

    let matches = state.matches();
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(m.template_name, "block");
    assert_eq!(m.region_name, "window");
    // Center: region origin + placement + side/2 = 20 + 10 + 10.
    assert_eq!((m.x, m.y), (40, 40));
    assert_eq!(m.score, 0.0);
}

#[test]
fn engine_pyramid_and_exhaustive_agree() {
    let bgra = [100, 100, 100, 255];
    let frame = frame_with_block(80, 80, 30, 30, 20, bgra);

    let mut settings = Settings::default();
    settings.tolerance = 5;
    settings.early_pixel_count = u32::MAX;
    settings.enable_learning = false;

    for pyramid_on in [false, true] {
        settings.use_pyramid_search = pyramid_on;
        let (state, mut engine) = engine_fixture(frame.clone(), 80, 80, settings);
        state
            .add_template(Template::solid(20, bgra, "block").unwrap())
            .unwrap();
        state.add_region(SearchRegion::new(20, 20, 40, 40, "window"));

        engine.run_cycle().unwrap();
        let matches = state.matches();
        assert_eq!(matches.len(), 1, "pyramid={pyramid_on}");
        assert_eq!((matches[0].x, matches[0].y), (40, 40));
    }
}

#[test]
fn inactive_templates_and_regions_are_skipped() {
    let bgra = [100, 100, 100, 255];
    let frame = frame_with_block(80, 80, 30, 30, 20, bgra);

    let mut settings = Settings::default();
    settings.tolerance = 5;
    settings.use_pyramid_search = false;
    settings.enable_learning = false;

    let (state, mut engine) = engine_fixture(frame, 80, 80, settings);
    let tid = state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(20, 20, 40, 40, "window"));

    state.set_template_active(tid, false).unwrap();
    engine.run_cycle().unwrap();
    assert!(state.matches().is_empty());

    state.set_template_active(tid, true).unwrap();
    engine.run_cycle().unwrap();
    assert_eq!(state.matches().len(), 1);
}

#[test]
fn undersized_region_is_skipped_not_fatal() {
    let bgra = [100, 100, 100, 255];
    let frame = frame_with_block(80, 80, 30, 30, 20, bgra);

    let mut settings = Settings::default();
    settings.tolerance = 5;
    settings.use_pyramid_search = false;
    settings.enable_learning = false;

    let (state, mut engine) = engine_fixture(frame, 80, 80, settings);
    state
        .add_template(Template::solid(20, bgra, "block").unwrap())
        .unwrap();
    state.add_region(SearchRegion::new(0, 0, 10, 10, "tiny"));
    state.add_region(SearchRegion::new(20, 20, 40, 40, "window"));

    let count = engine.run_cycle().unwrap();
    assert_eq!(count, 1);
    assert_eq!(state.matches()[0].region_name, "window");
}
