use screenmatch::capture::memory::{BlitBackend, DuplicationBackend, SharedDisplay};
use screenmatch::image::OwnedBgra;
use screenmatch::{BackendState, CaptureError, CaptureRect, CaptureStatus, FrameSource};

fn checker_display(width: usize, height: usize) -> SharedDisplay {
    let mut data = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let v = if (x + y) % 2 == 0 { 200 } else { 20 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    SharedDisplay::new(OwnedBgra::from_vec(data, width, height).unwrap())
}

fn source_for(display: &SharedDisplay) -> FrameSource<DuplicationBackend, BlitBackend> {
    FrameSource::new(
        DuplicationBackend::new(display.clone()),
        BlitBackend::new(display.clone()),
    )
}

#[test]
fn first_capture_initializes_primary() {
    let display = checker_display(16, 16);
    let mut source = source_for(&display);
    assert_eq!(source.state(), BackendState::Uninitialized);

    let rect = CaptureRect::new(0, 0, 8, 8);
    let mut out = vec![0u8; rect.byte_len()];
    let status = source.capture(rect, &mut out).unwrap();
    assert_eq!(status, CaptureStatus::Fresh);
    assert_eq!(source.state(), BackendState::Active);

    // Pixel (1,0) of the checkerboard.
    assert_eq!(&out[4..8], &[20, 20, 20, 255]);
}

#[test]
fn unchanged_display_serves_stale_frames() {
    let display = checker_display(16, 16);
    let mut source = source_for(&display);
    let rect = CaptureRect::new(0, 0, 8, 8);
    let mut out = vec![0u8; rect.byte_len()];

    assert_eq!(source.capture(rect, &mut out).unwrap(), CaptureStatus::Fresh);
    let first = out.clone();

    // No present() between captures: stale status, same retained pixels.
    out.fill(0);
    assert_eq!(source.capture(rect, &mut out).unwrap(), CaptureStatus::Stale);
    assert_eq!(out, first);

    // Presenting new contents makes the next capture fresh again.
    let mut inverted = Vec::with_capacity(16 * 16 * 4);
    for px in first.chunks_exact(4).cycle().take(16 * 16) {
        inverted.extend_from_slice(&[255 - px[0], 255 - px[1], 255 - px[2], 255]);
    }
    display.present(OwnedBgra::from_vec(inverted, 16, 16).unwrap());
    assert_eq!(source.capture(rect, &mut out).unwrap(), CaptureStatus::Fresh);
    assert_ne!(out, first);
}

#[test]
fn init_failure_degrades_to_fallback() {
    let display = checker_display(16, 16);
    let mut source = source_for(&display);
    source.primary_mut().set_fail_init(true);

    let rect = CaptureRect::new(0, 0, 8, 8);
    let mut out = vec![0u8; rect.byte_len()];
    let status = source.capture(rect, &mut out).unwrap();

    // Fallback served the call; primary is out for the session.
    assert_eq!(status, CaptureStatus::Fresh);
    assert_eq!(source.state(), BackendState::Degraded);
    assert_eq!(&out[0..4], &[200, 200, 200, 255]);

    // Even after the primary would recover, degraded mode sticks.
    source.primary_mut().set_fail_init(false);
    source.capture(rect, &mut out).unwrap();
    assert_eq!(source.state(), BackendState::Degraded);
}

#[test]
fn frame_loss_triggers_one_shot_reinit() {
    let display = checker_display(16, 16);
    let mut source = source_for(&display);
    let rect = CaptureRect::new(0, 0, 8, 8);
    let mut out = vec![0u8; rect.byte_len()];

    source.capture(rect, &mut out).unwrap();
    assert_eq!(source.state(), BackendState::Active);

    // Lost frame: the call is served by the fallback, the primary reinits.
    source.primary_mut().fail_next_capture(CaptureError::ResourceLost);
    let status = source.capture(rect, &mut out).unwrap();
    assert_eq!(status, CaptureStatus::Fresh);
    assert_eq!(source.state(), BackendState::Active);

    // The frame re-acquired during reinitialization has not been served yet,
    // so the primary's first capture afterwards is fresh even though the
    // display contents never changed. Only the one after that is stale.
    assert_eq!(source.capture(rect, &mut out).unwrap(), CaptureStatus::Fresh);
    assert_eq!(source.capture(rect, &mut out).unwrap(), CaptureStatus::Stale);
}

#[test]
fn frame_loss_with_broken_reinit_degrades() {
    let display = checker_display(16, 16);
    let mut source = source_for(&display);
    let rect = CaptureRect::new(0, 0, 8, 8);
    let mut out = vec![0u8; rect.byte_len()];

    source.capture(rect, &mut out).unwrap();
    source.primary_mut().fail_next_capture(CaptureError::ResourceLost);
    source.primary_mut().set_fail_init(true);

    assert!(source.capture(rect, &mut out).is_ok());
    assert_eq!(source.state(), BackendState::Degraded);
}

#[test]
fn both_backends_failing_is_an_error() {
    let display = checker_display(16, 16);
    let mut source = source_for(&display);
    source.primary_mut().set_fail_init(true);
    source.fallback_mut().fail_next_capture(CaptureError::Backend("blit down"));

    let rect = CaptureRect::new(0, 0, 8, 8);
    let mut out = vec![0u8; rect.byte_len()];
    let err = source.capture(rect, &mut out).unwrap_err();
    assert_eq!(err, CaptureError::Backend("blit down"));

    // The fallback failure was transient; the next call succeeds.
    assert!(source.capture(rect, &mut out).is_ok());
}

#[test]
fn prefer_primary_off_bypasses_state_machine() {
    let display = checker_display(16, 16);
    let mut source = source_for(&display);
    source.set_prefer_primary(false);

    let rect = CaptureRect::new(0, 0, 8, 8);
    let mut out = vec![0u8; rect.byte_len()];
    source.capture(rect, &mut out).unwrap();
    assert_eq!(source.state(), BackendState::Uninitialized);
}

#[test]
fn out_of_bounds_rect_is_rejected() {
    let display = checker_display(16, 16);
    let mut source = source_for(&display);

    let rect = CaptureRect::new(10, 10, 8, 8);
    let mut out = vec![0u8; rect.byte_len()];
    let err = source.capture(rect, &mut out).unwrap_err();
    assert_eq!(err, CaptureError::RectOutOfBounds);
}
