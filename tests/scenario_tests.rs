// tests/scenario_tests.rs
use image::{Rgb, RgbImage};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use roadwatch_core::{
    AssociationRole, BBox, ClassInfo, ClassTable, CountingLine, Detection, Frame, Point,
};
use roadwatch_cv::{
    AssociationEngine, LineCrossingCounter, Session, SessionConfig, SessionEvent,
};
use std::fs;
use tempfile::TempDir;

const BIKE: u32 = 0;
const NO_HELMET: u32 = 1;
const PLATE: u32 = 3;

fn centred(class_id: u32, x: i32, y: i32, half: i32) -> Detection {
    Detection::new(class_id, BBox::new(x - half, y - half, x + half, y + half))
}

fn traffic_table() -> ClassTable {
    let mut table = ClassTable::new();
    table.insert(ClassInfo::new(2, "car").counted());
    table.insert(ClassInfo::new(3, "motorcycle").counted().with_role(AssociationRole::Carrier));
    table.insert(ClassInfo::new(5, "bus").counted());
    table.insert(ClassInfo::new(7, "truck").counted());
    table
}

#[test]
fn scenario_a_violation_without_identifier() {
    let carriers = [Detection::new(BIKE, BBox::new(100, 100, 200, 200))];
    let markers = [centred(NO_HELMET, 150, 150, 10)];

    assert!(AssociationEngine::has_violation(&carriers[0], &markers));
    let records = AssociationEngine::associate(1, &carriers, &markers, &[]);
    assert!(records.is_empty());
}

#[test]
fn scenario_b_nearest_identifier_wins() {
    let carriers = [Detection::new(BIKE, BBox::new(100, 100, 200, 200))];
    let markers = [centred(NO_HELMET, 150, 150, 10)];
    let near = centred(PLATE, 160, 160, 8);
    let far = centred(PLATE, 199, 199, 8);

    for identifiers in [[near, far], [far, near]] {
        let records = AssociationEngine::associate(1, &carriers, &markers, &identifiers);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, near.bbox);
        assert_eq!(records[0].carrier, BBox::new(100, 100, 200, 200));
    }
}

#[test]
fn scenario_c_single_crossing() {
    let table = traffic_table();
    let line = CountingLine::from_coords(100, 0, 100, 1000);
    let mut counter = LineCrossingCounter::new();
    let car = |x| centred(2, x, 500, 20).with_track(11);

    assert!(counter.process(10, &line, &[car(90)], &table).is_empty());
    let events = counter.process(11, &line, &[car(110)], &table);
    assert_eq!(events.len(), 1);
    assert_eq!(counter.counts().get("car"), 1);

    assert!(counter.process(12, &line, &[car(130)], &table).is_empty());
    assert_eq!(counter.counts().get("car"), 1);
}

#[test]
fn counted_track_never_counts_twice() {
    let table = traffic_table();
    let line = CountingLine::from_coords(100, 0, 100, 1000);
    let mut counter = LineCrossingCounter::new();

    // weaves back and forth across the line five times
    let path = [90, 110, 90, 110, 90, 110];
    let mut fired = 0;
    for (frame, x) in path.iter().enumerate() {
        let det = centred(5, *x, 400, 30).with_track(3);
        fired += counter.process(frame as u64, &line, &[det], &table).len();
    }

    assert_eq!(fired, 1);
    assert_eq!(counter.counts().get("bus"), 1);
    assert!(counter.tracks().is_counted(3));
}

#[test]
fn totals_do_not_depend_on_same_frame_order() {
    let table = traffic_table();
    let line = CountingLine::from_coords(0, 300, 1000, 300);
    let classes = [2, 3, 5, 7];

    // 40 tracks; the even ones cross the horizontal line, the odd ones stay above it
    let before: Vec<Detection> = (0..40)
        .map(|i| centred(classes[i % 4], 20 + 20 * i as i32, 280, 5).with_track(i as u64))
        .collect();
    let after: Vec<Detection> = (0..40)
        .map(|i| {
            let y = if i % 2 == 0 { 320 } else { 290 };
            centred(classes[i % 4], 20 + 20 * i as i32, y, 5).with_track(i as u64)
        })
        .collect();

    let run = |first: &[Detection], second: &[Detection]| {
        let mut counter = LineCrossingCounter::new();
        counter.process(1, &line, first, &table);
        counter.process(2, &line, second, &table);
        counter.counts().clone()
    };

    let reference = run(&before, &after);
    assert_eq!(reference.total(), 20);
    assert_eq!(reference.get("car"), 10);
    assert_eq!(reference.get("bus"), 10);
    assert_eq!(reference.get("motorcycle"), 0);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..25 {
        let mut first = before.clone();
        let mut second = after.clone();
        first.shuffle(&mut rng);
        second.shuffle(&mut rng);
        assert_eq!(run(&first, &second), reference);
    }
}

#[test]
fn association_is_deterministic() {
    let carriers: Vec<Detection> = (0..5)
        .map(|i| Detection::new(BIKE, BBox::new(100 * i, 0, 100 * i + 90, 90)).with_track(i as u64))
        .collect();
    let markers: Vec<Detection> = (0..5).map(|i| centred(NO_HELMET, 100 * i + 45, 30, 5)).collect();
    let identifiers: Vec<Detection> = (0..5)
        .flat_map(|i| [centred(PLATE, 100 * i + 55, 45, 4), centred(PLATE, 100 * i + 35, 45, 4)])
        .collect();

    let first = AssociationEngine::associate(9, &carriers, &markers, &identifiers);
    assert_eq!(first.len(), 5);
    let encoded = serde_json::to_string(&first).unwrap();
    for _ in 0..20 {
        let again = AssociationEngine::associate(9, &carriers, &markers, &identifiers);
        assert_eq!(serde_json::to_string(&again).unwrap(), encoded);
    }
    // both plates are 10px from the carrier centre; the earlier one is kept
    assert_eq!(first[0].identifier.center(), Point::new(55, 45));
}

#[test]
fn combined_session_writes_counts_and_evidence() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut config = SessionConfig::default();
    config.counting.counts_file = dir.path().join("vehicle_counts.txt");
    config.violation.evidence_dir = dir.path().join("evidence");

    let mut session = Session::from_config(config, ClassTable::helmet_default())?;
    let line = CountingLine::from_coords(100, 0, 100, 1000);
    let image = RgbImage::from_pixel(640, 480, Rgb([40, 80, 120]));

    let frame_at = |index: u64, x: i32| {
        Frame::new(index, 640, 480).with_detections(vec![
            centred(BIKE, x, 300, 60).with_track(1),
            centred(NO_HELMET, x, 270, 10),
            centred(PLATE, x + 5, 340, 15),
        ])
    };

    let first = session.process_frame(&frame_at(1, 90), Some(&image), &line);
    let second = session.process_frame(&frame_at(2, 110), Some(&image), &line);

    assert_eq!(first.crossings.len(), 0);
    assert_eq!(first.violations.len(), 1);
    assert_eq!(second.crossings.len(), 1);
    assert_eq!(second.violations.len(), 1);
    assert_eq!(session.stats().evidence_saved, 2);

    let counts = fs::read_to_string(dir.path().join("vehicle_counts.txt"))?;
    assert_eq!(counts, "Vehicle Counts:\n===============\nbike: 1\n");

    for index in [1, 2] {
        for role in ["carrier", "identifier"] {
            let path = dir.path().join(format!("evidence/frame_{}_0_{}.jpg", index, role));
            assert!(path.exists(), "missing {:?}", path);
        }
    }

    let carrier = image::open(dir.path().join("evidence/frame_1_0_carrier.jpg"))?;
    assert_eq!((carrier.width(), carrier.height()), (120, 120));

    let events = session.drain_events();
    let crossings = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Crossing(_)))
        .count();
    let saved = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::EvidenceSaved { .. }))
        .count();
    assert_eq!((crossings, saved), (1, 2));
    Ok(())
}

#[test]
fn evidence_for_box_leaving_the_frame_is_clamped() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut config = SessionConfig::violations_only();
    config.violation.evidence_dir = dir.path().to_path_buf();

    let mut session = Session::from_config(config, ClassTable::helmet_default())?;
    let image = RgbImage::new(200, 150);

    // carrier hangs over the top-left corner
    let frame = Frame::new(3, 200, 150).with_detections(vec![
        Detection::new(BIKE, BBox::new(-40, -30, 60, 70)),
        centred(NO_HELMET, 20, 20, 5),
        centred(PLATE, 30, 40, 6),
    ]);
    let report = session.process_frame(&frame, Some(&image), &CountingLine::from_coords(0, 0, 1, 1));

    assert_eq!(report.evidence_failures, 0);
    let carrier = image::open(dir.path().join("frame_3_0_carrier.jpg"))?;
    assert_eq!((carrier.width(), carrier.height()), (60, 70));
    Ok(())
}
