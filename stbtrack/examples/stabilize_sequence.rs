use stbtrack::{Category, Detection, FrameDetections, StabilizerConfig, Tracker};

fn print_frame(tracker: &Tracker, frame: usize) -> anyhow::Result<()> {
    for category in [Category::Face, Category::Body] {
        let tracks = tracker.result(category)?;
        println!("Frame {}: {} {} tracks", frame, tracks.len(), category);
        for t in tracks {
            let state = if t.is_detected() { "detected" } else { "lost" };
            println!(
                "  Track ID {}: ({}, {}) size {} conf {} [{}]",
                t.track_id, t.x, t.y, t.size, t.confidence, state
            );
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let config = StabilizerConfig::from_json(
        r#"{ "steadiness_position": 10, "steadiness_size": 10, "retry_count_threshold": 2 }"#,
    )?;
    let mut tracker = Tracker::new(config)?;

    let frames = vec![
        // Two faces and a body appear
        FrameDetections {
            faces: vec![Detection::new(100, 100, 50, 800), Detection::new(400, 120, 60, 700)],
            bodies: vec![Detection::new(120, 300, 200, 600)],
        },
        // Small jitter is held, the second face moves far enough to follow
        FrameDetections {
            faces: vec![Detection::new(102, 101, 51, 820), Detection::new(440, 120, 60, 650)],
            bodies: vec![Detection::new(121, 302, 198, 640)],
        },
        // First face missed, a new face enters
        FrameDetections {
            faces: vec![Detection::new(445, 121, 61, 700), Detection::new(700, 90, 40, 500)],
            bodies: vec![Detection::new(122, 301, 200, 600)],
        },
        // Nobody detected
        FrameDetections::default(),
        FrameDetections::default(),
        FrameDetections::default(),
    ];

    for (i, frame) in frames.iter().enumerate() {
        tracker.set_detections(frame)?;
        tracker.execute();
        print_frame(&tracker, i + 1)?;
    }

    println!("\nAll lost tracks evicted; clearing and restarting ids");
    tracker.clear();
    let results = tracker.execute_frame(&FrameDetections {
        faces: vec![Detection::new(10, 10, 30, 900)],
        bodies: Vec::new(),
    })?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}
