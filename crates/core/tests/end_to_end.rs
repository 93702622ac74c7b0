use syncframe_core::{
    easing, AudioBuffer, ExportSettings, FrameExporter, Keyframe, KeyframeStore, KeyframeValue,
    MappingMatrix, ObjectId, Phase, Property, PropertySink, ReactiveMapping, SamplerConfig,
    SceneState, SpectrumBand, SteppedClock, Transport,
};

fn ramp_store() -> KeyframeStore {
    KeyframeStore::from_keyframes([
        Keyframe::new("cube", Property::PositionX, 0.0, KeyframeValue::Number(0.0)).unwrap(),
        Keyframe::new("cube", Property::PositionX, 10.0, KeyframeValue::Number(100.0))
            .unwrap()
            .with_ease("outQuad"),
        clip(0.0, "idle"),
        clip(6.0, "jump"),
    ])
    .unwrap()
}

fn clip(time: f64, name: &str) -> Keyframe {
    let value = KeyframeValue::Discrete(name.into());
    Keyframe::new("cube", Property::ActiveAnimation, time, value).unwrap()
}

fn tone(seconds: usize) -> AudioBuffer {
    let rate = 8_000;
    let samples = (0..rate * seconds)
        .map(|i| {
            let t = i as f32 / rate as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect();
    AudioBuffer::new(rate as u32, vec![samples]).unwrap()
}

#[test]
fn seek_then_tick_drives_keyframes_from_the_audio_clock() {
    let store = ramp_store();
    let mut transport = Transport::new();
    transport.init(SteppedClock::new(10.0), None).unwrap();

    transport.seek(5.0).unwrap();
    let now = transport.tick();
    assert_eq!(now, 5.0);
    assert_eq!(transport.phase(), Phase::Idle);

    let value = store
        .group(&ObjectId::new("cube"), Property::PositionX)
        .and_then(|group| group.evaluate(now))
        .and_then(|value| value.as_number())
        .unwrap();
    assert!((value - 75.0).abs() < 1e-9);
    assert!((value - 100.0 * easing::evaluate("outQuad", 0.5)).abs() < 1e-12);
}

#[test]
fn one_frame_reaches_the_scene_with_a_single_time_value() {
    let store = ramp_store();
    let mut transport = Transport::new();
    transport.init(SteppedClock::new(10.0), None).unwrap();
    transport.play().unwrap();
    transport.output_mut().unwrap().advance(7.0);
    let now = transport.tick();

    let mut matrix = MappingMatrix::new();
    let mut scene = SceneState::new();
    scene.apply_updates(matrix.evaluate(&store, now, &[]));

    let cube = ObjectId::new("cube");
    assert_eq!(
        scene.get(&cube, Property::ActiveAnimation),
        Some(&KeyframeValue::Discrete("jump".into()))
    );
    let x = scene
        .get(&cube, Property::PositionX)
        .and_then(KeyframeValue::as_number)
        .unwrap();
    assert!((x - 91.0).abs() < 1e-9);
}

#[test]
fn keyframes_round_trip_through_json() {
    let store = ramp_store();
    let restored = KeyframeStore::from_json(&store.to_json().unwrap()).unwrap();
    assert_eq!(restored.len(), store.len());
    for keyframe in store.iter() {
        assert_eq!(restored.get(keyframe.id()), Some(keyframe));
    }
}

#[test]
fn two_exports_of_the_same_inputs_are_identical() {
    let audio = tone(2).into_shared();
    let store = ramp_store();
    let settings = ExportSettings {
        fps: 15,
        ..ExportSettings::default()
    };
    let mappings = vec![ReactiveMapping::new(
        SpectrumBand::new(20, 40),
        "cube",
        Property::ScaleY,
        2.0,
        1.0,
    )
    .unwrap()];

    let run = || {
        FrameExporter::new(
            audio.clone(),
            SamplerConfig::default(),
            settings.clone(),
            Some(10.0),
            mappings.clone(),
        )
        .unwrap()
        .run(&store)
        .unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.len(), 150);
    assert_eq!(first, second);

    let halfway = &first[75];
    assert_eq!(halfway.time, 5.0);
    assert!(halfway
        .updates
        .iter()
        .any(|update| update.property == Property::ScaleY));
}
