use super::*;
use crate::choreography::directive::{AnimArgs, PauseArgs, PlaneMode, SceneArgs, SplitAnimArgs};

#[derive(Default)]
struct Names(Vec<String>);

impl AssetSink for Names {
    fn add_file(&mut self, name: &str) -> ChoreoResult<u32> {
        if let Some(i) = self.0.iter().position(|n| n == name) {
            return Ok(i as u32);
        }
        self.0.push(name.to_string());
        Ok((self.0.len() - 1) as u32)
    }

    fn add_bytes(&mut self, name: &str, _bytes: Vec<u8>) -> ChoreoResult<u32> {
        self.add_file(name)
    }
}

fn scene(name: &str, ms_per_frame: Option<u32>) -> Directive {
    Directive::Scene(SceneArgs {
        name: name.to_string(),
        planes: vec![PlaneMode::OneByOne; 6],
        ms_per_frame,
        onion_skin: None,
        post_anim_clear_plane_mask: 0,
        first_anim_frame_plane_copy_mask: 0,
    })
}

fn anim(name: &str, from: u16, to: u16) -> Directive {
    Directive::Anim(AnimArgs {
        name: name.to_string(),
        from,
        to,
        plane: 0,
        xor: 1,
    })
}

fn two_scenes() -> Vec<Directive> {
    vec![
        scene("intro", Some(20)),
        anim("a", 0, 4),
        Directive::Pause(PauseArgs { ms: 50 }),
        scene("two", None),
        anim("b", 0, 1),
    ]
}

fn compile_default(directives: &[Directive]) -> ChoreoResult<CompiledChoreography> {
    compile(
        directives,
        &CompileSettings::default(),
        &SplitMap::new(),
        &mut Names::default(),
    )
}

#[test]
fn events_are_laid_end_to_end() {
    let c = compile_default(&two_scenes()).unwrap();
    let kinds: Vec<&str> = c.events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec!["scene", "anim", "pause", "end", "scene", "anim"]);
    let starts: Vec<u32> = c.events.iter().map(|e| e.start_ms).collect();
    assert_eq!(starts, vec![0, 0, 100, 150, 150, 150]);
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(c.duration_ms(), 230);
}

#[test]
fn scene_without_rate_restores_the_default() {
    let c = compile_default(&two_scenes()).unwrap();
    assert_eq!(c.events[1].duration_ms, 5 * 20);
    assert_eq!(c.events[5].duration_ms, 2 * DEFAULT_MS_PER_FRAME);
}

#[test]
fn scene_index_points_at_scene_records() {
    let c = compile_default(&two_scenes()).unwrap();
    let entries = c.scene_index.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries.iter().map(|e| e.ms).collect::<Vec<_>>(),
        vec![0, 150, u32::MAX]
    );
    assert_eq!(
        entries.iter().map(|e| e.offset).collect::<Vec<_>>(),
        vec![64, 148, 200]
    );

    let bytes = c.to_bytes();
    assert_eq!(bytes.len(), 200);
    let order = ByteOrder::Little;
    let at = entries[1].offset as usize;
    let mut cur = crate::foundation::cursor::ByteCursor::at(&bytes, at).unwrap();
    assert_eq!(cur.read_u32(order).unwrap(), 150);
    assert_eq!(cur.read_u32(order).unwrap(), 28);
    assert_eq!(cur.read_u32(order).unwrap(), 13);
    assert_eq!(SceneIndex::parse(&bytes, order).unwrap(), c.scene_index);
}

#[test]
fn split_anim_is_expanded_against_the_map() {
    let mut map = SplitMap::new();
    map.insert("ba", vec![10, 15]);
    let mut sink = Names::default();
    let c = compile(
        &[Directive::SplitAnim(SplitAnimArgs {
            name: "ba".to_string(),
            from: 8,
            to: Some(11),
            count: None,
            plane: 0,
            xor: 1,
        })],
        &CompileSettings::default(),
        &map,
        &mut sink,
    )
    .unwrap();
    assert_eq!(c.events.len(), 2);
    assert_eq!(
        sink.0,
        vec!["data/ba-00_anim.bin".to_string(), "data/ba-01_anim.bin".to_string()]
    );
    assert_eq!(c.duration_ms(), 4 * DEFAULT_MS_PER_FRAME);
}

#[test]
fn errors_name_the_directive() {
    let err = compile_default(&[
        Directive::Pause(PauseArgs { ms: 1 }),
        scene("bad", Some(1000)),
    ])
    .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("directive #1 (scene)"), "{msg}");

    let err = compile_default(&[
        Directive::Pause(PauseArgs { ms: u32::MAX }),
        Directive::Pause(PauseArgs { ms: 1 }),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("exceeds u32"));
}

#[test]
fn script_json_uses_defaults() {
    let s = Script::from_json(r#"{"directives":[{"pause":{"ms":5}}]}"#).unwrap();
    assert_eq!(s.settings, CompileSettings::default());
    assert_eq!(s.directives, vec![Directive::Pause(PauseArgs { ms: 5 })]);
    assert!(Script::from_json(r#"{"directives":[],"extra":1}"#).is_err());
}

#[test]
fn unknown_directive_is_a_configuration_error() {
    let err = Script::from_json(r#"{"directives":[{"explode":{}}]}"#).unwrap_err();
    assert!(matches!(err, ChoreoError::Config(_)), "{err}");
    assert!(err.to_string().starts_with("configuration error: invalid script:"));
    assert!(err.to_string().contains("explode"));
}
