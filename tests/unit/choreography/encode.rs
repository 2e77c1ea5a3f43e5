use super::*;
use crate::choreography::directive::{
    ClearArgs, FadeToArgs, PaletteArgs, PauseArgs, PlaneMode, PlaneSelect, SceneOptionsArgs,
    SplitAnimArgs,
};

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

const STATE: CompilerState = CompilerState { ms_per_frame: 40 };

fn encode_with(d: &Directive, order: ByteOrder, sink: &mut Names) -> ChoreoResult<Encoded> {
    let mut ctx = EncodeContext {
        assets: sink,
        anim_dir: "data",
        byte_order: order,
        default_ms_per_frame: 40,
    };
    encode_directive(d, STATE, &mut ctx).map(|(_, e)| e)
}

fn encode(d: &Directive) -> ChoreoResult<Encoded> {
    encode_with(d, ByteOrder::Little, &mut Names::default())
}

fn scene(name: &str, planes: usize, ms_per_frame: Option<u32>) -> Directive {
    Directive::Scene(SceneArgs {
        name: name.to_string(),
        planes: vec![PlaneMode::OneByOne; planes],
        ms_per_frame,
        onion_skin: None,
        post_anim_clear_plane_mask: 0,
        first_anim_frame_plane_copy_mask: 0,
    })
}

fn anim(from: u16, to: u16) -> Directive {
    Directive::Anim(AnimArgs {
        name: "ba-01".to_string(),
        from,
        to,
        plane: 1,
        xor: 1,
    })
}

#[test]
fn clear_all_writes_plane_mask() {
    let e = encode(&Directive::Clear(ClearArgs {
        plane: PlaneSelect::All,
    }))
    .unwrap();
    assert_eq!(e.payload, vec![1, 0, 0, 0, 0xFF, 0, 0, 0]);
    assert_eq!(e.duration_ms, 0);
}

#[test]
fn palette_is_padded_with_opaque_black() {
    let e = encode(&Directive::Palette(PaletteArgs {
        values: vec![0x00FF_FFFF],
    }))
    .unwrap();
    assert_eq!(e.payload.len(), 8 + 4 * PALETTE_ENTRIES);
    assert_eq!(&e.payload[4..8], &32u32.to_le_bytes());
    assert_eq!(&e.payload[8..12], &0x00FF_FFFFu32.to_le_bytes());
    assert_eq!(&e.payload[12..16], &PALETTE_FILL.to_le_bytes());

    let err = encode(&Directive::Palette(PaletteArgs {
        values: vec![0; 33],
    }))
    .unwrap_err();
    assert!(err.to_string().contains("at most 32"));
}

#[test]
fn fade_blocks_only_when_waiting() {
    let fade = |wait| {
        Directive::FadeTo(FadeToArgs {
            ms: 500,
            values: Vec::new(),
            wait,
        })
    };
    assert_eq!(encode(&fade(false)).unwrap().duration_ms, 0);
    let e = encode(&fade(true)).unwrap();
    assert_eq!(e.duration_ms, 500);
    assert_eq!(e.payload.len(), 4 + 4 + 4 + 4 + 4 * PALETTE_ENTRIES);
}

#[test]
fn anim_duration_counts_both_endpoints() {
    let mut sink = Names::default();
    let e = encode_with(&anim(2, 10), ByteOrder::Big, &mut sink).unwrap();
    assert_eq!(e.duration_ms, 9 * 40);
    assert_eq!(sink.0, vec!["data/ba-01_anim.bin".to_string()]);
    assert_eq!(
        e.payload,
        vec![0, 0, 0, 4, 0, 0, 0, 0, 0, 2, 0, 10, 0, 1, 0, 1]
    );

    let back = encode(&anim(10, 2)).unwrap();
    assert_eq!(back.duration_ms, 9 * 40);
}

#[test]
fn scene_fills_sixth_plane_and_sets_frame_rate() {
    let mut sink = Names::default();
    let mut ctx = EncodeContext {
        assets: &mut sink,
        anim_dir: "data",
        byte_order: ByteOrder::Little,
        default_ms_per_frame: 40,
    };
    let (state, e) = encode_directive(&scene("intro", 5, Some(20)), STATE, &mut ctx).unwrap();
    assert_eq!(state.ms_per_frame, 20);
    assert_eq!(&e.payload[4..10], &[1, 1, 1, 1, 1, 0]);
    assert_eq!(e.payload[10], 20);
    assert_eq!(e.payload[15], 5);
    assert_eq!(&e.payload[16..21], b"intro");
    assert_eq!(e.payload.len(), 24);

    let (state, _) = encode_directive(&scene("next", 6, None), state, &mut ctx).unwrap();
    assert_eq!(state.ms_per_frame, 40);
}

#[test]
fn scene_rejects_bad_layouts_and_rates() {
    assert!(encode(&scene("x", 4, None)).is_err());
    let err = encode(&scene("x", 6, Some(300))).unwrap_err();
    assert!(err.to_string().contains("does not fit a byte"));
}

#[test]
fn ilbm_placement_is_scaled_and_bounded() {
    let ilbm = |x: f64| {
        Directive::Ilbm(IlbmArgs {
            name: "pic.ilbm".to_string(),
            display: None,
            x: Some(x),
            y: Some(0.0),
            w: Some(1.0),
            h: Some(0.25),
            plane: 0,
            fadein_ms: 200,
        })
    };
    let e = encode(&ilbm(0.5)).unwrap();
    assert_eq!(&e.payload[8..12], &[120, 0, 240, 60]);
    assert_eq!(e.duration_ms, 200);
    assert!(encode(&ilbm(1.5)).is_err());

    let full = encode(&Directive::Ilbm(IlbmArgs {
        name: "pic.ilbm".to_string(),
        display: Some(IlbmDisplay::Fullscreen),
        x: None,
        y: None,
        w: None,
        h: None,
        plane: 0,
        fadein_ms: 0,
    }))
    .unwrap();
    assert_eq!(&full.payload[8..12], &[0, 0, 240, 240]);
}

#[test]
fn loadfont_map_must_hold_whole_boxes() {
    let font = |map: Vec<u16>| {
        Directive::LoadFont(LoadFontArgs {
            name: "font.ilbm".to_string(),
            startchar: 'A',
            map,
        })
    };
    assert!(encode(&font(vec![0, 0, 8])).is_err());
    let e = encode(&font(vec![0, 0, 8, 8])).unwrap();
    assert_eq!(&e.payload[8..12], &65u32.to_le_bytes());
    assert_eq!(&e.payload[12..16], &1u32.to_le_bytes());
    assert_eq!(e.payload.len(), 16 + 8);
}

#[test]
fn pause_and_scene_options() {
    let p = encode(&Directive::Pause(PauseArgs { ms: 750 })).unwrap();
    assert_eq!((p.duration_ms, p.payload.len()), (750, 4));

    let o = encode(&Directive::SceneOptions(SceneOptionsArgs {
        distort: true,
        multidraw_3d: true,
        ..Default::default()
    }))
    .unwrap();
    assert_eq!(&o.payload[4..6], &1u16.to_le_bytes());
    assert_eq!(&o.payload[6..8], &0x8200u16.to_le_bytes());
}

#[test]
fn macro_directives_are_refused() {
    let err = encode(&Directive::SplitAnim(SplitAnimArgs {
        name: "ba".to_string(),
        from: 0,
        to: Some(1),
        count: None,
        plane: 0,
        xor: 1,
    }))
    .unwrap_err();
    assert!(err.to_string().contains("expanded before encoding"));
}

#[test]
fn effects_carry_their_number_and_parameters() {
    let e = encode(&Directive::StartEffect(Effect::Votevotevote {
        text: vec!["ab".to_string(), "cde".to_string()],
    }))
    .unwrap();
    assert_eq!(&e.payload[4..8], &2u32.to_le_bytes());
    assert_eq!(e.payload.len(), 8 + 20);

    let bad = Directive::StartEffect(Effect::Copperpastels {
        palette_fade_ref: -1,
        values: vec!["abc".to_string()],
    });
    assert!(encode(&bad).is_err());
}

#[test]
fn text_block_offsets_are_relative_to_the_table() {
    let b = text_block(&["ab".to_string(), "cde".to_string()], ByteOrder::Little).unwrap();
    assert_eq!(b.len(), 20);
    assert_eq!(&b[0..4], &20u32.to_le_bytes());
    assert_eq!(&b[4..8], &2u32.to_le_bytes());
    assert_eq!(&b[8..14], &[6, 0, 8, 0, 11, 0]);
    assert_eq!(&b[14..19], b"abcde");
    assert_eq!(b[19], 0);
}
