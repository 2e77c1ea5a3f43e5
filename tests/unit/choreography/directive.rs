use super::*;

fn parse(json: &str) -> Directive {
    serde_json::from_str(json).unwrap()
}

#[test]
fn directives_are_tagged_by_name() {
    let d = parse(r#"{"clear": {"plane": "all"}}"#);
    assert_eq!(d, Directive::Clear(ClearArgs { plane: PlaneSelect::All }));
    assert_eq!(d.kind(), "clear");

    let d = parse(r#"{"fadeto": {"ms": 250}}"#);
    assert_eq!(d.kind(), "fadeto");
    match d {
        Directive::FadeTo(a) => {
            assert_eq!(a.ms, 250);
            assert!(a.values.is_empty());
            assert!(!a.wait);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn plane_select_accepts_all_numbers_and_numeric_strings() {
    assert_eq!(parse(r#"{"clear": {}}"#), Directive::Clear(ClearArgs::default()));
    assert_eq!(
        parse(r#"{"clear": {"plane": 2}}"#),
        Directive::Clear(ClearArgs {
            plane: PlaneSelect::Plane(2)
        })
    );
    assert_eq!(
        parse(r#"{"clear": {"plane": "3"}}"#),
        Directive::Clear(ClearArgs {
            plane: PlaneSelect::Plane(3)
        })
    );
    assert!(serde_json::from_str::<Directive>(r#"{"clear": {"plane": "some"}}"#).is_err());
    assert_eq!(PlaneSelect::All.code(), 0xFF);
}

#[test]
fn unknown_directive_or_field_is_rejected() {
    assert!(serde_json::from_str::<Directive>(r#"{"explode": {}}"#).is_err());
    assert!(serde_json::from_str::<Directive>(r#"{"pause": {"ms": 1, "hint": "x"}}"#).is_err());
    for extra in [
        r#"{"mod": {"type": "stop", "bogus": 1}}"#,
        r#"{"mod": {"type": "start", "name": "a.mod", "bogus": 1}}"#,
        r#"{"starteffect": {"name": "spotlights", "bogus": 1}}"#,
        r#"{"starteffect": {"name": "votevotevote", "text": [], "bogus": 1}}"#,
    ] {
        assert!(serde_json::from_str::<Directive>(extra).is_err(), "{extra}");
    }
    assert_eq!(
        parse(r#"{"starteffect": {"name": "spotlights"}}"#),
        Directive::StartEffect(Effect::Spotlights {})
    );
}

#[test]
fn anim_defaults_xor_to_one() {
    match parse(r#"{"anim": {"name": "a-00", "from": 0, "to": 9}}"#) {
        Directive::Anim(a) => {
            assert_eq!(a.plane, 0);
            assert_eq!(a.xor, 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn mod_and_effect_use_inner_tags() {
    assert_eq!(
        parse(r#"{"mod": {"type": "start", "name": "data/song.mod"}}"#),
        Directive::Mod(ModArgs::Start {
            name: "data/song.mod".to_string()
        })
    );
    assert_eq!(parse(r#"{"mod": {"type": "stop"}}"#), Directive::Mod(ModArgs::Stop {}));

    let d = parse(r#"{"starteffect": {"name": "copperpastels", "values": ["YWWW"]}}"#);
    match d {
        Directive::StartEffect(e @ Effect::Copperpastels { .. }) => {
            assert_eq!(e.number(), 4);
            if let Effect::Copperpastels {
                palette_fade_ref, ..
            } = e
            {
                assert_eq!(palette_fade_ref, -1);
            }
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        parse(r#"{"starteffect": {"name": "static2"}}"#),
        Directive::StartEffect(Effect::Static2 {})
    );
}

#[test]
fn scene_planes_use_mode_names() {
    let d = parse(
        r#"{"scene": {"name": "dance-1", "planes": ["1x1", "2x2", "off", "off", "off"], "onion_skin": [2, 1]}}"#,
    );
    match d {
        Directive::Scene(s) => {
            assert_eq!(s.planes[1], PlaneMode::TwoByTwo);
            assert_eq!(s.planes[1].code(), 3);
            assert_eq!(s.onion_skin, Some([2, 1]));
            assert_eq!(s.ms_per_frame, None);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn scene_option_flags_pack_high_bits() {
    let opts = SceneOptionsArgs {
        distort: true,
        multidraw_3d: true,
        ..SceneOptionsArgs::default()
    };
    assert_eq!(opts.flags(), 0x8200);
    assert_eq!(SceneOptionsArgs::default().flags(), 0);
    let parsed = parse(r#"{"scene_options": {"epilepsy": true}}"#);
    match parsed {
        Directive::SceneOptions(o) => {
            assert_eq!(o.zoom, 1);
            assert_eq!(o.flags(), 1 << 10);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn directives_serialize_back_to_the_same_shape() {
    let d = Directive::SplitAnim(SplitAnimArgs {
        name: "ba".to_string(),
        from: 3,
        to: None,
        count: Some(4),
        plane: 0,
        xor: 1,
    });
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"split_anim": {"name": "ba", "from": 3, "count": 4, "plane": 0, "xor": 1}})
    );
    assert_eq!(serde_json::from_value::<Directive>(json).unwrap(), d);
}
