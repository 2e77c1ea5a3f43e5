use super::*;
use crate::arena::builder::build_arena;
use crate::foundation::cursor::ByteOrder;
use crate::foundation::error::{ChoreoError, PackError};
use crate::pack::page::parse_page;
use crate::pack::split_map::SplitMap;

fn vector(points: usize) -> Vec<u8> {
    let mut g = vec![1, 0xD0, points as u8];
    g.extend(std::iter::repeat_n(points as u8, 2 * points));
    g
}

fn tween_group(to_delta: u16) -> Vec<u8> {
    let [hi, lo] = to_delta.to_be_bytes();
    vec![2, 0xD0, 1, 3, 4, 0xE6, 0, 5, hi, lo, 0, 8]
}

fn arena_of(groups: &[Vec<u8>], frames: &[usize]) -> Arena {
    let mut source = Vec::new();
    let mut offsets = Vec::new();
    for g in groups {
        offsets.push(source.len() as u32);
        source.extend_from_slice(g);
    }
    let table: Vec<u32> = frames.iter().map(|&i| offsets[i]).collect();
    build_arena(&source, &table).unwrap()
}

fn config(limit: usize) -> PackConfig {
    PackConfig {
        page_limit: limit,
        ..PackConfig::default()
    }
}

// x @0, t @23 (targets v @35), v @35
fn forward_tween_arena() -> Arena {
    arena_of(&[vector(10), tween_group(4), vector(1)], &[0, 1, 2])
}

#[test]
fn small_animation_fits_one_page() {
    let arena = forward_tween_arena();
    let pages = split(&arena, &PackConfig::default()).unwrap();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.frames, vec![0, 23, 35]);
    assert_eq!(&page.bytes[..8], &[3, 0, 0, 0, 23, 0, 35, 0]);
    assert_eq!(&page.bytes[8..], arena.data());
}

#[test]
fn rewind_moves_trailing_tween_next_to_its_target() {
    let pages = split(&forward_tween_arena(), &config(45)).unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].frame_count(), 1);
    assert_eq!(pages[1].frame_count(), 2);
    assert_eq!(pages[1].first_frame, 1);
    assert_eq!(pages[1].index, 1);

    let mut expected = vec![2, 0, 0, 0, 12, 0];
    expected.extend_from_slice(&tween_group(4));
    expected.extend_from_slice(&vector(1));
    assert_eq!(pages[1].bytes, expected);
}

#[test]
fn locality_violation_fails_loudly() {
    // t @0 targets v @35 but a vector-only entry ends the page
    let arena = arena_of(&[tween_group(27), vector(10), vector(1)], &[0, 1, 2]);
    let err = split(&arena, &config(45)).unwrap_err();
    assert!(matches!(
        err,
        ChoreoError::Packing(PackError::TweenOutOfPage {
            page: 0,
            offset: 6,
            target: 35
        })
    ));
}

#[test]
fn every_page_is_bounded_and_preserves_frames() {
    let groups: Vec<Vec<u8>> = (0..60).map(|i| vector(1 + i % 9)).collect();
    let frames: Vec<usize> = (0..200).map(|i| (i * 7) % 60).collect();
    let mut first = frames.clone();
    first.insert(0, 0);
    let arena = arena_of(&groups, &first);

    let cfg = config(256);
    let pages = split(&arena, &cfg).unwrap();
    assert!(pages.len() > 1);
    assert_eq!(
        pages.iter().map(|p| p.frame_count()).sum::<usize>(),
        arena.frame_count()
    );

    let mut cursor = 0usize;
    for page in &pages {
        assert!(page.len() <= cfg.page_limit);
        assert_eq!(page.first_frame, cursor);
        let local = parse_page(&page.bytes, ByteOrder::Little).unwrap();
        for (i, &off) in page.frames.iter().enumerate() {
            let orig = arena.frames()[cursor + i];
            assert_eq!(local.group(u32::from(off)), arena.group(orig));
        }
        cursor += page.frame_count();
    }
}

#[test]
fn invalid_limit_is_rejected() {
    let arena = forward_tween_arena();
    assert!(matches!(
        split(&arena, &config(4)),
        Err(ChoreoError::Packing(PackError::InvalidLimit { limit: 4 }))
    ));
    assert!(split(&arena, &config(70_000)).is_err());
}

#[test]
fn split_many_keeps_input_order_and_names_failures() {
    let ok = vec![
        ("b".to_string(), forward_tween_arena()),
        ("a".to_string(), arena_of(&[vector(2)], &[0, 0])),
    ];
    let out = split_many(&ok, &config(45)).unwrap();
    assert_eq!(
        out.iter().map(|(n, p)| (n.as_str(), p.len())).collect::<Vec<_>>(),
        vec![("b", 2), ("a", 1)]
    );

    let bad = vec![
        ("fine".to_string(), forward_tween_arena()),
        ("huge".to_string(), arena_of(&[vector(40)], &[0])),
    ];
    match split_many(&bad, &config(45)).unwrap_err() {
        ChoreoError::InAnimation { name, source } => {
            assert_eq!(name, "huge");
            assert!(matches!(
                *source,
                ChoreoError::Packing(PackError::GroupTooLarge { .. })
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn zero_threads_is_a_config_error() {
    let cfg = PackConfig {
        threads: Some(0),
        ..PackConfig::default()
    };
    assert!(matches!(split_many(&[], &cfg), Err(ChoreoError::Config(_))));
}

#[test]
fn page_names_use_two_hex_digits() {
    assert_eq!(page_name("ba", 10), "ba-0a");
    assert_eq!(page_file_name("ba", 1), "ba-01_anim.bin");
}

#[test]
fn split_map_records_page_lengths() {
    let pages = split(&forward_tween_arena(), &config(45)).unwrap();
    let mut map = SplitMap::new();
    map.record_pages("anim", &pages);
    assert_eq!(map.page_lengths("anim"), Some(&[1usize, 2][..]));
    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, r#"{"anim":[1,2]}"#);
    assert_eq!(SplitMap::from_json(&json).unwrap(), map);
}
