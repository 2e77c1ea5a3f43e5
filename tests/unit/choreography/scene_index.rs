use super::*;

fn sample() -> SceneIndex {
    SceneIndex::build(
        vec![
            SceneEntry {
                ms: 100,
                offset: 0,
                name: "intro".to_string(),
            },
            SceneEntry {
                ms: 300,
                offset: 40,
                name: "averylongname".to_string(),
            },
        ],
        120,
    )
}

#[test]
fn build_shifts_offsets_past_the_index_record() {
    let idx = sample();
    assert_eq!(idx.record_len(), 64);
    let offsets: Vec<u32> = idx.entries().iter().map(|e| e.offset).collect();
    assert_eq!(offsets, vec![64, 104, 184]);
    assert_eq!(idx.scenes().len(), 2);
}

#[test]
fn sentinel_closes_the_table() {
    let idx = sample();
    let last = idx.entries().last().unwrap();
    assert_eq!(last.ms, SENTINEL_MS);
    assert_eq!(last.name, "end");
}

#[test]
fn names_are_cut_to_eight_bytes() {
    assert_eq!(sample().entries()[1].name, "averylon");
    let idx = SceneIndex::build(
        vec![SceneEntry {
            ms: 0,
            offset: 0,
            name: "ééééé".to_string(),
        }],
        0,
    );
    assert_eq!(idx.entries()[0].name, "éééé");
}

#[test]
fn written_record_parses_back() {
    for order in [ByteOrder::Little, ByteOrder::Big] {
        let idx = sample();
        let mut out = Vec::new();
        idx.write(order, &mut out);
        assert_eq!(out.len(), idx.record_len() as usize);
        assert_eq!(SceneIndex::parse(&out, order).unwrap(), idx);
    }
}

#[test]
fn parse_rejects_other_commands() {
    let mut out = Vec::new();
    let order = ByteOrder::Little;
    order.put_u32(&mut out, 0);
    order.put_u32(&mut out, 16);
    order.put_u32(&mut out, CommandTag::Anim as u32);
    order.put_u32(&mut out, 0);
    let err = SceneIndex::parse(&out, order).unwrap_err();
    assert!(err.to_string().contains("not a scene index"));
}

fn header(len: u32, count: u32) -> Vec<u8> {
    let order = ByteOrder::Little;
    let mut out = Vec::new();
    for v in [0, len, CommandTag::SceneIndex as u32, count] {
        order.put_u32(&mut out, v);
    }
    out
}

#[test]
fn parse_rejects_counts_that_wrap_the_length() {
    let err = SceneIndex::parse(&header(16, 0x1000_0000), ByteOrder::Little).unwrap_err();
    assert!(matches!(err, ChoreoError::Config(_)), "{err}");
}

#[test]
fn parse_rejects_entries_missing_from_the_buffer() {
    let err = SceneIndex::parse(&header(16 + 16 * 4, 4), ByteOrder::Little).unwrap_err();
    assert!(matches!(
        err,
        ChoreoError::Format(FormatError::Truncated {
            position: 16,
            wanted: 64,
            available: 0,
        })
    ));
}

#[test]
fn seek_finds_the_scene_playing_at_a_time() {
    let idx = sample();
    assert_eq!(idx.seek(0), Some((64, 104)));
    assert_eq!(idx.seek(100), Some((64, 104)));
    assert_eq!(idx.seek(299), Some((64, 104)));
    assert_eq!(idx.seek(300), Some((104, 184)));
    assert_eq!(idx.seek(10_000), Some((104, 184)));
    assert_eq!(idx.seek(u32::MAX), None);
}

#[test]
fn seek_without_scenes_is_none() {
    let idx = SceneIndex::build(Vec::new(), 48);
    assert_eq!(idx.entries().len(), 1);
    assert_eq!(idx.entries()[0].offset, 48 + 32);
    assert_eq!(idx.seek(0), None);
}
