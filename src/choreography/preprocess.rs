use crate::{
    choreography::directive::{
        AlternateAnimatedArgs, AnimArgs, Directive, EndArgs, SplitAnimArgs,
        UseAlternatePaletteArgs,
    },
    foundation::error::{ChoreoError, ChoreoResult},
    pack::packer::page_name,
    pack::split_map::SplitMap,
};

/// Run every rewrite pass: strobe expansion, cross-page expansion, then scene-end insertion.
///
/// Errors name the index of the offending directive in `directives`.
pub fn preprocess(directives: &[Directive], split_map: &SplitMap) -> ChoreoResult<Vec<Directive>> {
    let mut out = Vec::with_capacity(directives.len());
    for (index, d) in directives.iter().enumerate() {
        let wrap = |e: ChoreoError| e.in_directive(index, d.kind());
        match d {
            Directive::AlternateAnimated(args) => {
                for step in expand_strobe(args).map_err(wrap)? {
                    match step {
                        Directive::SplitAnim(s) => {
                            out.extend(expand_split_anim(&s, split_map).map_err(wrap)?);
                        }
                        other => out.push(other),
                    }
                }
            }
            Directive::SplitAnim(args) => {
                out.extend(expand_split_anim(args, split_map).map_err(wrap)?);
            }
            other => out.push(other.clone()),
        }
    }
    Ok(insert_scene_ends(out))
}

/// Expand a multi-source strobe into palette switches and `split_anim` ranges.
///
/// Each step plays the source with the most frames left, skipping the previous pick while
/// another source still has frames, for at most `frames_per_flash` frames.
pub fn expand_strobe(args: &AlternateAnimatedArgs) -> ChoreoResult<Vec<Directive>> {
    let names: Vec<&str> = if args.names.is_empty() {
        match &args.name {
            Some(n) => vec![n.as_str()],
            None => {
                return Err(ChoreoError::config(
                    "alternate_animated needs 'names' or 'name'",
                ));
            }
        }
    } else {
        args.names.iter().map(String::as_str).collect()
    };
    if args.frames_per_flash == 0 {
        return Err(ChoreoError::config("frames_per_flash must be >= 1"));
    }
    if args.start_palette > 1 {
        return Err(ChoreoError::config("start_palette must be 0 or 1"));
    }
    let mut total = match (args.repeat, args.frames) {
        (Some(r), _) => args
            .frames_per_flash
            .checked_mul(r)
            .ok_or_else(|| ChoreoError::config("frames_per_flash * repeat overflows"))?,
        (None, Some(f)) => f,
        (None, None) => {
            return Err(ChoreoError::config(
                "alternate_animated needs 'repeat' or 'frames'",
            ));
        }
    };
    let mut counts = args.counts.clone().unwrap_or_else(|| vec![total]);
    if counts.len() != names.len() {
        return Err(ChoreoError::config(format!(
            "{} counts given for {} sources",
            counts.len(),
            names.len()
        )));
    }

    let mut positions = vec![args.from; names.len()];
    let mut palette = args.start_palette;
    let mut last: Option<usize> = None;
    let mut out = Vec::new();

    while total > 0 {
        let live = counts.iter().filter(|&&c| c > 0).count();
        let skip = if live > 1 { last } else { None };
        let pick = counts
            .iter()
            .enumerate()
            .filter(|&(i, &c)| c > 0 && Some(i) != skip)
            // first maximum wins ties
            .fold(None::<(usize, u32)>, |best, (i, &c)| match best {
                Some((_, b)) if b >= c => best,
                _ => Some((i, c)),
            })
            .map(|(i, _)| i)
            .ok_or_else(|| {
                ChoreoError::range(format!("sources exhausted with {total} frames still requested"))
            })?;

        let take = total.min(args.frames_per_flash).min(counts[pick]);
        if args.strobe {
            out.push(Directive::UseAlternatePalette(UseAlternatePaletteArgs { idx: palette }));
        }
        out.push(Directive::SplitAnim(SplitAnimArgs {
            name: names[pick].to_string(),
            from: positions[pick],
            to: Some(positions[pick] + take - 1),
            count: None,
            plane: args.plane,
            xor: args.xor,
        }));
        palette = 1 - palette;
        counts[pick] -= take;
        positions[pick] += take;
        total -= take;
        last = Some(pick);
    }
    Ok(out)
}

/// Resolve a logical frame range against the page table of its animation.
///
/// Ranges are inclusive. A descending range is solved ascending, then reversed with each
/// event's endpoints swapped.
pub fn expand_split_anim(
    args: &SplitAnimArgs,
    split_map: &SplitMap,
) -> ChoreoResult<Vec<Directive>> {
    let (mut from, mut to) = match (args.to, args.count) {
        (Some(to), None) => (args.from, to),
        (None, Some(0)) => return Err(ChoreoError::config("split_anim count must be >= 1")),
        (None, Some(n)) => (
            args.from,
            args.from
                .checked_add(n - 1)
                .ok_or_else(|| ChoreoError::range("split_anim count overflows"))?,
        ),
        _ => {
            return Err(ChoreoError::config(
                "split_anim needs exactly one of 'to' or 'count'",
            ));
        }
    };
    let backwards = to < from;
    if backwards {
        std::mem::swap(&mut from, &mut to);
    }
    let pages = split_map
        .page_lengths(&args.name)
        .ok_or_else(|| ChoreoError::range(format!("no page table for animation '{}'", args.name)))?;

    let requested = (from, to);
    let mut events = Vec::new();
    let mut start = 0u32;
    let mut covered = false;
    for (idx, &len) in pages.iter().enumerate() {
        let len = len as u32;
        if len == 0 {
            continue;
        }
        let last = start + len - 1;
        if (start..=last).contains(&from) {
            let local_from = from - start;
            let local_to = to.min(last) - start;
            events.push(AnimArgs {
                name: page_name(&args.name, idx),
                from: local_frame(local_from)?,
                to: local_frame(local_to)?,
                plane: args.plane,
                xor: args.xor,
            });
            from += local_to - local_from + 1;
            if from > to {
                covered = true;
                break;
            }
        }
        start += len;
    }
    if !covered {
        return Err(ChoreoError::range(format!(
            "frames {}..={} of '{}' not covered by {start} known frames",
            requested.0, requested.1, args.name
        )));
    }

    if backwards {
        events.reverse();
        for e in &mut events {
            std::mem::swap(&mut e.from, &mut e.to);
        }
    }
    Ok(events.into_iter().map(Directive::Anim).collect())
}

fn local_frame(v: u32) -> ChoreoResult<u16> {
    u16::try_from(v).map_err(|_| ChoreoError::range(format!("page-local frame {v} exceeds u16")))
}

/// Insert an `end { end_scene: true }` before every scene but the first.
pub fn insert_scene_ends(directives: Vec<Directive>) -> Vec<Directive> {
    let mut out = Vec::with_capacity(directives.len());
    let mut seen_scene = false;
    for d in directives {
        if matches!(d, Directive::Scene(_)) {
            if seen_scene {
                out.push(Directive::End(EndArgs { end_scene: true }));
            }
            seen_scene = true;
        }
        out.push(d);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/choreography/preprocess.rs"]
mod tests;
