use crate::{
    assets::sink::AssetSink,
    choreography::directive::{
        AnimArgs, Directive, Effect, IlbmArgs, IlbmDisplay, LoadFontArgs, ModArgs, SceneArgs,
    },
    foundation::cursor::ByteOrder,
    foundation::error::{ChoreoError, ChoreoResult},
};

/// Command tags leading every payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum CommandTag {
    End = 0,
    Clear = 1,
    Palette = 2,
    FadeTo = 3,
    Anim = 4,
    Pause = 5,
    Mod = 6,
    Ilbm = 7,
    Sound = 8,
    StartEffect = 9,
    LoadFont = 10,
    AlternatePalette = 11,
    UseAlternatePalette = 12,
    Scene = 13,
    SceneIndex = 14,
    Mbit = 15,
    SceneOptions = 16,
}

/// Palette entries per palette payload.
pub const PALETTE_ENTRIES: usize = 32;
/// Filler for unspecified palette entries (opaque black).
pub const PALETTE_FILL: u32 = 0xFF00_0000;
/// Scale of fractional image placement.
pub const PLACEMENT_SCALE: f64 = 240.0;
/// Onion-skin marker bit in the scene payload.
pub const ONION_SKIN_FLAG: u8 = 0b0100_0000;

const MOD_START: u32 = 1;
const MOD_STOP: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Running state threaded through compilation.
pub struct CompilerState {
    /// Duration of one animation frame.
    pub ms_per_frame: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Result of encoding one directive.
pub struct Encoded {
    pub duration_ms: u32,
    pub payload: Vec<u8>,
}

/// Everything an encoder may consult besides the directive and the state.
pub struct EncodeContext<'a> {
    pub assets: &'a mut dyn AssetSink,
    /// Directory holding packed animations.
    pub anim_dir: &'a str,
    pub byte_order: ByteOrder,
    /// Frame duration restored by scenes that do not set one.
    pub default_ms_per_frame: u32,
}

impl EncodeContext<'_> {
    fn anim_path(&self, name: &str) -> String {
        if self.anim_dir.is_empty() {
            format!("{name}_anim.bin")
        } else {
            format!("{}/{name}_anim.bin", self.anim_dir.trim_end_matches('/'))
        }
    }
}

struct Payload {
    order: ByteOrder,
    buf: Vec<u8>,
}

impl Payload {
    fn new(order: ByteOrder, tag: CommandTag) -> Self {
        let mut p = Self {
            order,
            buf: Vec::new(),
        };
        p.u32(tag as u32);
        p
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.order.put_u16(&mut self.buf, v);
        self
    }

    fn i16(&mut self, v: i16) -> &mut Self {
        self.order.put_i16(&mut self.buf, v);
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.order.put_u32(&mut self.buf, v);
        self
    }

    fn bytes(&mut self, b: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(b);
        self
    }

    fn pad4(&mut self) -> &mut Self {
        while self.buf.len() % 4 != 0 {
            self.buf.push(0);
        }
        self
    }

    fn done(&mut self, duration_ms: u32) -> Encoded {
        Encoded {
            duration_ms,
            payload: std::mem::take(&mut self.buf),
        }
    }
}

/// Encode one directive against the running state.
///
/// Returns the state for the next directive (only scenes change it) and the event.
pub fn encode_directive(
    directive: &Directive,
    state: CompilerState,
    ctx: &mut EncodeContext<'_>,
) -> ChoreoResult<(CompilerState, Encoded)> {
    let order = ctx.byte_order;
    let encoded = match directive {
        Directive::Scene(args) => return encode_scene(args, ctx),
        Directive::Clear(args) => Payload::new(order, CommandTag::Clear)
            .u32(args.plane.code())
            .done(0),
        Directive::Palette(args) => {
            let mut p = Payload::new(order, CommandTag::Palette);
            p.u32(PALETTE_ENTRIES as u32);
            palette_entries(&mut p, &args.values)?;
            p.done(0)
        }
        Directive::AlternatePalette(args) => {
            let mut p = Payload::new(order, CommandTag::AlternatePalette);
            p.u32(args.idx);
            palette_entries(&mut p, &args.values)?;
            p.done(0)
        }
        Directive::UseAlternatePalette(args) => Payload::new(order, CommandTag::UseAlternatePalette)
            .u32(args.idx)
            .done(0),
        Directive::FadeTo(args) => {
            let mut p = Payload::new(order, CommandTag::FadeTo);
            p.u32(args.ms)
                .u32(CommandTag::Palette as u32)
                .u32(PALETTE_ENTRIES as u32);
            palette_entries(&mut p, &args.values)?;
            p.done(if args.wait { args.ms } else { 0 })
        }
        Directive::Anim(args) => encode_anim(args, state, ctx)?,
        Directive::Pause(args) => Payload::new(order, CommandTag::Pause).done(args.ms),
        Directive::Mod(ModArgs::Start { name }) => {
            let idx = ctx.assets.add_file(name)?;
            Payload::new(order, CommandTag::Mod)
                .u32(MOD_START)
                .u32(idx)
                .done(0)
        }
        Directive::Mod(ModArgs::Stop {}) => Payload::new(order, CommandTag::Mod)
            .u32(MOD_STOP)
            .u32(0)
            .done(0),
        Directive::Sound(args) => {
            let idx = ctx.assets.add_file(&args.name)?;
            Payload::new(order, CommandTag::Sound).u32(idx).done(args.ms)
        }
        Directive::Ilbm(args) => encode_ilbm(args, ctx)?,
        Directive::Mbit(args) => {
            let idx = ctx.assets.add_file(&args.name)?;
            Payload::new(order, CommandTag::Mbit).u32(idx).done(0)
        }
        Directive::LoadFont(args) => encode_loadfont(args, ctx)?,
        Directive::StartEffect(effect) => encode_effect(effect, order)?,
        Directive::SceneOptions(args) => Payload::new(order, CommandTag::SceneOptions)
            .u16(args.zoom)
            .u16(args.flags())
            .done(0),
        Directive::End(args) => Payload::new(order, CommandTag::End)
            .u32(u32::from(args.end_scene))
            .done(0),
        Directive::SplitAnim(_) | Directive::AlternateAnimated(_) => {
            return Err(ChoreoError::config(format!(
                "'{}' must be expanded before encoding",
                directive.kind()
            )));
        }
    };
    Ok((state, encoded))
}

fn palette_entries(p: &mut Payload, values: &[u32]) -> ChoreoResult<()> {
    if values.len() > PALETTE_ENTRIES {
        return Err(ChoreoError::config(format!(
            "palette has {} entries, at most {PALETTE_ENTRIES} fit",
            values.len()
        )));
    }
    for i in 0..PALETTE_ENTRIES {
        p.u32(values.get(i).copied().unwrap_or(PALETTE_FILL));
    }
    Ok(())
}

fn encode_scene(
    args: &SceneArgs,
    ctx: &mut EncodeContext<'_>,
) -> ChoreoResult<(CompilerState, Encoded)> {
    let mut planes = args.planes.clone();
    if planes.len() == 5 {
        planes.push(Default::default());
    }
    if planes.len() != 6 {
        return Err(ChoreoError::config(format!(
            "scene '{}' needs 5 or 6 planes, got {}",
            args.name,
            args.planes.len()
        )));
    }
    let ms_per_frame = args.ms_per_frame.unwrap_or(ctx.default_ms_per_frame);
    let ms_byte = u8::try_from(ms_per_frame).map_err(|_| {
        ChoreoError::config(format!(
            "scene '{}': ms_per_frame {ms_per_frame} does not fit a byte",
            args.name
        ))
    })?;
    let name = args.name.as_bytes();
    let name_len = u8::try_from(name.len())
        .map_err(|_| ChoreoError::config(format!("scene name '{}' is too long", args.name)))?;
    let (onion_high, onion_low) = match args.onion_skin {
        Some([depth, low]) => (ONION_SKIN_FLAG | depth, low),
        None => (0, 0),
    };

    let mut p = Payload::new(ctx.byte_order, CommandTag::Scene);
    for plane in &planes {
        p.u8(plane.code());
    }
    p.u8(ms_byte)
        .u8(onion_high)
        .u8(onion_low)
        .u8(args.post_anim_clear_plane_mask)
        .u8(args.first_anim_frame_plane_copy_mask)
        .u8(name_len)
        .bytes(name)
        .pad4();
    Ok((CompilerState { ms_per_frame }, p.done(0)))
}

fn encode_anim(
    args: &AnimArgs,
    state: CompilerState,
    ctx: &mut EncodeContext<'_>,
) -> ChoreoResult<Encoded> {
    let path = ctx.anim_path(&args.name);
    let idx = ctx.assets.add_file(&path)?;
    let frames = 1 + u32::from(args.from.abs_diff(args.to));
    let duration = state
        .ms_per_frame
        .checked_mul(frames)
        .ok_or_else(|| ChoreoError::config("animation duration overflows u32"))?;
    Ok(Payload::new(ctx.byte_order, CommandTag::Anim)
        .u32(idx)
        .u16(args.from)
        .u16(args.to)
        .u16(args.plane)
        .u16(args.xor)
        .done(duration))
}

fn placement(v: Option<f64>, axis: &str) -> ChoreoResult<u8> {
    let v = v.ok_or_else(|| {
        ChoreoError::config(format!("ilbm needs '{axis}' unless display is fullscreen"))
    })?;
    if !(0.0..=1.0).contains(&v) {
        return Err(ChoreoError::config(format!(
            "ilbm '{axis}' must be within 0..=1, got {v}"
        )));
    }
    Ok((v * PLACEMENT_SCALE).floor() as u8)
}

fn encode_ilbm(args: &IlbmArgs, ctx: &mut EncodeContext<'_>) -> ChoreoResult<Encoded> {
    let idx = ctx.assets.add_file(&args.name)?;
    let [x, y, w, h] = match args.display {
        Some(IlbmDisplay::Fullscreen) => [0, 0, PLACEMENT_SCALE as u8, PLACEMENT_SCALE as u8],
        None => [
            placement(args.x, "x")?,
            placement(args.y, "y")?,
            placement(args.w, "w")?,
            placement(args.h, "h")?,
        ],
    };
    Ok(Payload::new(ctx.byte_order, CommandTag::Ilbm)
        .u32(idx)
        .u8(x)
        .u8(y)
        .u8(w)
        .u8(h)
        .u32(args.fadein_ms)
        .u32(args.plane)
        .done(args.fadein_ms))
}

fn encode_loadfont(args: &LoadFontArgs, ctx: &mut EncodeContext<'_>) -> ChoreoResult<Encoded> {
    if args.map.len() % 4 != 0 {
        return Err(ChoreoError::config(format!(
            "font map for '{}' has {} values, expected groups of 4",
            args.name,
            args.map.len()
        )));
    }
    let idx = ctx.assets.add_file(&args.name)?;
    let mut p = Payload::new(ctx.byte_order, CommandTag::LoadFont);
    p.u32(idx)
        .u32(u32::from(args.startchar))
        .u32((args.map.len() / 4) as u32);
    for &v in &args.map {
        p.u16(v);
    }
    Ok(p.done(0))
}

fn encode_effect(effect: &Effect, order: ByteOrder) -> ChoreoResult<Encoded> {
    let mut p = Payload::new(order, CommandTag::StartEffect);
    p.u32(effect.number());
    match effect {
        Effect::Votevotevote { text } => {
            let block = text_block(text, order)?;
            p.bytes(&block);
        }
        Effect::Copperpastels {
            palette_fade_ref,
            values,
        } => {
            let count = u16::try_from(values.len())
                .map_err(|_| ChoreoError::config("too many copperpastels values"))?;
            p.i16(*palette_fade_ref).u16(count);
            for v in values {
                if v.len() != 4 {
                    return Err(ChoreoError::config(format!(
                        "copperpastels value '{v}' must be exactly 4 bytes"
                    )));
                }
                p.bytes(v.as_bytes());
            }
        }
        _ => {}
    }
    Ok(p.done(0))
}

/// Length-prefixed string table: `u32 block_len`, `u32 entries`, `entries + 1` `u16` positions
/// relative to the position table, the strings, then zero padding to four bytes.
pub fn text_block(texts: &[String], order: ByteOrder) -> ChoreoResult<Vec<u8>> {
    let mut body = Vec::new();
    let mut next = 2 * (texts.len() + 1);
    for t in texts {
        let at = u16::try_from(next).map_err(|_| ChoreoError::config("text block too large"))?;
        order.put_u16(&mut body, at);
        next += t.len();
    }
    let end = u16::try_from(next).map_err(|_| ChoreoError::config("text block too large"))?;
    order.put_u16(&mut body, end);
    for t in texts {
        body.extend_from_slice(t.as_bytes());
    }
    while body.len() % 4 != 0 {
        body.push(0);
    }

    let mut out = Vec::with_capacity(body.len() + 8);
    order.put_u32(&mut out, (body.len() + 8) as u32);
    order.put_u32(&mut out, texts.len() as u32);
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/choreography/encode.rs"]
mod tests;
