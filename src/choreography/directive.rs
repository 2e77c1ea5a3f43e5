use crate::foundation::error::ChoreoError;

fn default_xor() -> u16 {
    1
}

fn default_zoom() -> u16 {
    1
}

fn default_true() -> bool {
    true
}

fn default_fade_ref() -> i16 {
    -1
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// One declarative choreography directive, tagged by name in JSON (`{"clear": {...}}`).
///
/// `split_anim` and `alternate_animated` are macro directives: preprocessing rewrites them
/// into `anim` and `use_alternate_palette` directives before compilation.
pub enum Directive {
    /// Start a scene and set its bitplane layout.
    Scene(SceneArgs),
    /// Clear one bitplane or all of them.
    Clear(ClearArgs),
    /// Load the active palette.
    Palette(PaletteArgs),
    /// Load one of the two alternate palette slots.
    AlternatePalette(AlternatePaletteArgs),
    /// Switch to an alternate palette slot.
    UseAlternatePalette(UseAlternatePaletteArgs),
    /// Fade towards a palette.
    #[serde(rename = "fadeto")]
    FadeTo(FadeToArgs),
    /// Play frames of one physical page.
    Anim(AnimArgs),
    /// Play frames of a logical animation that may span pages.
    SplitAnim(SplitAnimArgs),
    /// Alternate several animations, optionally flashing between palettes.
    AlternateAnimated(AlternateAnimatedArgs),
    /// Wait.
    Pause(PauseArgs),
    /// Start or stop module music.
    Mod(ModArgs),
    /// Trigger a sample.
    Sound(SoundArgs),
    /// Show an ILBM still image.
    Ilbm(IlbmArgs),
    /// Show an mbit planar image.
    Mbit(MbitArgs),
    /// Load a bitmap font.
    #[serde(rename = "loadfont")]
    LoadFont(LoadFontArgs),
    /// Start a player-side effect.
    #[serde(rename = "starteffect")]
    StartEffect(Effect),
    /// Per-scene rendering options.
    SceneOptions(SceneOptionsArgs),
    /// End marker.
    End(EndArgs),
}

impl Directive {
    /// Directive name as written in scripts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scene(_) => "scene",
            Self::Clear(_) => "clear",
            Self::Palette(_) => "palette",
            Self::AlternatePalette(_) => "alternate_palette",
            Self::UseAlternatePalette(_) => "use_alternate_palette",
            Self::FadeTo(_) => "fadeto",
            Self::Anim(_) => "anim",
            Self::SplitAnim(_) => "split_anim",
            Self::AlternateAnimated(_) => "alternate_animated",
            Self::Pause(_) => "pause",
            Self::Mod(_) => "mod",
            Self::Sound(_) => "sound",
            Self::Ilbm(_) => "ilbm",
            Self::Mbit(_) => "mbit",
            Self::LoadFont(_) => "loadfont",
            Self::StartEffect(_) => "starteffect",
            Self::SceneOptions(_) => "scene_options",
            Self::End(_) => "end",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Display mode of one bitplane.
pub enum PlaneMode {
    #[default]
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "1x1")]
    OneByOne,
    #[serde(rename = "2x1")]
    TwoByOne,
    #[serde(rename = "2x2")]
    TwoByTwo,
}

impl PlaneMode {
    pub fn code(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::OneByOne => 1,
            Self::TwoByOne => 2,
            Self::TwoByTwo => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneArgs {
    /// Scene name; the first 8 bytes appear in the scene index.
    pub name: String,
    /// Five or six plane modes; a sixth `off` plane is implied when five are given.
    pub planes: Vec<PlaneMode>,
    /// Milliseconds per animation frame for the rest of the scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ms_per_frame: Option<u32>,
    /// Onion-skin parameters `[depth, low byte]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onion_skin: Option<[u8; 2]>,
    /// Planes cleared when an animation finishes.
    #[serde(default)]
    pub post_anim_clear_plane_mask: u8,
    /// Planes the first animation frame is copied to.
    #[serde(default)]
    pub first_anim_frame_plane_copy_mask: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "PlaneSelectRepr", into = "PlaneSelectRepr")]
/// Target of a clear: every plane, or one plane by number.
pub enum PlaneSelect {
    #[default]
    All,
    Plane(u8),
}

impl PlaneSelect {
    pub fn code(self) -> u32 {
        match self {
            Self::All => 0xFF,
            Self::Plane(p) => u32::from(p),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum PlaneSelectRepr {
    Name(String),
    Number(u8),
}

impl TryFrom<PlaneSelectRepr> for PlaneSelect {
    type Error = ChoreoError;

    fn try_from(r: PlaneSelectRepr) -> Result<Self, Self::Error> {
        match r {
            PlaneSelectRepr::Number(n) => Ok(Self::Plane(n)),
            PlaneSelectRepr::Name(s) if s == "all" => Ok(Self::All),
            PlaneSelectRepr::Name(s) => s
                .parse::<u8>()
                .map(Self::Plane)
                .map_err(|_| ChoreoError::config(format!("unknown plane '{s}'"))),
        }
    }
}

impl From<PlaneSelect> for PlaneSelectRepr {
    fn from(p: PlaneSelect) -> Self {
        match p {
            PlaneSelect::All => Self::Name("all".to_string()),
            PlaneSelect::Plane(n) => Self::Number(n),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClearArgs {
    #[serde(default)]
    pub plane: PlaneSelect,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaletteArgs {
    /// Up to 32 ARGB colours; missing entries are opaque black.
    #[serde(default)]
    pub values: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlternatePaletteArgs {
    pub idx: u32,
    #[serde(default)]
    pub values: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UseAlternatePaletteArgs {
    pub idx: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FadeToArgs {
    pub ms: u32,
    #[serde(default)]
    pub values: Vec<u32>,
    /// Block the timeline for the duration of the fade.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimArgs {
    /// Packed animation name, resolved as `<anim_dir>/<name>_anim.bin`.
    pub name: String,
    pub from: u16,
    pub to: u16,
    #[serde(default)]
    pub plane: u16,
    #[serde(default = "default_xor")]
    pub xor: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitAnimArgs {
    /// Logical animation name, a key of the split map.
    pub name: String,
    pub from: u32,
    /// Last frame, inclusive. A value below `from` plays backwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u32>,
    /// Alternative to `to`: number of frames starting at `from`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default)]
    pub plane: u16,
    #[serde(default = "default_xor")]
    pub xor: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlternateAnimatedArgs {
    #[serde(default)]
    pub names: Vec<String>,
    /// Single source, used when `names` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub frames_per_flash: u32,
    /// Total frames as a multiple of `frames_per_flash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<u32>,
    /// Total frames, when `repeat` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<u32>,
    /// Frames available per source; defaults to one source holding every frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Vec<u32>>,
    /// First frame played from each source.
    #[serde(default)]
    pub from: u32,
    #[serde(default)]
    pub start_palette: u32,
    #[serde(default = "default_true")]
    pub strobe: bool,
    #[serde(default)]
    pub plane: u16,
    #[serde(default = "default_xor")]
    pub xor: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PauseArgs {
    pub ms: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
/// Variants without fields are braced; every variant rejects unknown keys.
pub enum ModArgs {
    Start { name: String },
    Stop {},
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoundArgs {
    pub name: String,
    /// Time the timeline waits for the sample.
    #[serde(default)]
    pub ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IlbmDisplay {
    Fullscreen,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// Image placement is either `display: "fullscreen"` or a fractional `x, y, w, h` box.
pub struct IlbmArgs {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<IlbmDisplay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default)]
    pub plane: u32,
    /// Fade from the current palette to the image's palette.
    #[serde(default)]
    pub fadein_ms: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MbitArgs {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadFontArgs {
    pub name: String,
    /// Character mapped by the first glyph box.
    pub startchar: char,
    /// Glyph boxes, four values each.
    pub map: Vec<u16>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
/// Player-side effect and its parameters.
pub enum Effect {
    Nothing {},
    Spotlights {},
    Votevotevote {
        #[serde(default)]
        text: Vec<String>,
    },
    Delayedblit {},
    Copperpastels {
        /// Palette slot used for fades, `-1` for none.
        #[serde(default = "default_fade_ref")]
        palette_fade_ref: i16,
        /// Four-letter corner colour codes.
        #[serde(default)]
        values: Vec<String>,
    },
    Static {},
    Static2 {},
}

impl Effect {
    pub fn number(&self) -> u32 {
        match self {
            Self::Nothing {} => 0,
            Self::Spotlights {} => 1,
            Self::Votevotevote { .. } => 2,
            Self::Delayedblit {} => 3,
            Self::Copperpastels { .. } => 4,
            Self::Static {} => 5,
            Self::Static2 {} => 6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneOptionsArgs {
    #[serde(default = "default_zoom")]
    pub zoom: u16,
    #[serde(default)]
    pub distort: bool,
    #[serde(default)]
    pub flip_vertical: bool,
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default)]
    pub anim_outline: bool,
    /// Show the animation three frames behind on plane 1.
    #[serde(default)]
    pub anim_3_behind_plane_1: bool,
    #[serde(default)]
    pub epilepsy: bool,
    /// Select the draw plane from the low nibble of each vector opcode.
    #[serde(default)]
    pub multidraw_3d: bool,
}

impl Default for SceneOptionsArgs {
    fn default() -> Self {
        Self {
            zoom: 1,
            distort: false,
            flip_vertical: false,
            flip_horizontal: false,
            anim_outline: false,
            anim_3_behind_plane_1: false,
            epilepsy: false,
            multidraw_3d: false,
        }
    }
}

impl SceneOptionsArgs {
    pub fn flags(&self) -> u16 {
        let bit = |on: bool, shift: u16| u16::from(on) << shift;
        bit(self.distort, 15)
            | bit(self.flip_vertical, 14)
            | bit(self.flip_horizontal, 13)
            | bit(self.anim_outline, 12)
            | bit(self.anim_3_behind_plane_1, 11)
            | bit(self.epilepsy, 10)
            | bit(self.multidraw_3d, 9)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndArgs {
    #[serde(default)]
    pub end_scene: bool,
}

#[cfg(test)]
#[path = "../../tests/unit/choreography/directive.rs"]
mod tests;
