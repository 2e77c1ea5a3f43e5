//! Choreopack turns vector animations ripped from disk images into playable demo assets.
//!
//! # Pipeline overview
//!
//! 1. **Extract**: disk image + frame table -> [`Arena`] (deduplicated command groups)
//! 2. **Split**: `Arena -> Vec<Page>` (self-contained pages under a byte limit, tweens relocated)
//! 3. **Compile**: [`Script`] + [`SplitMap`] -> [`CompiledChoreography`] (timed event stream
//!    with a scene index)
//! 4. **Bundle**: compiled stream + referenced files -> [`Container`]
//!
//! Decoding and packing are pure functions of their input bytes. File IO happens only in the
//! `load`/`save`/`write` helpers and the `choreopack` binary.
#![forbid(unsafe_code)]

mod arena;
mod assets;
mod choreography;
mod codec;
mod foundation;
mod pack;

pub use arena::builder::{build_arena, build_arena_partial, read_frame_table};
pub use arena::model::Arena;
pub use arena::packed::PACKED_SUFFIX;
pub use assets::container::{
    CONTAINER_MAGIC, Container, ContainerView, NO_CHOREOGRAPHY, normalize_rel_path,
};
pub use assets::sink::AssetSink;
pub use choreography::compiler::{
    ChoreographyEvent, CompileSettings, CompiledChoreography, DEFAULT_MS_PER_FRAME, Script,
    compile,
};
pub use choreography::directive::{
    AlternateAnimatedArgs, AlternatePaletteArgs, AnimArgs, ClearArgs, Directive, Effect, EndArgs,
    FadeToArgs, IlbmArgs, IlbmDisplay, LoadFontArgs, MbitArgs, ModArgs, PaletteArgs, PauseArgs,
    PlaneMode, PlaneSelect, SceneArgs, SceneOptionsArgs, SoundArgs, SplitAnimArgs,
    UseAlternatePaletteArgs,
};
pub use choreography::encode::{
    CommandTag, CompilerState, EncodeContext, Encoded, encode_directive, text_block,
};
pub use choreography::preprocess::{
    expand_split_anim, expand_strobe, insert_scene_ends, preprocess,
};
pub use choreography::scene_index::{SENTINEL_MS, SceneEntry, SceneIndex};
pub use codec::command::{
    CommandGroup, DrawCommand, Tween, Vector, is_tween_opcode, is_vector_opcode,
};
pub use codec::group::{decode_group, decode_group_at, encode_group, encode_group_into};
pub use foundation::cursor::{ByteCursor, ByteOrder};
pub use foundation::error::{ChoreoError, ChoreoResult, FormatError, PackError};
pub use pack::config::{DEFAULT_PAGE_LIMIT, PackConfig};
pub use pack::packer::{page_file_name, page_name, split, split_many};
pub use pack::page::{Offer, Page, PageBuilder, parse_page, validate_page};
pub use pack::split_map::{SPLIT_MAP_FILE, SplitMap};
