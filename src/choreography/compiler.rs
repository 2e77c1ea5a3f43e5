use std::path::Path;

use anyhow::Context;

use crate::{
    assets::sink::AssetSink,
    choreography::directive::Directive,
    choreography::encode::{CompilerState, EncodeContext, encode_directive},
    choreography::preprocess::preprocess,
    choreography::scene_index::{SceneEntry, SceneIndex},
    foundation::cursor::ByteOrder,
    foundation::error::{ChoreoError, ChoreoResult},
    pack::split_map::SplitMap,
};

/// Default duration of one animation frame (25 fps).
pub const DEFAULT_MS_PER_FRAME: u32 = 40;

fn default_ms_per_frame() -> u32 {
    DEFAULT_MS_PER_FRAME
}

fn default_anim_dir() -> String {
    "data".to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// Compilation settings carried by a script.
pub struct CompileSettings {
    /// Frame duration until the first scene sets its own.
    #[serde(default = "default_ms_per_frame")]
    pub ms_per_frame: u32,
    /// Byte order of the emitted stream.
    #[serde(default)]
    pub byte_order: ByteOrder,
    /// Directory, relative to the asset root, holding packed animations and the split map.
    #[serde(default = "default_anim_dir")]
    pub anim_dir: String,
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            ms_per_frame: DEFAULT_MS_PER_FRAME,
            byte_order: ByteOrder::Little,
            anim_dir: default_anim_dir(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// A declarative choreography script.
pub struct Script {
    #[serde(default)]
    pub settings: CompileSettings,
    pub directives: Vec<Directive>,
}

impl Script {
    /// Parse a script; any JSON or schema failure is a configuration error.
    pub fn from_json(s: &str) -> ChoreoResult<Self> {
        serde_json::from_str(s).map_err(|e| ChoreoError::config(format!("invalid script: {e}")))
    }

    pub fn load(path: &Path) -> ChoreoResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read script '{}'", path.display()))?;
        Self::from_json(&s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One timed record of the compiled stream.
pub struct ChoreographyEvent {
    pub start_ms: u32,
    pub duration_ms: u32,
    /// Directive name the event came from.
    pub kind: &'static str,
    /// Payload, command tag first.
    pub payload: Vec<u8>,
}

impl ChoreographyEvent {
    /// Record length including the eight-byte header.
    pub fn encoded_len(&self) -> u32 {
        (self.payload.len() + 8) as u32
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Compiled stream: the scene index followed by the event records.
pub struct CompiledChoreography {
    pub byte_order: ByteOrder,
    pub scene_index: SceneIndex,
    pub events: Vec<ChoreographyEvent>,
}

impl CompiledChoreography {
    /// Total running time in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        self.events
            .last()
            .map(|e| e.start_ms + e.duration_ms)
            .unwrap_or(0)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let order = self.byte_order;
        let mut out = Vec::new();
        self.scene_index.write(order, &mut out);
        for e in &self.events {
            order.put_u32(&mut out, e.start_ms);
            order.put_u32(&mut out, e.encoded_len());
            out.extend_from_slice(&e.payload);
        }
        out
    }
}

/// Compile a directive list into a timed event stream.
///
/// Events are laid end to end: each starts where the previous one's duration ends.
#[tracing::instrument(skip_all, fields(directives = directives.len()))]
pub fn compile(
    directives: &[Directive],
    settings: &CompileSettings,
    split_map: &SplitMap,
    assets: &mut dyn AssetSink,
) -> ChoreoResult<CompiledChoreography> {
    let expanded = preprocess(directives, split_map)?;
    tracing::debug!(expanded = expanded.len(), "preprocessed");

    let mut ctx = EncodeContext {
        assets,
        anim_dir: &settings.anim_dir,
        byte_order: settings.byte_order,
        default_ms_per_frame: settings.ms_per_frame,
    };
    let mut state = CompilerState {
        ms_per_frame: settings.ms_per_frame,
    };
    let mut events: Vec<ChoreographyEvent> = Vec::with_capacity(expanded.len());
    let mut scenes = Vec::new();
    let mut clock = 0u32;
    let mut position = 0u32;

    for (index, directive) in expanded.iter().enumerate() {
        let kind = directive.kind();
        let (next, encoded) = encode_directive(directive, state, &mut ctx)
            .map_err(|e| e.in_directive(index, kind))?;
        state = next;

        let start_ms = clock;
        clock = clock.checked_add(encoded.duration_ms).ok_or_else(|| {
            ChoreoError::config("timeline exceeds u32 milliseconds").in_directive(index, kind)
        })?;
        if let Directive::Scene(args) = directive {
            scenes.push(SceneEntry {
                ms: clock,
                offset: position,
                name: args.name.clone(),
            });
        }
        tracing::debug!(index, kind, start_ms, duration = encoded.duration_ms, "event");

        let event = ChoreographyEvent {
            start_ms,
            duration_ms: encoded.duration_ms,
            kind,
            payload: encoded.payload,
        };
        position += event.encoded_len();
        events.push(event);
    }

    let scene_index = SceneIndex::build(scenes, position);
    tracing::info!(
        events = events.len(),
        scenes = scene_index.scenes().len(),
        duration_ms = clock,
        "choreography compiled"
    );
    Ok(CompiledChoreography {
        byte_order: settings.byte_order,
        scene_index,
        events,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/choreography/compiler.rs"]
mod tests;
