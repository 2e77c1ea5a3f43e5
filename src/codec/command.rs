use crate::foundation::error::{ChoreoResult, FormatError};

/// Opcodes that introduce a tween command.
pub const TWEEN_OPCODES: [u8; 4] = [0xE6, 0xE7, 0xE8, 0xF2];
/// Fixed tween payload: two `u16` deltas and two `u8` step fields.
pub const TWEEN_PAYLOAD_LEN: usize = 6;
/// Bytes from a tween's payload position to the end of its delta pair.
pub const TWEEN_TO_BIAS: i64 = 2;

const VECTOR_FAMILY: u8 = 0xD0;

pub fn is_vector_opcode(opcode: u8) -> bool {
    opcode & 0xF0 == VECTOR_FAMILY
}

pub fn is_tween_opcode(opcode: u8) -> bool {
    TWEEN_OPCODES.contains(&opcode)
}

#[derive(Clone, Debug, Eq)]
/// Polygon outline command.
pub struct Vector {
    opcode: u8,
    points: Vec<(u8, u8)>,
    points_position: Option<usize>,
}

impl Vector {
    /// Build a vector command from a full opcode byte (`0xD0..=0xDF`).
    pub fn new(opcode: u8, points: Vec<(u8, u8)>) -> ChoreoResult<Self> {
        if !is_vector_opcode(opcode) {
            return Err(FormatError::InvalidCommand(format!(
                "0x{opcode:02x} is not a vector opcode"
            ))
            .into());
        }
        if points.len() > u8::MAX as usize {
            return Err(FormatError::InvalidCommand(format!(
                "vector has {} points, at most 255 fit",
                points.len()
            ))
            .into());
        }
        Ok(Self {
            opcode,
            points,
            points_position: None,
        })
    }

    pub(crate) fn decoded(opcode: u8, points: Vec<(u8, u8)>, points_position: usize) -> Self {
        Self {
            opcode,
            points,
            points_position: Some(points_position),
        }
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Low nibble of the opcode.
    pub fn minor_opcode(&self) -> u8 {
        self.opcode & 0x0F
    }

    pub fn points(&self) -> &[(u8, u8)] {
        &self.points
    }

    /// Source offset just past the point-count byte, when decoded from a stream.
    pub fn points_position(&self) -> Option<usize> {
        self.points_position
    }

    pub fn encoded_len(&self) -> usize {
        2 + 2 * self.points.len()
    }
}

// points_position is diagnostic only
impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.opcode == other.opcode && self.points == other.points
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Interpolation between two commands addressed relative to this one.
///
/// The deltas are relative to the tween's payload position `p` (the byte after the opcode):
/// the source command is at `p - from_delta` and the destination at `p + to_delta + 2`.
pub struct Tween {
    opcode: u8,
    from_delta: u16,
    to_delta: u16,
    step: u8,
    total_steps: u8,
}

impl Tween {
    pub fn new(
        opcode: u8,
        from_delta: u16,
        to_delta: u16,
        step: u8,
        total_steps: u8,
    ) -> ChoreoResult<Self> {
        if !is_tween_opcode(opcode) {
            return Err(FormatError::InvalidCommand(format!(
                "0x{opcode:02x} is not a tween opcode"
            ))
            .into());
        }
        Ok(Self {
            opcode,
            from_delta,
            to_delta,
            step,
            total_steps,
        })
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn minor_opcode(&self) -> u8 {
        self.opcode & 0x0F
    }

    pub fn from_delta(&self) -> u16 {
        self.from_delta
    }

    pub fn to_delta(&self) -> u16 {
        self.to_delta
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn total_steps(&self) -> u8 {
        self.total_steps
    }

    /// Absolute source and destination offsets for a payload located at `payload_pos`.
    pub fn targets(&self, payload_pos: i64) -> (i64, i64) {
        (
            payload_pos - i64::from(self.from_delta),
            payload_pos + i64::from(self.to_delta) + TWEEN_TO_BIAS,
        )
    }

    /// Same tween re-addressed so that, at `payload_pos`, it resolves to `from` and `to`.
    ///
    /// Returns `None` when the required deltas do not fit in `u16`.
    pub fn retargeted(&self, payload_pos: i64, from: i64, to: i64) -> Option<Self> {
        let from_delta = u16::try_from(payload_pos - from).ok()?;
        let to_delta = u16::try_from(to - payload_pos - TWEEN_TO_BIAS).ok()?;
        Some(Self {
            from_delta,
            to_delta,
            ..*self
        })
    }

    pub fn encoded_len(&self) -> usize {
        1 + TWEEN_PAYLOAD_LEN
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One draw command.
pub enum DrawCommand {
    Vector(Vector),
    Tween(Tween),
}

impl DrawCommand {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Vector(v) => v.opcode(),
            Self::Tween(t) => t.opcode(),
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Vector(v) => v.encoded_len(),
            Self::Tween(t) => t.encoded_len(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Count-prefixed batch of draw commands addressed by one frame entry.
pub struct CommandGroup {
    commands: Vec<DrawCommand>,
}

impl CommandGroup {
    pub fn new(commands: Vec<DrawCommand>) -> ChoreoResult<Self> {
        if commands.len() > u8::MAX as usize {
            return Err(FormatError::InvalidCommand(format!(
                "group has {} commands, at most 255 fit",
                commands.len()
            ))
            .into());
        }
        Ok(Self { commands })
    }

    pub(crate) fn from_decoded(commands: Vec<DrawCommand>) -> Self {
        Self { commands }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn has_tween(&self) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Tween(_)))
    }

    /// Serialized length: count byte plus every command.
    pub fn encoded_len(&self) -> usize {
        1 + self
            .commands
            .iter()
            .map(DrawCommand::encoded_len)
            .sum::<usize>()
    }

    /// Tweens paired with their payload offset relative to the group start.
    pub fn tween_sites(&self) -> Vec<(usize, &Tween)> {
        let mut out = Vec::new();
        let mut at = 1usize;
        for cmd in &self.commands {
            if let DrawCommand::Tween(t) = cmd {
                out.push((at + 1, t));
            }
            at += cmd.encoded_len();
        }
        out
    }

    /// Rebuild the group with every tween replaced by `f(payload_offset, tween)`.
    pub fn map_tweens<F>(&self, mut f: F) -> ChoreoResult<Self>
    where
        F: FnMut(usize, &Tween) -> ChoreoResult<Tween>,
    {
        let mut at = 1usize;
        let mut commands = Vec::with_capacity(self.commands.len());
        for cmd in &self.commands {
            let next = match cmd {
                DrawCommand::Tween(t) => DrawCommand::Tween(f(at + 1, t)?),
                DrawCommand::Vector(_) => cmd.clone(),
            };
            at += cmd.encoded_len();
            commands.push(next);
        }
        Ok(Self { commands })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/command.rs"]
mod tests;
