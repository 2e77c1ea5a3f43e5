use crate::{
    codec::command::{CommandGroup, DrawCommand, Tween, Vector, is_tween_opcode, is_vector_opcode},
    foundation::cursor::ByteCursor,
    foundation::error::{ChoreoResult, FormatError},
};

/// Decode one count-prefixed command group at the cursor position.
///
/// Tween payloads are always big-endian, independent of the byte order chosen for page headers.
pub fn decode_group(cursor: &mut ByteCursor<'_>) -> ChoreoResult<CommandGroup> {
    let count = cursor.read_u8()?;
    let mut commands = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let position = cursor.position();
        let opcode = cursor.read_u8()?;
        let cmd = if is_vector_opcode(opcode) {
            let n = cursor.read_u8()? as usize;
            let points_position = cursor.position();
            let raw = cursor.read_bytes(2 * n)?;
            let points = raw.chunks_exact(2).map(|xy| (xy[0], xy[1])).collect();
            DrawCommand::Vector(Vector::decoded(opcode, points, points_position))
        } else if is_tween_opcode(opcode) {
            let from_delta = cursor.read_u16_be()?;
            let to_delta = cursor.read_u16_be()?;
            let step = cursor.read_u8()?;
            let total_steps = cursor.read_u8()?;
            DrawCommand::Tween(Tween::new(opcode, from_delta, to_delta, step, total_steps)?)
        } else {
            return Err(FormatError::UnknownOpcode { opcode, position }.into());
        };
        commands.push(cmd);
    }
    Ok(CommandGroup::from_decoded(commands))
}

/// Decode a group starting at `offset` in `buf`.
pub fn decode_group_at(buf: &[u8], offset: usize) -> ChoreoResult<CommandGroup> {
    let mut cursor = ByteCursor::at(buf, offset)?;
    decode_group(&mut cursor)
}

pub fn encode_group(group: &CommandGroup) -> Vec<u8> {
    let mut out = Vec::with_capacity(group.encoded_len());
    encode_group_into(group, &mut out);
    out
}

pub fn encode_group_into(group: &CommandGroup, out: &mut Vec<u8>) {
    out.push(group.len() as u8);
    for cmd in group.commands() {
        match cmd {
            DrawCommand::Vector(v) => {
                out.push(v.opcode());
                out.push(v.points().len() as u8);
                for &(x, y) in v.points() {
                    out.push(x);
                    out.push(y);
                }
            }
            DrawCommand::Tween(t) => {
                out.push(t.opcode());
                out.extend_from_slice(&t.from_delta().to_be_bytes());
                out.extend_from_slice(&t.to_delta().to_be_bytes());
                out.push(t.step());
                out.push(t.total_steps());
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/group.rs"]
mod tests;
