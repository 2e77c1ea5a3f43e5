pub type ChoreoResult<T> = Result<T, ChoreoError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Violations of the source bytecode or of a derived binary layout.
pub enum FormatError {
    /// An opcode outside the vector/tween families.
    #[error("unknown opcode 0x{opcode:02x} at offset {position}")]
    UnknownOpcode {
        /// Offending opcode byte.
        opcode: u8,
        /// Offset of the opcode byte within the stream.
        position: usize,
    },
    /// A read ran past the end of the buffer.
    #[error("truncated stream at offset {position}: wanted {wanted} bytes, {available} available")]
    Truncated {
        /// Offset the read started at.
        position: usize,
        /// Bytes requested.
        wanted: usize,
        /// Bytes left in the buffer.
        available: usize,
    },
    /// A frame or blob offset points outside its buffer.
    #[error("offset {offset} out of range for buffer of {len} bytes")]
    OffsetOutOfRange {
        /// Requested offset.
        offset: usize,
        /// Buffer length.
        len: usize,
    },
    /// The frame table references no frames.
    #[error("frame table is empty")]
    EmptyFrameTable,
    /// The arena cannot be addressed with 16-bit offsets.
    #[error("arena of {len} bytes exceeds 16-bit addressing")]
    ArenaTooLarge {
        /// Arena length in bytes.
        len: usize,
    },
    /// A command value that cannot be encoded.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    /// A container did not start with the expected magic tag.
    #[error("bad container magic")]
    BadMagic,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Infeasible or invalid page layouts.
pub enum PackError {
    /// One group plus the minimal index overhead does not fit in a page.
    #[error("group at offset {offset} needs {needed} bytes, page limit is {limit}")]
    GroupTooLarge {
        /// Arena offset of the group.
        offset: u32,
        /// Page bytes needed to hold just this group.
        needed: usize,
        /// Configured page limit.
        limit: usize,
    },
    /// Rewinding emptied the page, so there is nothing to flush.
    #[error("page {page}: no rewind target before frame {frame}")]
    NoRewindTarget {
        /// Page number being assembled.
        page: usize,
        /// Frame-sequence index that overflowed.
        frame: usize,
    },
    /// A tween target lives in a group that is not part of the page.
    #[error("page {page}: tween at arena offset {offset} targets {target}, outside the page")]
    TweenOutOfPage {
        /// Page number.
        page: usize,
        /// Arena offset of the tween payload.
        offset: u32,
        /// Arena offset the tween resolves to.
        target: i64,
    },
    /// A tween target does not land inside any decoded group.
    #[error("tween at offset {offset} targets {target}, which is not inside any group")]
    UnresolvedTween {
        /// Offset of the tween payload.
        offset: u32,
        /// Resolved target offset.
        target: i64,
    },
    /// Relocated tween deltas no longer fit their 16-bit fields.
    #[error("page {page}: tween at arena offset {offset} cannot be re-addressed")]
    RelocationOverflow {
        /// Page number.
        page: usize,
        /// Arena offset of the tween payload.
        offset: u32,
    },
    /// A serialized page exceeds the configured limit.
    #[error("page {page} is {len} bytes, limit is {limit}")]
    PageOverflow {
        /// Page number.
        page: usize,
        /// Serialized length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },
    /// The page limit cannot hold a header or exceeds 16-bit addressing.
    #[error("page limit {limit} must be within 8..=65535")]
    InvalidLimit {
        /// Requested limit.
        limit: usize,
    },
}

#[derive(thiserror::Error, Debug)]
/// Crate-wide error type.
pub enum ChoreoError {
    /// Malformed bytecode or binary layout.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// The packer could not produce a valid page.
    #[error("packing error: {0}")]
    Packing(#[from] PackError),

    /// A play range is not covered by the known page table.
    #[error("range error: {0}")]
    Range(String),

    /// A referenced asset could not be resolved.
    #[error("asset error: {0}")]
    Asset(String),

    /// Script or settings are invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Failure while processing one named animation.
    #[error("animation '{name}': {source}")]
    InAnimation {
        /// Animation name.
        name: String,
        /// Underlying error.
        source: Box<ChoreoError>,
    },

    /// Failure while compiling one directive.
    #[error("directive #{index} ({kind}): {source}")]
    InDirective {
        /// Position of the directive in the preprocessed list.
        index: usize,
        /// Directive name.
        kind: &'static str,
        /// Underlying error.
        source: Box<ChoreoError>,
    },

    /// I/O and other context-carrying failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChoreoError {
    /// Build a [`ChoreoError::Range`].
    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    /// Build a [`ChoreoError::Asset`].
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`ChoreoError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ChoreoError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Attach the name of the animation being processed.
    pub fn in_animation(self, name: impl Into<String>) -> Self {
        Self::InAnimation {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Attach the index and kind of the directive being compiled.
    pub fn in_directive(self, index: usize, kind: &'static str) -> Self {
        Self::InDirective {
            index,
            kind,
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for ChoreoError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
