use thiserror::Error;

/// Fatal errors raised by construction of a [`crate::machine::Machine`] or by
/// attaching a target to a [`crate::state::KnittingState`].
///
/// `OperationRejected` from spec §7 has no variant here: a rejected
/// `rack`/`transfer` is routine, expected control flow reported as a
/// `bool`, not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KnittingError {
    #[error("racking bounds [{min}, {max}] do not fit within a machine of width {width}")]
    InvalidMachine { width: usize, min: i32, max: i32 },

    #[error("initial racking {racking} is outside bounds [{min}, {max}]")]
    InvalidRacking { racking: i32, min: i32, max: i32 },

    #[error("target state has a non-identity residual braid, or a needle straddles two destinations")]
    InvalidTargetState,

    #[error("braid rank {0} does not correspond to any loop-bearing needle")]
    InvalidBraidRank(usize),
}

pub type Result<T> = std::result::Result<T, KnittingError>;
