//! Encoding of the action cells.
//!
//! Every cell of the parse table is a `u16` storing `operand << ACTION_BITS | action`.
//! Special cells (accept, error and conflict resolvers) use the two low bits of
//! their operand as a sub-kind, and the remaining bits as the resolver index.

pub const ACTION_BITS: u32 = 2;

/// Bit mask to obtain kind of action.
pub const MASK: u16 = 0x0003;

/// The largest operand value that fits into a cell.
pub const MAX_OPERAND: u16 = 0x3fff;

/// The largest resolver index that fits into a special operand.
pub const MAX_RESOLVER: u16 = MAX_OPERAND >> 2;

pub const SHIFT: u16 = 0;
pub const REDUCE: u16 = 1;
pub const SPECIAL: u16 = 2;
pub const SKIP: u16 = 3;

pub const SPECIAL_ACCEPT: u16 = 0;
pub const SPECIAL_ERROR: u16 = 1;
pub const SPECIAL_CONFLICT: u16 = 2;

pub const ERROR: u16 = create_value(SPECIAL, SPECIAL_ERROR);
pub const ACCEPT: u16 = create_value(SPECIAL, SPECIAL_ACCEPT);

#[inline]
pub const fn create_value(action: u16, operand: u16) -> u16 {
    action | operand << ACTION_BITS
}

#[inline]
pub const fn get_action(value: u16) -> u16 {
    value & MASK
}

#[inline]
pub const fn get_operand(value: u16) -> u16 {
    value >> ACTION_BITS
}

/// The decoded form of an action cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParseAction {
    /// Consume the lookahead symbol and move to the specified state.
    /// On a nonterminal column this is the goto after a reduction.
    Shift(u16),

    /// Reduce by the specified production.
    Reduce(u16),

    Accept,

    /// Discard the lookahead terminal (whitespace).
    Skip,

    Error,

    /// Consult the conflict resolver with the specified index.
    Resolve(u16),
}

impl ParseAction {
    pub const fn decode(value: u16) -> Self {
        let operand = get_operand(value);
        match get_action(value) {
            SHIFT => Self::Shift(operand),
            REDUCE => Self::Reduce(operand),
            SKIP => Self::Skip,
            _ => match operand & MASK {
                SPECIAL_ACCEPT => Self::Accept,
                SPECIAL_CONFLICT => Self::Resolve(operand >> ACTION_BITS),
                _ => Self::Error,
            },
        }
    }

    pub const fn encode(self) -> u16 {
        match self {
            Self::Shift(next) => create_value(SHIFT, next),
            Self::Reduce(production) => create_value(REDUCE, production),
            Self::Accept => ACCEPT,
            Self::Skip => create_value(SKIP, 0),
            Self::Error => ERROR,
            Self::Resolve(index) => {
                create_value(SPECIAL, SPECIAL_CONFLICT | index << ACTION_BITS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_uses_high_bits() {
        let value = create_value(REDUCE, 0x1234);
        assert_eq!(get_action(value), REDUCE);
        assert_eq!(get_operand(value), 0x1234);

        let value = create_value(SHIFT, MAX_OPERAND);
        assert_eq!(value, 0xfffc);
        assert_eq!(get_operand(value), MAX_OPERAND);
    }

    #[test]
    fn special_cells_are_distinct() {
        let cells = [
            ParseAction::Accept.encode(),
            ParseAction::Error.encode(),
            ParseAction::Skip.encode(),
            ParseAction::Resolve(0).encode(),
            ParseAction::Resolve(MAX_RESOLVER).encode(),
        ];
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(ParseAction::decode(ERROR), ParseAction::Error);
        assert_eq!(
            ParseAction::decode(ParseAction::Resolve(MAX_RESOLVER).encode()),
            ParseAction::Resolve(MAX_RESOLVER)
        );
    }
}
