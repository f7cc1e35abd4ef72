//! Instruction opcodes and their static capability flags.
//!
//! Pass dispatch is a plain `match` over [`Opcode`]; per-opcode capabilities that several
//! passes consult (may it move across a branch? does it terminate a block? which payload
//! fields are meaningful?) live in one dense [`OpProps`] table instead of being re-derived
//! ad hoc at each use site.

use bitflags::bitflags;
use strum::{EnumCount, EnumIter};

/// Operation performed by an [`Inst`](crate::ir::Inst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum Opcode {
    /// Integer/float literal; the raw value lives in the instruction's `imm` payload
    /// (bit pattern for floats). Constants reside in the start block.
    Constant,
    /// The null reference literal. Singleton, resides in the start block.
    NullPtr,
    /// Incoming method parameter. Resides in the start block.
    Parameter,
    /// SSA join: selects the input matching the predecessor control arrived from.
    /// Inputs align positionally with the owning block's predecessor list.
    Phi,
    /// Relational test of two operands producing a `Bool` (`cc` + `operands_ty` payloads).
    Compare,
    /// Two-operand conditional branch (`cc` + `operands_ty`). Terminator.
    If,
    /// Conditional branch of one operand against an immediate (`cc`, `imm`,
    /// `operands_ty`). Terminator.
    IfImm,
    /// Branchless choice: inputs `[v_true, v_false, cmp_op0, cmp_op1]` with `cc` and
    /// `operands_ty` describing the comparison.
    Select,
    /// Branchless choice against an immediate: inputs `[v_true, v_false, cond_op]`
    /// with `cc`, `imm` and `operands_ty`.
    SelectImm,

    /// Two's-complement addition.
    Add,
    /// Two's-complement subtraction.
    Sub,
    /// Two's-complement multiplication.
    Mul,
    /// Division. May trap on zero divisor, hence never speculated.
    Div,
    /// Remainder. May trap on zero divisor, hence never speculated.
    Mod,
    /// Arithmetic negation.
    Neg,
    /// Bitwise complement.
    Not,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive or.
    Xor,
    /// Shift left.
    Shl,
    /// Logical shift right.
    Shr,
    /// Arithmetic shift right.
    AShr,

    /// Addition with an immediate second operand.
    AddI,
    /// Subtraction with an immediate second operand.
    SubI,
    /// Bitwise and with an immediate second operand.
    AndI,
    /// Bitwise or with an immediate second operand.
    OrI,
    /// Bitwise exclusive or with an immediate second operand.
    XorI,
    /// Shift left by an immediate amount.
    ShlI,
    /// Logical shift right by an immediate amount.
    ShrI,
    /// Arithmetic shift right by an immediate amount.
    AShrI,

    /// Array allocation; input is the element count. Result is provably non-null.
    NewArray,
    /// Object allocation. Result is provably non-null.
    NewObject,
    /// Null guard: passes its reference input through, trapping on null.
    NullCheck,
    /// Array length read. Result is a non-negative `I32`.
    LenArray,
    /// Static call. Inputs are the arguments.
    CallStatic,

    /// Return a value. Terminator of an exit-bound block.
    Return,
    /// Return without a value. Terminator.
    ReturnVoid,
    /// Return an immediate value (`imm` payload). Terminator.
    ReturnI,
}

bitflags! {
    /// Static capability flags of an opcode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpProps: u16 {
        /// Safe to hoist out of a conditionally executed block during if-conversion
        /// (no traps, no side effects, no control dependence).
        const IFCVT = 0x0001;
        /// Ends a basic block.
        const TERMINATOR = 0x0002;
        /// Operand order does not affect the result.
        const COMMUTATIVE = 0x0004;
        /// Allocates a managed object; the result is never null.
        const ALLOCATION = 0x0008;
        /// Transfers control out of the method.
        const CALL = 0x0010;
        /// The `imm` payload is meaningful.
        const HAS_IMM = 0x0020;
        /// The `cc` and `operands_ty` payloads are meaningful.
        const HAS_CC = 0x0040;
    }
}

impl Opcode {
    /// The dense capability table for this opcode.
    #[must_use]
    pub fn props(self) -> OpProps {
        match self {
            Opcode::Constant => OpProps::HAS_IMM,
            Opcode::NullPtr | Opcode::Parameter | Opcode::Phi => OpProps::empty(),
            Opcode::Compare => OpProps::IFCVT.union(OpProps::HAS_CC),
            Opcode::If => OpProps::TERMINATOR.union(OpProps::HAS_CC),
            Opcode::IfImm => OpProps::TERMINATOR
                .union(OpProps::HAS_CC)
                .union(OpProps::HAS_IMM),
            Opcode::Select => OpProps::IFCVT.union(OpProps::HAS_CC),
            Opcode::SelectImm => OpProps::IFCVT
                .union(OpProps::HAS_CC)
                .union(OpProps::HAS_IMM),
            Opcode::Add | Opcode::Mul => OpProps::IFCVT.union(OpProps::COMMUTATIVE),
            Opcode::And | Opcode::Or | Opcode::Xor => OpProps::IFCVT.union(OpProps::COMMUTATIVE),
            Opcode::Sub
            | Opcode::Neg
            | Opcode::Not
            | Opcode::Shl
            | Opcode::Shr
            | Opcode::AShr => OpProps::IFCVT,
            Opcode::AddI
            | Opcode::SubI
            | Opcode::AndI
            | Opcode::OrI
            | Opcode::XorI
            | Opcode::ShlI
            | Opcode::ShrI
            | Opcode::AShrI => OpProps::IFCVT.union(OpProps::HAS_IMM),
            Opcode::Div | Opcode::Mod => OpProps::empty(),
            Opcode::NewArray | Opcode::NewObject => OpProps::ALLOCATION,
            Opcode::NullCheck | Opcode::LenArray => OpProps::empty(),
            Opcode::CallStatic => OpProps::CALL,
            Opcode::Return | Opcode::ReturnVoid => OpProps::TERMINATOR,
            Opcode::ReturnI => OpProps::TERMINATOR.union(OpProps::HAS_IMM),
        }
    }

    /// Whether if-conversion may move this instruction into its branching predecessor.
    #[must_use]
    pub fn is_if_convertible(self) -> bool {
        self.props().contains(OpProps::IFCVT)
    }

    /// Whether this opcode ends a basic block.
    #[must_use]
    pub fn is_terminator(self) -> bool {
        self.props().contains(OpProps::TERMINATOR)
    }

    /// Whether operand order is irrelevant.
    #[must_use]
    pub fn is_commutative(self) -> bool {
        self.props().contains(OpProps::COMMUTATIVE)
    }

    /// Whether the result is an allocation (and therefore never null).
    #[must_use]
    pub fn is_allocation(self) -> bool {
        self.props().contains(OpProps::ALLOCATION)
    }

    /// The immediate-operand form of a binary ALU opcode, if one exists.
    ///
    /// Lowering uses this to rewrite `op(x, const)` into the immediate encoding.
    #[must_use]
    pub fn imm_form(self) -> Option<Opcode> {
        match self {
            Opcode::Add => Some(Opcode::AddI),
            Opcode::Sub => Some(Opcode::SubI),
            Opcode::And => Some(Opcode::AndI),
            Opcode::Or => Some(Opcode::OrI),
            Opcode::Xor => Some(Opcode::XorI),
            Opcode::Shl => Some(Opcode::ShlI),
            Opcode::Shr => Some(Opcode::ShrI),
            Opcode::AShr => Some(Opcode::AShrI),
            _ => None,
        }
    }
}
