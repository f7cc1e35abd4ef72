//! SSA instructions.
//!
//! Instructions live in the graph's arena and reference each other by [`InstId`]. An
//! instruction owns its ordered input list; the inverse user list is maintained by the
//! graph's mutation API so the two views never diverge. Payload fields (`cc`, `imm`,
//! `operands_ty`) are stored inline and are meaningful only for opcodes whose
//! [`OpProps`](crate::ir::OpProps) say so; the accessors check that in debug builds.

use std::fmt;

use crate::ir::{BlockId, ConditionCode, DataType, OpProps, Opcode};

/// Arena index of an instruction within its [`Graph`](crate::ir::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(usize);

impl InstId {
    /// Creates an id from a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> InstId {
        InstId(index)
    }

    /// The raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A single SSA instruction.
///
/// Structural mutation (inputs, users, block membership) goes through
/// [`Graph`](crate::ir::Graph) so that def-use links stay consistent; this type only
/// exposes read access plus crate-internal raw setters.
#[derive(Debug, Clone)]
pub struct Inst {
    id: InstId,
    opcode: Opcode,
    ty: DataType,
    /// Owning block, `None` once the instruction has been unlinked.
    block: Option<BlockId>,
    inputs: Vec<InstId>,
    /// Instructions using this one; contains one entry per use, so an instruction
    /// consuming this value twice appears twice.
    users: Vec<InstId>,
    cc: ConditionCode,
    imm: i64,
    operands_ty: DataType,
}

impl Inst {
    pub(crate) fn new(id: InstId, opcode: Opcode, ty: DataType) -> Inst {
        Inst {
            id,
            opcode,
            ty,
            block: None,
            inputs: Vec::new(),
            users: Vec::new(),
            cc: ConditionCode::Eq,
            imm: 0,
            operands_ty: ty,
        }
    }

    /// This instruction's arena id.
    #[must_use]
    pub fn id(&self) -> InstId {
        self.id
    }

    /// The operation performed.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Result type.
    #[must_use]
    pub fn ty(&self) -> DataType {
        self.ty
    }

    /// The block currently containing this instruction, or `None` if it has been
    /// unlinked by a transformation.
    #[must_use]
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Ordered operand list. For phis the order matches the owning block's
    /// predecessor list.
    #[must_use]
    pub fn inputs(&self) -> &[InstId] {
        &self.inputs
    }

    /// The `index`-th operand.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub fn input(&self, index: usize) -> InstId {
        self.inputs[index]
    }

    /// Every instruction consuming this value, one entry per use.
    #[must_use]
    pub fn users(&self) -> &[InstId] {
        &self.users
    }

    /// Whether any instruction still consumes this value.
    #[must_use]
    pub fn has_users(&self) -> bool {
        !self.users.is_empty()
    }

    /// Whether exactly one use of this value exists.
    #[must_use]
    pub fn has_single_user(&self) -> bool {
        self.users.len() == 1
    }

    /// Whether this is an integer/float literal (the null literal is separate).
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.opcode == Opcode::Constant
    }

    /// Condition code payload (compare/branch/select family).
    #[must_use]
    pub fn cc(&self) -> ConditionCode {
        debug_assert!(
            self.opcode.props().contains(OpProps::HAS_CC),
            "{:?} carries no condition code",
            self.opcode
        );
        self.cc
    }

    /// Immediate payload. For `Constant` this is the literal value (bit pattern for
    /// float constants).
    #[must_use]
    pub fn imm(&self) -> i64 {
        debug_assert!(
            self.opcode.props().contains(OpProps::HAS_IMM),
            "{:?} carries no immediate",
            self.opcode
        );
        self.imm
    }

    /// Type of the compared operands (compare/branch/select family), which may differ
    /// from the result type.
    #[must_use]
    pub fn operands_ty(&self) -> DataType {
        debug_assert!(
            self.opcode.props().contains(OpProps::HAS_CC),
            "{:?} carries no compared-operand type",
            self.opcode
        );
        self.operands_ty
    }

    pub(crate) fn set_block(&mut self, block: Option<BlockId>) {
        self.block = block;
    }

    pub(crate) fn set_cc(&mut self, cc: ConditionCode) {
        self.cc = cc;
    }

    pub(crate) fn set_imm(&mut self, imm: i64) {
        self.imm = imm;
    }

    pub(crate) fn set_operands_ty(&mut self, ty: DataType) {
        self.operands_ty = ty;
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut Vec<InstId> {
        &mut self.inputs
    }

    pub(crate) fn users_mut(&mut self) -> &mut Vec<InstId> {
        &mut self.users
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:?} {:?}", self.id, self.opcode, self.ty)?;
        if !self.inputs.is_empty() {
            write!(f, " (")?;
            for (i, input) in self.inputs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{input}")?;
            }
            write!(f, ")")?;
        }
        let props = self.opcode.props();
        if props.contains(OpProps::HAS_CC) {
            write!(f, " {} {:?}", self.cc, self.operands_ty)?;
        }
        if props.contains(OpProps::HAS_IMM) {
            write!(f, " imm {}", self.imm)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Inst, InstId};
    use crate::ir::{ConditionCode, DataType, Opcode};

    #[test]
    fn test_inst_ids_display_as_values() {
        assert_eq!(InstId::new(7).to_string(), "v7");
    }

    #[test]
    fn test_new_inst_is_detached() {
        let inst = Inst::new(InstId::new(0), Opcode::Add, DataType::I32);
        assert!(inst.block().is_none());
        assert!(inst.inputs().is_empty());
        assert!(!inst.has_users());
    }

    #[test]
    fn test_display_includes_payloads() {
        let mut inst = Inst::new(InstId::new(3), Opcode::IfImm, DataType::Void);
        inst.set_cc(ConditionCode::Ne);
        inst.set_imm(0);
        inst.set_operands_ty(DataType::Bool);
        inst.inputs_mut().push(InstId::new(1));
        let text = inst.to_string();
        assert!(text.contains("v3"));
        assert!(text.contains("NE"));
        assert!(text.contains("imm 0"));
    }
}
