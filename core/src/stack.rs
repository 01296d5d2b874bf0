use crate::constants::STACK_SIZE;
use crate::error::CpuError;

/// # Stack
/// Return addresses for up to 16 nested subroutine calls.
///
/// `sp` counts the entries in use, so an empty stack has `sp == 0`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stack {
    slots: [u16; STACK_SIZE],
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, address: u16) -> Result<(), CpuError> {
        let slot = self.slots.get_mut(self.sp).ok_or(CpuError::StackOverflow)?;
        *slot = address;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, CpuError> {
        self.sp = self.sp.checked_sub(1).ok_or(CpuError::StackUnderflow)?;
        Ok(self.slots[self.sp])
    }

    /// The most recently pushed return address
    pub fn peek(&self) -> Option<u16> {
        self.sp.checked_sub(1).map(|top| self.slots[top])
    }

    /// The stack pointer
    pub fn len(&self) -> usize {
        self.sp
    }

    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }
}
