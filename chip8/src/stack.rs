//! The subroutine call stack.

/// Number of return address slots.
pub const STACK_SIZE: usize = 16;

/// Reason a stack operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Every slot is in use.
    Overflow,
    /// Nothing has been pushed.
    Underflow,
}

/// Fixed-capacity stack of return addresses.
///
/// The stack pointer is incremented before a push stores and read before a
/// pop decrements, so slot `0` is never written and at most
/// `STACK_SIZE - 1` calls can be nested.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stack {
    slots: [u16; STACK_SIZE],
    sp: usize,
}

impl Stack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a return address.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Overflow`] if the stack is full. The stack is
    /// left untouched.
    pub fn push(&mut self, address: u16) -> Result<(), StackError> {
        let sp = self.sp + 1;
        let slot = self.slots.get_mut(sp).ok_or(StackError::Overflow)?;
        *slot = address;
        self.sp = sp;
        Ok(())
    }

    /// Pops the most recently pushed return address.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Underflow`] if the stack is empty.
    pub fn pop(&mut self) -> Result<u16, StackError> {
        if self.sp == 0 {
            return Err(StackError::Underflow);
        }
        let address = self.slots[self.sp];
        self.sp -= 1;
        Ok(address)
    }

    /// The current stack pointer.
    #[must_use]
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// All slots, including ones above the stack pointer.
    #[must_use]
    pub fn slots(&self) -> &[u16; STACK_SIZE] {
        &self.slots
    }
}
