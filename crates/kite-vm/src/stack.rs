//! Pile de valeurs à capacité fixe.

use kite_core::bytecode::Value;

use crate::{VmError, VmResult};

/// Nombre de cases de la pile.
pub const STACK_MAX: usize = 256;

/// Pile bornée : `top` désigne la prochaine case libre.
#[derive(Debug, Clone)]
pub struct Stack {
    slots: [Value; STACK_MAX],
    top: usize,
}

impl Default for Stack {
    fn default() -> Self { Self::new() }
}

impl Stack {
    /// Pile vide.
    pub const fn new() -> Self { Self { slots: [0.0; STACK_MAX], top: 0 } }

    /// Empile ; `StackOverflow` quand les 256 cases sont occupées.
    pub fn push(&mut self, value: Value) -> VmResult<()> {
        let slot = self.slots.get_mut(self.top).ok_or(VmError::StackOverflow { max: STACK_MAX })?;
        *slot = value;
        self.top += 1;
        Ok(())
    }

    /// Dépile ; `StackUnderflow` sur pile vide.
    pub fn pop(&mut self) -> VmResult<Value> {
        if self.top == 0 {
            return Err(VmError::StackUnderflow);
        }
        self.top -= 1;
        Ok(self.slots[self.top])
    }

    /// Sommet sans dépiler.
    pub fn peek(&self) -> Option<Value> { self.as_slice().last().copied() }

    /// Nombre de valeurs empilées.
    pub const fn len(&self) -> usize { self.top }

    /// Pile vide ?
    pub const fn is_empty(&self) -> bool { self.top == 0 }

    /// Valeurs vivantes, du fond vers le sommet.
    pub fn as_slice(&self) -> &[Value] { &self.slots[..self.top] }

    /// Remet la pile à zéro.
    pub fn reset(&mut self) { self.top = 0; }
}
