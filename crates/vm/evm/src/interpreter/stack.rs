// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! The EVM's 1024-deep evaluation stack.

/// Generic stack trait so the interpreter can hold a `&mut dyn Stack<U256>`
/// without committing to a concrete backing container.
pub trait Stack<T> {
    /// Returns the item at the top of the stack without popping it.
    fn peek(&self, no_from_top: usize) -> &T;
    /// Returns the `n` top-most items as a slice, without popping them.
    fn peek_top(&self, no_of_elems: usize) -> &[T];
    /// Swap the top-most item with the one `no_from_top` deep.
    fn swap_with_top(&mut self, no_from_top: usize);
    /// Returns true if the stack currently holds at least `no_of_elems`.
    fn has(&self, no_of_elems: usize) -> bool;
    /// Number of elements currently on the stack.
    fn size(&self) -> usize;
    /// Remove and return the top-most item.
    fn pop_back(&mut self) -> T;
    /// Pop `no_of_elems` items and discard them.
    fn pop_n(&mut self, no_of_elems: usize);
    /// Push an item onto the stack.
    fn push(&mut self, elem: T);
    /// Returns the backing items, bottom to top.
    fn peek_top_rev(&self, no_of_elems: usize) -> Vec<&T>;
}

/// A plain `Vec`-backed stack, reserved to the schedule's configured
/// stack depth limit up front so no reallocation can happen mid-frame.
pub struct VecStack<S> {
    stack: Vec<S>,
}

impl<S: Copy> VecStack<S> {
    /// Create a stack pre-allocated to `capacity` with `fill` used only
    /// to size the backing allocation (the stack itself starts empty).
    pub fn with_capacity(capacity: usize, _fill: S) -> Self {
        VecStack {
            stack: Vec::with_capacity(capacity),
        }
    }
}

impl<S> Stack<S> for VecStack<S> {
    fn peek(&self, no_from_top: usize) -> &S {
        &self.stack[self.stack.len() - no_from_top - 1]
    }

    fn peek_top(&self, no_of_elems: usize) -> &[S] {
        &self.stack[self.stack.len() - no_of_elems..]
    }

    fn swap_with_top(&mut self, no_from_top: usize) {
        let len = self.stack.len();
        self.stack.swap(len - 1, len - no_from_top - 1);
    }

    fn has(&self, no_of_elems: usize) -> bool {
        self.stack.len() >= no_of_elems
    }

    fn size(&self) -> usize {
        self.stack.len()
    }

    fn pop_back(&mut self) -> S {
        self.stack
            .pop()
            .expect("pop_back is only called after has() has been checked; qed")
    }

    fn pop_n(&mut self, no_of_elems: usize) {
        let new_len = self.stack.len() - no_of_elems;
        self.stack.truncate(new_len);
    }

    fn push(&mut self, elem: S) {
        self.stack.push(elem);
    }

    fn peek_top_rev(&self, no_of_elems: usize) -> Vec<&S> {
        self.stack.iter().rev().take(no_of_elems).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;

    #[test]
    fn push_pop_roundtrip() {
        let mut stack = VecStack::with_capacity(16, U256::zero());
        stack.push(U256::from(1));
        stack.push(U256::from(2));
        assert_eq!(stack.size(), 2);
        assert_eq!(stack.pop_back(), U256::from(2));
        assert_eq!(stack.pop_back(), U256::from(1));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut stack = VecStack::with_capacity(16, U256::zero());
        stack.push(U256::from(10));
        stack.push(U256::from(20));
        assert_eq!(*stack.peek(0), U256::from(20));
        assert_eq!(*stack.peek(1), U256::from(10));
        assert_eq!(stack.size(), 2);
    }

    #[test]
    fn swap_with_top() {
        let mut stack = VecStack::with_capacity(16, U256::zero());
        stack.push(U256::from(1));
        stack.push(U256::from(2));
        stack.push(U256::from(3));
        stack.swap_with_top(2);
        assert_eq!(*stack.peek(0), U256::from(1));
        assert_eq!(*stack.peek(2), U256::from(3));
    }

    #[test]
    fn has_reports_current_depth() {
        let mut stack = VecStack::with_capacity(16, U256::zero());
        assert!(!stack.has(1));
        stack.push(U256::zero());
        assert!(stack.has(1));
        assert!(!stack.has(2));
    }
}
