use core::fmt::{Display, Error as FmtError, Formatter};

use crate::prelude::*;

/// Displays a slice as `[a, b, c]` using the `Display` form of its elements.
pub struct PrettySlice<'a, T>(pub &'a [T]);

impl<'a, T: Display> Display for PrettySlice<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "[")?;
        let mut elems = self.0.iter().peekable();
        while let Some(elem) = elems.next() {
            write!(f, "{elem}")?;
            if elems.peek().is_some() {
                write!(f, ", ")?;
            }
        }
        write!(f, "]")
    }
}

/// Owned counterpart of [`PrettySlice`], for fields held in a `Vec`.
pub struct PrettyVec<'a, T>(pub &'a Vec<T>);

impl<'a, T: Display> Display for PrettyVec<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        PrettySlice(self.0.as_slice()).fmt(f)
    }
}
