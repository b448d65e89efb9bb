//! Layer lifecycle against the full gateway stack.
