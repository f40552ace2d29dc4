//! Edge case tests for p4c-lex.
