//! Split policies: how a child marcher's parameters derive from its parent's.
//!
//! A policy is three independent rules, one per derived field:
//! - colour, via [`ColorRule`]
//! - move transitions, via [`MatrixRule<4>`]
//! - state transitions, via [`MatrixRule<3>`]
//!
//! Every rule defaults to [`Identity`]. Closures with the matching signature
//! are rules too, so callers can plug in their own without a new type.

pub mod policy;
pub mod color_rules;
pub mod matrix_rules;

pub use policy::{ColorRule, MatrixRule, SplitPolicy};
pub use color_rules::{ColorCycle, Darken, HueShift, Lighten, RandomColor};
pub use matrix_rules::{OrthoRotate, Relax};

/// Exact copy, valid for colours and for matrices of any width
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;
