//! Line decoration and highlighting.
//!
//! [`LineBoard`] is the render model: one entry per line with its decorations
//! and the match ids recorded on it. [`Projector`] keeps the board in step with
//! the match store:
//!
//! - **matched**: persistent, added once a confirmed relation names the line
//! - **paired**: transient, shown on every member of every group a hovered line
//!   belongs to
//!
//! A line moves from unmatched to matched only when the store absorbs a
//! relation naming it. Nothing moves it back short of a reload.
//!
//! [`LineBoard`]: board::LineBoard
//! [`Projector`]: projector::Projector

pub mod board;
pub mod projector;
