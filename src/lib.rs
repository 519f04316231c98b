//! hostprobe - host diagnostics and list rendering
//!
//! Two independent utilities share this crate:
//! - `host-report` prints OS, CPU, GPU, RAM, and per-process memory
//! - `list-to-image` renders a list of strings as centered lines in an image
//!
//! Both are best-effort: tolerated failures (missing GPU driver, vanished
//! processes, missing fonts) degrade to placeholders or fallbacks, anything
//! else propagates to the caller.

pub mod config;
pub mod hardware;
pub mod render;
pub mod terminal;
