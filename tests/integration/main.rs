//! Cross-module scenarios for flock agents and the action layer.

mod actions;
mod seeking;
mod spawning;
