//=========================================================================
// Aetheric Load Screen — Library Root
//
// This crate runs the load screen shown while a game loads.
//
// Responsibilities:
// - Decide between single- and multi-threaded loading per session
// - Run the loader and a network heartbeat on background threads
// - Share progress messages between the loader and the renderer
// - Hand the loaded game back once loading completed
//
// Typical usage:
// ```ignore
// use aetheric_loadscreen::prelude::*;
//
// let screen = LoadScreenBuilder::new(target, game, host, link)
//     .with_loading_mode(LoadingMode::Auto)
//     .start();
//
// match run_load_screen(EventLoop::new()?, screen)? {
//     Handoff::Game(game) => game.run(),
//     Handoff::Quit => {}
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the session building blocks (progress state, workers,
// host seams). `config` and `error` are shared by everything else.
//
pub mod config;
pub mod core;
pub mod error;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `load_screen` is the controller; `platform` drives it from Winit.
// Both are reached through the re-exports below.
//
mod load_screen;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use load_screen::{Handoff, LoadScreen, LoadScreenBuilder, SessionState, UpdateOutcome};
pub use platform::run_load_screen;
