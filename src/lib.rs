#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! # Repaint: a per-output rendering pipeline for compositors
//!
//! This crate implements the render manager of a single display output: it
//! accumulates damage, renders virtual workspaces into cached framebuffers
//! with occlusion-aware culling, runs a chain of full-screen post-effect
//! passes, and schedules repaints against the display's frame events.
//!
//! The surrounding compositor is not part of this crate. The display server
//! loop, the scene graph and the GPU context are consumed through the traits
//! in [`output`], [`scene`], [`event_loop`] and [`renderer`]; one
//! [`RenderManager`](render::RenderManager) is created per output and driven
//! by calling [`paint`](render::RenderManager::paint) whenever the display
//! delivers a frame event.
//!
//! ## The event loop and state handling
//!
//! All operations are single-threaded and cooperative: damage reports, hook
//! callbacks and `paint` itself run on the display server's event loop, which
//! is expected to be [`calloop`] or something shaped like it. The manager only
//! needs the loop for idle callbacks, abstracted by
//! [`event_loop::EventLoop`]; [`event_loop::LoopIdles`] adapts a
//! [`calloop::LoopHandle`] directly.
//!
//! ## Logging
//!
//! This crate uses `tracing` for logging. Per-frame traces (damage regions,
//! culling decisions) are emitted at trace level; collaborator contract
//! violations are logged as errors.

pub mod event_loop;
pub mod output;
pub mod render;
pub mod renderer;
pub mod scene;
pub mod utils;
