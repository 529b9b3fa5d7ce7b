//! Client for the SkillSwap support live chat.
//!
//! [`network::ChatController`] drives one chat widget: it opens sessions,
//! polls them through [`network::SessionPoller`], and emits
//! [`common::ChatEvent`]s carrying state changes and rendered threads.
//! The same component serves both the user and the admin view.

pub mod common;
pub mod config;
pub mod network;
pub mod render;
