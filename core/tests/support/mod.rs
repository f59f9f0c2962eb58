#![allow(dead_code)]

pub mod recording_host;
pub mod scripted_backend;
