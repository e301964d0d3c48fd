//! Announcement controller: turns detection results into rate-limited speech.

pub mod controller;

pub use controller::{transition, AnnouncementController, Announcement, CooldownState};
