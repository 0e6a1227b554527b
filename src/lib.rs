//! Local Guides Scraper - contribution metrics pipeline for tracked guide profiles
//!
//! Resolves profile URLs, scrapes two views per profile, merges the
//! extracted metrics and reconciles them into a SQLite store with monthly
//! history snapshots.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
