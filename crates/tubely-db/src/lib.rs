//! Tubely database layer
//!
//! The record store behind the upload pipeline. `VideoRepository` is the seam;
//! `SqliteVideoRepository` backs deployments and `InMemoryVideoRepository`
//! backs tests and `DATABASE_URL=memory`.

pub mod db;

pub use db::{
    run_migrations, InMemoryVideoRepository, SqliteVideoRepository, VideoRepository,
};
