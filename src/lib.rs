//! # Lecture Brief
//!
//! Resolves a course's weekly lecture material from a document store and
//! extracts its plain text, ready for briefing and speech synthesis.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────┐
//! │   Store     │──▶│   Resolver   │──▶│ WeeklyBundle  │
//! │ FS / Drive  │   │ match+extract│   │ prev/current  │
//! └─────────────┘   └──────────────┘   └───────────────┘
//!        ▲                 ▲
//!        │           ┌─────┴─────┐
//!        │           │  week +   │
//!        │           │  keyword  │
//!        │           └───────────┘
//!   ┌────┴─────┐
//!   │   CLI    │
//!   │ (brief)  │
//!   └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. [`week::compute_week`] maps the semester start and a reference date to
//!    a [`models::WeekNumber`].
//! 2. The [`resolve::Resolver`] lists the course folder once through a
//!    [`store::DocumentStore`].
//! 3. [`keyword`] renders the week tag (`"3주차"` by default) and keeps the
//!    documents whose normalized names contain it.
//! 4. Each match is downloaded and run through [`extract`] (PDF, PPTX, DOCX).
//! 5. The result is a [`models::WeeklyBundle`]: merged current week text, the
//!    most recent previous week text, and the newest current week file.
//!
//! ## Quick Start
//!
//! ```bash
//! brief week                          # which week is it?
//! brief resolve edtech                # texts for this week and last week
//! brief resolve edtech --week 3 --save slides.pdf
//! brief extract ./handout.docx
//! brief courses                       # check every course folder
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`week`] | Semester week arithmetic |
//! | [`keyword`] | Name normalization and week matching |
//! | [`extract`] | PDF / PPTX / DOCX text extraction |
//! | [`store`] | Document store trait with memory, filesystem, and Drive backends |
//! | [`resolve`] | Weekly resolution pipeline |
//! | [`courses`] | Course folder health listing |

pub mod config;
pub mod courses;
pub mod extract;
pub mod keyword;
pub mod models;
pub mod resolve;
pub mod store;
pub mod week;
