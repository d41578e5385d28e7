//! Remote services consumed by a sync pass.
//!
//! - `AnnictClient`: the source library
//! - `AniListClient`: the target library, read and written
//! - `ArmDatabase`: the id cross-reference table
//! - `fetch_library`: concurrent partitioned pagination shared by both clients

pub mod anilist;
pub mod annict;
pub mod arm;
pub mod fetch;
mod graphql;

pub use anilist::{AniListClient, AniListViewer};
pub use annict::{AnnictClient, AnnictViewer};
pub use arm::ArmDatabase;
pub use fetch::{Page, PagedLibrary, fetch_library};
pub use graphql::GraphQlClient;
