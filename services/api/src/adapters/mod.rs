pub mod catalog;
pub mod db;
pub mod identity;
pub mod memory;

pub use catalog::{GoogleBooksProvider, NationalLibraryProvider, OpenLibraryProvider};
pub use db::DbAdapter;
pub use identity::{DisabledIdentityProvider, HttpIdentityProvider};
pub use memory::MemoryStore;
