pub mod sqlite_loader;

pub use sqlite_loader::SqliteLoader;
