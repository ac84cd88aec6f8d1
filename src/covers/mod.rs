//! Cover image and ISBN resolution.
//!
//! Three external catalogs are queried behind one capability trait, in
//! priority order: Open Library, Google Books, BookHub NZ. Every catalog
//! failure is absorbed as an empty result; a missing cover is never an error.

mod bookhub;
mod google_books;
mod open_library;
mod resolver;
mod validator;

pub use bookhub::BookHub;
pub use google_books::GoogleBooks;
pub use open_library::OpenLibrary;
pub use resolver::CoverResolver;
pub use validator::CoverValidator;

use async_trait::async_trait;

/// Result of a single catalog lookup. Either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverHit {
    pub cover_url: Option<String>,
    pub isbn: Option<String>,
}

/// One external catalog that may know a cover and/or ISBN for a book.
///
/// Implementations are best-effort: they decline silently (empty `CoverHit`)
/// on any failure and never surface an error to the caller.
#[async_trait]
pub trait CoverSource: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Attempt to resolve a cover/ISBN for this book, or decline silently.
    async fn attempt(&self, title: &str, author: Option<&str>, isbn: Option<&str>) -> CoverHit;
}
