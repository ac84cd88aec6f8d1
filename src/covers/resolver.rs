//! Cover resolution chain.

use futures_util::future::join_all;

use super::{BookHub, CoverHit, CoverSource, CoverValidator, GoogleBooks, OpenLibrary};
use crate::models::Book;

/// Batch width for bulk lookups. Requests within a batch run concurrently;
/// batches run serially to bound load on the catalog APIs.
const BATCH_SIZE: usize = 10;

/// Orchestrates the catalog sources in priority order.
pub struct CoverResolver {
    sources: Vec<Box<dyn CoverSource>>,
}

impl CoverResolver {
    pub fn new(sources: Vec<Box<dyn CoverSource>>) -> Self {
        Self { sources }
    }

    /// The production chain: Open Library, Google Books, BookHub NZ.
    pub fn with_default_sources(client: reqwest::Client) -> Self {
        let validator = CoverValidator::new(client.clone());
        Self::new(vec![
            Box::new(OpenLibrary::new(client.clone(), validator.clone())),
            Box::new(GoogleBooks::new(client.clone(), validator.clone())),
            Box::new(BookHub::new(client, validator)),
        ])
    }

    /// Try each source in order, stopping at the first cover. The ISBN in the
    /// result is whatever the earliest source discovered, independent of which
    /// source supplied the cover.
    pub async fn find_cover(
        &self,
        title: &str,
        author: Option<&str>,
        isbn: Option<&str>,
    ) -> CoverHit {
        let mut found_isbn: Option<String> = None;

        for source in &self.sources {
            let hit = source.attempt(title, author, isbn).await;
            if found_isbn.is_none() {
                found_isbn = hit.isbn;
            }
            if let Some(cover_url) = hit.cover_url {
                tracing::debug!("Cover for \"{}\" found via {}", title, source.name());
                return CoverHit {
                    cover_url: Some(cover_url),
                    isbn: found_isbn,
                };
            }
        }

        CoverHit {
            cover_url: None,
            isbn: found_isbn,
        }
    }

    /// Resolve covers for every book missing one, in batches of [`BATCH_SIZE`].
    /// Fills in ISBNs found along the way. Returns (covers found, ISBNs filled).
    pub async fn refresh_missing(&self, books: &mut [Book]) -> (usize, usize) {
        let mut covers = 0;
        let mut isbns = 0;

        let mut missing: Vec<&mut Book> = books
            .iter_mut()
            .filter(|b| b.cover_url.is_none())
            .collect();

        for batch in missing.chunks_mut(BATCH_SIZE) {
            let lookups = batch.iter_mut().map(|book| {
                let title = book.title.clone();
                let author = book.author.clone();
                let isbn = book.isbn.clone();
                async move {
                    let hit = self
                        .find_cover(&title, author.as_deref(), isbn.as_deref())
                        .await;
                    (book, hit)
                }
            });

            for (book, hit) in join_all(lookups).await {
                if let Some(cover_url) = hit.cover_url {
                    book.cover_url = Some(cover_url);
                    covers += 1;
                }
                if book.isbn.is_none() {
                    if let Some(isbn) = hit.isbn {
                        book.isbn = Some(isbn);
                        isbns += 1;
                    }
                }
            }
        }

        (covers, isbns)
    }
}
