use futures::Stream;
use futures::stream;
use std::future::Future;

use crate::error::Error;

/// A response that belongs to a page-key paginated result set.
pub trait Paginated {
    /// Returns the opaque key of the next page, if any.
    fn page_key(&self) -> Option<&str>;

    /// An absent page key means the result set is exhausted.
    fn is_last_page(&self) -> bool {
        self.page_key().is_none()
    }
}

enum Cursor {
    Start(Option<String>),
    Next(String),
    Done,
}

/// Walks a paginated result set, starting from `first_key`.
///
/// `fetch` is called with the key of the page to load and the stream yields
/// every page in order. The stream ends after the first page without a key
/// and never requests past it. An error ends the stream after being yielded.
pub fn pages<T, F, Fut>(first_key: Option<String>, fetch: F) -> impl Stream<Item = Result<T, Error>>
where
    T: Paginated,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    stream::unfold(
        (Cursor::Start(first_key), fetch),
        |(cursor, mut fetch)| async move {
            let key = match cursor {
                Cursor::Start(key) => key,
                Cursor::Next(key) => Some(key),
                Cursor::Done => return None,
            };
            match fetch(key).await {
                Ok(page) => {
                    let next = match page.page_key() {
                        Some(key) => Cursor::Next(key.to_string()),
                        None => Cursor::Done,
                    };
                    Some((Ok(page), (next, fetch)))
                }
                Err(e) => Some((Err(e), (Cursor::Done, fetch))),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    struct Page {
        items: Vec<u32>,
        next: Option<String>,
    }

    impl Paginated for Page {
        fn page_key(&self) -> Option<&str> {
            self.next.as_deref()
        }
    }

    fn fetch_from(total: u32, size: u32, key: Option<String>) -> Result<Page, Error> {
        let start: u32 = key.map(|k| k.parse().unwrap()).unwrap_or(0);
        let end = (start + size).min(total);
        Ok(Page {
            items: (start..end).collect(),
            next: (end < total).then(|| end.to_string()),
        })
    }

    #[tokio::test]
    async fn test_pages_until_key_is_absent() {
        let mut requested = Vec::new();
        let collected: Vec<Page> = pages(None, |key| {
            requested.push(key.clone());
            std::future::ready(fetch_from(250, 100, key))
        })
        .map(|page| page.unwrap())
        .collect()
        .await;

        let sizes: Vec<usize> = collected.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert!(collected.last().unwrap().is_last_page());
        assert_eq!(
            requested,
            vec![None, Some("100".to_string()), Some("200".to_string())]
        );

        let all: Vec<u32> = collected.into_iter().flat_map(|p| p.items).collect();
        assert_eq!(all, (0..250).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let results: Vec<Result<Page, Error>> = pages(None, |_key| {
            std::future::ready(Err::<Page, _>(Error::InvalidPageSize(500)))
        })
        .collect()
        .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
