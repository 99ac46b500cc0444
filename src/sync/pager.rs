use std::future::Future;

use chrono::Utc;

use crate::api::{ApiError, Timeline};
use crate::error::Result;
use crate::sync::retry::RetryPolicy;
use crate::sync::window::FetchWindow;

/// Offset/count of one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub count: u32,
}

/// How a collection is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub offset: u32,
    pub page_size: u32,
    pub fetch_all: bool,
}

/// Request pages sequentially, retrying each one under `retry`.
///
/// Without `fetch_all` exactly one page is requested. With it, pages are
/// requested until one comes back shorter than `page_size`. Any page that
/// fails for good fails the whole walk; nothing collected so far is returned.
pub async fn fetch_pages<T, F, Fut>(
    label: &str,
    plan: PagePlan,
    retry: &RetryPolicy,
    mut fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(Page) -> Fut,
    Fut: Future<Output = std::result::Result<Vec<T>, ApiError>>,
{
    let page_size = plan.page_size.max(1);
    let mut offset = plan.offset;
    let mut records = Vec::new();
    let mut pages = 0u32;

    loop {
        let page = Page {
            offset,
            count: page_size,
        };
        let batch = retry.run(label, || fetch(page)).await?;
        pages += 1;
        let received = batch.len();
        log::debug!("{label}: page {pages} at offset {offset} returned {received} records");
        records.extend(batch);

        if !plan.fetch_all || received < page_size as usize {
            break;
        }
        offset = offset.saturating_add(page_size);
    }

    log::debug!("{label}: {} records in {pages} page(s)", records.len());
    Ok(records)
}

/// Apply forced ordering and the window cut to an aggregated result set.
///
/// With `force_ordering`, records are sorted newest-first by their cut field
/// (records without one count as "now"); otherwise the remote order is kept.
/// Records outside the window are dropped.
pub fn order_and_cut<T: Timeline>(
    mut records: Vec<T>,
    window: &FetchWindow,
    force_ordering: bool,
) -> Vec<T> {
    let now = Utc::now();
    if force_ordering {
        records.sort_by_key(|r| std::cmp::Reverse(r.cut_time().unwrap_or(now)));
    }
    if window.is_bounded() {
        records.retain(|r| window.contains(r.cut_time().unwrap_or(now)));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::{DateTime, TimeZone};
    use std::cell::RefCell;

    #[derive(Debug, Clone)]
    struct Rec(i64);

    impl Timeline for Rec {
        fn cut_time(&self) -> Option<DateTime<Utc>> {
            Utc.timestamp_opt(self.0, 0).single()
        }
    }

    fn source(total: usize) -> Vec<Rec> {
        // deliberately unordered
        (0..total as i64).map(|i| Rec((i * 7919) % 10_007 + 1)).collect()
    }

    #[tokio::test]
    async fn test_single_page_without_fetch_all() {
        let data = source(250);
        let calls = RefCell::new(Vec::new());
        let plan = PagePlan {
            offset: 100,
            page_size: 100,
            fetch_all: false,
        };
        let out = fetch_pages("test", plan, &RetryPolicy::none(), |page| {
            calls.borrow_mut().push(page);
            let slice: Vec<Rec> = data
                .iter()
                .skip(page.offset as usize)
                .take(page.count as usize)
                .cloned()
                .collect();
            async move { Ok(slice) }
        })
        .await
        .unwrap();
        assert_eq!(out.len(), 100);
        assert_eq!(
            *calls.borrow(),
            vec![Page {
                offset: 100,
                count: 100
            }]
        );
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let data = source(247);
        let calls = RefCell::new(Vec::new());
        let plan = PagePlan {
            offset: 0,
            page_size: 100,
            fetch_all: true,
        };
        let out = fetch_pages("test", plan, &RetryPolicy::none(), |page| {
            calls.borrow_mut().push(page.offset);
            let slice: Vec<Rec> = data
                .iter()
                .skip(page.offset as usize)
                .take(page.count as usize)
                .cloned()
                .collect();
            async move { Ok(slice) }
        })
        .await
        .unwrap();
        assert_eq!(out.len(), 247);
        assert_eq!(*calls.borrow(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_empty_page() {
        let data = source(200);
        let calls = RefCell::new(0);
        let plan = PagePlan {
            offset: 0,
            page_size: 100,
            fetch_all: true,
        };
        let out = fetch_pages("test", plan, &RetryPolicy::none(), |page| {
            *calls.borrow_mut() += 1;
            let slice: Vec<Rec> = data
                .iter()
                .skip(page.offset as usize)
                .take(page.count as usize)
                .cloned()
                .collect();
            async move { Ok(slice) }
        })
        .await
        .unwrap();
        assert_eq!(out.len(), 200);
        assert_eq!(*calls.borrow(), 3);
    }

    #[tokio::test]
    async fn test_failed_page_discards_everything() {
        let plan = PagePlan {
            offset: 0,
            page_size: 2,
            fetch_all: true,
        };
        let result = fetch_pages("test", plan, &RetryPolicy::none(), |page| async move {
            if page.offset == 0 {
                Ok(vec![Rec(1), Rec(2)])
            } else {
                Err(ApiError::Vk {
                    code: 10,
                    message: "Internal server error".into(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(Error::RemoteTransient { .. })));
    }

    #[test]
    fn test_forced_ordering_is_descending() {
        let out = order_and_cut(source(500), &FetchWindow::default(), true);
        assert_eq!(out.len(), 500);
        assert!(out.windows(2).all(|w| w[0].0 > w[1].0));
    }

    #[test]
    fn test_remote_order_kept_without_forcing() {
        let records = vec![Rec(1), Rec(3), Rec(2)];
        let out = order_and_cut(records, &FetchWindow::default(), false);
        let order: Vec<i64> = out.iter().map(|r| r.0).collect();
        assert_eq!(order, vec![1, 3, 2]);
    }

    #[test]
    fn test_window_cut() {
        let window = FetchWindow {
            after: Utc.timestamp_opt(10, 0).single(),
            before: Utc.timestamp_opt(20, 0).single(),
            ..FetchWindow::default()
        };
        let records = (5..25).map(Rec).collect();
        let out = order_and_cut(records, &window, true);
        let kept: Vec<i64> = out.iter().map(|r| r.0).collect();
        assert_eq!(kept, (11..20).rev().collect::<Vec<_>>());
    }
}
