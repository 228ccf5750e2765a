use crate::app::{AppContext, Result, RillError};
use crate::domain::{Entry, Feed, ListContext, ViewType};
use crate::fetcher::parallel::refresh_feed;
use crate::store::Store;

pub async fn add_feed(
    ctx: &AppContext,
    url: &str,
    view: ViewType,
    category: Option<String>,
    owner: Option<String>,
) -> Result<()> {
    url::Url::parse(url)?;

    // Check if feed already exists
    if ctx.store.get_feed_by_url(url)?.is_some() {
        println!("Feed already exists: {}", url);
        return Ok(());
    }

    let mut feed = Feed::new(url.to_string()).with_view(view);
    feed.category = category;
    feed.owner_user_id = owner;
    feed.id = ctx.store.add_feed(&feed)?;
    println!("Added feed: {}", url);

    match refresh_feed(ctx.fetcher.as_ref(), &feed, ctx.store.as_ref(), &ctx.normalizer).await {
        Ok(count) => {
            if let Some(title) = ctx.store.get_feed(feed.id)?.and_then(|f| f.title) {
                println!("Feed title: {}", title);
            }
            println!("Fetched {} entries", count);
            Ok(())
        }
        Err(e) => {
            // Keep nothing half-added around.
            ctx.store.delete_feed(feed.id)?;
            Err(e)
        }
    }
}

pub async fn remove_feed(ctx: &AppContext, url: &str) -> Result<()> {
    let feed = ctx
        .store
        .get_feed_by_url(url)?
        .ok_or_else(|| RillError::FeedNotFound(url.to_string()))?;

    ctx.store.delete_feed(feed.id)?;
    println!("Removed feed: {}", url);
    Ok(())
}

pub async fn update_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.get_all_feeds()?;

    if feeds.is_empty() {
        println!("No feeds to update");
        return Ok(());
    }

    println!("Updating {} feeds...", feeds.len());

    let results = ctx
        .parallel_fetcher
        .fetch_all(feeds, ctx.store.clone(), &ctx.normalizer)
        .await;

    let mut total_new = 0;
    let mut errors = 0;

    for (feed_id, result) in results {
        match result {
            Ok(count) => {
                total_new += count;
                if count > 0 {
                    if let Ok(Some(feed)) = ctx.store.get_feed(feed_id) {
                        println!("  {} new entries from {}", count, feed.display_title());
                    }
                }
            }
            Err(e) => {
                errors += 1;
                if let Ok(Some(feed)) = ctx.store.get_feed(feed_id) {
                    eprintln!("  Error updating {}: {}", feed.display_title(), e);
                }
            }
        }
    }

    println!("Update complete: {} new entries, {} errors", total_new, errors);
    Ok(())
}

pub fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.get_all_feeds()?;

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    for feed in feeds {
        let unread = ctx.store.get_unread_count(feed.id)?;
        let folder = feed
            .category
            .as_deref()
            .map(|c| format!(" [{}]", c))
            .unwrap_or_default();
        let view = match feed.view() {
            Some(view) => view.descriptor().name.to_string(),
            None => format!("view {}", feed.raw_view),
        };
        println!(
            "{}: {}{} ({} unread, {})\n  {}",
            feed.id,
            feed.display_title(),
            folder,
            unread,
            view,
            feed.url
        );
    }

    Ok(())
}

pub fn list_entries(ctx: &AppContext, context: &ListContext, limit: usize) -> Result<()> {
    let page = ctx.store.query_page(context, None, limit)?;

    if page.entries.is_empty() {
        println!("No entries");
        return Ok(());
    }

    for entry in &page.entries {
        println!("{}", entry_line(entry));
    }
    if page.has_next {
        println!("... {} more", page.total_count - page.entries.len());
    }

    Ok(())
}

fn entry_line(entry: &Entry) -> String {
    let marker = if entry.is_starred {
        "★"
    } else if !entry.is_read {
        "●"
    } else {
        " "
    };

    let date = entry
        .published_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "          ".to_string());

    format!("{} {} {}  {}", marker, date, entry.display_title(), entry.id)
}

pub fn mark_read(ctx: &AppContext, entry_id: &str) -> Result<()> {
    let entry = ctx
        .store
        .get_entry(entry_id)?
        .ok_or_else(|| RillError::EntryNotFound(entry_id.to_string()))?;

    if entry.is_read {
        println!("Already read: {}", entry.display_title());
    } else {
        ctx.store.set_read(&entry.id, true)?;
        println!("Marked read: {}", entry.display_title());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedSelector;

    fn seeded() -> (AppContext, String) {
        let ctx = AppContext::in_memory().unwrap();
        let feed_id = ctx
            .store
            .add_feed(&Feed::new("https://example.com/feed.xml".into()))
            .unwrap();
        let mut entry = Entry::new(feed_id, "https://example.com/feed.xml", "one");
        entry.title = Some("One".into());
        let id = entry.id.clone();
        ctx.store.add_entries(&[entry]).unwrap();
        (ctx, id)
    }

    #[test]
    fn test_mark_read() {
        let (ctx, id) = seeded();
        mark_read(&ctx, &id).unwrap();
        assert!(ctx.store.get_entry(&id).unwrap().unwrap().is_read);
        // Marking twice is harmless.
        mark_read(&ctx, &id).unwrap();
    }

    #[test]
    fn test_mark_read_unknown_entry() {
        let (ctx, _) = seeded();
        assert!(matches!(
            mark_read(&ctx, "missing"),
            Err(RillError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_entry_line() {
        let (ctx, id) = seeded();
        let entry = ctx.store.get_entry(&id).unwrap().unwrap();
        let line = entry_line(&entry);
        assert!(line.starts_with("●"));
        assert!(line.contains("One"));
        assert!(line.ends_with(&id));
    }

    #[test]
    fn test_list_entries() {
        let (ctx, _) = seeded();
        let context = ListContext::new(FeedSelector::All, ViewType::Articles, true);
        list_entries(&ctx, &context, 10).unwrap();
    }

    #[test]
    fn test_list_feeds_with_unknown_view() {
        let ctx = AppContext::in_memory().unwrap();
        let mut feed = Feed::new("https://example.com/feed.xml".into());
        feed.raw_view = 77;
        ctx.store.add_feed(&feed).unwrap();
        list_feeds(&ctx).unwrap();
    }

    #[tokio::test]
    async fn test_remove_unknown_feed() {
        let ctx = AppContext::in_memory().unwrap();
        let result = remove_feed(&ctx, "https://nowhere.test/feed.xml").await;
        assert!(matches!(result, Err(RillError::FeedNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_url() {
        let ctx = AppContext::in_memory().unwrap();
        let result = add_feed(&ctx, "not a url", ViewType::Articles, None, None).await;
        assert!(matches!(result, Err(RillError::InvalidUrl(_))));
        assert!(ctx.store.get_all_feeds().unwrap().is_empty());
    }
}
