//! Breadth-first frontier and visited set for one entry point
//!
//! The frontier owns:
//! - the FIFO queue of pending crawl tasks
//! - the set of normalized URLs already seen in this entry point's BFS
//! - the depth ceiling
//!
//! A URL enters the visited set at the moment it is enqueued, so it can never be queued
//! (or fetched) twice, and its depth is the BFS distance at which it was first seen.

use crate::url::{normalize_key, normalize_url};
use crate::UrlError;
use std::collections::{HashSet, VecDeque};

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized URL
    pub url: String,

    /// BFS distance from the entry point
    pub depth: u32,

    /// Page the URL was discovered on; `None` for the entry point
    pub parent_url: Option<String>,
}

/// BFS queue plus visited set, scoped to a single entry point
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
    max_depth: u32,
}

impl Frontier {
    /// Creates a frontier seeded with the entry point at depth 0
    ///
    /// # Errors
    ///
    /// Returns an error if the entry URL cannot be normalized.
    pub fn new(entry_url: &str, max_depth: u32) -> Result<Self, UrlError> {
        let url = normalize_url(entry_url)?.to_string();

        let mut visited = HashSet::new();
        visited.insert(url.clone());

        let mut queue = VecDeque::new();
        queue.push_back(CrawlTask {
            url,
            depth: 0,
            parent_url: None,
        });

        Ok(Self {
            queue,
            visited,
            max_depth,
        })
    }

    /// Removes the next task in FIFO order
    pub fn pop(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }

    /// Removes every queued task of the shallowest queued depth
    ///
    /// Tasks come back in frontier order. Because the queue is FIFO and depths only
    /// grow by one per level, the shallowest tasks are always at the front.
    pub fn take_level(&mut self) -> Vec<CrawlTask> {
        let depth = match self.queue.front() {
            Some(task) => task.depth,
            None => return Vec::new(),
        };

        let mut level = Vec::new();
        while self.queue.front().map_or(false, |task| task.depth == depth) {
            if let Some(task) = self.queue.pop_front() {
                level.push(task);
            }
        }

        level
    }

    /// Returns true if the children of `task` may be enqueued
    pub fn can_expand(&self, task: &CrawlTask) -> bool {
        task.depth < self.max_depth
    }

    /// Offers a discovered link found on `parent`
    ///
    /// The URL is normalized, checked against the visited set, inserted, and enqueued at
    /// `parent.depth + 1`. Returns true if it was enqueued; false if it was already seen,
    /// cannot be normalized, or would exceed the depth ceiling.
    pub fn offer(&mut self, url: &str, parent: &CrawlTask) -> bool {
        if !self.can_expand(parent) {
            return false;
        }

        let key = match normalize_key(url) {
            Some(key) => key,
            None => return false,
        };

        if !self.visited.insert(key.clone()) {
            return false;
        }

        self.queue.push_back(CrawlTask {
            url: key,
            depth: parent.depth + 1,
            parent_url: Some(parent.url.clone()),
        });

        true
    }

    /// Marks a URL as seen without enqueueing it
    ///
    /// Used for the final URL of a redirect so the target is not fetched again under its
    /// own name. Returns true if the URL was not seen before.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        match normalize_key(url) {
            Some(key) => self.visited.insert(key),
            None => false,
        }
    }

    /// Returns true if the normalized form of `url` has been seen
    pub fn is_visited(&self, url: &str) -> bool {
        normalize_key(url).map_or(false, |key| self.visited.contains(&key))
    }

    /// Number of tasks waiting to be fetched
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true when the BFS has nothing left to fetch
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs seen so far
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Deepest level that is still fetched
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_entry_point() {
        let mut frontier = Frontier::new("https://example.edu/it/", 2).unwrap();

        assert_eq!(frontier.len(), 1);
        assert!(frontier.is_visited("https://example.edu/it"));

        let task = frontier.pop().unwrap();
        assert_eq!(task.url, "https://example.edu/it");
        assert_eq!(task.depth, 0);
        assert_eq!(task.parent_url, None);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_invalid_entry_point() {
        assert!(Frontier::new("not a url", 1).is_err());
    }

    #[test]
    fn test_offer_enqueues_child_one_level_deeper() {
        let mut frontier = Frontier::new("https://example.edu/", 2).unwrap();
        let root = frontier.pop().unwrap();

        assert!(frontier.offer("https://example.edu/faq", &root));

        let child = frontier.pop().unwrap();
        assert_eq!(child.depth, 1);
        assert_eq!(child.parent_url.as_deref(), Some("https://example.edu/"));
    }

    #[test]
    fn test_offer_rejects_duplicates_across_spellings() {
        let mut frontier = Frontier::new("https://example.edu/", 2).unwrap();
        let root = frontier.pop().unwrap();

        assert!(frontier.offer("https://example.edu/faq", &root));
        assert!(!frontier.offer("https://example.edu/faq/", &root));
        assert!(!frontier.offer("https://EXAMPLE.edu/faq#top", &root));
        assert!(!frontier.offer("https://example.edu/", &root));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_depth_ceiling() {
        let mut frontier = Frontier::new("https://example.edu/", 1).unwrap();
        let root = frontier.pop().unwrap();
        assert!(frontier.can_expand(&root));
        assert!(frontier.offer("https://example.edu/a", &root));

        let child = frontier.pop().unwrap();
        assert!(!frontier.can_expand(&child));
        assert!(!frontier.offer("https://example.edu/b", &child));
        assert!(frontier.is_empty());
        assert!(!frontier.is_visited("https://example.edu/b"));
    }

    #[test]
    fn test_zero_depth_never_expands() {
        let mut frontier = Frontier::new("https://example.edu/doc.pdf", 0).unwrap();
        let root = frontier.pop().unwrap();
        assert!(!frontier.offer("https://example.edu/a", &root));
    }

    #[test]
    fn test_depth_is_first_discovery_distance() {
        let mut frontier = Frontier::new("https://example.edu/", 3).unwrap();
        let root = frontier.pop().unwrap();
        assert!(frontier.offer("https://example.edu/a", &root));
        assert!(frontier.offer("https://example.edu/b", &root));

        let a = frontier.pop().unwrap();
        // b is reachable from a at depth 2 but was already seen at depth 1
        assert!(!frontier.offer("https://example.edu/b", &a));

        let b = frontier.pop().unwrap();
        assert_eq!(b.url, "https://example.edu/b");
        assert_eq!(b.depth, 1);
    }

    #[test]
    fn test_take_level_drains_shallowest_depth() {
        let mut frontier = Frontier::new("https://example.edu/", 3).unwrap();
        assert_eq!(frontier.take_level().len(), 1);

        let root = CrawlTask {
            url: "https://example.edu/".to_string(),
            depth: 0,
            parent_url: None,
        };
        frontier.offer("https://example.edu/a", &root);
        frontier.offer("https://example.edu/b", &root);

        let level = frontier.take_level();
        let urls: Vec<&str> = level.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.edu/a", "https://example.edu/b"]);

        frontier.offer("https://example.edu/a/1", &level[0]);
        let next = frontier.take_level();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].depth, 2);
        assert!(frontier.take_level().is_empty());
    }

    #[test]
    fn test_mark_visited_blocks_later_offers() {
        let mut frontier = Frontier::new("https://example.edu/", 2).unwrap();
        let root = frontier.pop().unwrap();

        assert!(frontier.mark_visited("https://www.example.edu/"));
        assert!(!frontier.offer("https://www.example.edu/", &root));
        assert_eq!(frontier.visited_len(), 2);
    }

    #[test]
    fn test_unnormalizable_links_ignored() {
        let mut frontier = Frontier::new("https://example.edu/", 2).unwrap();
        let root = frontier.pop().unwrap();
        assert!(!frontier.offer("mailto:someone@example.edu", &root));
        assert!(frontier.is_empty());
    }
}
