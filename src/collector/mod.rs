//! Boundary to the inventory source.
//!
//! The core only ever sees [`Collector`]: one finite, restartable
//! sequence of security-group records with pagination already flattened
//! away. Concrete transports implement [`PageSource`] and get the token
//! loop from [`PagedCollector`].

use thiserror::Error;

use crate::model::raw::{DescribeSecurityGroupsPage, RawSecurityGroup};

/// How an inventory pass can fail.
#[derive(Debug, Error)]
pub enum CollectionFailure {
    /// Nothing was retrieved; the run has no inventory to audit.
    #[error("inventory collection failed: {0}")]
    Total(String),

    /// A deeper page failed after earlier pages succeeded. The groups
    /// already collected are carried so the caller may audit the prefix.
    #[error("collection stopped after {} group(s): {cause}", collected.len())]
    Partial {
        collected: Vec<RawSecurityGroup>,
        cause: String,
    },
}

/// A finite, restartable sequence of security groups. Each call is a
/// fresh pass over the inventory.
pub trait Collector {
    fn security_groups(&self) -> Result<Vec<RawSecurityGroup>, CollectionFailure>;
}

/// One page of inventory plus the continuation token, as a transport
/// returns it.
pub trait PageSource {
    /// Fetch one page. `token` is `None` for the first page.
    fn fetch_page(&self, token: Option<&str>) -> Result<DescribeSecurityGroupsPage, String>;
}

/// Drives a [`PageSource`] through its continuation tokens.
///
/// A first-page failure is total; a failure on any later page surfaces
/// the prefix already collected.
pub struct PagedCollector<S: PageSource> {
    source: S,
}

impl<S: PageSource> PagedCollector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: PageSource> Collector for PagedCollector<S> {
    fn security_groups(&self) -> Result<Vec<RawSecurityGroup>, CollectionFailure> {
        let mut collected: Vec<RawSecurityGroup> = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = match self.source.fetch_page(token.as_deref()) {
                Ok(page) => page,
                Err(cause) if collected.is_empty() => {
                    return Err(CollectionFailure::Total(cause));
                }
                Err(cause) => {
                    return Err(CollectionFailure::Partial { collected, cause });
                }
            };
            collected.extend(page.security_groups);
            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(collected),
            }
        }
    }
}

/// In-memory collector over a fixed inventory. Used for fixtures, file
/// input, and tests; never fails.
#[derive(Debug, Clone, Default)]
pub struct StaticCollector {
    groups: Vec<RawSecurityGroup>,
}

impl StaticCollector {
    pub fn new(groups: Vec<RawSecurityGroup>) -> Self {
        Self { groups }
    }
}

impl Collector for StaticCollector {
    fn security_groups(&self) -> Result<Vec<RawSecurityGroup>, CollectionFailure> {
        Ok(self.groups.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn group(id: &str) -> RawSecurityGroup {
        RawSecurityGroup {
            group_id: id.into(),
            group_name: id.into(),
            ..Default::default()
        }
    }

    /// Scripted page source: each entry is one page result.
    struct Script {
        pages: RefCell<Vec<Result<DescribeSecurityGroupsPage, String>>>,
    }

    impl Script {
        fn new(pages: Vec<Result<DescribeSecurityGroupsPage, String>>) -> Self {
            Self {
                pages: RefCell::new(pages),
            }
        }
    }

    impl PageSource for Script {
        fn fetch_page(&self, _token: Option<&str>) -> Result<DescribeSecurityGroupsPage, String> {
            self.pages.borrow_mut().remove(0)
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> DescribeSecurityGroupsPage {
        DescribeSecurityGroupsPage {
            security_groups: ids.iter().map(|id| group(id)).collect(),
            next_token: next.map(String::from),
        }
    }

    #[test]
    fn follows_tokens_across_pages() {
        let collector = PagedCollector::new(Script::new(vec![
            Ok(page(&["sg-1", "sg-2"], Some("t1"))),
            Ok(page(&["sg-3"], None)),
        ]));
        let groups = collector.security_groups().unwrap();
        let ids: Vec<&str> = groups.iter().map(|g| g.group_id.as_str()).collect();
        assert_eq!(ids, vec!["sg-1", "sg-2", "sg-3"]);
    }

    #[test]
    fn first_page_failure_is_total() {
        let collector = PagedCollector::new(Script::new(vec![Err("connection refused".into())]));
        match collector.security_groups() {
            Err(CollectionFailure::Total(cause)) => assert!(cause.contains("refused")),
            other => panic!("expected total failure, got {other:?}"),
        }
    }

    #[test]
    fn deeper_page_failure_keeps_prefix() {
        let collector = PagedCollector::new(Script::new(vec![
            Ok(page(&["sg-1"], Some("t1"))),
            Err("throttled".into()),
        ]));
        match collector.security_groups() {
            Err(CollectionFailure::Partial { collected, cause }) => {
                assert_eq!(collected.len(), 1);
                assert_eq!(collected[0].group_id, "sg-1");
                assert_eq!(cause, "throttled");
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[test]
    fn static_collector_restartable() {
        let collector = StaticCollector::new(vec![group("sg-1")]);
        assert_eq!(collector.security_groups().unwrap().len(), 1);
        assert_eq!(collector.security_groups().unwrap().len(), 1);
    }
}
