//! Region/endpoint registry
//!
//! A fixed, ordered list of the regions the archive service is deployed in.
//! The position of a region in [`REGIONS`] is persisted in the property file
//! (`locationSet`), so entries are only ever appended, never reordered.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// One deployment of the archive service with its sub-service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub index: usize,
    /// Canonical region name, e.g. `us-east-1`
    pub name: &'static str,
    /// Human readable title shown in selection lists
    pub title: &'static str,
    pub archive_endpoint: &'static str,
    pub queue_endpoint: &'static str,
    pub notification_endpoint: &'static str,
}

macro_rules! region {
    ($index:expr, $name:literal, $title:literal) => {
        Region {
            index: $index,
            name: $name,
            title: $title,
            archive_endpoint: concat!("https://glacier.", $name, ".amazonaws.com"),
            queue_endpoint: concat!("https://sqs.", $name, ".amazonaws.com"),
            notification_endpoint: concat!("https://sns.", $name, ".amazonaws.com"),
        }
    };
}

pub const REGIONS: &[Region] = &[
    region!(0, "us-east-1", "US East (Northern Virginia)"),
    region!(1, "us-west-1", "US West (Northern California)"),
    region!(2, "us-west-2", "US West (Oregon)"),
    region!(3, "eu-west-1", "EU (Ireland)"),
    region!(4, "ap-northeast-1", "Asia Pacific (Tokyo)"),
    region!(5, "eu-central-1", "EU (Frankfurt)"),
    region!(6, "ap-southeast-2", "Asia Pacific (Sydney)"),
];

/// Number of known regions.
pub fn count() -> usize {
    REGIONS.len()
}

/// Look up a region by its persisted index.
pub fn by_index(index: usize) -> CoreResult<&'static Region> {
    REGIONS.get(index).ok_or(CoreError::IndexOutOfRange {
        what: "Region",
        index,
        len: REGIONS.len(),
    })
}

/// Display titles in index order, for populating a selection list.
pub fn titles() -> impl Iterator<Item = &'static str> {
    REGIONS.iter().map(|r| r.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn indices_match_positions() {
        for (i, region) in REGIONS.iter().enumerate() {
            assert_eq!(region.index, i);
            assert_eq!(by_index(i).unwrap(), region);
        }
    }

    #[test]
    fn titles_and_endpoints_are_distinct() {
        let titles: HashSet<_> = titles().collect();
        let endpoints: HashSet<_> = REGIONS.iter().map(|r| r.archive_endpoint).collect();
        assert_eq!(titles.len(), count());
        assert_eq!(endpoints.len(), count());
    }

    #[test]
    fn endpoints_embed_region_name() {
        let region = by_index(3).unwrap();
        assert_eq!(region.name, "eu-west-1");
        assert_eq!(region.archive_endpoint, "https://glacier.eu-west-1.amazonaws.com");
        assert_eq!(region.queue_endpoint, "https://sqs.eu-west-1.amazonaws.com");
        assert_eq!(region.notification_endpoint, "https://sns.eu-west-1.amazonaws.com");
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = by_index(count()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::IndexOutOfRange { index, len, .. } if index == count() && len == count()
        ));
        assert!(by_index(usize::MAX).is_err());
    }
}
