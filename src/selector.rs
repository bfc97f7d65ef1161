//! Narrowing the catalog down to a working selection.
//!
//! Each function builds a fresh [`Selection`]; nothing is merged with a
//! previous one.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::warn;

use crate::catalog::{Catalog, Item};
use crate::error::{AnnouncerError, Result};

pub type Selection = Vec<Item>;

/// All items on the given pages, in catalog order.
pub fn select_by_pages(catalog: &Catalog, pages: &BTreeSet<u32>) -> Selection {
    catalog
        .items()
        .iter()
        .filter(|item| pages.contains(&item.page))
        .cloned()
        .collect()
}

/// All items whose page-relative ordinal lies in `start..=end`.
///
/// Bounds are validated against the size of the whole catalog, so a range
/// can match items on several pages.
pub fn select_by_ordinal_range(catalog: &Catalog, start: u32, end: u32) -> Result<Selection> {
    if start < 1 || end as usize > catalog.len() {
        warn!(
            "select_by_ordinal_range rejected {start}..={end} (catalog has {} items)",
            catalog.len()
        );
        return Err(AnnouncerError::InvalidRange {
            start,
            end,
            total: catalog.len(),
        });
    }

    Ok(catalog
        .items()
        .iter()
        .filter(|item| (start..=end).contains(&item.ordinal))
        .cloned()
        .collect())
}

/// `count` distinct items in draw order. Clamped to the catalog size.
pub fn select_random<R: Rng + ?Sized>(catalog: &Catalog, count: usize, rng: &mut R) -> Selection {
    let total = catalog.len();
    let count = if count > total {
        warn!("Requested {count} random items but only {total} exist, selecting all");
        total
    } else {
        count
    };

    rand::seq::index::sample(rng, total, count)
        .into_iter()
        .map(|idx| catalog.items()[idx].clone())
        .collect()
}

/// Parse a comma-separated page list such as `"1, 2,3"`.
pub fn parse_page_list(input: &str) -> Result<BTreeSet<u32>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<u32>().map_err(|_| {
                AnnouncerError::InvalidInput(format!(
                    "'{token}' is not a page number; enter numbers separated by commas"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scenario_catalog() -> Catalog {
        Catalog::from_items(vec![
            Item::new("A", 1, 1),
            Item::new("B", 1, 2),
            Item::new("C", 2, 1),
        ])
    }

    fn larger_catalog() -> Catalog {
        Catalog::from_pages(&["a\nb\nc\nd", "e\nf", "g\nh\ni"])
    }

    #[test]
    fn pages_filter_keeps_catalog_order() {
        let catalog = larger_catalog();
        let pages = BTreeSet::from([3, 1]);
        let selection = select_by_pages(&catalog, &pages);

        assert_eq!(selection.len(), 7);
        assert!(selection.iter().all(|item| pages.contains(&item.page)));
        let texts: Vec<&str> = selection.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c", "d", "g", "h", "i"]);
    }

    #[test]
    fn empty_or_unknown_pages_select_nothing() {
        let catalog = larger_catalog();
        assert!(select_by_pages(&catalog, &BTreeSet::new()).is_empty());
        assert!(select_by_pages(&catalog, &BTreeSet::from([42])).is_empty());
    }

    #[test]
    fn ordinal_range_matches_across_pages() {
        let selection = select_by_ordinal_range(&scenario_catalog(), 1, 1).unwrap();
        let texts: Vec<&str> = selection.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["A", "C"]);
    }

    #[test]
    fn ordinal_range_results_are_within_bounds() {
        let catalog = larger_catalog();
        let selection = select_by_ordinal_range(&catalog, 2, 3).unwrap();
        assert!(selection.iter().all(|i| (2..=3).contains(&i.ordinal)));
        assert_eq!(selection.len(), 5);
    }

    #[test]
    fn ordinal_range_is_validated_against_catalog_size() {
        let catalog = scenario_catalog();
        assert!(matches!(
            select_by_ordinal_range(&catalog, 0, 2),
            Err(AnnouncerError::InvalidRange { start: 0, end: 2, total: 3 })
        ));
        assert!(matches!(
            select_by_ordinal_range(&catalog, 1, 4),
            Err(AnnouncerError::InvalidRange { .. })
        ));
        // Largest ordinal is 2, but the bound is the total item count.
        assert_eq!(select_by_ordinal_range(&catalog, 3, 3).unwrap().len(), 0);
    }

    #[test]
    fn random_selection_is_distinct() {
        let catalog = larger_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let selection = select_random(&catalog, 5, &mut rng);

        assert_eq!(selection.len(), 5);
        for (i, a) in selection.iter().enumerate() {
            assert!(catalog.items().contains(a));
            assert!(selection[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn random_selection_clamps_to_catalog() {
        let catalog = scenario_catalog();
        let mut rng = StdRng::seed_from_u64(1);
        let selection = select_random(&catalog, 10, &mut rng);

        assert_eq!(selection.len(), 3);
        for item in catalog.items() {
            assert!(selection.contains(item));
        }
    }

    #[test]
    fn random_selection_is_reproducible_with_seed() {
        let catalog = larger_catalog();
        let a = select_random(&catalog, 4, &mut StdRng::seed_from_u64(99));
        let b = select_random(&catalog, 4, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn page_list_parsing() {
        assert_eq!(parse_page_list("1, 2,3").unwrap(), BTreeSet::from([1, 2, 3]));
        assert_eq!(parse_page_list(" 4 ,").unwrap(), BTreeSet::from([4]));
        assert!(matches!(
            parse_page_list("1,two"),
            Err(AnnouncerError::InvalidInput(_))
        ));
    }
}
