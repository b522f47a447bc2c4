//! Badge stock deficit derivation.
//!
//! Pure functions comparing badge demand (pending awards, optionally the
//! members working on badges scheduled for them) against stock on hand.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::types::{AwardStatus, BadgeDefinition, BadgeStock, MemberBadgeAward};

/// A badge needed more times than it is in stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockDeficit {
    pub badge_id: Uuid,
    pub badge_name: String,
    pub current_stock: i64,
    pub needed: u32,
    pub deficit: i64,
}

/// A badge at or below its reorder threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStock {
    pub badge_id: Uuid,
    pub badge_name: String,
    pub current_stock: i64,
    pub minimum_threshold: i64,
}

/// Count pending awards per badge.
pub fn pending_demand(awards: &[MemberBadgeAward]) -> HashMap<Uuid, u32> {
    let mut demand = HashMap::new();
    for award in awards.iter().filter(|a| a.award_status == AwardStatus::Pending) {
        *demand.entry(award.badge_id).or_insert(0) += 1;
    }
    demand
}

/// Pending demand plus members in progress on badges scheduled in their
/// section's current term.
///
/// `scheduled_in_progress` must already exclude members holding an award
/// for the badge, so nobody is counted twice.
pub fn forecast_demand(
    pending: &HashMap<Uuid, u32>,
    scheduled_in_progress: &HashMap<Uuid, u32>,
) -> HashMap<Uuid, u32> {
    let mut demand = pending.clone();
    for (badge_id, count) in scheduled_in_progress {
        *demand.entry(*badge_id).or_insert(0) += count;
    }
    demand
}

/// Badges whose demand exceeds stock, largest deficit first.
///
/// A badge with no stock row counts as zero in stock.
pub fn derive_deficits(
    badges: &[BadgeDefinition],
    demand: &HashMap<Uuid, u32>,
    stock: &[BadgeStock],
) -> Vec<StockDeficit> {
    let levels: HashMap<Uuid, i64> = stock.iter().map(|s| (s.badge_id, s.current_stock)).collect();

    let mut deficits: Vec<StockDeficit> = badges
        .iter()
        .filter_map(|badge| {
            let needed = *demand.get(&badge.id)?;
            let current_stock = levels.get(&badge.id).copied().unwrap_or(0);
            let deficit = (needed as i64 - current_stock).max(0);
            (deficit > 0).then(|| StockDeficit {
                badge_id: badge.id,
                badge_name: badge.name.clone(),
                current_stock,
                needed,
                deficit,
            })
        })
        .collect();

    deficits.sort_by(|a, b| {
        (Reverse(a.deficit), &a.badge_name).cmp(&(Reverse(b.deficit), &b.badge_name))
    });
    deficits
}

/// Badges whose stock is at or below their minimum threshold.
pub fn low_stock(badges: &[BadgeDefinition], stock: &[BadgeStock]) -> Vec<LowStock> {
    let names: HashMap<Uuid, &str> = badges.iter().map(|b| (b.id, b.name.as_str())).collect();

    let mut low: Vec<LowStock> = stock
        .iter()
        .filter(|s| s.current_stock <= s.minimum_threshold)
        .filter_map(|s| {
            Some(LowStock {
                badge_id: s.badge_id,
                badge_name: names.get(&s.badge_id)?.to_string(),
                current_stock: s.current_stock,
                minimum_threshold: s.minimum_threshold,
            })
        })
        .collect();

    low.sort_by(|a, b| {
        a.current_stock
            .cmp(&b.current_stock)
            .then_with(|| a.badge_name.cmp(&b.badge_name))
    });
    low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::types::{BadgeCategory, BadgeSection};
    use chrono::Utc;

    fn badge(name: &str) -> BadgeDefinition {
        BadgeDefinition::new(name, BadgeSection::All, BadgeCategory::Activity)
    }

    fn stock(badge: &BadgeDefinition, current: i64, minimum: i64) -> BadgeStock {
        BadgeStock {
            badge_id: badge.id,
            current_stock: current,
            minimum_threshold: minimum,
            updated_at: Utc::now(),
        }
    }

    fn pending(badge: &BadgeDefinition, n: usize) -> Vec<MemberBadgeAward> {
        (0..n)
            .map(|_| MemberBadgeAward::pending(Uuid::new_v4(), badge.id))
            .collect()
    }

    #[test]
    fn test_deficit_is_demand_minus_stock() {
        let camper = badge("Camper");
        let demand = pending_demand(&pending(&camper, 5));

        let deficits = derive_deficits(&[camper.clone()], &demand, &[stock(&camper, 2, 1)]);
        assert_eq!(deficits.len(), 1);
        assert_eq!(deficits[0].needed, 5);
        assert_eq!(deficits[0].current_stock, 2);
        assert_eq!(deficits[0].deficit, 3);
    }

    #[test]
    fn test_covered_demand_is_omitted() {
        let camper = badge("Camper");
        let demand = pending_demand(&pending(&camper, 2));
        assert!(derive_deficits(&[camper.clone()], &demand, &[stock(&camper, 2, 1)]).is_empty());
    }

    #[test]
    fn test_missing_stock_row_counts_as_zero() {
        let hiker = badge("Hiker");
        let demand = pending_demand(&pending(&hiker, 2));
        let deficits = derive_deficits(&[hiker], &demand, &[]);
        assert_eq!(deficits[0].current_stock, 0);
        assert_eq!(deficits[0].deficit, 2);
    }

    #[test]
    fn test_awarded_rows_are_not_demand() {
        let hiker = badge("Hiker");
        let mut awards = pending(&hiker, 3);
        awards[0].award_status = AwardStatus::Awarded;
        assert_eq!(pending_demand(&awards).get(&hiker.id), Some(&2));
    }

    #[test]
    fn test_ordering_by_deficit_then_name() {
        let a = badge("Astronomer");
        let b = badge("Builder");
        let c = badge("Cook");
        let mut demand = HashMap::new();
        demand.insert(a.id, 2);
        demand.insert(b.id, 4);
        demand.insert(c.id, 2);

        let deficits = derive_deficits(&[a, b, c], &demand, &[]);
        let names: Vec<&str> = deficits.iter().map(|d| d.badge_name.as_str()).collect();
        assert_eq!(names, vec!["Builder", "Astronomer", "Cook"]);
    }

    #[test]
    fn test_forecast_adds_in_progress_to_pending() {
        let navigator = badge("Navigator");
        let swimmer = badge("Swimmer");
        let pending = pending_demand(&pending(&navigator, 1));

        let mut in_progress = HashMap::new();
        in_progress.insert(navigator.id, 4);

        let demand = forecast_demand(&pending, &in_progress);
        assert_eq!(demand.get(&navigator.id), Some(&5));
        assert_eq!(demand.get(&swimmer.id), None);
    }

    #[test]
    fn test_low_stock_includes_threshold() {
        let a = badge("Astronomer");
        let b = badge("Builder");
        let c = badge("Cook");
        let rows = [stock(&a, 2, 2), stock(&b, 5, 2), stock(&c, -1, 2)];

        let low = low_stock(&[a, b, c], &rows);
        let names: Vec<&str> = low.iter().map(|l| l.badge_name.as_str()).collect();
        assert_eq!(names, vec!["Cook", "Astronomer"]);
    }
}
