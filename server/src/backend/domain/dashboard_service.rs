//! Dashboard statistics.
//!
//! [`compute_stats`] is a pure function over the current collections so the
//! arithmetic can be tested without a store.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::{BTreeMap, HashSet};

use crate::backend::storage::{CollectionRepository, FarmStore};
use shared::{
    AgeDistribution, BreedingRecord, BreedingStatus, DashboardStats, FeedInventory, HealthStatus, QuickStats, Rabbit,
    RabbitStatus,
};

const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Clone)]
pub struct DashboardService {
    rabbits: CollectionRepository<Rabbit>,
    breeding: CollectionRepository<BreedingRecord>,
    feed: CollectionRepository<FeedInventory>,
    total_cages: u32,
}

impl DashboardService {
    pub fn new(store: FarmStore, total_cages: u32) -> Self {
        Self {
            rabbits: store.repository(),
            breeding: store.repository(),
            feed: store.repository(),
            total_cages,
        }
    }

    pub async fn get_stats(&self) -> Result<DashboardStats> {
        info!("Computing dashboard statistics");
        let rabbits = self.rabbits.list().await?;
        let breeding = self.breeding.list().await?;
        let feed = self.feed.list().await?;
        Ok(compute_stats(&rabbits, &breeding, &feed, self.total_cages, Utc::now()))
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn age_in_months(birth_date: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - birth_date).num_seconds() as f64 / (DAYS_PER_MONTH * 24.0 * 60.0 * 60.0)
}

pub fn compute_stats(
    rabbits: &[Rabbit],
    breeding: &[BreedingRecord],
    feed: &[FeedInventory],
    total_cages: u32,
    now: DateTime<Utc>,
) -> DashboardStats {
    let mut age_distribution = AgeDistribution::default();
    for birth_date in rabbits.iter().filter_map(|r| r.birth_date) {
        let months = age_in_months(birth_date, now);
        if months <= 3.0 {
            age_distribution.young += 1;
        } else if months <= 12.0 {
            age_distribution.adult += 1;
        } else {
            age_distribution.senior += 1;
        }
    }

    let mut breed_distribution: BTreeMap<String, u32> = BTreeMap::new();
    for rabbit in rabbits {
        *breed_distribution.entry(rabbit.breed.clone()).or_default() += 1;
    }

    let successful: Vec<&BreedingRecord> = breeding
        .iter()
        .filter(|b| b.status == BreedingStatus::Success)
        .collect();
    let total_born: u64 = successful.iter().map(|b| u64::from(b.litter_size.unwrap_or(0))).sum();
    let total_alive: u64 = successful.iter().map(|b| u64::from(b.litter_alive.unwrap_or(0))).sum();

    let average_litter_size = if successful.is_empty() {
        0.0
    } else {
        total_born as f64 / successful.len() as f64
    };
    let mortality_rate = if total_born > 0 {
        (total_born.saturating_sub(total_alive) as f64 / total_born as f64) * 100.0
    } else {
        0.0
    };

    let occupied_cages: HashSet<&str> = rabbits
        .iter()
        .filter(|r| r.status != RabbitStatus::Deceased)
        .filter_map(|r| r.cage_number.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    let feed_grams: u64 = feed.iter().map(|f| f.quantity as u64).sum();

    DashboardStats {
        total_rabbits: rabbits.len() as u32,
        active_breeding: breeding.iter().filter(|b| b.status == BreedingStatus::Pending).count() as u32,
        active_medical: rabbits.iter().filter(|r| r.health_status != HealthStatus::Healthy).count() as u32,
        feed_stock: feed_grams as f64 / 1000.0,
        age_distribution,
        breed_distribution,
        quick_stats: QuickStats {
            birth_rate: successful.len() as u32,
            average_litter_size: round_one_decimal(average_litter_size),
            mortality_rate: round_one_decimal(mortality_rate),
            rabbits_for_sale: rabbits.iter().filter(|r| r.status == RabbitStatus::ForSale).count() as u32,
            available_cages: total_cages.saturating_sub(occupied_cages.len() as u32),
        },
    }
}
